pub mod cli;

pub use cli::{Cli, Mode};
