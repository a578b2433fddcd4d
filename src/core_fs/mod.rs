pub mod error;
pub mod lister;
pub mod path;
