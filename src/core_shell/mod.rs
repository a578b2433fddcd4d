pub mod error;
pub mod network;
pub mod pty;
pub mod relay;
