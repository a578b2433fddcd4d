// Errors that abort a single shell session
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("openpty failed: {0}")]
    Open(#[source] nix::Error),

    #[error("failed to configure pty: {0}")]
    Setup(#[source] nix::Error),

    #[error("failed to register pty with the reactor: {0}")]
    Register(#[source] std::io::Error),

    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
