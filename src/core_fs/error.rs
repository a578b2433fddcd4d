// Filesystem errors raised while resolving session paths
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path exceeds {limit} bytes: {path}")]
    TooLong { path: String, limit: usize },

    #[error("Failed to resolve {path}: {source}")]
    Unresolvable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Directory not accessible: {0}")]
    NotAccessible(String),
}

impl PathError {
    pub fn to_ftp_response(&self) -> String {
        "550 Failed to change directory\r\n".to_string()
    }
}
