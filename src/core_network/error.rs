// Data channel errors reported on the control connection
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataChannelError {
    #[error("Passive mode has not been entered")]
    NotOpen,

    #[error("No data connection within {0:?}")]
    AcceptTimeout(Duration),

    #[error("Data connection failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DataChannelError {
    pub fn to_ftp_response(&self) -> String {
        "425 Can't open data connection\r\n".to_string()
    }
}
