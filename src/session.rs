use crate::core_network::pasv::DataChannel;
use std::net::SocketAddr;
use std::path::PathBuf;

/// State of one control connection.
///
/// `current_dir` is canonical and only replaced after a successful CWD.
/// The data listener, when present, is dropped together with the session.
#[derive(Debug)]
pub struct Session {
    pub current_dir: PathBuf,
    pub client_addr: SocketAddr,
    pub local_addr: SocketAddr, // Control socket address on our side
    pub data_channel: Option<DataChannel>,
}

impl Session {
    pub fn new(current_dir: PathBuf, client_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            current_dir,
            client_addr,
            local_addr,
            data_channel: None,
        }
    }
}
