use crate::config::Config;
use crate::constants::DATA_LISTEN_BACKLOG;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::core_network::error::DataChannelError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{debug, error, trace, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Mutex;

/// Handles the PASV command.
///
/// Opens the session's data listener on first use and reports where it can
/// be reached. Later PASV commands report the same listener again.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> HandlerResult {
    let mut session = session.lock().await;

    if session.data_channel.is_none() {
        match DataChannel::open() {
            Ok(channel) => session.data_channel = Some(channel),
            Err(e) => {
                error!("Failed to set up passive listener: {}", e);
                send_response(&writer, e.to_ftp_response().as_bytes()).await?;
                return Ok(SessionFlow::Continue);
            }
        }
    }

    let port = match session.data_channel.as_ref() {
        Some(channel) => channel.port(),
        None => return Ok(SessionFlow::Continue),
    };
    let pasv_ip = reported_address(&config, session.local_addr);

    let response = pasv_response(pasv_ip, port);
    send_response(&writer, response.as_bytes()).await?;
    debug!("PASV listener reported as {}:{}", pasv_ip, port);
    Ok(SessionFlow::Continue)
}

/// The configured passive address, or the local end of the control
/// connection when none is usable.
fn reported_address(config: &Config, local_addr: SocketAddr) -> Ipv4Addr {
    if let Some(address) = config.ftp.pasv_address.as_deref() {
        match address.parse::<Ipv4Addr>() {
            Ok(ip) => return ip,
            Err(e) => warn!("Ignoring passive address {:?}: {}", address, e),
        }
    }
    match local_addr.ip() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(ip) => ip.to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
    }
}

/// Passive mode listener owned by one control session.
///
/// Opened by the first PASV and kept until the session ends. Every transfer
/// command takes exactly one connection from it, and only one transfer runs
/// at a time because the control loop waits for the handler to finish.
#[derive(Debug)]
pub struct DataChannel {
    listener: TcpListener,
    port: u16,
}

impl DataChannel {
    /// Binds an ephemeral port on the wildcard address with a backlog of one.
    pub fn open() -> Result<Self, DataChannelError> {
        let socket = TcpSocket::new_v4()?;
        socket.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))?;
        let listener = socket.listen(DATA_LISTEN_BACKLOG)?;
        let port = listener.local_addr()?.port();
        debug!("Data listener bound on port {}", port);
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the data peer of the next transfer.
    pub async fn accept(&self, timeout: Option<Duration>) -> Result<TcpStream, DataChannelError> {
        let (stream, addr) = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.listener.accept())
                .await
                .map_err(|_| DataChannelError::AcceptTimeout(limit))??,
            None => self.listener.accept().await?,
        };
        trace!("Accepted data connection from: {}", addr);
        Ok(stream)
    }
}

/// Formats the 227 reply: four address octets, then the port split into
/// high and low bytes (`port = 256 * hi + lo`).
pub fn pasv_response(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
        a,
        b,
        c,
        d,
        port / 256,
        port % 256
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_port(response: &str) -> u16 {
        let start = response.find('(').unwrap() + 1;
        let end = response.find(')').unwrap();
        let parts: Vec<u16> = response[start..end]
            .split(',')
            .map(|p| p.parse().unwrap())
            .collect();
        assert_eq!(parts.len(), 6);
        parts[4] * 256 + parts[5]
    }

    #[test]
    fn test_pasv_response_format() {
        let response = pasv_response(Ipv4Addr::new(192, 168, 1, 20), 50_123);
        assert_eq!(
            response,
            "227 Entering Passive Mode (192,168,1,20,195,203)\r\n"
        );
        assert_eq!(decode_port(&response), 50_123);
    }

    #[tokio::test]
    async fn test_reported_port_matches_listener() {
        let channel = DataChannel::open().unwrap();
        let response = pasv_response(Ipv4Addr::LOCALHOST, channel.port());
        assert_eq!(decode_port(&response), channel.port());
        assert_eq!(channel.listener.local_addr().unwrap().port(), channel.port());
    }

    #[tokio::test]
    async fn test_accept_one_peer_per_call() {
        let channel = DataChannel::open().unwrap();
        let port = channel.port();

        for _ in 0..2 {
            let client = tokio::spawn(async move { TcpStream::connect(("127.0.0.1", port)).await });
            let accepted = channel.accept(Some(Duration::from_secs(5))).await.unwrap();
            let connected = client.await.unwrap().unwrap();
            assert_eq!(accepted.peer_addr().unwrap(), connected.local_addr().unwrap());
        }
    }

    #[test]
    fn test_reported_address() {
        let local: SocketAddr = "127.0.0.1:21".parse().unwrap();
        let mut config = Config::default();
        assert_eq!(reported_address(&config, local), Ipv4Addr::LOCALHOST);

        config.ftp.pasv_address = Some("203.0.113.7".to_string());
        assert_eq!(reported_address(&config, local), Ipv4Addr::new(203, 0, 113, 7));

        config.ftp.pasv_address = Some("bogus".to_string());
        assert_eq!(reported_address(&config, local), Ipv4Addr::LOCALHOST);

        let mapped: SocketAddr = "[::ffff:10.0.0.9]:21".parse().unwrap();
        config.ftp.pasv_address = None;
        assert_eq!(reported_address(&config, mapped), Ipv4Addr::new(10, 0, 0, 9));
    }

    #[tokio::test]
    async fn test_accept_timeout() {
        let channel = DataChannel::open().unwrap();
        let err = channel
            .accept(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, DataChannelError::AcceptTimeout(_)));
        assert_eq!(err.to_ftp_response(), "425 Can't open data connection\r\n");
    }
}
