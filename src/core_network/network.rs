use crate::config::Config;
use crate::constants::BUFFER_SIZE;
use crate::core_ftpcommand::handlers::{CommandTable, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Mutex;

/// Binds `0.0.0.0:port` with `SO_REUSEADDR` and the given backlog.
pub fn bind_listener(port: u16, backlog: u32) -> std::io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    socket.listen(backlog)
}

/// Serves control sessions one after another.
///
/// The next client is only accepted once the current session, including all
/// of its data transfers, has ended.
pub async fn serve_sessions(
    listener: TcpListener,
    config: Arc<Config>,
    commands: Arc<CommandTable>,
    start_dir: PathBuf,
) -> Result<()> {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Accept failed: {}", e);
                continue;
            }
        };
        info!("New client connected from {}", addr);

        if let Err(e) = handle_connection(
            socket,
            Arc::clone(&config),
            Arc::clone(&commands),
            start_dir.clone(),
        )
        .await
        {
            error!("Connection error: {:?}", e);
        }
        info!("Closing connection from {}", addr);
    }
}

/// Runs one control session until QUIT, disconnect or a control channel error.
pub async fn handle_connection(
    socket: TcpStream,
    config: Arc<Config>,
    commands: Arc<CommandTable>,
    start_dir: PathBuf,
) -> Result<()> {
    let client_addr = socket.peer_addr().context("Failed to read peer address")?;
    let local_addr = socket.local_addr().context("Failed to read local address")?;

    let (read_half, write_half) = socket.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));
    let mut reader = BufReader::new(read_half);
    let session = Arc::new(Mutex::new(Session::new(start_dir, client_addr, local_addr)));

    send_response(&writer, b"220 Welcome to mini FTP Server (Passive Mode Only)\r\n").await?;

    let mut buffer = Vec::with_capacity(BUFFER_SIZE);
    loop {
        match read_control_line(&mut reader, &mut buffer)
            .await
            .context("Error receiving data")?
        {
            ControlLine::Closed => {
                info!("Client disconnected");
                break;
            }
            ControlLine::TooLong => {
                warn!("Discarded control line longer than {} bytes", BUFFER_SIZE);
                send_response(&writer, b"500 Syntax error, command unrecognized\r\n").await?;
                continue;
            }
            ControlLine::Line => {}
        }

        let line = String::from_utf8_lossy(&buffer);
        debug!("Received [{}]: {}", client_addr, line.trim_end());

        let flow = commands
            .dispatch(
                &line,
                Arc::clone(&writer),
                Arc::clone(&config),
                Arc::clone(&session),
            )
            .await
            .context("Error handling command")?;
        if flow == SessionFlow::Terminate {
            break;
        }
    }

    // The data listener goes with the session; the control socket is shut
    // down explicitly so the peer sees EOF right away.
    session.lock().await.data_channel.take();
    if let Err(e) = writer.lock().await.shutdown().await {
        debug!("Control shutdown: {}", e);
    }
    Ok(())
}

enum ControlLine {
    Line,
    TooLong,
    Closed,
}

/// Reads one control line of at most `BUFFER_SIZE` bytes into `buffer`.
///
/// Longer lines are drained up to their newline in bounded chunks and
/// reported as `TooLong`, so a peer that never ends its line cannot make
/// the session buffer without limit.
async fn read_control_line<R>(reader: &mut R, buffer: &mut Vec<u8>) -> std::io::Result<ControlLine>
where
    R: AsyncBufRead + Unpin,
{
    buffer.clear();
    let n = (&mut *reader)
        .take(BUFFER_SIZE as u64)
        .read_until(b'\n', buffer)
        .await?;
    if n == 0 {
        return Ok(ControlLine::Closed);
    }
    if n < BUFFER_SIZE || buffer.last() == Some(&b'\n') {
        return Ok(ControlLine::Line);
    }

    let mut rest = Vec::with_capacity(BUFFER_SIZE);
    loop {
        rest.clear();
        let n = (&mut *reader)
            .take(BUFFER_SIZE as u64)
            .read_until(b'\n', &mut rest)
            .await?;
        if n == 0 || rest.last() == Some(&b'\n') {
            break;
        }
    }
    Ok(ControlLine::TooLong)
}
