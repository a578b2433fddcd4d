use crate::core_shell::pty::PtyMaster;
use log::trace;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Which side ended the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    ClientClosed,
    TerminalClosed,
}

/// Copies bytes both ways between the client and the terminal master until
/// one of them reaches end of stream.
///
/// Bytes are passed through untouched in both directions: keystrokes to the
/// child, and echo, output and control sequences back to the client. There
/// is no timeout; an idle session waits until either side closes.
pub async fn relay<S>(client: &mut S, master: &PtyMaster, buffer_size: usize) -> io::Result<RelayEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_reader, mut client_writer) = tokio::io::split(client);
    let mut client_buf = vec![0u8; buffer_size.max(1)];
    let mut pty_buf = vec![0u8; buffer_size.max(1)];

    loop {
        tokio::select! {
            read = client_reader.read(&mut client_buf) => {
                let n = read?;
                if n == 0 {
                    return Ok(RelayEnd::ClientClosed);
                }
                trace!("client -> pty: {} bytes", n);
                master.write_all(&client_buf[..n]).await?;
            }
            read = master.read(&mut pty_buf) => {
                let n = read?;
                if n == 0 {
                    return Ok(RelayEnd::TerminalClosed);
                }
                trace!("pty -> client: {} bytes", n);
                client_writer.write_all(&pty_buf[..n]).await?;
                client_writer.flush().await?;
            }
        }
    }
}
