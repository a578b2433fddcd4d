use crate::config::Config;
use crate::core_network::error::DataChannelError;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{error, info};
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Sends the preliminary 150 reply, then blocks until the data peer connects.
///
/// When no peer can be obtained the 425 reply has already been sent and
/// `None` is returned; the control session carries on.
pub async fn open_data_connection(
    writer: &ControlWriter,
    config: &Config,
    session: &Session,
    preliminary: &[u8],
) -> io::Result<Option<TcpStream>> {
    send_response(writer, preliminary).await?;

    let Some(channel) = session.data_channel.as_ref() else {
        let e = DataChannelError::NotOpen;
        error!("Transfer requested by {}: {}", session.client_addr, e);
        send_response(writer, e.to_ftp_response().as_bytes()).await?;
        return Ok(None);
    };

    match channel.accept(config.ftp.data_accept_timeout()).await {
        Ok(stream) => Ok(Some(stream)),
        Err(e) => {
            error!("Accept failed: {}", e);
            send_response(writer, e.to_ftp_response().as_bytes()).await?;
            Ok(None)
        }
    }
}

/// Closes the data connection and reports how the transfer ended.
pub async fn finish_transfer(
    writer: &ControlWriter,
    mut data_stream: TcpStream,
    outcome: io::Result<u64>,
) -> io::Result<()> {
    if let Err(e) = data_stream.shutdown().await {
        // The peer may already be gone; the outcome below decides the reply.
        info!("Data stream shutdown: {}", e);
    }
    drop(data_stream);

    match outcome {
        Ok(bytes) => {
            info!("Transfer complete ({} bytes)", bytes);
            send_response(writer, b"226 Transfer complete\r\n").await
        }
        Err(e) => {
            error!("Transfer aborted: {}", e);
            send_response(writer, b"426 Connection closed; transfer aborted\r\n").await
        }
    }
}
