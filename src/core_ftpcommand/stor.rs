use crate::config::Config;
use crate::core_fs::path::join_path;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::core_ftpcommand::utils::{finish_transfer, open_data_connection};
use crate::core_network::transfer::receive_file;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the STOR (Store File) FTP command.
///
/// Everything the data peer sends until it closes is written to the named
/// file in the working directory, which is created or truncated (mode 0644).
pub async fn handle_stor_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> HandlerResult {
    if arg.is_empty() {
        warn!("STOR command received with no arguments");
        send_response(&writer, b"501 Syntax error in parameters or arguments\r\n").await?;
        return Ok(SessionFlow::Continue);
    }

    let session = session.lock().await;
    let Some(mut data_stream) = open_data_connection(
        &writer,
        &config,
        &session,
        b"150 Opening BINARY mode data connection\r\n",
    )
    .await?
    else {
        return Ok(SessionFlow::Continue);
    };

    let file_path = join_path(&session.current_dir, &arg);
    info!("Receiving file: {:?}", file_path);
    let outcome = receive_file(&file_path, &mut data_stream, config.ftp.buffer_size()).await;

    finish_transfer(&writer, data_stream, outcome).await?;
    Ok(SessionFlow::Continue)
}
