use crate::config::Config;
use crate::core_fs::path::join_path;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::core_ftpcommand::utils::{finish_transfer, open_data_connection};
use crate::core_network::transfer::send_file;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is looked up in the working directory and streamed to the data
/// peer. A file that cannot be opened produces an empty transfer that is
/// still reported as complete.
pub async fn handle_retr_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> HandlerResult {
    if arg.is_empty() {
        warn!("RETR command received with no arguments");
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
    info!("Sending file: {:?}", file_path);
    let outcome = send_file(&file_path, &mut data_stream, config.ftp.buffer_size()).await;

    finish_transfer(&writer, data_stream, outcome).await?;
    Ok(SessionFlow::Continue)
}
