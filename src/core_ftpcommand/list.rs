use crate::config::Config;
use crate::core_fs::lister::list_details;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::core_ftpcommand::utils::{finish_transfer, open_data_connection};
use crate::helpers::ControlWriter;
use crate::session::Session;
use log::error;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Handles the LIST FTP command.
///
/// Streams one attribute line per entry of the working directory. An
/// unreadable directory yields an empty listing, still followed by 226.
pub async fn handle_list_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> HandlerResult {
    let session = session.lock().await;
    let Some(mut data_stream) = open_data_connection(
        &writer,
        &config,
        &session,
        b"150 Opening ASCII mode data connection for file list\r\n",
    )
    .await?
    else {
        return Ok(SessionFlow::Continue);
    };

    let lines = list_details(&session.current_dir).await.unwrap_or_else(|e| {
        error!("Unable to open directory {:?}: {}", session.current_dir, e);
        Vec::new()
    });

    let mut listing = String::new();
    for line in lines {
        listing.push_str(&line);
        listing.push_str("\r\n");
    }
    let outcome = data_stream
        .write_all(listing.as_bytes())
        .await
        .map(|_| listing.len() as u64);

    finish_transfer(&writer, data_stream, outcome).await?;
    Ok(SessionFlow::Continue)
}
