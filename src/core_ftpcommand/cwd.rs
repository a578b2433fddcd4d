use crate::config::Config;
use crate::core_fs::path::resolve_directory;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CWD FTP command.
///
/// The working directory only moves when the target resolves to an
/// accessible directory; otherwise the session keeps its previous one.
pub async fn handle_cwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    arg: String,
) -> HandlerResult {
    if arg.is_empty() {
        warn!("CWD command received with no arguments");
        send_response(&writer, b"501 Syntax error in parameters or arguments\r\n").await?;
        return Ok(SessionFlow::Continue);
    }

    let mut session = session.lock().await;
    match resolve_directory(&session.current_dir, &arg).await {
        Ok(resolved) => {
            info!("Current working dir: {}", resolved.display());
            session.current_dir = resolved;
            send_response(&writer, b"250 Directory successfully changed\r\n").await?;
        }
        Err(e) => {
            warn!("Failed to change directory: {}", e);
            send_response(&writer, e.to_ftp_response().as_bytes()).await?;
        }
    }

    Ok(SessionFlow::Continue)
}
