// src/core_ftpcommand/pwd.rs
use crate::config::Config;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PWD FTP command.
///
/// Reports the session's working directory as an absolute path.
pub async fn handle_pwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _arg: String,
) -> HandlerResult {
    let current_dir = session.lock().await.current_dir.clone();
    let response = format!("257 \"{}\" is the current directory\r\n", current_dir.display());

    send_response(&writer, response.as_bytes()).await?;
    Ok(SessionFlow::Continue)
}
