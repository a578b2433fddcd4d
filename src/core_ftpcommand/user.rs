use crate::config::Config;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the USER FTP command.
///
/// Any name is accepted; no account state is kept.
pub async fn handle_user_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    username: String,
) -> HandlerResult {
    info!("Received USER command with username: {}", username);
    send_response(&writer, b"331 User name okay, need password\r\n").await?;
    Ok(SessionFlow::Continue)
}
