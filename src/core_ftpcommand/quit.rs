use crate::config::Config;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the QUIT FTP command.
///
/// Replies, then tells the control loop to close the connection.
pub async fn handle_quit_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _arg: String,
) -> HandlerResult {
    info!("Received QUIT command. Closing connection.");
    send_response(&writer, b"221 Goodbye\r\n").await?;
    Ok(SessionFlow::Terminate)
}
