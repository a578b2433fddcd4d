use crate::config::Config;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the TYPE FTP command.
///
/// Transfers are always binary, so every type is acknowledged as image.
pub async fn handle_type_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    arg: String,
) -> HandlerResult {
    debug!("TYPE {} requested", arg);
    send_response(&writer, b"200 Type set to I\r\n").await?;
    Ok(SessionFlow::Continue)
}
