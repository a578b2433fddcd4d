use crate::config::Config;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASS FTP command.
///
/// Every password is accepted without checking.
///
/// # Arguments
///
/// * `writer` - Control connection write half.
/// * `_password` - The password sent by the client, ignored.
///
/// # Returns
///
/// `SessionFlow::Continue` once the 230 reply is sent.
pub async fn handle_pass_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _password: String,
) -> HandlerResult {
    send_response(&writer, b"230 User logged in\r\n").await?;
    Ok(SessionFlow::Continue)
}
