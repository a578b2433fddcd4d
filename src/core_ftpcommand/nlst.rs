use crate::config::Config;
use crate::core_fs::lister::list_names;
use crate::core_ftpcommand::handlers::{HandlerResult, SessionFlow};
use crate::core_ftpcommand::utils::{finish_transfer, open_data_connection};
use crate::helpers::ControlWriter;
use crate::session::Session;
use log::error;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Handles the NLST FTP command: bare names over the data connection.
pub async fn handle_nlst_command(
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

    let names = list_names(&session.current_dir).await.unwrap_or_else(|e| {
        error!("Unable to open directory {:?}: {}", session.current_dir, e);
        Vec::new()
    });

    let mut outcome = Ok(0u64);
    for name in names {
        let line = format!("{}\r\n", name);
        if let Err(e) = data_stream.write_all(line.as_bytes()).await {
            outcome = Err(e);
            break;
        }
        outcome = outcome.map(|sent| sent + line.len() as u64);
    }

    finish_transfer(&writer, data_stream, outcome).await?;
    Ok(SessionFlow::Continue)
}
