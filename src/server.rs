use crate::config::Config;
use crate::constants::{FTP_LISTEN_BACKLOG, SHELL_LISTEN_BACKLOG};
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::handlers::CommandTable;
use crate::core_network::network::{self, bind_listener};
use crate::core_shell;
use crate::helpers::resolve_pasv_address;
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Runs the FTP service until Ctrl-C.
///
/// Control sessions are served strictly one at a time from a shared,
/// read-only command table.
pub async fn run_ftp(mut config: Config) -> Result<()> {
    let pasv_address = resolve_pasv_address(config.ftp.pasv_address.as_deref())
        .context("No passive mode address configured and none could be detected")?;
    config.ftp.pasv_address = Some(pasv_address);

    let start_dir = session_start_dir(&config)?;
    info!("Starting FTP server with config: {:?}", config);
    info!("Sessions start in {}", start_dir.display());

    let listener = bind_listener(config.ftp.listen_port, FTP_LISTEN_BACKLOG)
        .with_context(|| format!("Failed to bind to port {}", config.ftp.listen_port))?;
    info!("FTP server listening on port {}", config.ftp.listen_port);

    let commands = Arc::new(CommandTable::new());
    debug!("Registered commands: {:?}", FtpCommand::all());
    tokio::select! {
        result = network::serve_sessions(listener, Arc::new(config), commands, start_dir) => {
            if let Err(e) = &result {
                error!("FTP server stopped: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down FTP server");
            Ok(())
        }
    }
}

/// Runs the terminal relay service until Ctrl-C.
pub async fn run_shell(config: Config) -> Result<()> {
    info!("Starting shell server with config: {:?}", config);

    let listener = bind_listener(config.shell.listen_port, SHELL_LISTEN_BACKLOG)
        .with_context(|| format!("Failed to bind to port {}", config.shell.listen_port))?;
    info!(
        "Shell server listening on port {}, running {}",
        config.shell.listen_port, config.shell.command
    );

    tokio::select! {
        result = core_shell::network::serve_clients(listener, Arc::new(config)) => {
            if let Err(e) = &result {
                error!("Shell server stopped: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down shell server");
            Ok(())
        }
    }
}

/// The configured root directory, or the working directory at startup.
fn session_start_dir(config: &Config) -> Result<PathBuf> {
    let dir = match &config.ftp.root_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read the working directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("Invalid root directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_start_dir_from_config() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.ftp.root_dir = Some(dir.path().to_path_buf());
        assert_eq!(
            session_start_dir(&config).unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_start_dir_defaults_to_cwd() {
        let config = Config::default();
        assert_eq!(
            session_start_dir(&config).unwrap(),
            std::env::current_dir().unwrap().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_missing_root_dir_is_an_error() {
        let mut config = Config::default();
        config.ftp.root_dir = Some(PathBuf::from("/nonexistent/minisessiond-root"));
        assert!(session_start_dir(&config).is_err());
    }

    #[tokio::test]
    async fn test_non_ipv4_pasv_address_does_not_stop_startup() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.ftp.listen_port = 0;
        config.ftp.root_dir = Some(dir.path().to_path_buf());
        config.ftp.pasv_address = Some("not-an-ip".to_string());

        // Still serving when the timeout fires.
        let running = tokio::time::timeout(Duration::from_millis(300), run_ftp(config)).await;
        assert!(running.is_err(), "{:?}", running);
    }
}
