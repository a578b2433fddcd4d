use crate::config::Config;
use crate::core_shell::pty::PtySession;
use crate::core_shell::relay::{relay, RelayEnd};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// Accepts shell clients and runs each one on its own task.
///
/// Sessions are detached: the accept loop never waits for them, and a failed
/// session does not affect the others.
pub async fn serve_clients(listener: TcpListener, config: Arc<Config>) -> Result<()> {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Accept failed: {}", e);
                continue;
            }
        };
        info!("New shell client connected from {}", addr);

        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, config).await {
                error!("Shell session for {} failed: {:?}", addr, e);
            }
            info!("Client {} disconnected", addr);
        });
    }
}

/// Gives one client a fresh terminal running the configured command and
/// relays until either side closes.
pub async fn handle_client(mut socket: TcpStream, config: Arc<Config>) -> Result<()> {
    let session = PtySession::spawn(&config.shell)
        .with_context(|| format!("Failed to start {}", config.shell.command))?;
    debug!("Shell pid {:?} attached", session.pid());

    let outcome = relay(&mut socket, session.master(), config.shell.buffer_size()).await;
    match &outcome {
        Ok(RelayEnd::ClientClosed) => debug!("Client closed the connection"),
        Ok(RelayEnd::TerminalClosed) => debug!("Shell exited"),
        Err(e) => warn!("Relay stopped: {}", e),
    }

    // Master first, then the child, then the client.
    if let Err(e) = session.terminate().await {
        warn!("Failed to reap shell: {}", e);
    }
    if let Err(e) = socket.shutdown().await {
        debug!("Client shutdown: {}", e);
    }

    outcome.map(|_| ()).context("Relay error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use crate::constants::SHELL_LISTEN_BACKLOG;
    use crate::core_network::network::bind_listener;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    async fn start_server(shell: ShellConfig) -> u16 {
        let listener = bind_listener(0, SHELL_LISTEN_BACKLOG).unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = Arc::new(Config {
            shell,
            ..Config::default()
        });
        tokio::spawn(serve_clients(listener, config));
        port
    }

    fn pty_available() -> bool {
        nix::pty::openpty(None::<&nix::pty::Winsize>, None::<&nix::sys::termios::Termios>).is_ok()
    }

    async fn read_until(stream: &mut TcpStream, needle: &str, occurrences: usize) -> String {
        let mut output = Vec::new();
        let mut buf = [0u8; 1024];
        let read = async {
            while String::from_utf8_lossy(&output).matches(needle).count() < occurrences {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                output.extend_from_slice(&buf[..n]);
            }
        };
        let _ = tokio::time::timeout(Duration::from_secs(10), read).await;
        String::from_utf8_lossy(&output).into_owned()
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        if !pty_available() {
            eprintln!("No pseudo-terminals available, skipping");
            return;
        }
        let port = start_server(ShellConfig {
            command: "/bin/sh".to_string(),
            ..ShellConfig::default()
        })
        .await;

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(b"echo hi\n").await.unwrap();

        // Once as terminal echo of the typed line, once as command output.
        let output = read_until(&mut client, "hi\r\n", 2).await;
        assert!(output.matches("hi\r\n").count() >= 2, "{:?}", output);
    }

    #[tokio::test]
    async fn test_shell_exit_closes_client() {
        if !pty_available() {
            eprintln!("No pseudo-terminals available, skipping");
            return;
        }
        let port = start_server(ShellConfig {
            command: "/bin/sh".to_string(),
            ..ShellConfig::default()
        })
        .await;

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(b"exit\n").await.unwrap();

        let mut rest = Vec::new();
        let closed = tokio::time::timeout(Duration::from_secs(10), client.read_to_end(&mut rest)).await;
        assert!(closed.is_ok(), "server kept the connection open");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        if !pty_available() {
            eprintln!("No pseudo-terminals available, skipping");
            return;
        }
        let port = start_server(ShellConfig {
            command: "/bin/sh".to_string(),
            ..ShellConfig::default()
        })
        .await;

        let mut first = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut second = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        second.write_all(b"echo second-$((1 + 1))\n").await.unwrap();
        let output = read_until(&mut second, "second-2", 1).await;
        assert!(output.contains("second-2"), "{:?}", output);

        first.write_all(b"echo first-$((2 + 2))\n").await.unwrap();
        let output = read_until(&mut first, "first-4", 1).await;
        assert!(output.contains("first-4"), "{:?}", output);
    }

    #[tokio::test]
    async fn test_failed_spawn_drops_client() {
        let port = start_server(ShellConfig {
            command: "/nonexistent/shell".to_string(),
            ..ShellConfig::default()
        })
        .await;

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut rest = Vec::new();
        let closed = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest)).await;
        assert!(closed.is_ok());
        assert!(rest.is_empty());

        // The accept loop is still serving.
        TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    }
}
