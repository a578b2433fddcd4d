use crate::config::Config;
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "minisessiond",
    about = "A passive-mode FTP server and a terminal relay."
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Serve FTP control sessions one at a time
    Ftp {
        /// Control port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address reported in PASV replies
        #[arg(short, long)]
        address: Option<Ipv4Addr>,
    },
    /// Give every client its own terminal running a command
    Shell {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Program started on each terminal
        #[arg(long)]
        command: Option<String>,
    },
}

impl Mode {
    /// Applies the options given on the command line over the loaded file.
    pub fn apply_overrides(&self, config: &mut Config) {
        match self {
            Mode::Ftp { port, address } => {
                if let Some(port) = port {
                    config.ftp.listen_port = *port;
                }
                if let Some(address) = address {
                    config.ftp.pasv_address = Some(address.to_string());
                }
            }
            Mode::Shell { port, command } => {
                if let Some(port) = port {
                    config.shell.listen_port = *port;
                }
                if let Some(command) = command {
                    config.shell.command = command.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftp_arguments() {
        let cli = Cli::try_parse_from(["minisessiond", "-v", "ftp", "-p", "2121", "-a", "192.0.2.1"])
            .unwrap();
        assert!(cli.verbose);
        assert!(cli.config.is_none());

        let mut config = Config::default();
        cli.mode.apply_overrides(&mut config);
        assert_eq!(config.ftp.listen_port, 2121);
        assert_eq!(config.ftp.pasv_address.as_deref(), Some("192.0.2.1"));
        assert_eq!(config.shell.listen_port, 12345);
    }

    #[test]
    fn test_shell_arguments() {
        let cli = Cli::try_parse_from([
            "minisessiond",
            "shell",
            "--command",
            "/bin/bash",
            "-c",
            "/tmp/minisessiond.conf",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/minisessiond.conf")));

        let mut config = Config::default();
        cli.mode.apply_overrides(&mut config);
        assert_eq!(config.shell.command, "/bin/bash");
        assert_eq!(config.shell.listen_port, 12345);
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["minisessiond", "ftp"]).unwrap();
        let mut config = Config::default();
        cli.mode.apply_overrides(&mut config);
        assert_eq!(config.ftp.listen_port, 21);
        assert!(config.ftp.pasv_address.is_none());
    }

    #[test]
    fn test_mode_is_required() {
        assert!(Cli::try_parse_from(["minisessiond"]).is_err());
        assert!(Cli::try_parse_from(["minisessiond", "ftp", "-a", "not-an-ip"]).is_err());
    }
}
