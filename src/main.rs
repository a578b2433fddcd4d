mod config;
mod constants;
mod core_cli;
mod core_fs;
mod core_ftpcommand;
mod core_network;
mod core_shell;
mod helpers;
mod server;
mod session;

use crate::config::Config;
use crate::constants::DEFAULT_CONFIG_PATH;
use crate::core_cli::{Cli, Mode};
use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    let mut config = Config::load(args.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
    args.mode.apply_overrides(&mut config);

    match args.mode {
        Mode::Ftp { .. } => server::run_ftp(config).await,
        Mode::Shell { .. } => server::run_shell(config).await,
    }
}
