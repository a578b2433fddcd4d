use crate::constants::{BUFFER_SIZE, DEFAULT_FTP_PORT, DEFAULT_SHELL_COMMAND, DEFAULT_SHELL_PORT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FtpConfig {
    pub listen_port: u16,
    pub pasv_address: Option<String>, // Reported in PASV replies, auto-detected when unset
    pub root_dir: Option<PathBuf>,    // Starting directory of every session
    pub transfer_buffer_size: Option<usize>,
    pub data_accept_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    pub listen_port: u16,
    pub command: String,
    pub args: Vec<String>,
    pub buffer_size: Option<usize>,
    pub rows: u16,
    pub cols: u16,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ftp: FtpConfig,
    pub shell: ShellConfig,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_FTP_PORT,
            pasv_address: None,
            root_dir: None,
            transfer_buffer_size: Some(BUFFER_SIZE),
            data_accept_timeout_secs: None,
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_SHELL_PORT,
            command: String::from(DEFAULT_SHELL_COMMAND),
            args: Vec::new(),
            buffer_size: Some(BUFFER_SIZE),
            rows: 24,
            cols: 80,
        }
    }
}

impl FtpConfig {
    pub fn buffer_size(&self) -> usize {
        self.transfer_buffer_size
            .filter(|size| *size > 0)
            .unwrap_or(BUFFER_SIZE)
    }

    pub fn data_accept_timeout(&self) -> Option<Duration> {
        self.data_accept_timeout_secs.map(Duration::from_secs)
    }
}

impl ShellConfig {
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.filter(|size| *size > 0).unwrap_or(BUFFER_SIZE)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    /// Loads the file named on the command line, or the default file when it
    /// exists, falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None if default_path.is_file() => Self::load_from_file(default_path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ftp.listen_port, 21);
        assert_eq!(config.shell.listen_port, 12345);
        assert_eq!(config.shell.command, "/bin/sh");
        assert_eq!(config.ftp.buffer_size(), 1024);
        assert!(config.ftp.data_accept_timeout().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [ftp]
            listen_port = 2121
            pasv_address = "10.0.0.5"
            data_accept_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.ftp.listen_port, 2121);
        assert_eq!(config.ftp.pasv_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.ftp.data_accept_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.ftp.buffer_size(), 1024);
        assert_eq!(config.shell.listen_port, 12345);
    }

    #[test]
    fn test_zero_buffer_size_falls_back() {
        let config = Config::from_toml("[shell]\nbuffer_size = 0\n").unwrap();
        assert_eq!(config.shell.buffer_size(), 1024);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[shell]").unwrap();
        writeln!(file, "command = \"/bin/bash\"").unwrap();
        writeln!(file, "args = [\"-i\"]").unwrap();

        let config = Config::load(Some(file.path()), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.shell.command, "/bin/bash");
        assert_eq!(config.shell.args, vec!["-i".to_string()]);
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let config = Config::load(None, Path::new("/nonexistent/minisessiond.conf")).unwrap();
        assert_eq!(config.ftp.listen_port, 21);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/x.conf")), Path::new("/x")).is_err());
    }
}
