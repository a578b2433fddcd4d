// src/constants.rs

/// Chunk size for file transfers and terminal relaying.
pub const BUFFER_SIZE: usize = 1024;
/// Longest path a CWD argument may expand to.
pub const MAX_PATH: usize = 512;

pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_SHELL_PORT: u16 = 12345;
pub const DEFAULT_SHELL_COMMAND: &str = "/bin/sh";

pub const FTP_LISTEN_BACKLOG: u32 = 5;
pub const SHELL_LISTEN_BACKLOG: u32 = 10;
pub const DATA_LISTEN_BACKLOG: u32 = 1;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/minisessiond.conf";
