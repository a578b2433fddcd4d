//! Pseudo-terminal allocation and the child process attached to it.
//!
//! The master end is non-blocking and registered with tokio through
//! `AsyncFd`, so reads and writes wait on reactor readiness instead of
//! polling.

use crate::config::ShellConfig;
use crate::core_shell::error::PtyError;
use log::{debug, info, warn};
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::pty::{openpty, Winsize};
use nix::sys::termios::Termios;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{setsid, Pid};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tokio::process::{Child, Command};

/// How long a hung-up child gets before it is killed outright.
const HANGUP_GRACE: Duration = Duration::from_secs(5);

/// Controlling end of the terminal, as seen by the session.
pub struct PtyMaster {
    fd: AsyncFd<File>,
}

impl PtyMaster {
    fn new(master: OwnedFd) -> Result<Self, PtyError> {
        set_nonblocking(master.as_raw_fd())?;
        let fd = AsyncFd::new(File::from(master)).map_err(PtyError::Register)?;
        Ok(Self { fd })
    }

    /// Reads what the child wrote to its terminal.
    ///
    /// Returns 0 once the subordinate side is gone; Linux reports that as
    /// `EIO` rather than end of file.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;

            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(Ok(n)) => return Ok(n),
                Ok(Err(e)) if e.raw_os_error() == Some(libc::EIO) => {
                    debug!("PTY read returned EIO (child side closed)");
                    return Ok(0);
                }
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
    }

    /// Feeds bytes to the child's terminal input.
    pub async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        let mut remaining = data;
        while !remaining.is_empty() {
            let mut guard = self.fd.writable().await?;

            match guard.try_io(|inner| inner.get_ref().write(remaining)) {
                Ok(Ok(0)) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(Ok(n)) => remaining = &remaining[n..],
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
        Ok(())
    }
}

/// A terminal master paired with the child running on its subordinate end.
///
/// Both halves are created together by [`PtySession::spawn`] and released
/// together by [`PtySession::terminate`].
pub struct PtySession {
    master: PtyMaster,
    child: Child,
}

impl PtySession {
    /// Opens a terminal pair and starts `config.command` on it as the leader
    /// of a new session, with the terminal as stdin, stdout, stderr and
    /// controlling terminal.
    pub fn spawn(config: &ShellConfig) -> Result<Self, PtyError> {
        let winsize = Winsize {
            ws_row: config.rows,
            ws_col: config.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pty = openpty(&winsize, None::<&Termios>).map_err(PtyError::Open)?;

        // Keep both ends out of children spawned by other sessions.
        set_cloexec(pty.master.as_raw_fd())?;
        set_cloexec(pty.slave.as_raw_fd())?;
        let master = PtyMaster::new(pty.master)?;

        let spawn_error = |source: io::Error| PtyError::Spawn {
            command: config.command.clone(),
            source,
        };
        let stdin = pty.slave.try_clone().map_err(spawn_error)?;
        let stdout = pty.slave.try_clone().map_err(spawn_error)?;

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(pty.slave))
            .kill_on_drop(true);
        if std::env::var_os("TERM").is_none() {
            command.env("TERM", "xterm-256color");
        }

        // SAFETY: only async-signal-safe calls run between fork and exec.
        unsafe {
            command.pre_exec(|| {
                setsid()?;
                if libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY as _, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = command.spawn().map_err(spawn_error)?;
        // The command still owns our copies of the subordinate end; closing
        // them lets the master see EIO when the child exits.
        drop(command);

        info!("Spawned {} (pid {:?})", config.command, child.id());
        Ok(Self { master, child })
    }

    pub fn master(&self) -> &PtyMaster {
        &self.master
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Closes the master, hangs up the child and reaps it.
    pub async fn terminate(self) -> io::Result<()> {
        let PtySession { master, mut child } = self;
        drop(master);

        if child.try_wait()?.is_none() {
            if let Some(pid) = child.id() {
                if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGHUP) {
                    debug!("SIGHUP to {} failed: {}", pid, e);
                }
            }
        }

        match tokio::time::timeout(HANGUP_GRACE, child.wait()).await {
            Ok(status) => {
                debug!("Child exited: {:?}", status?);
            }
            Err(_) => {
                warn!("Child {:?} ignored hangup, killing it", child.id());
                child.kill().await?;
            }
        }
        Ok(())
    }
}

fn set_nonblocking(fd: RawFd) -> Result<(), PtyError> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(PtyError::Setup)?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(PtyError::Setup)?;
    Ok(())
}

fn set_cloexec(fd: RawFd) -> Result<(), PtyError> {
    fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(PtyError::Setup)?;
    Ok(())
}
