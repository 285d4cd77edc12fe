//! PTY session for the target program
//!
//! Owns the child process, the PTY master, and the raw output buffer. Reads
//! are time-boxed with `poll(2)` so a single thread can pace the session.

use anyhow::{anyhow, Context, Result};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{self, Read, Write};
use std::os::fd::{BorrowedFd, RawFd};
use std::thread;
use std::time::{Duration, Instant};

use super::progress::ProgressSink;
use super::types::SessionConfig;
use crate::error::CaptureError;

/// Check that a pseudo-terminal can be opened on this host
pub fn probe_pty() -> Result<(), CaptureError> {
    native_pty_system()
        .openpty(PtySize {
            rows: 1,
            cols: 1,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map(drop)
        .map_err(|e| CaptureError::DependencyMissing {
            reason: format!("{:#}", e),
        })
}

/// A child process attached to a pseudo-terminal
pub struct PtySession {
    child: Box<dyn Child + Send + Sync>,
    // Held so the master fd stays open while we poll it
    _master: Box<dyn MasterPty + Send>,
    master_fd: RawFd,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    read_chunk: usize,
    captured: Vec<u8>,
    eof: bool,
    exited: bool,
}

impl PtySession {
    /// Spawn the configured program on a fresh PTY of the configured size
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        cmd.env("TERM", "xterm-256color");
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn {}", config.program))?;
        // Only the child holds the slave now, so its exit shows up as hang-up
        drop(pair.slave);

        tracing::debug!(
            "Spawned {} with PID {:?} on a {}x{} PTY",
            config.program,
            child.process_id(),
            config.cols,
            config.rows
        );

        let master_fd = pair
            .master
            .as_raw_fd()
            .ok_or_else(|| anyhow!("PTY master has no file descriptor"))?;
        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to clone PTY reader")?;
        let writer = pair
            .master
            .take_writer()
            .context("Failed to take PTY writer")?;

        Ok(Self {
            child,
            _master: pair.master,
            master_fd,
            reader,
            writer,
            read_chunk: config.read_chunk.max(1),
            captured: Vec::new(),
            eof: false,
            exited: false,
        })
    }

    /// Process ID of the child, if known
    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Whether end-of-output has been observed
    pub fn eof_reached(&self) -> bool {
        self.eof
    }

    /// Raw bytes read so far
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Write bytes to the child. A hung-up terminal marks EOF instead of failing.
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let result = self
            .writer
            .write_all(bytes)
            .and_then(|()| self.writer.flush());
        match result {
            Err(e) if is_hangup(&e) => {
                tracing::debug!("PTY hung up while writing {} bytes", bytes.len());
                self.eof = true;
                Ok(())
            }
            other => other,
        }
    }

    /// Read whatever the child produces for `duration`.
    ///
    /// Each attempt waits at most `read_timeout`. Returns `true` as soon as
    /// end-of-output is seen, `false` when the window elapses first.
    pub fn drain(
        &mut self,
        duration: Duration,
        read_timeout: Duration,
        progress: &mut dyn ProgressSink,
    ) -> io::Result<bool> {
        if self.eof {
            return Ok(true);
        }

        let end = Instant::now() + duration;
        let mut buf = vec![0u8; self.read_chunk];

        loop {
            let now = Instant::now();
            if now >= end {
                return Ok(false);
            }
            if !self.poll_readable(read_timeout.min(end - now))? {
                continue;
            }

            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(true);
                }
                Ok(n) => {
                    self.captured.extend_from_slice(&buf[..n]);
                    if progress.wants_raw_output() {
                        progress.raw_output(&buf[..n]);
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                    ) => {}
                Err(e) if is_hangup(&e) => {
                    self.eof = true;
                    return Ok(true);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Give the child `grace` to exit on its own, then kill it
    pub fn finish(&mut self, grace: Duration) {
        match self.wait_timeout(grace) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Child still running after {:?}, killing it", grace);
                self.force_kill();
            }
            Err(e) => {
                tracing::debug!("Failed to wait for child: {}", e);
                self.force_kill();
            }
        }
    }

    /// Terminate the child immediately. Safe to call more than once.
    pub fn force_kill(&mut self) {
        if self.exited {
            return;
        }

        if let Err(e) = self.child.kill() {
            tracing::debug!("Failed to kill child: {}", e);
            if let Some(pid) = self.pid() {
                let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            }
        }

        match self.wait_timeout(Duration::from_millis(100)) {
            Ok(true) => {}
            _ => tracing::debug!("Child did not report exit after kill"),
        }
    }

    /// Poll the child until it exits or `timeout` passes
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                tracing::debug!("Child exited with code {}", status.exit_code());
                self.exited = true;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Wait until the master has data (or hang-up) for at most `timeout`
    fn poll_readable(&self, timeout: Duration) -> io::Result<bool> {
        // SAFETY: master_fd belongs to `_master`, which lives as long as `self`
        let fd = unsafe { BorrowedFd::borrow_raw(self.master_fd) };
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);

        match poll(&mut fds, millis) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(Errno::EINTR) => Ok(false),
            Err(e) => Err(io::Error::from(e)),
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.force_kill();
    }
}

/// Linux reports a closed slave side as EIO on the master
fn is_hangup(err: &io::Error) -> bool {
    err.raw_os_error() == Some(Errno::EIO as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::progress::RecordingProgress;

    fn sh(script: &str) -> SessionConfig {
        SessionConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_probe_pty() {
        assert!(probe_pty().is_ok());
    }

    #[test]
    fn test_fixed_window_size() {
        let mut session = PtySession::spawn(&sh("stty size")).expect("spawn sh");
        let mut progress = RecordingProgress::default();
        let eof = session
            .drain(Duration::from_secs(5), Duration::from_millis(200), &mut progress)
            .expect("drain");

        assert!(eof);
        let text = String::from_utf8_lossy(session.captured());
        assert!(text.contains("40 160"), "unexpected output: {:?}", text);
    }

    #[test]
    fn test_drain_times_out_on_idle_child() {
        let mut session = PtySession::spawn(&SessionConfig {
            program: "cat".to_string(),
            ..Default::default()
        })
        .expect("spawn cat");
        let mut progress = RecordingProgress::default();

        let started = Instant::now();
        let eof = session
            .drain(Duration::from_millis(300), Duration::from_millis(50), &mut progress)
            .expect("drain");

        assert!(!eof);
        assert!(started.elapsed() >= Duration::from_millis(300));
        session.force_kill();
        session.force_kill();
    }

    #[test]
    fn test_drain_mirrors_raw_output() {
        let mut session = PtySession::spawn(&sh("printf 'mirrored'")).expect("spawn sh");
        let mut progress = RecordingProgress {
            capture_raw: true,
            ..Default::default()
        };
        session
            .drain(Duration::from_secs(5), Duration::from_millis(200), &mut progress)
            .expect("drain");

        assert_eq!(progress.raw, session.captured());
        assert!(String::from_utf8_lossy(&progress.raw).contains("mirrored"));
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let result = PtySession::spawn(&SessionConfig {
            program: "ctxcap-no-such-program".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
