//! Drive a slash command through an interactive Claude Code session.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;

use super::progress::ProgressSink;
use super::session::PtySession;
use super::types::{CaptureOptions, CaptureOutput};
use crate::error::CaptureError;
use crate::sanitize::strip_ansi;

/// Escape closes whatever overlay the command opened
const DISMISS_KEY: &[u8] = b"\x1b";

/// Spawn the target program, run `options.command` in it, and capture the output.
///
/// 1. Waits for the startup banner
/// 2. Types the command, pauses, then presses Enter
/// 3. Drains output for `options.wait`
/// 4. Presses Escape and drains briefly
/// 5. Sends the exit command and drains briefly
/// 6. Gives the child time to exit, then kills it
///
/// Steps 1-5 must finish inside `options.timeout`, otherwise the child is
/// killed and [`CaptureError::Timeout`] carries what was read so far.
pub fn capture_slash_command(
    options: &CaptureOptions,
    progress: &mut dyn ProgressSink,
) -> Result<CaptureOutput, CaptureError> {
    progress.step(&format!(
        "Spawning {} to execute '{}'...\n",
        options.session.program, options.command
    ));

    let mut session = PtySession::spawn(&options.session)?;
    let deadline = Deadline::new(options.timeout);

    let eof_reached = match drive(&mut session, options, &deadline, progress) {
        Ok(eof) => eof,
        Err(err) => {
            tracing::debug!("Capture aborted: {}", err);
            session.force_kill();
            return Err(err);
        }
    };

    let raw = String::from_utf8_lossy(session.captured()).into_owned();
    if progress.wants_raw_output() {
        progress.step(&format!("\nRaw captured output length: {}", raw.len()));
    }
    tracing::debug!(
        "Captured {} bytes (eof: {})",
        session.captured().len(),
        eof_reached
    );

    let cleaned = strip_ansi(&raw);
    session.finish(options.timings.exit_grace);

    Ok(CaptureOutput {
        raw_len: session.captured().len(),
        text: if cleaned.is_empty() { raw } else { cleaned },
        eof_reached,
    })
}

/// Run the key sequence. Returns whether end-of-output was seen.
fn drive(
    session: &mut PtySession,
    options: &CaptureOptions,
    deadline: &Deadline,
    progress: &mut dyn ProgressSink,
) -> Result<bool, CaptureError> {
    let timings = &options.timings;

    progress.step("Waiting for initial output...");
    pause(session, deadline, timings.startup_wait)?;

    progress.step(&format!("Sending command: {}", options.command));
    send(session, options.command.as_bytes())?;
    pause(session, deadline, timings.submit_delay)?;

    progress.step("Pressing Enter to execute command...");
    send(session, b"\r")?;

    progress.step(&format!(
        "Capturing output for {} seconds...",
        options.wait.as_secs_f32()
    ));
    let mut eof = drain(session, deadline, options.wait, timings.read_timeout, progress)?;

    if !eof {
        progress.step("Pressing Escape to dismiss dialog...");
        send(session, DISMISS_KEY)?;
        eof = drain(session, deadline, timings.dismiss_drain, timings.read_timeout, progress)?;
    }

    if !eof {
        progress.step(&format!(
            "Sending {} to terminate session...",
            options.exit_command
        ));
        send(session, format!("{}\n", options.exit_command).as_bytes())?;
        eof = drain(session, deadline, timings.exit_drain, timings.read_timeout, progress)?;
    }

    Ok(eof)
}

/// Sleep for `duration`, or until the deadline if that comes first
fn pause(
    session: &PtySession,
    deadline: &Deadline,
    duration: Duration,
) -> Result<(), CaptureError> {
    let (duration, cut_short) = deadline.clamp(duration);
    thread::sleep(duration);
    if cut_short {
        return Err(deadline.timeout_error(session));
    }
    Ok(())
}

fn send(session: &mut PtySession, bytes: &[u8]) -> Result<(), CaptureError> {
    if session.eof_reached() {
        tracing::debug!(
            "Child already closed the terminal, skipping {} bytes",
            bytes.len()
        );
        return Ok(());
    }
    session.send(bytes).context("Failed to write to PTY")?;
    Ok(())
}

fn drain(
    session: &mut PtySession,
    deadline: &Deadline,
    window: Duration,
    read_timeout: Duration,
    progress: &mut dyn ProgressSink,
) -> Result<bool, CaptureError> {
    let (window, cut_short) = deadline.clamp(window);
    let eof = session
        .drain(window, read_timeout, progress)
        .context("Failed to read from PTY")?;
    if cut_short && !eof {
        return Err(deadline.timeout_error(session));
    }
    Ok(eof)
}

/// Overall deadline for the key sequence
struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    fn new(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + timeout,
        }
    }

    /// Shorten `window` to what is left. The flag is set when it was shortened.
    fn clamp(&self, window: Duration) -> (Duration, bool) {
        let remaining = self.at.saturating_duration_since(Instant::now());
        if window > remaining {
            (remaining, true)
        } else {
            (window, false)
        }
    }

    fn timeout_error(&self, session: &PtySession) -> CaptureError {
        CaptureError::Timeout {
            elapsed: self.started.elapsed(),
            buffer: String::from_utf8_lossy(session.captured()).into_owned(),
        }
    }
}
