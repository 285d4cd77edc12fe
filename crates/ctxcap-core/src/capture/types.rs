//! Configuration and result types for a capture run.

use std::time::Duration;

/// Program and terminal geometry for the spawned session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Program to run (resolved through `PATH`)
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// PTY rows
    pub rows: u16,
    /// PTY columns
    pub cols: u16,
    /// Maximum bytes taken per read
    pub read_chunk: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            args: Vec::new(),
            rows: 40,
            cols: 160,
            read_chunk: 4096,
        }
    }
}

/// Fixed delays used to pace the interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait for the startup banner before typing
    pub startup_wait: Duration,
    /// Pause between typing the command and pressing Enter
    pub submit_delay: Duration,
    /// Drain window after Escape
    pub dismiss_drain: Duration,
    /// Drain window after the exit command
    pub exit_drain: Duration,
    /// Upper bound on a single read attempt
    pub read_timeout: Duration,
    /// How long the child gets to exit on its own before it is killed
    pub exit_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            startup_wait: Duration::from_secs(2),
            submit_delay: Duration::from_millis(500),
            dismiss_drain: Duration::from_secs(1),
            exit_drain: Duration::from_secs(1),
            read_timeout: Duration::from_millis(200),
            exit_grace: Duration::from_secs(5),
        }
    }
}

/// Everything needed for one capture run
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Slash command typed into the session
    pub command: String,
    /// Command that ends the session
    pub exit_command: String,
    /// Session to spawn
    pub session: SessionConfig,
    /// Deadline for the whole drive sequence
    pub timeout: Duration,
    /// Drain window after the command is submitted
    pub wait: Duration,
    /// Pacing delays
    pub timings: Timings,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            command: "/context".to_string(),
            exit_command: "/exit".to_string(),
            session: SessionConfig::default(),
            timeout: Duration::from_secs(30),
            wait: Duration::from_secs(5),
            timings: Timings::default(),
        }
    }
}

/// Output of a finished capture run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutput {
    /// Sanitized output, or the raw output when sanitizing leaves nothing
    pub text: String,
    /// Number of raw bytes read from the PTY
    pub raw_len: usize,
    /// Whether the child closed its side before the sequence ended
    pub eof_reached: bool,
}

impl CaptureOutput {
    /// Whether anything was captured at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
