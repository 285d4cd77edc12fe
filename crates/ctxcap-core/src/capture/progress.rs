//! Progress narration for a capture run.

use std::io::Write;

/// Receives narration and raw output while a capture runs
pub trait ProgressSink {
    /// A human-readable step ("Sending command: /context")
    fn step(&mut self, message: &str);

    /// A chunk of raw PTY output, as read
    fn raw_output(&mut self, _chunk: &[u8]) {}

    /// Whether raw output should be forwarded to `raw_output` at all
    fn wants_raw_output(&self) -> bool {
        false
    }
}

/// Narrates to stdout unless silenced, optionally echoing raw output live
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress {
    silent: bool,
    echo_raw: bool,
}

impl ConsoleProgress {
    /// Create a console sink. Raw echo is never enabled in silent mode.
    pub fn new(silent: bool, echo_raw: bool) -> Self {
        Self {
            silent,
            echo_raw: echo_raw && !silent,
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn step(&mut self, message: &str) {
        tracing::debug!("{}", message);
        if !self.silent {
            println!("{}", message);
        }
    }

    fn raw_output(&mut self, chunk: &[u8]) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(chunk);
        let _ = stdout.flush();
    }

    fn wants_raw_output(&self) -> bool {
        self.echo_raw
    }
}

/// Collects narration in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    /// Steps in the order they were reported
    pub steps: Vec<String>,
    /// Concatenated raw output
    pub raw: Vec<u8>,
    /// Forward raw output into `raw`
    pub capture_raw: bool,
}

#[cfg(test)]
impl ProgressSink for RecordingProgress {
    fn step(&mut self, message: &str) {
        self.steps.push(message.to_string());
    }

    fn raw_output(&mut self, chunk: &[u8]) {
        self.raw.extend_from_slice(chunk);
    }

    fn wants_raw_output(&self) -> bool {
        self.capture_raw
    }
}
