//! Capture of slash command output from an interactive Claude Code session.
//!
//! Claude Code has no machine-readable ready signal, so the driver paces the
//! session with fixed delays and time-boxed reads on a pseudo-terminal.

pub mod driver;
pub mod progress;
pub mod session;
pub mod types;

pub use driver::capture_slash_command;
pub use progress::{ConsoleProgress, ProgressSink};
pub use session::{probe_pty, PtySession};
pub use types::{CaptureOptions, CaptureOutput, SessionConfig, Timings};
