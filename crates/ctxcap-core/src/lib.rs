//! Core library for ctxcap.
//!
//! Spawns Claude Code on a pseudo-terminal, drives a slash command through it,
//! and turns the captured screen output into a context usage summary.

pub mod capture;
pub mod error;
pub mod sanitize;
pub mod summary;

pub use capture::{
    capture_slash_command, probe_pty, CaptureOptions, CaptureOutput, ConsoleProgress,
    ProgressSink, PtySession, SessionConfig, Timings,
};
pub use error::CaptureError;
pub use sanitize::strip_ansi;
pub use summary::{extract_context_summary, extract_usage_only, ContextSummary};
