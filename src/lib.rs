//! ctxcap - capture the Claude Code `/context` usage summary.

pub mod app;
pub mod config;
pub mod report;
