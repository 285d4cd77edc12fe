//! Reporting of a capture run: the context log file and console output.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use ctxcap_core::ContextSummary;

/// Width of the `=`/`-` separator lines
const SEPARATOR_WIDTH: usize = 60;

/// Error writing the context log. Never fatal.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The log file could not be written
    #[error("failed to write {path:?}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Pick what goes into the context log: usage fragment, else the summary
/// line, else the whole output
pub fn log_payload<'a>(output: &'a str, summary: Option<&'a ContextSummary>) -> &'a str {
    match summary {
        Some(ContextSummary {
            usage: Some(usage), ..
        }) => usage.as_str(),
        Some(summary) => summary.line.as_str(),
        None => output,
    }
}

/// Overwrite `path` with `payload` and a trailing newline.
///
/// An empty path disables logging; returns whether anything was written.
pub fn write_context_log(path: &str, payload: &str) -> Result<bool, ReportError> {
    if path.is_empty() {
        return Ok(false);
    }

    fs::write(path, format!("{}\n", payload)).map_err(|source| ReportError::LogWrite {
        path: PathBuf::from(path),
        source,
    })?;
    tracing::debug!("Wrote {} bytes to {}", payload.len() + 1, path);
    Ok(true)
}

/// Persist an error message so downstream consumers can surface it
pub fn write_error_log(path: &str, message: &str) -> Result<bool, ReportError> {
    write_context_log(path, &format!("ERROR: {}", message))
}

/// Captured output framed by separator lines
pub fn format_output_block(command: &str, output: &str) -> String {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    format!(
        "\n{rule}\nOUTPUT FROM '{command}':\n{rule}\n{output}\n{rule}",
        rule = rule,
        command = command,
        output = output
    )
}

/// Extracted summary, with the model and usage fragment when there are any
pub fn format_summary_block(summary: &ContextSummary) -> String {
    let rule = "=".repeat(SEPARATOR_WIDTH);
    let mut block = format!("\nCaptured Context Summary:\n{}\n{}\n", rule, summary.line);
    if !summary.model.is_empty() || summary.usage.is_some() {
        block.push_str(&"-".repeat(SEPARATOR_WIDTH));
        block.push('\n');
    }
    if !summary.model.is_empty() {
        block.push_str(&format!("Model: {}\n", summary.model));
    }
    if let Some(usage) = &summary.usage {
        block.push_str(&format!("Usage: {}\n", usage));
    }
    block.push_str(&rule);
    block
}

/// Console side of the report. Silent mode suppresses everything but
/// warnings and errors, which go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    silent: bool,
}

impl Reporter {
    /// Create a reporter
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }

    /// Print the captured output
    pub fn output(&self, command: &str, output: &str) {
        if !self.silent {
            println!("{}", format_output_block(command, output));
        }
    }

    /// Note where the context log went
    pub fn saved(&self, path: &str) {
        if !self.silent {
            println!("\nContext details saved to: {}", path);
        }
    }

    /// Print the extracted summary
    pub fn summary(&self, summary: &ContextSummary) {
        if !self.silent {
            println!("{}", format_summary_block(summary));
        }
    }

    /// Warn that the output carried no summary line
    pub fn missing_summary(&self) {
        tracing::debug!("No context summary line in captured output");
        eprintln!("\nWarning: Could not locate context summary in output");
    }

    /// Warn about a failed log write
    pub fn log_write_failed(&self, err: &ReportError) {
        tracing::debug!("Context log write failed: {}", err);
        eprintln!("\nWarning: Failed to write context log ({})", err);
    }

    /// Report a fatal error
    pub fn error(&self, message: &str) {
        tracing::debug!("Reporting failure: {}", message.trim());
        eprintln!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(usage: Option<&str>) -> ContextSummary {
        ContextSummary {
            line: "claude-sonnet-4-5-20250929 · 66k/200k tokens (33%)".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            usage: usage.map(str::to_string),
        }
    }

    #[test]
    fn test_payload_prefers_usage() {
        let s = summary(Some("66k/200k tokens (33%)"));
        assert_eq!(log_payload("raw", Some(&s)), "66k/200k tokens (33%)");
    }

    #[test]
    fn test_payload_falls_back_to_line() {
        let s = summary(None);
        assert_eq!(
            log_payload("raw", Some(&s)),
            "claude-sonnet-4-5-20250929 · 66k/200k tokens (33%)"
        );
    }

    #[test]
    fn test_payload_falls_back_to_output() {
        assert_eq!(log_payload("whole screen", None), "whole screen");
    }

    #[test]
    fn test_write_context_log_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("context.log");
        let path_str = path.to_str().expect("utf-8 path");
        fs::write(&path, "old contents that are longer\n").expect("seed file");

        assert!(write_context_log(path_str, "66k/200k tokens (33%)").expect("write"));
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "66k/200k tokens (33%)\n"
        );
    }

    #[test]
    fn test_empty_path_skips() {
        assert!(!write_context_log("", "anything").expect("skip"));
        assert!(!write_error_log("", "anything").expect("skip"));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("context.log");

        let err = write_context_log(path.to_str().expect("utf-8 path"), "x")
            .expect_err("missing directory");
        assert!(matches!(err, ReportError::LogWrite { .. }));
        assert!(err.to_string().contains("missing-dir"));
    }

    #[test]
    fn test_error_log_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("context.log");

        write_error_log(path.to_str().expect("utf-8 path"), "no pty").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "ERROR: no pty\n");
    }

    #[test]
    fn test_format_blocks() {
        let block = format_output_block("/context", "hello");
        let rule = "=".repeat(60);
        assert_eq!(
            block,
            format!("\n{0}\nOUTPUT FROM '/context':\n{0}\nhello\n{0}", rule)
        );

        let with_usage = format_summary_block(&summary(Some("66k/200k tokens (33%)")));
        assert!(with_usage.contains("Usage: 66k/200k tokens (33%)"));
        assert!(with_usage.ends_with(&rule));

        let without_usage = format_summary_block(&summary(None));
        assert!(!without_usage.contains("Usage:"));
        assert!(without_usage.contains("Model: claude-sonnet-4-5-20250929\n"));
    }

    #[test]
    fn test_summary_block_layout() {
        let rule = "=".repeat(60);
        let block = format_summary_block(&summary(Some("66k/200k tokens (33%)")));
        assert_eq!(
            block,
            format!(
                "\nCaptured Context Summary:\n{rule}\n\
                 claude-sonnet-4-5-20250929 · 66k/200k tokens (33%)\n\
                 {dash}\n\
                 Model: claude-sonnet-4-5-20250929\n\
                 Usage: 66k/200k tokens (33%)\n\
                 {rule}",
                rule = rule,
                dash = "-".repeat(60)
            )
        );
    }
}
