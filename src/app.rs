//! One capture run: capability check, capture, extraction, and report.

use std::process::ExitCode;

use ctxcap_core::{
    capture_slash_command, probe_pty, CaptureError, CaptureOutput, ConsoleProgress,
    ContextSummary,
};

use crate::config::{Config, Settings};
use crate::report::{self, Reporter};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Output was captured and reported
    Captured,
    /// The host cannot open a pseudo-terminal
    DependencyMissing,
    /// The capture failed or produced nothing
    CaptureFailed,
}

impl RunOutcome {
    /// Process exit status for this outcome
    pub fn code(self) -> u8 {
        match self {
            RunOutcome::Captured => 0,
            RunOutcome::DependencyMissing | RunOutcome::CaptureFailed => 1,
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Run a capture with the host's PTY support
pub fn run(cli: &Config, settings: &Settings) -> RunOutcome {
    run_with_probe(cli, settings, probe_pty)
}

/// Run a capture, checking PTY support with `probe` first
pub fn run_with_probe<P>(cli: &Config, settings: &Settings, probe: P) -> RunOutcome
where
    P: FnOnce() -> Result<(), CaptureError>,
{
    let reporter = Reporter::new(cli.silent);
    let log_path = settings.context_log_path().unwrap_or_default();

    if let Err(err) = probe() {
        record_failure(&reporter, log_path, &err);
        return RunOutcome::DependencyMissing;
    }

    let options = settings.capture_options();
    let mut progress = ConsoleProgress::new(cli.silent, cli.debug);

    match capture_slash_command(&options, &mut progress) {
        Ok(output) => report_output(&reporter, settings, &output),
        Err(err) if err.is_dependency_missing() => {
            record_failure(&reporter, log_path, &err);
            RunOutcome::DependencyMissing
        }
        Err(err) => {
            if let CaptureError::Timeout { buffer, .. } = &err {
                reporter.error(&format!("\nTimeout: {}", err));
                if cli.debug {
                    reporter.error(&format!("Buffer before timeout: {}", buffer));
                }
            } else if let CaptureError::Unexpected(source) = &err {
                reporter.error(&format!("\nError: {:?}", source));
            }
            capture_failed(&reporter, log_path, &err.to_string())
        }
    }
}

/// Record a failed capture in the log and on stderr
fn capture_failed(reporter: &Reporter, log_path: &str, message: &str) -> RunOutcome {
    if let Err(log_err) = report::write_error_log(log_path, message) {
        reporter.log_write_failed(&log_err);
    }
    reporter.error("Failed to capture output or no output received");
    RunOutcome::CaptureFailed
}

/// Report a missing capability on stderr and in the log file
fn record_failure(reporter: &Reporter, log_path: &str, err: &CaptureError) {
    let message = format!("Missing dependency: {}", err);
    if let Err(log_err) = report::write_error_log(log_path, &message) {
        reporter.log_write_failed(&log_err);
    }
    reporter.error(&message);
}

/// Print the captured output, persist the summary, and print it
fn report_output(reporter: &Reporter, settings: &Settings, output: &CaptureOutput) -> RunOutcome {
    if output.is_empty() {
        let log_path = settings.context_log_path().unwrap_or_default();
        return capture_failed(reporter, log_path, "no output captured");
    }

    reporter.output(&settings.command, &output.text);

    let summary = ContextSummary::find(&output.text);

    if let Some(path) = settings.context_log_path() {
        let payload = report::log_payload(&output.text, summary.as_ref());
        match report::write_context_log(path, payload) {
            Ok(_) => reporter.saved(path),
            Err(err) => reporter.log_write_failed(&err),
        }
    }

    match &summary {
        Some(summary) => reporter.summary(summary),
        None => reporter.missing_summary(),
    }

    RunOutcome::Captured
}
