//! Command line behavior of the ctxcap binary.

use std::path::Path;
use std::process::{Command, Output};

fn ctxcap(args: &[&str], home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ctxcap"))
        .args(args)
        // Keep any real user config out of the run
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .output()
        .expect("Failed to run ctxcap")
}

#[test]
fn debug_and_silent_are_rejected_before_any_work() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("context.log");

    let output = ctxcap(
        &[
            "--debug",
            "--silent",
            "--context-log",
            log.to_str().expect("utf-8 path"),
        ],
        dir.path(),
    );

    assert!(!output.status.success());
    assert!(!log.exists(), "no log file may be written");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--silent"), "stderr: {}", stderr);
}

#[test]
fn help_lists_options() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = ctxcap(&["--help"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--debug", "--timeout", "--wait", "--context-log", "--silent"] {
        assert!(stdout.contains(flag), "missing {} in help:\n{}", flag, stdout);
    }
}

#[test]
fn missing_program_exits_with_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("ctxcap.toml");
    let log = dir.path().join("context.log");
    std::fs::write(
        &config,
        "program = \"ctxcap-no-such-program\"\n\n[timings]\nstartup_wait_ms = 10\n",
    )
    .expect("write config");

    let output = ctxcap(
        &[
            "--silent",
            "--config",
            config.to_str().expect("utf-8 path"),
            "--context-log",
            log.to_str().expect("utf-8 path"),
        ],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "silent mode prints nothing to stdout");
    let content = std::fs::read_to_string(&log).expect("error log");
    assert!(content.starts_with("ERROR: "), "log: {:?}", content);
}
