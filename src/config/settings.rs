use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ctxcap_core::{CaptureOptions, SessionConfig, Timings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Capture Claude Code /context output")]
pub struct Config {
    /// Slash command to execute (default: /context)
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Show all interactions
    #[arg(short, long, conflicts_with = "silent")]
    pub debug: bool,

    /// Timeout in seconds (default: 30)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds to wait after sending command (default: 5)
    #[arg(long, value_name = "SECS")]
    pub wait: Option<u64>,

    /// File to write extracted context info (default: /tmp/context.log). Use empty string to skip.
    #[arg(long, value_name = "PATH")]
    pub context_log: Option<String>,

    /// Suppress normal output; only emit errors
    #[arg(short, long)]
    pub silent: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Program to spawn
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments for the program
    #[serde(default)]
    pub program_args: Vec<String>,

    /// Slash command to execute
    #[serde(default = "default_command")]
    pub command: String,

    /// Command that ends the session
    #[serde(default = "default_exit_command")]
    pub exit_command: String,

    /// Deadline for the whole key sequence in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds to capture output after the command is submitted
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// Where the extracted summary is written (empty disables)
    #[serde(default = "default_context_log")]
    pub context_log: String,

    /// Terminal geometry
    #[serde(default)]
    pub pty: PtySettings,

    /// Pacing delays
    #[serde(default)]
    pub timings: TimingSettings,
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_command() -> String {
    "/context".to_string()
}

fn default_exit_command() -> String {
    "/exit".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_wait_secs() -> u64 {
    5
}

fn default_context_log() -> String {
    "/tmp/context.log".to_string()
}

/// Terminal geometry for the spawned session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtySettings {
    /// Rows
    #[serde(default = "default_rows")]
    pub rows: u16,

    /// Columns
    #[serde(default = "default_cols")]
    pub cols: u16,
}

fn default_rows() -> u16 {
    40
}

fn default_cols() -> u16 {
    160
}

impl Default for PtySettings {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

/// Fixed delays, in milliseconds
///
/// Claude Code gives no ready signal, so these are the only knobs for
/// slow machines or a slow first render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Wait for the startup banner before typing
    #[serde(default = "default_startup_wait")]
    pub startup_wait_ms: u64,

    /// Pause between typing the command and pressing Enter
    #[serde(default = "default_submit_delay")]
    pub submit_delay_ms: u64,

    /// Capture window after Escape
    #[serde(default = "default_dismiss_drain")]
    pub dismiss_drain_ms: u64,

    /// Capture window after the exit command
    #[serde(default = "default_exit_drain")]
    pub exit_drain_ms: u64,

    /// Upper bound on a single read attempt
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Time the program gets to exit before it is killed
    #[serde(default = "default_exit_grace")]
    pub exit_grace_ms: u64,
}

fn default_startup_wait() -> u64 {
    2000
}

fn default_submit_delay() -> u64 {
    500
}

fn default_dismiss_drain() -> u64 {
    1000
}

fn default_exit_drain() -> u64 {
    1000
}

fn default_read_timeout() -> u64 {
    200
}

fn default_exit_grace() -> u64 {
    5000
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            startup_wait_ms: default_startup_wait(),
            submit_delay_ms: default_submit_delay(),
            dismiss_drain_ms: default_dismiss_drain(),
            exit_drain_ms: default_exit_drain(),
            read_timeout_ms: default_read_timeout(),
            exit_grace_ms: default_exit_grace(),
        }
    }
}

impl TimingSettings {
    fn to_timings(&self) -> Timings {
        Timings {
            startup_wait: Duration::from_millis(self.startup_wait_ms),
            submit_delay: Duration::from_millis(self.submit_delay_ms),
            dismiss_drain: Duration::from_millis(self.dismiss_drain_ms),
            exit_drain: Duration::from_millis(self.exit_drain_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            exit_grace: Duration::from_millis(self.exit_grace_ms),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program: default_program(),
            program_args: Vec::new(),
            command: default_command(),
            exit_command: default_exit_command(),
            timeout_secs: default_timeout_secs(),
            wait_secs: default_wait_secs(),
            context_log: default_context_log(),
            pty: PtySettings::default(),
            timings: TimingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_file(p);
            }
            tracing::warn!("Config file {:?} not found, falling back to defaults", p);
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("ctxcap/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/ctxcap/config.toml")),
            dirs::home_dir().map(|p| p.join(".ctxcap.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        tracing::debug!("Loaded settings from {:?}", path);
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(command) = &cli.command {
            self.command = command.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(wait) = cli.wait {
            self.wait_secs = wait;
        }
        if let Some(context_log) = &cli.context_log {
            self.context_log = context_log.clone();
        }
    }

    /// Validate and normalize settings values
    ///
    /// A zero read timeout would turn the drain loop into a busy spin, and a
    /// zero-sized terminal makes Claude Code render nothing.
    pub fn validate(&mut self) {
        const MIN_READ_TIMEOUT_MS: u64 = 1;

        if self.timings.read_timeout_ms < MIN_READ_TIMEOUT_MS {
            self.timings.read_timeout_ms = MIN_READ_TIMEOUT_MS;
        }
        self.pty.rows = self.pty.rows.max(1);
        self.pty.cols = self.pty.cols.max(1);

        let needed = self.minimum_timeout();
        if needed > Duration::from_secs(self.timeout_secs) {
            tracing::warn!(
                "Timeout of {}s is shorter than the startup wait, submit delay and capture wait ({:.1}s); every run will time out",
                self.timeout_secs,
                needed.as_secs_f32()
            );
        }
    }

    /// Time the key sequence spends in fixed pauses before any drain can end early
    pub fn minimum_timeout(&self) -> Duration {
        Duration::from_millis(self.timings.startup_wait_ms)
            + Duration::from_millis(self.timings.submit_delay_ms)
            + Duration::from_secs(self.wait_secs)
    }

    /// Log file path, or `None` when logging is disabled
    pub fn context_log_path(&self) -> Option<&str> {
        Some(self.context_log.as_str()).filter(|p| !p.is_empty())
    }

    /// Build the options for one capture run
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            command: self.command.clone(),
            exit_command: self.exit_command.clone(),
            session: SessionConfig {
                program: self.program.clone(),
                args: self.program_args.clone(),
                rows: self.pty.rows,
                cols: self.pty.cols,
                ..Default::default()
            },
            timeout: Duration::from_secs(self.timeout_secs),
            wait: Duration::from_secs(self.wait_secs),
            timings: self.timings.to_timings(),
        }
    }
}
