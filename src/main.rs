use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ctxcap::app;
use ctxcap::config::{Config, Settings};

fn main() -> Result<ExitCode> {
    // Parse CLI arguments (rejects --debug with --silent)
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug, cli.silent);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    // Run the capture
    Ok(app::run(&cli, &settings).exit_code())
}

fn setup_logging(debug: bool, silent: bool) {
    let filter = if debug {
        EnvFilter::new("ctxcap=debug,ctxcap_core=debug")
    } else if silent {
        EnvFilter::new("ctxcap=error,ctxcap_core=error")
    } else {
        EnvFilter::new("ctxcap=warn,ctxcap_core=warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
