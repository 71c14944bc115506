//! Olympics EDA - command line entry point.

use anyhow::Result;
use clap::Parser;
use olympics_eda::{pipeline, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let config = Config::parse();
    setup_logging(&config.log_level);

    tracing::info!("Olympics EDA v{} starting", env!("CARGO_PKG_VERSION"));

    let report = pipeline::run(&config)?;
    println!("{}", report.to_json(config.pretty)?);
    Ok(())
}

/// Logs go to stderr so the JSON report on stdout stays parseable.
fn setup_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
