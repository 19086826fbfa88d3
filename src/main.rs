//! Trellis CLI
//!
//! Prices the order described by a settings file and prints it.

use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use jiff::Timestamp;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use trellis::{
    checkout::price_order,
    clock::{Clock, FixedClock, SystemClock},
    config::Settings,
    report::write_order,
};

#[derive(Debug, Parser)]
#[command(name = "trellis", about = "Price an order with promotions and taxes", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, short)]
    config: PathBuf,

    /// Evaluate promotion and tax dates at this instant instead of now
    #[arg(long)]
    now: Option<Timestamp>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()?;

    let cli = Cli::parse();

    let settings = Settings::from_path(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };

    let order = price_order(&settings, &clock)?;

    write_order(&mut io::stdout().lock(), &order)?;

    Ok(())
}
