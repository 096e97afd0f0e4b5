// gridcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Resolve the base directory (first argument, default: current directory)
// 3. Load config, copying defaults on first run
// 4. Run the pipeline and write the summary

use std::path::PathBuf;

use anyhow::Context;
use gridcast_cli::{app, config};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;

    // 2. Base directory
    let base_dir = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    info!("gridcast starting in {}", base_dir.display());

    // 3. Load config
    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: seasons {}-{}, lookback depths {:?}",
        config.seasons.start, config.seasons.end, config.datasets.lookback_depths
    );

    // 4. Run
    let summary = app::run(&config, &base_dir).context("pipeline failed")?;
    info!(
        "Done: {} seasons, {} eligible, {} datasets",
        summary.seasons,
        summary.eligible,
        summary.datasets.len()
    );
    Ok(())
}

/// Initialize tracing to stderr so stdout stays free for piping.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridcast=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
