// Lineup optimizer entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only the report)
// 2. Load config (first argument, or config/lineup.toml)
// 3. Load roster
// 4. Build pipeline and aggregator
// 5. Install Ctrl+C handler that stops enumeration early
// 6. Run the pipeline
// 7. Print the report, optionally write it as JSON

use lineup_app::config;
use lineup_app::progress::LogProgress;
use lineup_app::report;
use lineup_app::roster;

use anyhow::Context;
use lineup_sim::Pipeline;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Lineup optimizer starting up");

    // 2. Load config
    let config_arg = std::env::args().nth(1);
    let config = config::load_config(config_arg.as_deref()).context("failed to load configuration")?;
    info!(
        "Config loaded: {} games per lineup, top {} / bottom {}, pitching {}",
        config.simulation.games_per_lineup,
        config.simulation.top_k,
        config.simulation.bottom_k,
        config.pitching.describe()
    );

    // 3. Load roster
    let roster = roster::load_roster(&config.roster_path)
        .with_context(|| format!("failed to load roster from {}", config.roster_path.display()))?;
    info!(
        "Loaded {} players from {}",
        roster.len(),
        config.roster_path.display()
    );

    // 4. Build pipeline and aggregator
    let pipeline = Pipeline::new(Arc::new(roster), config.simulation.clone())
        .with_strategy(config.pitching.strategy())
        .with_progress(Arc::new(LogProgress));
    let aggregator = pipeline.new_aggregator();

    // 5. Ctrl+C stops the producer; queued lineups still finish
    let stop = pipeline.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing queued lineups");
            stop.stop();
        }
    });

    // 6. Run
    let summary = pipeline
        .run(Arc::clone(&aggregator))
        .await
        .context("lineup simulation failed")?;
    if !summary.exhausted {
        info!(
            "Enumeration stopped early after {} lineups",
            summary.produced
        );
    }

    // 7. Report
    let report = report::build_report(&aggregator, &summary, &config.simulation);
    print!("{}", report::render_text(&report));

    if let Some(path) = &config.report_path {
        report::write_json(&report, path)?;
        info!("Report written to {}", path.display());
    }

    info!("Lineup optimizer shut down cleanly");
    Ok(())
}

/// Initialize tracing to stderr.
///
/// Uses `RUST_LOG` if set, otherwise defaults to info for this workspace.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup_app=info,lineup_sim=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
