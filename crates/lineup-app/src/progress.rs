// Progress reporting for long enumerations.

use lineup_sim::ProgressSink;
use tracing::info;

/// Logs the running total of processed lineups.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, processed: u64) {
        info!("Processed {} lineups...", processed);
    }
}
