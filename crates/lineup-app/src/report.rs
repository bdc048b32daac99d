// Final report: the best and worst lineups of a run, rendered as text for
// stdout and optionally written as JSON.

use anyhow::Context;
use chrono::{DateTime, Utc};
use lineup_sim::{Aggregator, LineupResult, RunSummary, SimulationSettings};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    /// 1-based position within its section.
    pub rank: usize,
    /// Short hex prefix of the lineup's identity hash.
    pub id: String,
    pub mean_runs: f64,
    pub mean_hits: f64,
    /// Last names in batting order.
    pub order: Vec<String>,
}

impl RankedRow {
    fn from_result(rank: usize, result: &LineupResult) -> Self {
        RankedRow {
            rank,
            id: result.short_id(),
            mean_runs: result.mean_runs,
            mean_hits: result.mean_hits(),
            order: result.order.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub lineups_evaluated: u64,
    pub distinct_lineups: usize,
    pub games_per_lineup: u32,
    pub exhausted: bool,
    pub seed: u64,
    pub elapsed_ms: u64,
    /// Highest mean runs first.
    pub top: Vec<RankedRow>,
    /// Lowest mean runs first.
    pub bottom: Vec<RankedRow>,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

pub fn build_report(
    aggregator: &Aggregator,
    summary: &RunSummary,
    settings: &SimulationSettings,
) -> Report {
    let rows = |results: Vec<LineupResult>| -> Vec<RankedRow> {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| RankedRow::from_result(i + 1, r))
            .collect()
    };

    Report {
        generated_at: Utc::now(),
        lineups_evaluated: summary.processed,
        distinct_lineups: aggregator.distinct_lineups(),
        games_per_lineup: settings.games_per_lineup,
        exhausted: summary.exhausted,
        seed: summary.seed,
        elapsed_ms: summary.elapsed.as_millis() as u64,
        top: rows(aggregator.top()),
        bottom: rows(aggregator.bottom()),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_row(out: &mut String, row: &RankedRow) {
    let _ = writeln!(
        out,
        "{:>2}) ID={} mean={:.3}  order=[{}]",
        row.rank,
        row.id,
        row.mean_runs,
        row.order.join(" ")
    );
}

/// Plain-text rendering, one section per ranking.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("Top lineups by average runs:\n");
    for row in &report.top {
        render_row(&mut out, row);
    }
    out.push_str("Bottom lineups by average runs:\n");
    for row in &report.bottom {
        render_row(&mut out, row);
    }
    out
}

/// Write the report as pretty-printed JSON, creating parent directories.
pub fn write_json(report: &Report, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn result(mean_runs: f64, hash: u64, names: &[&str]) -> LineupResult {
        LineupResult {
            mean_runs,
            order: names.iter().map(|s| s.to_string()).collect(),
            hash,
            games: 4,
            runs: (mean_runs * 4.0).round() as u64,
            hits: 30,
            left_on_base: 20,
        }
    }

    fn summary(processed: u64) -> RunSummary {
        RunSummary {
            produced: processed,
            processed,
            exhausted: false,
            workers: 2,
            seed: 7,
            elapsed: Duration::from_millis(1500),
        }
    }

    fn sample_report() -> Report {
        let agg = Aggregator::new(2, 2);
        agg.record(&result(4.25, 0x00ab_cdef_0000_0001, &["Alpha", "Bravo"]));
        agg.record(&result(5.5, 0x1234_5678_9abc_def0, &["Bravo", "Alpha"]));
        agg.record(&result(3.0, 0xfedc_ba98_7654_3210, &["Charlie", "Delta"]));
        let settings = SimulationSettings {
            games_per_lineup: 4,
            ..SimulationSettings::default()
        };
        build_report(&agg, &summary(3), &settings)
    }

    #[test]
    fn build_report_ranks_sections() {
        let report = sample_report();
        assert_eq!(report.lineups_evaluated, 3);
        assert_eq!(report.distinct_lineups, 3);
        assert_eq!(report.games_per_lineup, 4);
        assert_eq!(report.elapsed_ms, 1500);

        let top: Vec<(usize, f64)> = report.top.iter().map(|r| (r.rank, r.mean_runs)).collect();
        assert_eq!(top, vec![(1, 5.5), (2, 4.25)]);
        let bottom: Vec<(usize, f64)> = report.bottom.iter().map(|r| (r.rank, r.mean_runs)).collect();
        assert_eq!(bottom, vec![(1, 3.0), (2, 4.25)]);
        assert!((report.top[0].mean_hits - 7.5).abs() < 1e-12);
    }

    #[test]
    fn short_ids_are_zero_padded() {
        let report = sample_report();
        assert_eq!(report.top[0].id, "123456");
        assert_eq!(report.top[1].id, "00abcd");
        assert_eq!(report.bottom[0].id, "fedcba");
    }

    #[test]
    fn render_text_formats_rows() {
        let text = render_text(&sample_report());
        let expected = "\
Top lineups by average runs:
 1) ID=123456 mean=5.500  order=[Bravo Alpha]
 2) ID=00abcd mean=4.250  order=[Alpha Bravo]
Bottom lineups by average runs:
 1) ID=fedcba mean=3.000  order=[Charlie Delta]
 2) ID=00abcd mean=4.250  order=[Alpha Bravo]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_report_still_has_headers() {
        let agg = Aggregator::new(5, 5);
        let report = build_report(&agg, &summary(0), &SimulationSettings::default());
        assert_eq!(
            render_text(&report),
            "Top lineups by average runs:\nBottom lineups by average runs:\n"
        );
    }

    #[test]
    fn write_json_creates_parent_dirs() {
        let dir = std::env::temp_dir().join("lineup_report_json");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested/report.json");

        write_json(&sample_report(), &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["lineups_evaluated"], 3);
        assert_eq!(value["top"][0]["id"], "123456");
        assert_eq!(value["top"][0]["order"][0], "Bravo");
        assert!(value["generated_at"].is_string());

        let _ = fs::remove_dir_all(&dir);
    }
}
