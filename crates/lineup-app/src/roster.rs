// Roster file loading.
//
// Two formats, picked by file extension:
// - `.json`: an array of player records with `first_name`, `last_name` and
//   `LHP` / `RHP` objects of `avg`, `obp`, `slug`.
// - `.csv`: one row per player with flattened split columns
//   (`lhp_avg`, `lhp_obp`, ..., `rhp_slug`).

use lineup_sim::{Player, Roster, RosterError, Stats};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterLoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("unsupported roster format for {path} (expected .json or .csv)")]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    Roster(#[from] RosterError),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawCsvPlayer {
    first_name: String,
    last_name: String,
    lhp_avg: f64,
    lhp_obp: f64,
    lhp_slug: f64,
    rhp_avg: f64,
    rhp_obp: f64,
    rhp_slug: f64,
}

impl From<RawCsvPlayer> for Player {
    fn from(raw: RawCsvPlayer) -> Self {
        Player::new(
            raw.first_name.trim(),
            raw.last_name.trim(),
            Stats::new(raw.lhp_avg, raw.lhp_obp, raw.lhp_slug),
            Stats::new(raw.rhp_avg, raw.rhp_obp, raw.rhp_slug),
        )
    }
}

// ---------------------------------------------------------------------------
// Row checks
// ---------------------------------------------------------------------------

/// Drop players the outcome model cannot use and warn about suspicious ones.
fn screen_players(players: Vec<Player>) -> Vec<Player> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(players.len());
    for player in players {
        let name = player.full_name();
        if !player.lhp.is_finite() || !player.rhp.is_finite() {
            warn!("skipping player '{}': non-finite split stats", name);
            continue;
        }
        for (split, stats) in [("LHP", &player.lhp), ("RHP", &player.rhp)] {
            if stats.avg > stats.obp {
                warn!(
                    "player '{}' has {} AVG {:.3} above OBP {:.3}; walks will never occur",
                    name, split, stats.avg, stats.obp
                );
            }
            if ![stats.avg, stats.obp].iter().all(|v| (0.0..=1.0).contains(v)) {
                warn!("player '{}' has {} rates outside [0, 1]", name, split);
            }
        }
        if !seen.insert((player.last_name.clone(), player.first_name.clone())) {
            warn!("duplicate player name '{}'; lineup IDs may collide", name);
        }
        kept.push(player);
    }
    kept
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_json_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, serde_json::Error> {
    let players: Vec<Player> = serde_json::from_reader(rdr)?;
    Ok(screen_players(players))
}

fn load_csv_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawCsvPlayer>() {
        match result {
            Ok(raw) => players.push(Player::from(raw)),
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
            }
        }
    }
    Ok(screen_players(players))
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load a roster file and check that it can fill a lineup.
pub fn load_roster(path: &Path) -> Result<Roster, RosterLoadError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let players = match extension.as_deref() {
        Some("json") => {
            let file = open(path)?;
            load_json_from_reader(file).map_err(|e| RosterLoadError::Json {
                path: display,
                source: e,
            })?
        }
        Some("csv") => {
            let file = open(path)?;
            load_csv_from_reader(file).map_err(|e| RosterLoadError::Csv {
                path: display,
                source: e,
            })?
        }
        _ => return Err(RosterLoadError::UnsupportedFormat { path: display }),
    };

    Ok(Roster::new(players)?)
}

fn open(path: &Path) -> Result<std::fs::File, RosterLoadError> {
    std::fs::File::open(path).map_err(|e| RosterLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV_HEADER: &str = "first_name,last_name,lhp_avg,lhp_obp,lhp_slug,rhp_avg,rhp_obp,rhp_slug";

    fn csv_rows(count: usize) -> String {
        let mut out = String::from(CSV_HEADER);
        for i in 0..count {
            out.push_str(&format!(
                "\nFirst{i},Last{i},0.250,0.320,0.410,0.260,0.330,0.430"
            ));
        }
        out
    }

    #[test]
    fn json_roster_parses_splits() {
        let json = r#"[
            {"first_name": "Kyle", "last_name": "Schwarber",
             "LHP": {"avg": 0.210, "obp": 0.330, "slug": 0.430},
             "RHP": {"avg": 0.205, "obp": 0.345, "slug": 0.500}},
            {"first_name": "Trea", "last_name": "Turner",
             "LHP": {"avg": 0.300, "obp": 0.350, "slug": 0.480},
             "RHP": {"avg": 0.285, "obp": 0.330, "slug": 0.450}}
        ]"#;
        let players = load_json_from_reader(json.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].last_name, "Schwarber");
        assert!((players[0].rhp.obp - 0.345).abs() < f64::EPSILON);
        assert!((players[1].lhp.avg - 0.300).abs() < f64::EPSILON);
    }

    #[test]
    fn csv_roster_parses_splits() {
        let csv_data = format!(
            "{CSV_HEADER}\n  Alec , Bohm ,0.310,0.360,0.470,0.270,0.320,0.410"
        );
        let players = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].first_name, "Alec");
        assert_eq!(players[0].last_name, "Bohm");
        assert!((players[0].lhp.slug - 0.470).abs() < f64::EPSILON);
        assert!((players[0].rhp.obp - 0.320).abs() < f64::EPSILON);
    }

    #[test]
    fn csv_malformed_rows_skipped() {
        let csv_data = format!(
            "{CSV_HEADER}\nGood,Row,0.25,0.32,0.41,0.26,0.33,0.43\nBad,Row,abc,0.32,0.41,0.26,0.33,0.43"
        );
        let players = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].first_name, "Good");
    }

    #[test]
    fn non_finite_stats_skipped() {
        let csv_data = format!("{CSV_HEADER}\nInf,Row,inf,0.32,0.41,0.26,0.33,0.43");
        let players = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn avg_above_obp_is_kept() {
        let csv_data = format!("{CSV_HEADER}\nOdd,Row,0.40,0.30,0.50,0.26,0.33,0.43");
        let players = load_csv_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
    }

    #[test]
    fn load_roster_by_extension() {
        let dir = std::env::temp_dir().join("lineup_roster_by_extension");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let csv_path = dir.join("team.CSV");
        fs::write(&csv_path, csv_rows(10)).unwrap();
        let roster = load_roster(&csv_path).unwrap();
        assert_eq!(roster.len(), 10);

        let txt_path = dir.join("team.txt");
        fs::write(&txt_path, "whatever").unwrap();
        assert!(matches!(
            load_roster(&txt_path).unwrap_err(),
            RosterLoadError::UnsupportedFormat { .. }
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_roster_rejects_short_roster() {
        let dir = std::env::temp_dir().join("lineup_roster_short");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("short.csv");
        fs::write(&path, csv_rows(8)).unwrap();
        match load_roster(&path).unwrap_err() {
            RosterLoadError::Roster(RosterError::TooFewPlayers { have, need }) => {
                assert_eq!(have, 8);
                assert_eq!(need, 9);
            }
            other => panic!("expected TooFewPlayers, got: {other}"),
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_roster_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("lineup_roster_missing/none.json");
        assert!(matches!(
            load_roster(&path).unwrap_err(),
            RosterLoadError::Io { .. }
        ));
    }

    #[test]
    fn load_roster_bad_json_is_json_error() {
        let dir = std::env::temp_dir().join("lineup_roster_bad_json");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_roster(&path).unwrap_err(),
            RosterLoadError::Json { .. }
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
