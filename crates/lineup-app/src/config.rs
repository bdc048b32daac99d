// Configuration loading and parsing (lineup.toml).

use lineup_sim::{BullpenStrategy, FixedHand, PipelineError, PitcherHand, PitcherStrategy, SimulationSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Config file used when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config/lineup.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub simulation: SimulationSettings,
    pub pitching: PitchingConfig,
    /// Roster file, relative to the working directory unless absolute.
    pub roster_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// lineup.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    simulation: SimulationSection,
    #[serde(default)]
    pitching: PitchingConfig,
    roster: RosterSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SimulationSection {
    games_per_lineup: u32,
    top_k: usize,
    bottom_k: usize,
    workers: usize,
    queue_capacity: usize,
    progress_interval: u64,
    seed: Option<u64>,
    max_lineups: Option<u64>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let d = SimulationSettings::default();
        SimulationSection {
            games_per_lineup: d.games_per_lineup,
            top_k: d.top_k,
            bottom_k: d.bottom_k,
            workers: d.workers,
            queue_capacity: d.queue_capacity,
            progress_interval: d.progress_interval,
            seed: d.seed,
            max_lineups: d.max_lineups,
        }
    }
}

impl From<SimulationSection> for SimulationSettings {
    fn from(s: SimulationSection) -> Self {
        SimulationSettings {
            games_per_lineup: s.games_per_lineup,
            top_k: s.top_k,
            bottom_k: s.bottom_k,
            workers: s.workers,
            queue_capacity: s.queue_capacity,
            seed: s.seed,
            max_lineups: s.max_lineups,
            progress_interval: s.progress_interval,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RosterSection {
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputSection {
    report_path: Option<String>,
}

/// How the opposing pitcher's hand is chosen, selected by `policy`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum PitchingConfig {
    /// One hand all game. `"left"` is a left-hander, anything else a
    /// right-hander.
    Fixed {
        #[serde(default = "default_hand")]
        hand: String,
    },
    /// Random starter, with a chance of an opposite-hand reliever.
    Bullpen {
        left_starter_share: f64,
        change_inning: u8,
        change_probability: f64,
    },
}

fn default_hand() -> String {
    PitcherHand::Right.label().to_string()
}

impl Default for PitchingConfig {
    fn default() -> Self {
        PitchingConfig::Fixed {
            hand: default_hand(),
        }
    }
}

impl PitchingConfig {
    pub fn strategy(&self) -> Arc<dyn PitcherStrategy> {
        match self {
            PitchingConfig::Fixed { hand } => Arc::new(FixedHand(PitcherHand::from_label(hand))),
            PitchingConfig::Bullpen {
                left_starter_share,
                change_inning,
                change_probability,
            } => Arc::new(BullpenStrategy {
                left_starter_share: *left_starter_share,
                change_inning: *change_inning,
                change_probability: *change_probability,
            }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PitchingConfig::Fixed { hand } => {
                format!("fixed {}-handed", PitcherHand::from_label(hand))
            }
            PitchingConfig::Bullpen {
                left_starter_share,
                change_inning,
                change_probability,
            } => format!(
                "bullpen (left starters {:.0}%, change before inning {} at {:.0}%)",
                left_starter_share * 100.0,
                change_inning,
                change_probability * 100.0
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from a TOML file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        simulation: file.simulation.into(),
        pitching: file.pitching,
        roster_path: PathBuf::from(file.roster.path),
        report_path: file.output.report_path.map(PathBuf::from),
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads `path`, or [`DEFAULT_CONFIG_PATH`] relative to
/// the working directory.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    load_config_from(path)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    config.simulation.validate().map_err(|e| match e {
        PipelineError::InvalidSettings { field, message } => ConfigError::ValidationError {
            field: format!("simulation.{field}"),
            message,
        },
        other => ConfigError::ValidationError {
            field: "simulation".into(),
            message: other.to_string(),
        },
    })?;

    if let PitchingConfig::Bullpen {
        left_starter_share,
        change_inning,
        change_probability,
    } = &config.pitching
    {
        let shares: &[(&str, f64)] = &[
            ("pitching.left_starter_share", *left_starter_share),
            ("pitching.change_probability", *change_probability),
        ];
        for (name, val) in shares {
            if !(0.0..=1.0).contains(val) {
                return Err(ConfigError::ValidationError {
                    field: name.to_string(),
                    message: format!("must be between 0.0 and 1.0 inclusive, got {val}"),
                });
            }
        }

        if !(2..=lineup_sim::game::INNINGS).contains(change_inning) {
            return Err(ConfigError::ValidationError {
                field: "pitching.change_inning".into(),
                message: format!("must be between 2 and 9, got {change_inning}"),
            });
        }
    }

    if config.roster_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "roster.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
