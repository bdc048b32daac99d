// Players, split stats and the roster a lineup is drawn from.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RosterError;
use crate::lineup::Lineup;

/// Number of batters in a lineup.
pub const LINEUP_SIZE: usize = 9;

// ---------------------------------------------------------------------------
// Stats and handedness
// ---------------------------------------------------------------------------

/// Rate stats for one handedness split. AVG <= OBP is assumed by the
/// outcome model but not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub avg: f64,
    pub obp: f64,
    pub slug: f64,
}

impl Stats {
    pub fn new(avg: f64, obp: f64, slug: f64) -> Self {
        Stats { avg, obp, slug }
    }

    /// Whether all three rates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.avg.is_finite() && self.obp.is_finite() && self.slug.is_finite()
    }
}

/// Throwing hand of the opposing pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitcherHand {
    Left,
    Right,
}

impl PitcherHand {
    /// `"left"` (any case) is a left-hander; every other label is treated as
    /// a right-hander.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("left") {
            PitcherHand::Left
        } else {
            PitcherHand::Right
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            PitcherHand::Left => PitcherHand::Right,
            PitcherHand::Right => PitcherHand::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PitcherHand::Left => "left",
            PitcherHand::Right => "right",
        }
    }
}

impl fmt::Display for PitcherHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A batter with separate splits against left- and right-handed pitching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "LHP")]
    pub lhp: Stats,
    #[serde(rename = "RHP")]
    pub rhp: Stats,
}

impl Player {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, lhp: Stats, rhp: Stats) -> Self {
        Player {
            first_name: first_name.into(),
            last_name: last_name.into(),
            lhp,
            rhp,
        }
    }

    /// The split used against a pitcher of the given hand.
    pub fn split(&self, hand: PitcherHand) -> &Stats {
        match hand {
            PitcherHand::Left => &self.lhp,
            PitcherHand::Right => &self.rhp,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The immutable pool of players lineups are drawn from. Lineups refer to
/// players by their index here.
#[derive(Debug, Clone)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Fails when there are not enough players to fill a single lineup.
    pub fn new(players: Vec<Player>) -> Result<Self, RosterError> {
        if players.len() < LINEUP_SIZE {
            return Err(RosterError::TooFewPlayers {
                have: players.len(),
                need: LINEUP_SIZE,
            });
        }
        Ok(Roster { players })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Resolve a lineup's roster indices to player references in batting
    /// order.
    ///
    /// Panics if the lineup was built for a larger roster.
    pub fn resolve(&self, lineup: &Lineup) -> [&Player; LINEUP_SIZE] {
        lineup.slots().map(|index| &self.players[index])
    }
}
