// Ordered lineups, their identity hash, and per-lineup simulation summaries.

use serde::Serialize;
use std::fmt::Write as _;

use crate::player::{Roster, LINEUP_SIZE};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hex digits shown for a lineup ID in reports.
pub const SHORT_ID_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Lineup
// ---------------------------------------------------------------------------

/// Nine distinct roster indices in batting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lineup {
    slots: [usize; LINEUP_SIZE],
}

impl Lineup {
    /// Returns `None` unless all nine indices are distinct.
    pub fn new(slots: [usize; LINEUP_SIZE]) -> Option<Self> {
        for (i, a) in slots.iter().enumerate() {
            if slots[i + 1..].contains(a) {
                return None;
            }
        }
        Some(Lineup { slots })
    }

    /// Caller guarantees the indices are distinct.
    pub(crate) fn from_distinct(slots: [usize; LINEUP_SIZE]) -> Self {
        debug_assert!(Lineup::new(slots).is_some());
        Lineup { slots }
    }

    pub fn slots(&self) -> [usize; LINEUP_SIZE] {
        self.slots
    }

    /// Stable identity key for this batting order: FNV-1a over
    /// `0:Last,First|1:Last,First|...`. Depends on order and on names only.
    pub fn identity_hash(&self, roster: &Roster) -> u64 {
        let mut key = String::with_capacity(LINEUP_SIZE * 20);
        for (position, player) in roster.resolve(self).iter().enumerate() {
            if position > 0 {
                key.push('|');
            }
            let _ = write!(key, "{}:{},{}", position, player.last_name, player.first_name);
        }
        fnv1a(key.as_bytes())
    }

    /// Last names in batting order.
    pub fn last_names(&self, roster: &Roster) -> Vec<String> {
        roster
            .resolve(self)
            .iter()
            .map(|p| p.last_name.clone())
            .collect()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Fixed-width hex prefix of an identity hash, for display.
pub fn short_id(hash: u64) -> String {
    let mut full = format!("{hash:016x}");
    full.truncate(SHORT_ID_LEN);
    full
}

// ---------------------------------------------------------------------------
// LineupResult
// ---------------------------------------------------------------------------

/// Summary of every game simulated for one lineup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupResult {
    pub mean_runs: f64,
    pub order: Vec<String>,
    pub hash: u64,
    pub games: u64,
    pub runs: u64,
    pub hits: u64,
    pub left_on_base: u64,
}

impl LineupResult {
    pub fn short_id(&self) -> String {
        short_id(self.hash)
    }

    pub fn mean_hits(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.hits as f64 / self.games as f64
        }
    }
}
