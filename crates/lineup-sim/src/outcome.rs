// Plate-appearance outcome model.
//
// A uniform draw against OBP and AVG decides out / walk / hit. Hits are then
// classified from the isolated power implied by SLUG/AVG using a bounded
// single/double/triple/home-run mix.

use rand::Rng;

use crate::player::{PitcherHand, Player, Stats};

// Bases-per-hit clamp.
const MIN_BASES_PER_HIT: f64 = 1.10;
const MAX_BASES_PER_HIT: f64 = 2.10;

const TRIPLE_RATE: f64 = 0.015;
const TRIPLE_RATE_POWER: f64 = 0.02;
const TRIPLE_POWER_THRESHOLD: f64 = 1.70;

const DOUBLE_BASE_RATE: f64 = 0.19;
const DOUBLE_SLOPE: f64 = 0.20;
const DOUBLE_PIVOT: f64 = 1.55;
const DOUBLE_FLOOR: f64 = 0.12;
const DOUBLE_CEILING: f64 = 0.26;

const HOME_RUN_FLOOR: f64 = 0.03;
const HOME_RUN_CEILING: f64 = 0.12;

const SINGLE_FLOOR: f64 = 0.55;

/// Result of one plate appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Out,
    WalkOrHbp,
    Single,
    Double,
    Triple,
    HomeRun,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        matches!(
            self,
            Outcome::Single | Outcome::Double | Outcome::Triple | Outcome::HomeRun
        )
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Sample a plate appearance for `player` against a pitcher of `hand`.
pub fn plate_appearance<R: Rng + ?Sized>(player: &Player, hand: PitcherHand, rng: &mut R) -> Outcome {
    let stats = player.split(hand);
    let u: f64 = rng.gen();
    if u > stats.obp {
        return Outcome::Out;
    }
    if u > stats.avg {
        return Outcome::WalkOrHbp;
    }
    HitDistribution::for_rates(stats.avg, stats.slug).sample(rng.gen())
}

// ---------------------------------------------------------------------------
// Top-level probabilities
// ---------------------------------------------------------------------------

/// Analytic out / walk / hit probabilities implied by a split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProbabilities {
    pub out: f64,
    pub walk_or_hbp: f64,
    pub hit: f64,
}

impl OutcomeProbabilities {
    /// Rates are clamped into [0, 1] and AVG is capped at OBP, mirroring the
    /// threshold order used by [`plate_appearance`].
    pub fn for_stats(stats: &Stats) -> Self {
        let obp = stats.obp.clamp(0.0, 1.0);
        let hit = stats.avg.clamp(0.0, obp);
        OutcomeProbabilities {
            out: 1.0 - obp,
            walk_or_hbp: obp - hit,
            hit,
        }
    }
}

// ---------------------------------------------------------------------------
// Hit type mix
// ---------------------------------------------------------------------------

/// Probability of each hit type given that the plate appearance is a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitDistribution {
    pub single: f64,
    pub double: f64,
    pub triple: f64,
    pub home_run: f64,
}

impl HitDistribution {
    /// Every hit is a single.
    pub const SINGLES_ONLY: HitDistribution = HitDistribution {
        single: 1.0,
        double: 0.0,
        triple: 0.0,
        home_run: 0.0,
    };

    /// Derive the hit mix from batting average and slugging.
    ///
    /// Non-positive AVG or SLUG yields [`HitDistribution::SINGLES_ONLY`].
    pub fn for_rates(avg: f64, slug: f64) -> Self {
        if avg <= 0.0 || slug <= 0.0 {
            return Self::SINGLES_ONLY;
        }

        let t = (slug / avg).clamp(MIN_BASES_PER_HIT, MAX_BASES_PER_HIT);

        let triple = if t > TRIPLE_POWER_THRESHOLD {
            TRIPLE_RATE_POWER
        } else {
            TRIPLE_RATE
        };
        let mut double =
            (DOUBLE_BASE_RATE + DOUBLE_SLOPE * (t - DOUBLE_PIVOT)).clamp(DOUBLE_FLOOR, DOUBLE_CEILING);

        // Total bases left over after singles, doubles and triples, spread
        // across the three extra bases a home run adds.
        let mut home_run =
            ((t - (1.0 + double + 2.0 * triple)) / 3.0).clamp(HOME_RUN_FLOOR, HOME_RUN_CEILING);

        let mut single = 1.0 - (double + triple + home_run);
        if single < SINGLE_FLOOR {
            let mut deficit = SINGLE_FLOOR - single;

            let hr_room = (home_run - HOME_RUN_FLOOR).max(0.0);
            let hr_cut = deficit.min(hr_room);
            home_run -= hr_cut;
            deficit -= hr_cut;

            if deficit > 0.0 {
                let double_room = (double - DOUBLE_FLOOR).max(0.0);
                double -= deficit.min(double_room);
            }

            single = (1.0 - (double + triple + home_run)).max(0.0);
        }

        HitDistribution {
            single,
            double,
            triple,
            home_run,
        }
    }

    /// Map a uniform draw in [0, 1) onto a hit type.
    pub fn sample(&self, u: f64) -> Outcome {
        let mut r = u;
        if r < self.single {
            return Outcome::Single;
        }
        r -= self.single;
        if r < self.double {
            return Outcome::Double;
        }
        r -= self.double;
        if r < self.triple {
            return Outcome::Triple;
        }
        Outcome::HomeRun
    }

    pub fn total(&self) -> f64 {
        self.single + self.double + self.triple + self.home_run
    }
}
