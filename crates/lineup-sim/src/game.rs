// Single-game state machine for one batting order.
//
// A game is nine half-innings of three outs each. Runners are tracked as
// references to the players occupying each base, so the field never copies
// player data.

use rand::{Rng, RngCore};

use crate::lineup::{Lineup, LineupResult};
use crate::outcome::{self, Outcome};
use crate::player::{PitcherHand, Player, Roster, LINEUP_SIZE};

pub const INNINGS: u8 = 9;
pub const OUTS_PER_INNING: u8 = 3;
pub const DOUBLE_PLAY_PROBABILITY: f64 = 0.11;

// Slugging band over which the extra-base advancement odds are interpolated.
const SLUG_LOW: f64 = 0.350;
const SLUG_HIGH: f64 = 0.600;
const DEFAULT_SLUG: f64 = 0.400;

const SECOND_SCORES_ON_SINGLE: (f64, f64) = (0.38, 0.72);
const FIRST_SCORES_ON_DOUBLE: (f64, f64) = (0.32, 0.62);

/// Chance a runner on second scores on a single, given the batter's SLUG.
pub fn prob_score_from_second_on_single(slug: f64) -> f64 {
    interpolate_by_slug(slug, SECOND_SCORES_ON_SINGLE)
}

/// Chance a runner on first scores on a double, given the batter's SLUG.
pub fn prob_score_from_first_on_double(slug: f64) -> f64 {
    interpolate_by_slug(slug, FIRST_SCORES_ON_DOUBLE)
}

fn interpolate_by_slug(slug: f64, (low, high): (f64, f64)) -> f64 {
    let slug = if slug <= 0.0 { DEFAULT_SLUG } else { slug };
    let frac = ((slug - SLUG_LOW) / (SLUG_HIGH - SLUG_LOW)).clamp(0.0, 1.0);
    low + frac * (high - low)
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Base occupancy for the current half-inning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Field<'a> {
    pub at_bat: Option<&'a Player>,
    pub first: Option<&'a Player>,
    pub second: Option<&'a Player>,
    pub third: Option<&'a Player>,
}

impl<'a> Field<'a> {
    /// Runners currently on base. At the third out this is the LOB count.
    pub fn left_on_base(&self) -> u8 {
        [self.first, self.second, self.third]
            .iter()
            .filter(|base| base.is_some())
            .count() as u8
    }

    pub fn bases_loaded(&self) -> bool {
        self.left_on_base() == 3
    }

    pub fn clear(&mut self) {
        *self = Field::default();
    }
}

// ---------------------------------------------------------------------------
// Pitcher handedness strategies
// ---------------------------------------------------------------------------

/// Decides which hand the batters face. Consulted once at game start and
/// before each inning after the first.
pub trait PitcherStrategy: Send + Sync {
    fn starter(&self, rng: &mut dyn RngCore) -> PitcherHand;

    fn between_innings(&self, _next_inning: u8, current: PitcherHand, _rng: &mut dyn RngCore) -> PitcherHand {
        current
    }
}

/// The same hand all game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHand(pub PitcherHand);

impl Default for FixedHand {
    fn default() -> Self {
        FixedHand(PitcherHand::Right)
    }
}

impl PitcherStrategy for FixedHand {
    fn starter(&self, _rng: &mut dyn RngCore) -> PitcherHand {
        self.0
    }
}

/// Random starter hand with one chance of an opposite-hand reliever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BullpenStrategy {
    /// Share of games started by a left-hander.
    pub left_starter_share: f64,
    /// Inning (2..=9) before which the reliever may enter.
    pub change_inning: u8,
    pub change_probability: f64,
}

impl PitcherStrategy for BullpenStrategy {
    fn starter(&self, rng: &mut dyn RngCore) -> PitcherHand {
        if rng.gen::<f64>() < self.left_starter_share {
            PitcherHand::Left
        } else {
            PitcherHand::Right
        }
    }

    fn between_innings(&self, next_inning: u8, current: PitcherHand, rng: &mut dyn RngCore) -> PitcherHand {
        if next_inning == self.change_inning && rng.gen::<f64>() < self.change_probability {
            current.opposite()
        } else {
            current
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Totals for one finished (or abandoned) game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameSummary {
    pub runs: u32,
    pub hits: u32,
    pub left_on_base: u32,
    pub lob_by_inning: [u8; INNINGS as usize],
}

/// Mutable state of one simulated game.
#[derive(Debug, Clone)]
pub struct Game<'a> {
    hits: u32,
    runs: u32,
    left_on_base: u32,
    field: Field<'a>,
    hand: PitcherHand,
    inning: u8,
    outs: u8,
    total_outs: u32,
    batter: usize,
    plate_appearances: u32,
    lob_by_inning: [u8; INNINGS as usize],
    finished: bool,
}

impl<'a> Game<'a> {
    pub fn new(hand: PitcherHand) -> Self {
        Game {
            hits: 0,
            runs: 0,
            left_on_base: 0,
            field: Field::default(),
            hand,
            inning: 1,
            outs: 0,
            total_outs: 0,
            batter: 0,
            plate_appearances: 0,
            lob_by_inning: [0; INNINGS as usize],
            finished: false,
        }
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn left_on_base(&self) -> u32 {
        self.left_on_base
    }

    pub fn field(&self) -> &Field<'a> {
        &self.field
    }

    pub fn inning(&self) -> u8 {
        self.inning
    }

    pub fn outs(&self) -> u8 {
        self.outs
    }

    /// Outs recorded across all innings, including the current one.
    pub fn total_outs(&self) -> u32 {
        self.total_outs
    }

    /// Slot (0..9) of the next batter. Carries over between innings.
    pub fn batter_index(&self) -> usize {
        self.batter
    }

    pub fn plate_appearances(&self) -> u32 {
        self.plate_appearances
    }

    pub fn pitcher_hand(&self) -> PitcherHand {
        self.hand
    }

    pub fn set_pitcher_hand(&mut self, hand: PitcherHand) {
        self.hand = hand;
    }

    pub fn lob_by_inning(&self) -> &[u8; INNINGS as usize] {
        &self.lob_by_inning
    }

    pub fn is_over(&self) -> bool {
        self.finished
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            runs: self.runs,
            hits: self.hits,
            left_on_base: self.left_on_base,
            lob_by_inning: self.lob_by_inning,
        }
    }

    /// Apply one plate appearance by `batter`. Returns true when it ended
    /// the half-inning. Ignored once the game is over.
    pub fn apply<R: Rng + ?Sized>(&mut self, batter: &'a Player, outcome: Outcome, rng: &mut R) -> bool {
        if self.finished {
            return false;
        }

        self.field.at_bat = Some(batter);
        let slug = batter.split(self.hand).slug;

        match outcome {
            Outcome::Out => self.record_out(rng),
            Outcome::WalkOrHbp => self.walk(batter),
            Outcome::Single => self.single(batter, slug, rng),
            Outcome::Double => self.double(batter, slug, rng),
            Outcome::Triple => self.triple(batter),
            Outcome::HomeRun => self.home_run(),
        }

        self.field.at_bat = None;
        self.plate_appearances += 1;
        self.batter = (self.batter + 1) % LINEUP_SIZE;

        if self.outs >= OUTS_PER_INNING {
            self.end_half_inning();
            true
        } else {
            false
        }
    }

    fn score(&mut self, runner: Option<&'a Player>) {
        if runner.is_some() {
            self.runs += 1;
        }
    }

    fn add_outs(&mut self, n: u8) {
        self.outs += n;
        self.total_outs += u32::from(n);
    }

    fn record_out<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.add_outs(1);
        if self.field.first.is_some()
            && self.outs < 2
            && rng.gen::<f64>() < DOUBLE_PLAY_PROBABILITY
        {
            self.add_outs(1);
            self.field.first = None;
        }
    }

    // Force-only: a runner moves up only when the base behind it is taken.
    fn walk(&mut self, batter: &'a Player) {
        if self.field.first.is_some() {
            if self.field.second.is_some() {
                let forced_home = self.field.third.take();
                self.score(forced_home);
                self.field.third = self.field.second.take();
            }
            self.field.second = self.field.first.take();
        }
        self.field.first = Some(batter);
    }

    fn single<R: Rng + ?Sized>(&mut self, batter: &'a Player, slug: f64, rng: &mut R) {
        self.hits += 1;
        let from_third = self.field.third.take();
        self.score(from_third);
        if let Some(runner) = self.field.second.take() {
            if rng.gen::<f64>() < prob_score_from_second_on_single(slug) {
                self.runs += 1;
            } else {
                self.field.third = Some(runner);
            }
        }
        self.field.second = self.field.first.take();
        self.field.first = Some(batter);
    }

    fn double<R: Rng + ?Sized>(&mut self, batter: &'a Player, slug: f64, rng: &mut R) {
        self.hits += 1;
        let from_third = self.field.third.take();
        self.score(from_third);
        let from_second = self.field.second.take();
        self.score(from_second);
        if let Some(runner) = self.field.first.take() {
            if rng.gen::<f64>() < prob_score_from_first_on_double(slug) {
                self.runs += 1;
            } else {
                self.field.third = Some(runner);
            }
        }
        self.field.second = Some(batter);
    }

    fn triple(&mut self, batter: &'a Player) {
        self.hits += 1;
        self.clear_bases_scoring();
        self.field.third = Some(batter);
    }

    fn home_run(&mut self) {
        self.hits += 1;
        self.clear_bases_scoring();
        self.runs += 1;
    }

    fn clear_bases_scoring(&mut self) {
        for runner in [
            self.field.third.take(),
            self.field.second.take(),
            self.field.first.take(),
        ] {
            self.score(runner);
        }
    }

    fn end_half_inning(&mut self) {
        let lob = self.field.left_on_base();
        self.lob_by_inning[usize::from(self.inning - 1)] = lob;
        self.left_on_base += u32::from(lob);
        self.field.clear();
        self.outs = 0;
        if self.inning >= INNINGS {
            self.finished = true;
        } else {
            self.inning += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Driving games
// ---------------------------------------------------------------------------

/// Play one full game for a resolved batting order.
pub fn play_game<'a, S, R>(lineup: &[&'a Player; LINEUP_SIZE], strategy: &S, rng: &mut R) -> GameSummary
where
    S: PitcherStrategy + ?Sized,
    R: RngCore,
{
    let mut game = Game::new(strategy.starter(rng));
    while !game.is_over() {
        let batter = lineup[game.batter_index()];
        let outcome = outcome::plate_appearance(batter, game.pitcher_hand(), rng);
        let inning_over = game.apply(batter, outcome, rng);
        if inning_over && !game.is_over() {
            let hand = strategy.between_innings(game.inning(), game.pitcher_hand(), rng);
            game.set_pitcher_hand(hand);
        }
    }
    game.summary()
}

/// Play `games` independent games for one lineup and summarize them.
pub fn simulate_lineup<S, R>(roster: &Roster, lineup: &Lineup, games: u32, strategy: &S, rng: &mut R) -> LineupResult
where
    S: PitcherStrategy + ?Sized,
    R: RngCore,
{
    let batters = roster.resolve(lineup);
    let mut runs = 0u64;
    let mut hits = 0u64;
    let mut left_on_base = 0u64;
    for _ in 0..games {
        let summary = play_game(&batters, strategy, rng);
        runs += u64::from(summary.runs);
        hits += u64::from(summary.hits);
        left_on_base += u64::from(summary.left_on_base);
    }

    let mean_runs = if games == 0 {
        0.0
    } else {
        runs as f64 / f64::from(games)
    };

    LineupResult {
        mean_runs,
        order: lineup.last_names(roster),
        hash: lineup.identity_hash(roster),
        games: u64::from(games),
        runs,
        hits,
        left_on_base,
    }
}
