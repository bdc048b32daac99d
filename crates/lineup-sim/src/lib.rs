// Library root for the lineup simulation core.
//
// Data flows enumerate -> pipeline (bounded queue) -> outcome + game ->
// aggregate. Roster loading, configuration and reporting live in lineup-app.

pub mod aggregate;
pub mod enumerate;
pub mod error;
pub mod game;
pub mod lineup;
pub mod outcome;
pub mod pipeline;
pub mod player;

pub use aggregate::{Agg, Aggregator};
pub use error::{PipelineError, RosterError};
pub use game::{BullpenStrategy, FixedHand, PitcherStrategy};
pub use lineup::{Lineup, LineupResult};
pub use outcome::Outcome;
pub use pipeline::{Pipeline, ProgressSink, RunSummary, SimulationSettings, StopHandle, MAX_WORKERS};
pub use player::{PitcherHand, Player, Roster, Stats, LINEUP_SIZE};
