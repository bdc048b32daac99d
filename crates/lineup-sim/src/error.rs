// Error types for the simulation core.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("need at least {need} players to build a lineup, have {have}")]
    TooFewPlayers { have: usize, need: usize },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("invalid simulation setting `{field}`: {message}")]
    InvalidSettings { field: String, message: String },

    #[error("simulation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
