//! Error types for the bracket engine.

use thiserror::Error;

use crate::racer::RacerId;

/// A request the caller can correct and retry.
///
/// Returned when user input or the requested transition is not allowed. The
/// snapshot passed in is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Finish order has a different number of racers than the heat.
    #[error("finish order lists {actual} racers but the heat has {expected}")]
    WrongRacerCount { expected: usize, actual: usize },

    /// A racer appears more than once in the finish order.
    #[error("racer {0} is listed more than once")]
    DuplicateRacer(RacerId),

    /// A racer in the finish order is not assigned to the heat.
    #[error("racer {0} is not in this heat")]
    ForeignRacer(RacerId),

    /// A racer assigned to the heat is absent from the finish order.
    #[error("racer {0} has no finishing place")]
    MissingRacer(RacerId),

    /// Interactive entry left a racer without a position.
    #[error("please set the position for racer {0}")]
    MissingPosition(RacerId),

    /// Two racers were given the same position.
    #[error("position {0} is assigned to more than one racer")]
    DuplicatePosition(u32),

    /// Position outside 1..=heat size.
    #[error("position {position} for racer {racer} is outside 1..={max}")]
    PositionOutOfRange { racer: RacerId, position: u32, max: u32 },

    /// Heat results are immutable once recorded.
    #[error("heat {0} is already completed")]
    HeatAlreadyCompleted(String),

    /// No heat with this id exists in the event.
    #[error("heat {0} does not exist in this event")]
    UnknownHeat(String),

    /// The latest round still has pending heats.
    #[error("complete all heats in round {0} before starting the next round")]
    RoundIncomplete(u32),

    /// Every configured round has already been created.
    #[error("all {0} rounds have already been started")]
    AllRoundsStarted(u32),

    /// Not enough racers selected to run the event.
    #[error("{selected} racers selected, at least {required} required")]
    InsufficientRacers { selected: usize, required: usize },

    /// A racer was selected twice for the same event.
    #[error("racer {0} is selected more than once")]
    DuplicateEventRacer(RacerId),

    /// Heat capacity below the minimum.
    #[error("racers per heat must be at least {min}, got {got}")]
    RacersPerHeatTooSmall { got: usize, min: usize },

    /// Heat capacity above the maximum.
    #[error("racers per heat must be at most {max}, got {got}")]
    RacersPerHeatTooLarge { got: usize, max: usize },

    /// Round count below the minimum.
    #[error("total rounds must be at least {min}, got {got}")]
    TotalRoundsTooSmall { got: u32, min: u32 },

    /// Season points can only be applied to a completed event.
    #[error("event {0} is not complete")]
    EventNotComplete(String),

    /// Season points were already added for this event.
    #[error("season points for event {0} have already been applied")]
    SeasonPointsAlreadyApplied(String),
}

/// The snapshot itself is corrupt or was modified concurrently.
///
/// The engine refuses to operate on such a snapshot rather than repairing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("round at position {position} is numbered {found}")]
    RoundNumberMismatch { position: u32, found: u32 },

    #[error("event has {created} rounds but only {total} are configured")]
    TooManyRounds { created: usize, total: u32 },

    #[error("event has no current round")]
    MissingCurrentRound,

    #[error("heat {heat} holds {size} racers, capacity is {capacity}")]
    HeatOverCapacity { heat: String, size: usize, capacity: usize },

    #[error("heat {0} has no racers")]
    EmptyHeat(String),

    #[error("pending heat {0} already has results")]
    PendingHeatHasResults(String),

    #[error("completed heat {0} has results that do not match its racers")]
    CorruptResults(String),

    #[error("racer {racer} in heat {heat} is not registered for the event")]
    UnregisteredRacer { heat: String, racer: RacerId },

    #[error("racer {racer} is placed in more than one heat of round {round}")]
    RacerInMultipleHeats { round: u32, racer: RacerId },

    #[error("stored racers per heat {0} is outside the allowed range")]
    InvalidCapacity(usize),
}

/// Any failure of a bracket operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("inconsistent event state: {0}")]
    State(#[from] StateError),
}

impl EngineError {
    /// Validation failures can be shown to the user and retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
