//! Round and event state transitions.
//!
//! Every transition takes a snapshot by reference, checks it for consistency,
//! and returns a new snapshot. A rejected transition leaves the caller's
//! snapshot as it was.

use rand::Rng;
use tracing::{error, info, warn};

use crate::error::{EngineError, EngineResult, StateError, ValidationError};
use crate::event::{Event, Round};
use crate::racer::{Racer, RacerId};
use crate::scoring::validate_and_score_heat;
use crate::seeding::{seed_and_partition_first_round, seed_and_partition_next_round};
use crate::standings::{accumulated_points, apply_season_points, compute_event_standings, RankedEntry};

/// Snapshot after an event's standings were added to season totals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizedEvent {
    pub event: Event,
    pub racers: Vec<Racer>,
    pub standings: Vec<RankedEntry>,
}

pub fn is_round_complete(round: &Round) -> bool {
    round.is_complete()
}

pub fn is_event_complete(event: &Event) -> bool {
    event.is_complete()
}

fn ensure_consistent(event: &Event) -> EngineResult<()> {
    event.check_consistency().map_err(|e| {
        error!(event = %event.id, error = %e, "inconsistent event snapshot");
        EngineError::from(e)
    })
}

/// Start the next round of `event`.
///
/// The first round is seeded at random. Later rounds need the latest round
/// completed and fewer than `total_rounds` rounds created; racers are then
/// seeded on their points from all earlier rounds of this event.
pub fn start_round<R: Rng + ?Sized>(event: &Event, rng: &mut R) -> EngineResult<Event> {
    ensure_consistent(event)?;

    let heats = match event.current_round() {
        None => {
            if event.racers.is_empty() {
                return Err(ValidationError::InsufficientRacers {
                    selected: 0,
                    required: 1,
                }
                .into());
            }
            seed_and_partition_first_round(&event.racers, event.racers_per_heat, rng)
        }
        Some(current) => {
            if event.rounds.len() >= event.total_rounds as usize {
                warn!(event = %event.id, "all rounds already started");
                return Err(ValidationError::AllRoundsStarted(event.total_rounds).into());
            }
            if !current.is_complete() {
                warn!(event = %event.id, round = current.round_number, "round still has pending heats");
                return Err(ValidationError::RoundIncomplete(current.round_number).into());
            }
            let points = accumulated_points(event);
            seed_and_partition_next_round(&points, event.racers_per_heat, rng)
        }
    };

    let round_number = event.rounds.len() as u32 + 1;
    info!(event = %event.id, round = round_number, heats = heats.len(), "round started");

    let mut next = event.clone();
    next.rounds.push(Round::new(round_number, heats));
    Ok(next)
}

/// Record the finishing order of one heat.
pub fn complete_heat(event: &Event, heat_id: &str, finish_order: &[RacerId]) -> EngineResult<Event> {
    ensure_consistent(event)?;

    if event.current_round().is_none() {
        return Err(StateError::MissingCurrentRound.into());
    }

    let (round_index, heat_index) = event
        .find_heat(heat_id)
        .ok_or_else(|| ValidationError::UnknownHeat(heat_id.to_string()))?;

    let scored = validate_and_score_heat(&event.rounds[round_index].heats[heat_index], finish_order)?;

    let mut next = event.clone();
    next.rounds[round_index].heats[heat_index] = scored.heat;

    let round = &next.rounds[round_index];
    info!(
        event = %event.id,
        round = round.round_number,
        heat = heat_id,
        round_complete = round.is_complete(),
        "heat completed"
    );
    Ok(next)
}

/// Close out a completed event and add its standings to season points.
///
/// Allowed once per event: the returned event is marked so a second call is
/// rejected instead of counting the points again.
pub fn finalize_event(event: &Event, racers: &[Racer]) -> EngineResult<FinalizedEvent> {
    ensure_consistent(event)?;

    if event.season_points_applied {
        warn!(event = %event.id, "season points already applied");
        return Err(ValidationError::SeasonPointsAlreadyApplied(event.id.clone()).into());
    }
    if !event.is_complete() {
        return Err(ValidationError::EventNotComplete(event.id.clone()).into());
    }

    let standings = compute_event_standings(event);
    let racers = apply_season_points(racers, &standings);

    let mut next = event.clone();
    next.season_points_applied = true;

    info!(event = %event.id, racers = standings.len(), "season points applied");
    Ok(FinalizedEvent {
        event: next,
        racers,
        standings,
    })
}
