//! Python bindings.
//!
//! The host application keeps events and racers as JSON documents, so every
//! function takes and returns JSON strings shaped like the serde types.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{
    rng_from_seed, DEFAULT_RACERS_PER_HEAT, DEFAULT_TOTAL_ROUNDS, MAX_RACERS_PER_HEAT, MIN_RACERS_PER_HEAT,
};
use crate::error::{EngineError, ValidationError};
use crate::event::{Event, Round};
use crate::heat::Heat;
use crate::racer::{Racer, RacerId};
use crate::standings::RankedEntry;
use crate::{progression, scoring, seeding, standings};

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => PyValueError::new_err(e.to_string()),
            EngineError::State(e) => PyRuntimeError::new_err(e.to_string()),
        }
    }
}

fn from_json<T: DeserializeOwned>(json: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("Invalid document: {}", e)))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize: {}", e)))
}

fn check_capacity(racers_per_heat: usize) -> PyResult<()> {
    let err = if racers_per_heat < MIN_RACERS_PER_HEAT {
        ValidationError::RacersPerHeatTooSmall {
            got: racers_per_heat,
            min: MIN_RACERS_PER_HEAT,
        }
    } else if racers_per_heat > MAX_RACERS_PER_HEAT {
        ValidationError::RacersPerHeatTooLarge {
            got: racers_per_heat,
            max: MAX_RACERS_PER_HEAT,
        }
    } else {
        return Ok(());
    };
    Err(EngineError::from(err).into())
}

/// Heats for round 1 as a JSON list.
#[pyfunction]
#[pyo3(signature = (racer_ids, racers_per_heat, seed = None))]
fn seed_and_partition_first_round(racer_ids: Vec<RacerId>, racers_per_heat: usize, seed: Option<u64>) -> PyResult<String> {
    check_capacity(racers_per_heat)?;
    let mut rng = rng_from_seed(seed);
    to_json(&seeding::seed_and_partition_first_round(&racer_ids, racers_per_heat, &mut rng))
}

/// Heats for a later round from (racer id, points) pairs.
#[pyfunction]
#[pyo3(signature = (racer_points, racers_per_heat, seed = None))]
fn seed_and_partition_next_round(
    racer_points: Vec<(RacerId, u32)>,
    racers_per_heat: usize,
    seed: Option<u64>,
) -> PyResult<String> {
    check_capacity(racers_per_heat)?;
    let mut rng = rng_from_seed(seed);
    to_json(&seeding::seed_and_partition_next_round(&racer_points, racers_per_heat, &mut rng))
}

/// Returns (heat JSON, racer id -> points).
#[pyfunction]
fn validate_and_score_heat(heat: &str, finish_order: Vec<RacerId>) -> PyResult<(String, std::collections::HashMap<RacerId, u32>)> {
    let heat: Heat = from_json(heat)?;
    let scored = scoring::validate_and_score_heat(&heat, &finish_order).map_err(EngineError::from)?;
    Ok((to_json(&scored.heat)?, scored.points))
}

#[pyfunction]
fn is_round_complete(round: &str) -> PyResult<bool> {
    let round: Round = from_json(round)?;
    Ok(progression::is_round_complete(&round))
}

#[pyfunction]
fn is_event_complete(event: &str) -> PyResult<bool> {
    let event: Event = from_json(event)?;
    Ok(progression::is_event_complete(&event))
}

#[pyfunction]
fn compute_event_standings(event: &str) -> PyResult<String> {
    let event: Event = from_json(event)?;
    to_json(&standings::compute_event_standings(&event))
}

#[pyfunction]
fn apply_season_points(racers: &str, event_standings: &str) -> PyResult<String> {
    let racers: Vec<Racer> = from_json(racers)?;
    let event_standings: Vec<RankedEntry> = from_json(event_standings)?;
    to_json(&standings::apply_season_points(&racers, &event_standings))
}

#[pyfunction]
#[pyo3(signature = (racers, search = None))]
fn season_leaderboard(racers: &str, search: Option<&str>) -> PyResult<String> {
    let racers: Vec<Racer> = from_json(racers)?;
    to_json(&standings::season_leaderboard(&racers, search))
}

/// Start the first or next round; returns the updated event.
#[pyfunction]
#[pyo3(signature = (event, seed = None))]
fn start_round(event: &str, seed: Option<u64>) -> PyResult<String> {
    let event: Event = from_json(event)?;
    let mut rng = rng_from_seed(seed);
    to_json(&progression::start_round(&event, &mut rng)?)
}

#[pyfunction]
fn complete_heat(event: &str, heat_id: &str, finish_order: Vec<RacerId>) -> PyResult<String> {
    let event: Event = from_json(event)?;
    to_json(&progression::complete_heat(&event, heat_id, &finish_order)?)
}

/// Returns (event JSON, racers JSON, standings JSON).
#[pyfunction]
fn finalize_event(event: &str, racers: &str) -> PyResult<(String, String, String)> {
    let event: Event = from_json(event)?;
    let racers: Vec<Racer> = from_json(racers)?;
    let finalized = progression::finalize_event(&event, &racers)?;
    Ok((
        to_json(&finalized.event)?,
        to_json(&finalized.racers)?,
        to_json(&finalized.standings)?,
    ))
}

/// Python module definition
#[pymodule]
fn heat_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Bracket generation
    m.add_function(wrap_pyfunction!(seed_and_partition_first_round, m)?)?;
    m.add_function(wrap_pyfunction!(seed_and_partition_next_round, m)?)?;

    // Scoring and progression
    m.add_function(wrap_pyfunction!(validate_and_score_heat, m)?)?;
    m.add_function(wrap_pyfunction!(is_round_complete, m)?)?;
    m.add_function(wrap_pyfunction!(is_event_complete, m)?)?;
    m.add_function(wrap_pyfunction!(start_round, m)?)?;
    m.add_function(wrap_pyfunction!(complete_heat, m)?)?;
    m.add_function(wrap_pyfunction!(finalize_event, m)?)?;

    // Standings
    m.add_function(wrap_pyfunction!(compute_event_standings, m)?)?;
    m.add_function(wrap_pyfunction!(apply_season_points, m)?)?;
    m.add_function(wrap_pyfunction!(season_leaderboard, m)?)?;

    // Constants
    m.add("MIN_RACERS_PER_HEAT", MIN_RACERS_PER_HEAT)?;
    m.add("MAX_RACERS_PER_HEAT", MAX_RACERS_PER_HEAT)?;
    m.add("DEFAULT_RACERS_PER_HEAT", DEFAULT_RACERS_PER_HEAT)?;
    m.add("DEFAULT_TOTAL_ROUNDS", DEFAULT_TOTAL_ROUNDS)?;

    Ok(())
}
