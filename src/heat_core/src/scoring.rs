use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::constants::heat_points;
use crate::error::ValidationError;
use crate::heat::{Heat, HeatResult, HeatStatus};
use crate::racer::RacerId;

/// A completed heat together with the points it awarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoredHeat {
    pub heat: Heat,

    /// Racer id to points earned in this heat
    pub points: HashMap<RacerId, u32>,
}

/// Check that `finish_order` is exactly a permutation of the heat's racers.
pub fn validate_finish_order(heat: &Heat, finish_order: &[RacerId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(finish_order.len());
    for racer in finish_order {
        if !heat.contains(racer) {
            return Err(ValidationError::ForeignRacer(racer.clone()));
        }
        if !seen.insert(racer.as_str()) {
            return Err(ValidationError::DuplicateRacer(racer.clone()));
        }
    }

    if let Some(missing) = heat.racer_ids.iter().find(|r| !seen.contains(r.as_str())) {
        return Err(ValidationError::MissingRacer(missing.clone()));
    }

    // Foreign and duplicate entries were rejected above, so this only trips
    // when the heat itself lists a racer twice.
    if finish_order.len() != heat.len() {
        return Err(ValidationError::WrongRacerCount {
            expected: heat.len(),
            actual: finish_order.len(),
        });
    }

    Ok(())
}

/// Turn interactively entered positions into a finish order.
///
/// `entries` pairs each racer with the place chosen for them, `None` when
/// nothing has been picked yet. Each racer may be entered once, and every
/// racer of the heat needs a unique position in `1..=heat size`.
pub fn finish_order_from_positions(
    heat: &Heat,
    entries: &[(RacerId, Option<u32>)],
) -> Result<Vec<RacerId>, ValidationError> {
    let mut entered = HashSet::with_capacity(entries.len());
    for (racer, _) in entries {
        if !heat.contains(racer) {
            return Err(ValidationError::ForeignRacer(racer.clone()));
        }
        if !entered.insert(racer.as_str()) {
            return Err(ValidationError::DuplicateRacer(racer.clone()));
        }
    }

    let k = heat.len();
    let mut slots: Vec<Option<RacerId>> = vec![None; k];

    for racer in &heat.racer_ids {
        let position = entries
            .iter()
            .find(|(id, _)| id == racer)
            .and_then(|(_, pos)| *pos)
            .ok_or_else(|| ValidationError::MissingPosition(racer.clone()))?;

        if position == 0 || position as usize > k {
            return Err(ValidationError::PositionOutOfRange {
                racer: racer.clone(),
                position,
                max: k as u32,
            });
        }

        let slot = &mut slots[position as usize - 1];
        if slot.is_some() {
            return Err(ValidationError::DuplicatePosition(position));
        }
        *slot = Some(racer.clone());
    }

    // Every racer filled a distinct slot in 1..=k, so no slot is empty.
    Ok(slots.into_iter().flatten().collect())
}

/// Validate a finish order and record it on a copy of the heat.
///
/// Position i of k earns `k - i + 1` points. The input heat is never
/// modified; on rejection the caller keeps the pending heat as it was.
pub fn validate_and_score_heat(
    heat: &Heat,
    finish_order: &[RacerId],
) -> Result<ScoredHeat, ValidationError> {
    if heat.status == HeatStatus::Completed {
        return Err(ValidationError::HeatAlreadyCompleted(heat.id.clone()));
    }

    if let Err(e) = validate_finish_order(heat, finish_order) {
        warn!(heat = %heat.id, error = %e, "rejected finish order");
        return Err(e);
    }

    let table = heat_points(heat.len());
    let results: Vec<HeatResult> = finish_order
        .iter()
        .zip(table)
        .enumerate()
        .map(|(index, (racer_id, points))| HeatResult {
            racer_id: racer_id.clone(),
            position: index as u32 + 1,
            points,
        })
        .collect();

    let points = results
        .iter()
        .map(|r| (r.racer_id.clone(), r.points))
        .collect();

    let scored = Heat {
        status: HeatStatus::Completed,
        results,
        ..heat.clone()
    };

    debug!(heat = %scored.id, racers = scored.len(), "heat scored");
    Ok(ScoredHeat { heat: scored, points })
}
