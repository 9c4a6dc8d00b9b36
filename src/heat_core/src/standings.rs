use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::event::{Event, Round};
use crate::racer::{Racer, RacerId};

/// One line of an event leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// 1-based place in the ranking
    pub position: u32,
    pub racer_id: RacerId,
    pub points: u32,
}

/// One line of the season leaderboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub position: u32,
    pub racer: Racer,
    pub season_points: u32,
}

/// Points each racer earned in one round's completed heats.
pub fn round_points(round: &Round) -> HashMap<RacerId, u32> {
    let mut points = HashMap::new();
    for heat in round.heats.iter().filter(|h| h.is_completed()) {
        for result in &heat.results {
            *points.entry(result.racer_id.clone()).or_insert(0) += result.points;
        }
    }
    points
}

/// Event points per racer over every round so far, in registration order.
///
/// Racers without a completed heat are listed with zero. This is the input to
/// next-round seeding; season totals play no part.
pub fn accumulated_points(event: &Event) -> Vec<(RacerId, u32)> {
    let mut totals: HashMap<RacerId, u32> = HashMap::new();
    for round in &event.rounds {
        for (racer, points) in round_points(round) {
            *totals.entry(racer).or_insert(0) += points;
        }
    }

    event
        .racers
        .iter()
        .map(|id| (id.clone(), totals.get(id).copied().unwrap_or(0)))
        .collect()
}

/// Rank an already summed points list, highest first, ties in input order.
pub fn rank_points(points: Vec<(RacerId, u32)>) -> Vec<RankedEntry> {
    let mut points = points;
    // sort_by is stable, which keeps tied racers in input order
    points.sort_by(|a, b| b.1.cmp(&a.1));
    points
        .into_iter()
        .enumerate()
        .map(|(index, (racer_id, points))| RankedEntry {
            position: index as u32 + 1,
            racer_id,
            points,
        })
        .collect()
}

/// Event leaderboard over every completed heat of every round.
pub fn compute_event_standings(event: &Event) -> Vec<RankedEntry> {
    rank_points(accumulated_points(event))
}

/// Add each racer's event total to their season points.
///
/// Returns updated copies in the input order; racers absent from `standings`
/// come back unchanged. Persisting the result, and calling this once per
/// event, is the caller's responsibility. [`finalize_event`] enforces the
/// latter.
///
/// [`finalize_event`]: crate::progression::finalize_event
pub fn apply_season_points(racers: &[Racer], standings: &[RankedEntry]) -> Vec<Racer> {
    let earned: HashMap<&str, u32> = standings
        .iter()
        .map(|e| (e.racer_id.as_str(), e.points))
        .collect();

    racers
        .iter()
        .map(|racer| match earned.get(racer.id.as_str()) {
            Some(&points) => racer.with_season_points_added(points),
            None => racer.clone(),
        })
        .collect()
}

/// Season leaderboard ranked by season points, ties in input order.
///
/// With a search term, only racers whose name or nickname contains it
/// (case-insensitive), or whose number contains it, are listed. Positions are
/// taken from the full ranking so a filtered view still shows true places.
pub fn season_leaderboard(racers: &[Racer], search: Option<&str>) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Racer> = racers.iter().collect();
    ranked.sort_by(|a, b| b.season_points.cmp(&a.season_points));

    ranked
        .into_iter()
        .enumerate()
        .filter(|(_, racer)| search.map_or(true, |term| racer.matches_search(term)))
        .map(|(index, racer)| LeaderboardEntry {
            position: index as u32 + 1,
            racer: racer.clone(),
            season_points: racer.season_points,
        })
        .collect()
}

/// Recompute season totals from the events already finalized.
///
/// Events are summed in parallel. Comparing the result with the stored
/// `season_points` detects totals that were applied twice or lost.
pub fn season_totals(events: &[Event]) -> HashMap<RacerId, u32> {
    events
        .par_iter()
        .filter(|event| event.season_points_applied)
        .map(|event| {
            compute_event_standings(event)
                .into_iter()
                .map(|e| (e.racer_id, e.points))
                .collect::<HashMap<_, _>>()
        })
        .reduce(HashMap::new, |mut acc, event_points| {
            for (racer, points) in event_points {
                *acc.entry(racer).or_insert(0) += points;
            }
            acc
        })
}
