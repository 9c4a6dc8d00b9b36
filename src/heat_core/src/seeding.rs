//! Ordering policy that decides which racers share a heat.
//!
//! Round 1 is a uniform shuffle. Later rounds put the leaders together: racers
//! are sorted by points accumulated in the event so far, highest first, with
//! ties broken at random. All randomness comes from the caller's `Rng`, so a
//! seeded generator reproduces the same bracket.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::heat::Heat;
use crate::partition::partition_heats;
use crate::racer::RacerId;

/// Uniform random permutation of the pool.
pub fn first_round_order<R: Rng + ?Sized>(pool: &[RacerId], rng: &mut R) -> Vec<RacerId> {
    let mut order = pool.to_vec();
    order.shuffle(rng);
    order
}

/// Points-descending order with a random tie-break.
///
/// Each racer draws one tie-break key up front and the sort uses it as a
/// secondary key, so every group of tied racers comes out in uniformly random
/// order while the comparison stays a total order.
pub fn next_round_order<R: Rng + ?Sized>(
    racer_points: &[(RacerId, u32)],
    rng: &mut R,
) -> Vec<RacerId> {
    let mut keyed: Vec<(u32, u64, &RacerId)> = racer_points
        .iter()
        .map(|(id, points)| (*points, rng.gen::<u64>(), id))
        .collect();

    keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id.clone()).collect()
}

/// Heats for the opening round of an event.
pub fn seed_and_partition_first_round<R: Rng + ?Sized>(
    racer_ids: &[RacerId],
    racers_per_heat: usize,
    rng: &mut R,
) -> Vec<Heat> {
    let order = first_round_order(racer_ids, rng);
    let heats = partition_heats(&order, racers_per_heat, rng);
    debug!(racers = racer_ids.len(), heats = heats.len(), "seeded first round");
    heats
}

/// Heats for a later round, seeded on accumulated event points.
pub fn seed_and_partition_next_round<R: Rng + ?Sized>(
    racer_points: &[(RacerId, u32)],
    racers_per_heat: usize,
    rng: &mut R,
) -> Vec<Heat> {
    let order = next_round_order(racer_points, rng);
    let heats = partition_heats(&order, racers_per_heat, rng);
    debug!(racers = racer_points.len(), heats = heats.len(), "seeded next round");
    heats
}
