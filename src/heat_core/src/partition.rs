use rand::Rng;

use crate::heat::{new_heat_id, Heat};
use crate::racer::RacerId;

/// Number of heats needed for `pool_size` racers at `racers_per_heat` each.
pub fn heat_count(pool_size: usize, racers_per_heat: usize) -> usize {
    pool_size.div_ceil(racers_per_heat)
}

/// Split an ordered racer sequence into pending heats.
///
/// Heats are filled in input order. Every heat but the last holds exactly
/// `racers_per_heat` racers; the last holds the remainder. An empty sequence
/// produces no heats. Heat ids are drawn from `rng`.
///
/// # Panics
/// If `racers_per_heat` is zero. Event configuration rejects capacities below
/// [`MIN_RACERS_PER_HEAT`](crate::constants::MIN_RACERS_PER_HEAT) long before
/// this point.
pub fn partition_heats<R: Rng + ?Sized>(
    order: &[RacerId],
    racers_per_heat: usize,
    rng: &mut R,
) -> Vec<Heat> {
    assert!(racers_per_heat > 0, "heat capacity must be positive");

    order
        .chunks(racers_per_heat)
        .map(|chunk| Heat::new(new_heat_id(rng), chunk.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::rng_from_seed;
    use crate::heat::HeatStatus;

    fn pool(n: usize) -> Vec<RacerId> {
        (0..n).map(|i| format!("R{}", i)).collect()
    }

    #[test]
    fn test_seven_racers_four_per_heat() {
        let mut rng = rng_from_seed(Some(1));
        let heats = partition_heats(&pool(7), 4, &mut rng);

        assert_eq!(heats.len(), 2);
        assert_eq!(heats[0].racer_ids, pool(7)[..4].to_vec());
        assert_eq!(heats[1].racer_ids, pool(7)[4..].to_vec());
        assert!(heats.iter().all(|h| h.status == HeatStatus::Pending && h.results.is_empty()));
    }

    #[test]
    fn test_empty_pool_no_heats() {
        let mut rng = rng_from_seed(Some(1));
        assert!(partition_heats(&[], 4, &mut rng).is_empty());
        assert_eq!(heat_count(0, 4), 0);
    }

    #[test]
    fn test_exact_multiple() {
        let mut rng = rng_from_seed(Some(1));
        let heats = partition_heats(&pool(8), 4, &mut rng);
        assert_eq!(heats.len(), 2);
        assert!(heats.iter().all(|h| h.len() == 4));
    }

    #[test]
    fn test_single_racer_remainder() {
        let mut rng = rng_from_seed(Some(1));
        let heats = partition_heats(&pool(5), 2, &mut rng);
        assert_eq!(heats.len(), heat_count(5, 2));
        assert_eq!(heats[2].racer_ids, vec!["R4".to_string()]);
    }

    #[test]
    fn test_heat_ids_distinct() {
        let mut rng = rng_from_seed(Some(9));
        let heats = partition_heats(&pool(40), 3, &mut rng);
        let mut ids: Vec<_> = heats.iter().map(|h| h.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), heats.len());
    }
}
