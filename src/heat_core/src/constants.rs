use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Smallest heat that still makes a race
pub const MIN_RACERS_PER_HEAT: usize = 2;

/// An event needs at least one round
pub const MIN_TOTAL_ROUNDS: u32 = 1;

/// Heat capacity offered when an event is created without one
pub const DEFAULT_RACERS_PER_HEAT: usize = 4;

/// Largest heat an event may be configured with
///
/// Keeps every points table and heat total well inside `u32`.
pub const MAX_RACERS_PER_HEAT: usize = 1000;

/// Round count offered when an event is created without one
pub const DEFAULT_TOTAL_ROUNDS: u32 = 3;

/// Points table for a heat of `heat_size` racers, indexed by finishing position - 1.
///
/// First place earns `heat_size` points, each following place one fewer, and
/// last place always earns 1. Sizes past `u32::MAX` are clamped; configured
/// events never exceed [`MAX_RACERS_PER_HEAT`].
pub fn heat_points(heat_size: usize) -> Vec<u32> {
    let k = u32::try_from(heat_size).unwrap_or(u32::MAX);
    (1..=k).rev().collect()
}

/// Total points handed out by a completed heat of `heat_size` racers.
///
/// Saturates at `u32::MAX`, which first happens at 92,682 racers.
pub fn heat_points_total(heat_size: usize) -> u32 {
    let k = heat_size as u128;
    u32::try_from(k * (k + 1) / 2).unwrap_or(u32::MAX)
}

/// Random source for seeding and heat ids.
///
/// A fixed seed gives a reproducible bracket; `None` draws a fresh seed from
/// the operating system.
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_heat_points_descending() {
        assert_eq!(heat_points(4), vec![4, 3, 2, 1]);
        assert_eq!(heat_points(2), vec![2, 1]);
        assert!(heat_points(0).is_empty());
    }

    #[test]
    fn test_heat_points_total_matches_table() {
        for k in 0..12 {
            assert_eq!(heat_points(k).iter().sum::<u32>(), heat_points_total(k));
        }
    }

    #[test]
    fn test_heat_points_total_at_limits() {
        let k = MAX_RACERS_PER_HEAT;
        assert_eq!(heat_points_total(k), heat_points(k).iter().sum::<u32>());
        assert_eq!(heat_points(k)[0], k as u32);

        assert_eq!(heat_points_total(92_681), 4_294_930_221);
        assert_eq!(heat_points_total(92_682), u32::MAX);
        assert_eq!(heat_points_total(usize::MAX / 2), u32::MAX);
    }

    #[test]
    fn test_rng_from_seed_deterministic() {
        let a: u64 = rng_from_seed(Some(7)).gen();
        let b: u64 = rng_from_seed(Some(7)).gen();
        assert_eq!(a, b);
    }
}
