use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::StateError;
use crate::racer::RacerId;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Nine lowercase base-36 characters drawn from `rng`.
pub fn new_heat_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatStatus {
    #[default]
    Pending,
    Completed,
}

/// One racer's finish in a completed heat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatResult {
    pub racer_id: RacerId,

    /// 1-based finishing place
    pub position: u32,

    /// Derived from position and heat size, never edited directly
    pub points: u32,
}

/// A single race among at most `racers_per_heat` racers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heat {
    pub id: String,

    pub racer_ids: Vec<RacerId>,

    #[serde(default)]
    pub status: HeatStatus,

    /// Empty while pending; ordered by position once completed
    #[serde(default)]
    pub results: Vec<HeatResult>,
}

impl Heat {
    /// A pending heat with no results.
    pub fn new(id: impl Into<String>, racer_ids: Vec<RacerId>) -> Self {
        Heat {
            id: id.into(),
            racer_ids,
            status: HeatStatus::Pending,
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.racer_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.racer_ids.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.status == HeatStatus::Completed
    }

    pub fn contains(&self, racer_id: &str) -> bool {
        self.racer_ids.iter().any(|r| r == racer_id)
    }

    /// Points earned by `racer_id`, or `None` if pending or not in this heat.
    pub fn points_for(&self, racer_id: &str) -> Option<u32> {
        self.results
            .iter()
            .find(|r| r.racer_id == racer_id)
            .map(|r| r.points)
    }

    /// Checks the pending/completed result invariants.
    pub fn check_consistency(&self) -> Result<(), StateError> {
        if self.racer_ids.is_empty() {
            return Err(StateError::EmptyHeat(self.id.clone()));
        }

        match self.status {
            HeatStatus::Pending if !self.results.is_empty() => {
                Err(StateError::PendingHeatHasResults(self.id.clone()))
            }
            HeatStatus::Pending => Ok(()),
            HeatStatus::Completed => {
                if self.results_are_bijection() {
                    Ok(())
                } else {
                    Err(StateError::CorruptResults(self.id.clone()))
                }
            }
        }
    }

    fn results_are_bijection(&self) -> bool {
        let k = self.racer_ids.len();
        if self.results.len() != k {
            return false;
        }

        let mut racers = HashSet::with_capacity(k);
        let mut positions = HashSet::with_capacity(k);
        for result in &self.results {
            let position = result.position as usize;
            if position == 0 || position > k {
                return false;
            }
            if result.points as usize != k - position + 1 {
                return false;
            }
            if !self.contains(&result.racer_id) {
                return false;
            }
            if !racers.insert(result.racer_id.as_str()) || !positions.insert(position) {
                return false;
            }
        }
        true
    }
}
