use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{
    DEFAULT_RACERS_PER_HEAT, DEFAULT_TOTAL_ROUNDS, MAX_RACERS_PER_HEAT, MIN_RACERS_PER_HEAT,
    MIN_TOTAL_ROUNDS,
};
use crate::error::{StateError, ValidationError};
use crate::heat::Heat;
use crate::racer::RacerId;

/// Round count and heat capacity chosen when an event is set up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub total_rounds: u32,
    pub racers_per_heat: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            racers_per_heat: DEFAULT_RACERS_PER_HEAT,
        }
    }
}

impl EventConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_rounds < MIN_TOTAL_ROUNDS {
            return Err(ValidationError::TotalRoundsTooSmall {
                got: self.total_rounds,
                min: MIN_TOTAL_ROUNDS,
            });
        }
        if self.racers_per_heat < MIN_RACERS_PER_HEAT {
            return Err(ValidationError::RacersPerHeatTooSmall {
                got: self.racers_per_heat,
                min: MIN_RACERS_PER_HEAT,
            });
        }
        if self.racers_per_heat > MAX_RACERS_PER_HEAT {
            return Err(ValidationError::RacersPerHeatTooLarge {
                got: self.racers_per_heat,
                max: MAX_RACERS_PER_HEAT,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// No round has been started
    Upcoming,
    InProgress,
    Completed,
}

/// One layer of heats covering every racer in the event once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: u32,
    pub heats: Vec<Heat>,
}

impl Round {
    pub fn new(round_number: u32, heats: Vec<Heat>) -> Self {
        Round { round_number, heats }
    }

    /// True exactly when every heat is completed.
    pub fn is_complete(&self) -> bool {
        self.heats.iter().all(Heat::is_completed)
    }

    /// Derived from heat states on every call.
    ///
    /// A round without heats counts as completed.
    pub fn status(&self) -> RoundStatus {
        if self.is_complete() {
            RoundStatus::Completed
        } else if self.heats.iter().any(Heat::is_completed) {
            RoundStatus::InProgress
        } else {
            RoundStatus::Pending
        }
    }

    pub fn heat(&self, heat_id: &str) -> Option<&Heat> {
        self.heats.iter().find(|h| h.id == heat_id)
    }
}

/// A race day: its configuration, entrants, and the rounds run so far.
///
/// Status is never stored; [`Event::status`] recomputes it from the rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,

    pub name: String,

    /// Calendar date as entered, e.g. `2024-06-01`
    pub date: String,

    pub total_rounds: u32,

    pub racers_per_heat: usize,

    /// Participating racers in registration order
    pub racers: Vec<RacerId>,

    #[serde(default)]
    pub rounds: Vec<Round>,

    /// Set once this event's standings have been added to season totals
    #[serde(default)]
    pub season_points_applied: bool,
}

impl Event {
    /// A new event with no rounds.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        date: impl Into<String>,
        config: EventConfig,
        racers: Vec<RacerId>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        if racers.is_empty() {
            return Err(ValidationError::InsufficientRacers {
                selected: 0,
                required: 1,
            });
        }

        let mut seen = HashSet::with_capacity(racers.len());
        for racer in &racers {
            if !seen.insert(racer.as_str()) {
                return Err(ValidationError::DuplicateEventRacer(racer.clone()));
            }
        }

        Ok(Event {
            id: id.into(),
            name: name.into(),
            date: date.into(),
            total_rounds: config.total_rounds,
            racers_per_heat: config.racers_per_heat,
            racers,
            rounds: Vec::new(),
            season_points_applied: false,
        })
    }

    pub fn config(&self) -> EventConfig {
        EventConfig {
            total_rounds: self.total_rounds,
            racers_per_heat: self.racers_per_heat,
        }
    }

    /// The latest round, if any has been started.
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// All configured rounds exist and the last one is completed.
    pub fn is_complete(&self) -> bool {
        self.rounds.len() == self.total_rounds as usize
            && self.current_round().is_some_and(Round::is_complete)
    }

    pub fn status(&self) -> EventStatus {
        if self.rounds.is_empty() {
            EventStatus::Upcoming
        } else if self.is_complete() {
            EventStatus::Completed
        } else {
            EventStatus::InProgress
        }
    }

    /// Locate a heat by id across every round.
    pub fn find_heat(&self, heat_id: &str) -> Option<(usize, usize)> {
        self.rounds.iter().enumerate().find_map(|(r, round)| {
            round
                .heats
                .iter()
                .position(|h| h.id == heat_id)
                .map(|h| (r, h))
        })
    }

    /// Reject snapshots that could not have been produced by the engine.
    ///
    /// Checks round numbering, round count, heat capacity, heat result
    /// invariants, that every heat racer is registered, and that no racer is
    /// placed twice in one round. Nothing is repaired.
    pub fn check_consistency(&self) -> Result<(), StateError> {
        if !(MIN_RACERS_PER_HEAT..=MAX_RACERS_PER_HEAT).contains(&self.racers_per_heat) {
            return Err(StateError::InvalidCapacity(self.racers_per_heat));
        }

        if self.rounds.len() > self.total_rounds as usize {
            return Err(StateError::TooManyRounds {
                created: self.rounds.len(),
                total: self.total_rounds,
            });
        }

        let registered: HashSet<&str> = self.racers.iter().map(String::as_str).collect();

        for (index, round) in self.rounds.iter().enumerate() {
            let position = index as u32 + 1;
            if round.round_number != position {
                return Err(StateError::RoundNumberMismatch {
                    position,
                    found: round.round_number,
                });
            }

            let mut placed = HashSet::new();
            for heat in &round.heats {
                if heat.len() > self.racers_per_heat {
                    return Err(StateError::HeatOverCapacity {
                        heat: heat.id.clone(),
                        size: heat.len(),
                        capacity: self.racers_per_heat,
                    });
                }

                heat.check_consistency()?;

                for racer in &heat.racer_ids {
                    if !registered.contains(racer.as_str()) {
                        return Err(StateError::UnregisteredRacer {
                            heat: heat.id.clone(),
                            racer: racer.clone(),
                        });
                    }
                    if !placed.insert(racer.as_str()) {
                        return Err(StateError::RacerInMultipleHeats {
                            round: position,
                            racer: racer.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
