use serde::{Deserialize, Serialize};

/// Racer identifiers are opaque strings assigned at registration.
pub type RacerId = String;

/// A registered racer and their running season total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Racer {
    pub id: RacerId,

    pub name: String,

    /// Kart or bib number, free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,

    /// Points accumulated over every finalized event this season
    #[serde(default)]
    pub season_points: u32,
}

impl Racer {
    pub fn new(id: impl Into<RacerId>, name: impl Into<String>) -> Self {
        Racer {
            id: id.into(),
            name: name.into(),
            number: None,
            nickname: None,
            age_group: None,
            season_points: 0,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_age_group(mut self, age_group: impl Into<String>) -> Self {
        self.age_group = Some(age_group.into());
        self
    }

    /// Copy of this racer with `points` added to the season total.
    pub fn with_season_points_added(&self, points: u32) -> Self {
        Racer {
            season_points: self.season_points.saturating_add(points),
            ..self.clone()
        }
    }

    /// Case-insensitive match against name or nickname, or a substring of the number.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .nickname
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle))
            || self.number.as_deref().is_some_and(|n| n.contains(term))
    }
}
