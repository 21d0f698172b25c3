//! Canonical, provider-agnostic entity shapes.
//!
//! Nothing in here carries a provider's field names; each normalizer maps its
//! own raw payload onto these types. Optional data (venue, broadcast, point
//! spread, scores before kickoff) is `None` when the provider did not supply
//! it, never a stand-in value.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Canonical game status shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
}

impl GameStatus {
    /// Whether the game has kicked off, so a score is expected.
    pub fn has_started(self) -> bool {
        matches!(self, GameStatus::Live | GameStatus::Final)
    }
}

/// A team as it appeared in the payload, plus its canonical id when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub id: String,
    pub status: GameStatus,
    pub home: TeamRef,
    pub away: TeamRef,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub broadcast: Option<String>,
    /// Display form of the point spread, e.g. "OU -7.5".
    pub spread: Option<String>,
    pub period: Option<u32>,
    pub clock: Option<String>,
}

impl Game {
    /// True when the game has started but a score is missing.
    pub fn is_missing_score(&self) -> bool {
        self.status.has_started() && (self.home_score.is_none() || self.away_score.is_none())
    }

    pub fn involves(&self, team_id: &str) -> bool {
        self.home.id.as_deref() == Some(team_id) || self.away.id.as_deref() == Some(team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameList {
    pub games: Vec<Game>,
}

impl GameList {
    pub fn any_live(&self) -> bool {
        self.games.iter().any(|g| g.status == GameStatus::Live)
    }
}

/// Upcoming games for a single team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleList {
    pub team: TeamRef,
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub team: TeamRef,
    pub record: Option<String>,
    pub points: Option<f64>,
    pub first_place_votes: Option<u32>,
    pub previous_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingList {
    pub poll: String,
    pub season: Option<i32>,
    pub week: Option<u32>,
    pub entries: Vec<RankingEntry>,
}

/// Named group of numeric statistics; `None` marks a stat the provider left
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSection {
    pub name: String,
    pub stats: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatBlock {
    pub team: TeamRef,
    pub season: Option<i32>,
    pub category: StatCategory,
    pub sections: Vec<StatSection>,
}

impl StatBlock {
    pub fn section(&self, name: &str) -> Option<&StatSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Advanced,
    Records,
    Betting,
}

/// Every shape a query can resolve to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CanonicalResult {
    Game(Game),
    GameList(GameList),
    RankingList(RankingList),
    StatBlock(StatBlock),
    ScheduleList(ScheduleList),
}

impl CanonicalResult {
    /// Games contained in the result, for variants that carry any.
    pub fn games(&self) -> &[Game] {
        match self {
            CanonicalResult::Game(game) => std::slice::from_ref(game),
            CanonicalResult::GameList(list) => &list.games,
            CanonicalResult::ScheduleList(list) => &list.games,
            CanonicalResult::RankingList(_) | CanonicalResult::StatBlock(_) => &[],
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn team(name: &str) -> TeamRef {
        TeamRef {
            name: name.to_string(),
            id: Some(name.to_lowercase().replace(' ', "-")),
        }
    }

    pub fn game(id: &str, status: GameStatus, home_score: Option<u32>, away_score: Option<u32>) -> Game {
        Game {
            id: id.to_string(),
            status,
            home: team("Oklahoma"),
            away: team("Texas"),
            home_score,
            away_score,
            start_time: None,
            venue: None,
            broadcast: None,
            spread: None,
            period: None,
            clock: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::game;
    use super::*;

    #[test]
    fn test_missing_score_only_matters_after_kickoff() {
        assert!(!game("1", GameStatus::Scheduled, None, None).is_missing_score());
        assert!(game("2", GameStatus::Live, Some(7), None).is_missing_score());
        assert!(!game("3", GameStatus::Final, Some(0), Some(3)).is_missing_score());
    }

    #[test]
    fn test_canonical_json_uses_canonical_names() {
        let result = CanonicalResult::Game(game("401", GameStatus::Live, Some(24), Some(17)));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "game");
        assert_eq!(json["data"]["status"], "LIVE");
        assert_eq!(json["data"]["home_score"], 24);
        assert!(json["data"]["venue"].is_null());
    }
}
