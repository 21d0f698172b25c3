//! Freshness classes and the TTL each one buys.
//!
//! Classification is a pure function of the query kind and the normalized
//! result; it never looks at the wall clock.

use crate::model::{CanonicalResult, GameStatus};
use crate::query::QueryKind;
use serde::Serialize;
use std::time::Duration;

const LIVE_TTL_SECS: u64 = 60;
const UPCOMING_TTL_SECS: u64 = 6 * 60 * 60;
const DAY_SECS: u64 = 24 * 60 * 60;
const MULTI_DIVISION_TTL_SECS: u64 = 300;
const SCOREBOARD_LIVE_TTL_SECS: u64 = 60;
const SCOREBOARD_IDLE_TTL_SECS: u64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessClass {
    Live,
    Completed,
    Upcoming,
    Schedule,
    Rankings,
    Analytics,
    /// `any_live` is set for scoreboard-style game lists and picks the
    /// short or long scoreboard TTL.
    MultiDivision { any_live: Option<bool> },
}

impl FreshnessClass {
    pub fn ttl(self) -> Duration {
        let secs = match self {
            FreshnessClass::Live => LIVE_TTL_SECS,
            FreshnessClass::Upcoming => UPCOMING_TTL_SECS,
            FreshnessClass::Completed
            | FreshnessClass::Schedule
            | FreshnessClass::Rankings => DAY_SECS,
            FreshnessClass::Analytics => UPCOMING_TTL_SECS,
            FreshnessClass::MultiDivision { any_live: None } => MULTI_DIVISION_TTL_SECS,
            FreshnessClass::MultiDivision { any_live: Some(true) } => SCOREBOARD_LIVE_TTL_SECS,
            FreshnessClass::MultiDivision { any_live: Some(false) } => SCOREBOARD_IDLE_TTL_SECS,
        };
        Duration::from_secs(secs)
    }
}

/// Decide the freshness class for a normalized result.
pub fn classify(kind: QueryKind, result: &CanonicalResult) -> FreshnessClass {
    if kind == QueryKind::MultiDivisionRankings {
        return FreshnessClass::MultiDivision { any_live: None };
    }

    match result {
        CanonicalResult::Game(game) => match game.status {
            GameStatus::Live => FreshnessClass::Live,
            GameStatus::Final => FreshnessClass::Completed,
            GameStatus::Scheduled => FreshnessClass::Upcoming,
        },
        // The whole list is scanned: one live game is enough for the short TTL.
        CanonicalResult::GameList(list) => FreshnessClass::MultiDivision {
            any_live: Some(list.any_live()),
        },
        CanonicalResult::RankingList(_) => FreshnessClass::Rankings,
        CanonicalResult::ScheduleList(_) => FreshnessClass::Schedule,
        CanonicalResult::StatBlock(_) => FreshnessClass::Analytics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{game, team};
    use crate::model::{GameList, RankingList, ScheduleList, StatBlock, StatCategory};

    #[test]
    fn test_single_game_follows_status() {
        let live = CanonicalResult::Game(game("1", GameStatus::Live, Some(24), Some(17)));
        let done = CanonicalResult::Game(game("2", GameStatus::Final, Some(31), Some(10)));
        let soon = CanonicalResult::Game(game("3", GameStatus::Scheduled, None, None));

        assert_eq!(classify(QueryKind::CurrentGame, &live), FreshnessClass::Live);
        assert_eq!(classify(QueryKind::CurrentGame, &done), FreshnessClass::Completed);
        assert_eq!(classify(QueryKind::CurrentGame, &soon), FreshnessClass::Upcoming);
        assert_eq!(classify(QueryKind::CurrentGame, &live).ttl(), Duration::from_secs(60));
        assert_eq!(classify(QueryKind::CurrentGame, &soon).ttl(), Duration::from_secs(21_600));
        assert_eq!(classify(QueryKind::CurrentGame, &done).ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_one_live_game_dominates_scoreboard() {
        let mut games: Vec<_> = (0..4)
            .map(|i| game(&i.to_string(), GameStatus::Final, Some(21), Some(14)))
            .collect();
        games.push(game("live", GameStatus::Live, Some(3), Some(0)));
        let board = CanonicalResult::GameList(GameList { games });

        let class = classify(QueryKind::MultiDivisionScoreboard, &board);
        assert_eq!(class, FreshnessClass::MultiDivision { any_live: Some(true) });
        assert_eq!(class.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_idle_scoreboard_uses_long_ttl() {
        let board = CanonicalResult::GameList(GameList {
            games: vec![
                game("a", GameStatus::Final, Some(7), Some(6)),
                game("b", GameStatus::Scheduled, None, None),
            ],
        });
        assert_eq!(classify(QueryKind::Scoreboard, &board).ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_content_blind_classes() {
        let rankings = CanonicalResult::RankingList(RankingList {
            poll: "ap".into(),
            season: Some(2024),
            week: Some(6),
            entries: vec![],
        });
        let schedule = CanonicalResult::ScheduleList(ScheduleList {
            team: team("Texas"),
            games: vec![game("x", GameStatus::Live, Some(1), Some(0))],
        });
        let stats = CanonicalResult::StatBlock(StatBlock {
            team: team("Texas"),
            season: Some(2024),
            category: StatCategory::Advanced,
            sections: vec![],
        });

        assert_eq!(classify(QueryKind::Rankings, &rankings), FreshnessClass::Rankings);
        assert_eq!(classify(QueryKind::Schedule, &schedule), FreshnessClass::Schedule);
        assert_eq!(classify(QueryKind::Analytics, &stats), FreshnessClass::Analytics);
        assert_eq!(classify(QueryKind::Analytics, &stats).ttl(), Duration::from_secs(21_600));
        assert_eq!(
            classify(QueryKind::MultiDivisionRankings, &rankings).ttl(),
            Duration::from_secs(300)
        );
    }
}
