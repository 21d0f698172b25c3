//! Advanced-analytics provider: season efficiency stats, win/loss records and
//! betting lines.
//!
//! All three endpoints return arrays filtered by `year` and `team`. Stat
//! names are mapped onto fixed snake_case keys; a null from the provider is
//! kept as an absent stat.

use super::{
    decode, optional_number, parse_score, require_team, same_team, team_ref, unsupported,
    FlexNumber, Provider,
};
use crate::error::{NormalizationError, QueryError};
use crate::model::{CanonicalResult, StatBlock, StatCategory, StatSection};
use crate::query::{ProviderDomain, QueryKind, QueryParams};
use crate::teams::TeamDirectory;
use crate::upstream::UpstreamRequest;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const PROVIDER: &str = "analytics";

/// Preferred line source when a game lists several.
const CONSENSUS_PROVIDER: &str = "consensus";

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAdvancedSeason {
    pub season: Option<i32>,
    pub team: Option<String>,
    pub offense: Option<RawAdvancedSide>,
    pub defense: Option<RawAdvancedSide>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAdvancedSide {
    pub plays: Option<f64>,
    pub drives: Option<f64>,
    pub ppa: Option<f64>,
    pub success_rate: Option<f64>,
    pub explosiveness: Option<f64>,
    pub power_success: Option<f64>,
    pub stuff_rate: Option<f64>,
    pub line_yards: Option<f64>,
    pub points_per_opportunity: Option<f64>,
}

impl RawAdvancedSide {
    fn into_section(self, name: &str) -> StatSection {
        let stats = [
            ("plays", self.plays),
            ("drives", self.drives),
            ("points_added_per_play", self.ppa),
            ("success_rate", self.success_rate),
            ("explosiveness", self.explosiveness),
            ("power_success", self.power_success),
            ("stuff_rate", self.stuff_rate),
            ("line_yards", self.line_yards),
            ("points_per_opportunity", self.points_per_opportunity),
        ];
        StatSection {
            name: name.to_string(),
            stats: stats.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRecord {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub total: Option<RawWinLoss>,
    pub conference_games: Option<RawWinLoss>,
    pub home_games: Option<RawWinLoss>,
    pub away_games: Option<RawWinLoss>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawWinLoss {
    pub games: Option<u32>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub ties: Option<u32>,
}

impl RawWinLoss {
    fn section(&self, name: &str) -> StatSection {
        let stats = [
            ("games", self.games),
            ("wins", self.wins),
            ("losses", self.losses),
            ("ties", self.ties),
        ];
        StatSection {
            name: name.to_string(),
            stats: stats
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.map(f64::from)))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGameLines {
    pub id: Option<Value>,
    pub season: Option<i32>,
    pub week: Option<u32>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub(crate) home_score: Option<FlexNumber>,
    pub(crate) away_score: Option<FlexNumber>,
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLine {
    pub provider: Option<String>,
    pub(crate) spread: Option<FlexNumber>,
    pub(crate) spread_open: Option<FlexNumber>,
    pub(crate) over_under: Option<FlexNumber>,
    pub(crate) over_under_open: Option<FlexNumber>,
    pub(crate) home_moneyline: Option<FlexNumber>,
    pub(crate) away_moneyline: Option<FlexNumber>,
}

pub struct AnalyticsProvider {
    teams: Arc<dyn TeamDirectory>,
}

impl AnalyticsProvider {
    pub fn new(teams: Arc<dyn TeamDirectory>) -> Self {
        Self { teams }
    }

    fn advanced(
        &self,
        rows: Vec<RawAdvancedSeason>,
        team: &str,
    ) -> Result<Option<StatBlock>, NormalizationError> {
        let Some(row) = self.row_for_team(rows, team, |r| r.team.as_deref())? else {
            return Ok(None);
        };
        let name = row.team.unwrap_or_default();
        let offense = row
            .offense
            .ok_or_else(|| NormalizationError::missing(PROVIDER, "offense"))?;
        let defense = row
            .defense
            .ok_or_else(|| NormalizationError::missing(PROVIDER, "defense"))?;

        Ok(Some(StatBlock {
            team: team_ref(self.teams.as_ref(), &name),
            season: row.season,
            category: StatCategory::Advanced,
            sections: vec![offense.into_section("offense"), defense.into_section("defense")],
        }))
    }

    fn records(&self, rows: Vec<RawRecord>, team: &str) -> Result<Option<StatBlock>, NormalizationError> {
        let Some(row) = self.row_for_team(rows, team, |r| r.team.as_deref())? else {
            return Ok(None);
        };
        let total = row
            .total
            .as_ref()
            .ok_or_else(|| NormalizationError::missing(PROVIDER, "total"))?;
        if total.wins.is_none() || total.losses.is_none() {
            return Err(NormalizationError::missing(PROVIDER, "total.wins/total.losses"));
        }

        let mut sections = vec![total.section("total")];
        for (name, split) in [
            ("conference", &row.conference_games),
            ("home", &row.home_games),
            ("away", &row.away_games),
        ] {
            if let Some(split) = split {
                sections.push(split.section(name));
            }
        }

        Ok(Some(StatBlock {
            team: team_ref(self.teams.as_ref(), row.team.as_deref().unwrap_or_default()),
            season: row.year,
            category: StatCategory::Records,
            sections,
        }))
    }

    fn betting(
        &self,
        games: Vec<RawGameLines>,
        team: &str,
        year: i32,
    ) -> Result<Option<StatBlock>, NormalizationError> {
        let mut sections = Vec::new();
        let mut subject = None;

        for game in &games {
            let home = game
                .home_team
                .as_deref()
                .ok_or_else(|| NormalizationError::missing(PROVIDER, "homeTeam"))?;
            let away = game
                .away_team
                .as_deref()
                .ok_or_else(|| NormalizationError::missing(PROVIDER, "awayTeam"))?;

            let line = game
                .lines
                .iter()
                .find(|l| {
                    l.provider
                        .as_deref()
                        .is_some_and(|p| p.eq_ignore_ascii_case(CONSENSUS_PROVIDER))
                })
                .or_else(|| game.lines.first());
            let Some(line) = line else {
                continue;
            };

            if subject.is_none() {
                subject = [home, away]
                    .into_iter()
                    .find(|name| same_team(self.teams.as_ref(), name, team));
            }

            let mut stats = BTreeMap::new();
            for (key, raw) in [
                ("spread", &line.spread),
                ("spread_open", &line.spread_open),
                ("over_under", &line.over_under),
                ("over_under_open", &line.over_under_open),
                ("home_moneyline", &line.home_moneyline),
                ("away_moneyline", &line.away_moneyline),
            ] {
                stats.insert(key.to_string(), optional_number(PROVIDER, key, raw.as_ref())?);
            }
            for (key, raw) in [("home_score", &game.home_score), ("away_score", &game.away_score)] {
                let score = parse_score(PROVIDER, key, raw.as_ref())?;
                stats.insert(key.to_string(), score.map(f64::from));
            }

            let week = game.week.map(|w| format!(" (week {})", w)).unwrap_or_default();
            sections.push(StatSection {
                name: format!("{} @ {}{}", away, home, week),
                stats,
            });
        }

        if sections.is_empty() {
            return Ok(None);
        }

        Ok(Some(StatBlock {
            team: team_ref(self.teams.as_ref(), subject.unwrap_or(team)),
            season: games.iter().find_map(|g| g.season).or(Some(year)),
            category: StatCategory::Betting,
            sections,
        }))
    }

    /// Pick the row for the requested team. The provider filters by team
    /// already, but some endpoints match on substrings.
    fn row_for_team<T>(
        &self,
        rows: Vec<T>,
        team: &str,
        name_of: impl Fn(&T) -> Option<&str>,
    ) -> Result<Option<T>, NormalizationError> {
        for row in &rows {
            if name_of(row).is_none() {
                return Err(NormalizationError::missing(PROVIDER, "team"));
            }
        }
        Ok(rows
            .into_iter()
            .find(|row| name_of(row).is_some_and(|name| same_team(self.teams.as_ref(), name, team))))
    }
}

/// Season that is current for college football: the season year rolls over
/// in August.
pub fn current_season() -> i32 {
    let today = Utc::now().date_naive();
    if today.month() >= 8 {
        today.year()
    } else {
        today.year() - 1
    }
}

impl Provider for AnalyticsProvider {
    const DOMAIN: ProviderDomain = ProviderDomain::Analytics;

    fn request(&self, kind: QueryKind, params: &QueryParams) -> Result<UpstreamRequest, QueryError> {
        let path = match kind {
            QueryKind::Analytics => "/stats/season/advanced",
            QueryKind::Records => "/records",
            QueryKind::Betting => "/lines",
            other => return Err(unsupported(Self::DOMAIN, other)),
        };
        if params.sport_or_default() != "football" {
            return Err(QueryError::InvalidQuery(format!(
                "{} only covers football",
                Self::DOMAIN
            )));
        }
        let team = require_team(kind, params)?;
        // The provider filters on the exact school spelling
        let school = self
            .teams
            .resolve(team)
            .and_then(|id| self.teams.school_name(&id))
            .unwrap_or_else(|| team.to_string());

        Ok(UpstreamRequest::new(path)
            .param("year", params.year.unwrap_or_else(current_season))
            .param("team", school))
    }

    fn normalize(
        &self,
        kind: QueryKind,
        params: &QueryParams,
        payload: Value,
    ) -> Result<Option<CanonicalResult>, NormalizationError> {
        let team = params.team.as_deref().unwrap_or_default();
        let block = match kind {
            QueryKind::Analytics => self.advanced(decode(PROVIDER, payload)?, team)?,
            QueryKind::Records => self.records(decode(PROVIDER, payload)?, team)?,
            QueryKind::Betting => {
                let year = params.year.unwrap_or_else(current_season);
                self.betting(decode(PROVIDER, payload)?, team, year)?
            }
            other => {
                return Err(NormalizationError::new(
                    PROVIDER,
                    format!("no normalizer for `{}`", other),
                ))
            }
        };
        Ok(block.map(CanonicalResult::StatBlock))
    }
}
