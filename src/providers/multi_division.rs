//! Multi-division provider: scoreboards and polls for every NCAA division.
//!
//! Games carry `gameState` as `pre` / `live` / `final` (older feeds send
//! `P` / `I` / `F`), scores as strings that are empty before kickoff, and
//! polls as rows keyed by upper-case column titles.

use super::{decode, optional_number, parse_score, unsupported, FlexNumber, Provider};
use crate::error::{NormalizationError, QueryError};
use crate::model::{CanonicalResult, Game, GameList, GameStatus, RankingEntry, RankingList, TeamRef};
use crate::query::{ProviderDomain, QueryKind, QueryParams};
use crate::teams::TeamDirectory;
use crate::upstream::UpstreamRequest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const PROVIDER: &str = "multi-division";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ScoreboardPayload {
    pub games: Vec<RawGameWrapper>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawGameWrapper {
    pub game: Option<RawGame>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGame {
    #[serde(rename = "gameID")]
    pub game_id: Option<Value>,
    pub game_state: Option<String>,
    pub start_time_epoch: Option<Value>,
    pub current_period: Option<String>,
    pub contest_clock: Option<String>,
    pub network: Option<String>,
    pub home: Option<RawSide>,
    pub away: Option<RawSide>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawSide {
    pub(crate) score: Option<FlexNumber>,
    pub names: Option<RawNames>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawNames {
    pub short: Option<String>,
    pub full: Option<String>,
    pub char6: Option<String>,
}

impl RawNames {
    fn best(&self) -> Option<&str> {
        self.short
            .as_deref()
            .or(self.full.as_deref())
            .or(self.char6.as_deref())
            .filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RankingsPayload {
    pub title: Option<String>,
    pub data: Vec<RawRankingRow>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawRankingRow {
    #[serde(rename = "RANK")]
    pub rank: Option<String>,
    #[serde(rename = "SCHOOL", alias = "SCHOOL (1ST VOTES)", alias = "TEAM")]
    pub school: Option<String>,
    #[serde(rename = "POINTS")]
    pub(crate) points: Option<FlexNumber>,
    #[serde(rename = "PREVIOUS", alias = "PREV")]
    pub previous: Option<String>,
    #[serde(rename = "RECORD", alias = "W-L")]
    pub record: Option<String>,
}

/// Map the provider's `gameState` vocabulary onto [`GameStatus`].
pub fn map_game_state(state: &str) -> Result<GameStatus, NormalizationError> {
    match state.trim().to_ascii_lowercase().as_str() {
        "pre" | "p" | "scheduled" => Ok(GameStatus::Scheduled),
        "live" | "i" | "in" => Ok(GameStatus::Live),
        "final" | "f" => Ok(GameStatus::Final),
        _ => Err(NormalizationError::invalid(PROVIDER, "gameState", state)),
    }
}

/// Split "Ohio St. (50)" into the school and its first-place votes.
fn split_first_place_votes(school: &str) -> (&str, Option<u32>) {
    let trimmed = school.trim();
    if let Some(open) = trimmed.rfind('(') {
        if let Some(votes) = trimmed[open + 1..]
            .strip_suffix(')')
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            return (trimmed[..open].trim_end(), Some(votes));
        }
    }
    (trimmed, None)
}

fn parse_rank(raw: &str) -> Option<u32> {
    raw.trim().trim_start_matches("T-").parse().ok()
}

pub struct MultiDivisionProvider {
    teams: Arc<dyn TeamDirectory>,
}

impl MultiDivisionProvider {
    pub fn new(teams: Arc<dyn TeamDirectory>) -> Self {
        Self { teams }
    }

    /// Provider sport slug.
    fn sport(params: &QueryParams) -> Result<&'static str, QueryError> {
        match params.sport_or_default() {
            "football" | "college-football" => Ok("football"),
            "basketball" | "mens-basketball" | "basketball-men" => Ok("basketball-men"),
            "womens-basketball" | "basketball-women" => Ok("basketball-women"),
            other => Err(QueryError::InvalidQuery(format!("unsupported sport `{}`", other))),
        }
    }

    fn division(sport: &str, params: &QueryParams) -> Result<&'static str, QueryError> {
        let divisions: &[&'static str] = match sport {
            "football" => &["fbs", "fcs", "d2", "d3"],
            _ => &["d1", "d2", "d3"],
        };
        match params.division.as_deref() {
            None => Ok(divisions[0]),
            Some(wanted) => divisions
                .iter()
                .find(|d| **d == wanted)
                .copied()
                .ok_or_else(|| {
                    QueryError::InvalidQuery(format!("unknown {} division `{}`", sport, wanted))
                }),
        }
    }

    fn poll_slug(poll: Option<&str>) -> Option<&'static str> {
        match poll {
            None | Some("ap") | Some("associated-press") => Some("associated-press"),
            Some("coaches") | Some("usa-today-coaches") => Some("usa-today-coaches"),
            Some("cfp") | Some("playoff") | Some("college-football-playoff") => {
                Some("college-football-playoff")
            }
            Some(_) => None,
        }
    }

    fn date_path(date: &str) -> Result<String, QueryError> {
        let parsed = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
            .ok_or_else(|| QueryError::InvalidQuery(format!("unrecognised date `{}`", date)))?;
        Ok(parsed.format("%Y/%m/%d").to_string())
    }

    fn team(&self, side: Option<&RawSide>, label: &str) -> Result<(TeamRef, Option<u32>), NormalizationError> {
        let side = side.ok_or_else(|| NormalizationError::missing(PROVIDER, label))?;
        let name = side
            .names
            .as_ref()
            .and_then(RawNames::best)
            .ok_or_else(|| NormalizationError::missing(PROVIDER, &format!("{}.names", label)))?;
        let score = parse_score(PROVIDER, &format!("{}.score", label), side.score.as_ref())?;
        Ok((
            TeamRef {
                name: name.to_string(),
                id: self.teams.resolve(name),
            },
            score,
        ))
    }

    fn normalize_game(&self, game: &RawGame) -> Result<Game, NormalizationError> {
        let id = game
            .game_id
            .as_ref()
            .and_then(value_string)
            .ok_or_else(|| NormalizationError::missing(PROVIDER, "gameID"))?;
        let status = map_game_state(
            game.game_state
                .as_deref()
                .ok_or_else(|| NormalizationError::missing(PROVIDER, "gameState"))?,
        )?;
        let (home, home_score) = self.team(game.home.as_ref(), "home")?;
        let (away, away_score) = self.team(game.away.as_ref(), "away")?;

        let start_time = game
            .start_time_epoch
            .as_ref()
            .and_then(value_string)
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        let period = game.current_period.as_deref().and_then(|p| {
            let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        });

        Ok(Game {
            id,
            status,
            home,
            away,
            home_score,
            away_score,
            start_time,
            venue: None,
            broadcast: game.network.clone().filter(|n| !n.trim().is_empty()),
            spread: None,
            period,
            clock: game
                .contest_clock
                .clone()
                .filter(|c| status == GameStatus::Live && !c.trim().is_empty()),
        })
    }

    fn normalize_rankings(
        &self,
        payload: RankingsPayload,
        poll: &str,
    ) -> Result<Option<RankingList>, NormalizationError> {
        let entries = payload
            .data
            .iter()
            .map(|row| {
                let rank_text = row
                    .rank
                    .as_deref()
                    .ok_or_else(|| NormalizationError::missing(PROVIDER, "RANK"))?;
                let rank = parse_rank(rank_text)
                    .ok_or_else(|| NormalizationError::invalid(PROVIDER, "RANK", rank_text))?;
                let school = row
                    .school
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| NormalizationError::missing(PROVIDER, "SCHOOL"))?;
                let (name, first_place_votes) = split_first_place_votes(school);

                Ok(RankingEntry {
                    rank,
                    team: TeamRef {
                        name: name.to_string(),
                        id: self.teams.resolve(name),
                    },
                    record: row.record.clone().filter(|r| !r.trim().is_empty()),
                    points: optional_number(PROVIDER, "POINTS", row.points.as_ref())?,
                    first_place_votes,
                    previous_rank: row.previous.as_deref().and_then(parse_rank),
                })
            })
            .collect::<Result<Vec<_>, NormalizationError>>()?;

        if entries.is_empty() {
            return Ok(None);
        }

        Ok(Some(RankingList {
            poll: payload.title.unwrap_or_else(|| poll.to_string()),
            season: None,
            week: None,
            entries,
        }))
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Provider for MultiDivisionProvider {
    const DOMAIN: ProviderDomain = ProviderDomain::MultiDivision;

    fn request(&self, kind: QueryKind, params: &QueryParams) -> Result<UpstreamRequest, QueryError> {
        let sport = Self::sport(params)?;
        let division = Self::division(sport, params)?;
        match kind {
            QueryKind::MultiDivisionScoreboard => {
                let mut path = format!("/scoreboard/{}/{}", sport, division);
                if let Some(date) = params.date.as_deref() {
                    path.push('/');
                    path.push_str(&Self::date_path(date)?);
                }
                Ok(UpstreamRequest::new(path))
            }
            QueryKind::MultiDivisionRankings => {
                let poll = Self::poll_slug(params.poll.as_deref()).ok_or_else(|| {
                    QueryError::InvalidQuery(format!(
                        "unknown poll `{}`",
                        params.poll.as_deref().unwrap_or_default()
                    ))
                })?;
                Ok(UpstreamRequest::new(format!(
                    "/rankings/{}/{}/{}",
                    sport, division, poll
                )))
            }
            other => Err(unsupported(Self::DOMAIN, other)),
        }
    }

    fn normalize(
        &self,
        kind: QueryKind,
        params: &QueryParams,
        payload: Value,
    ) -> Result<Option<CanonicalResult>, NormalizationError> {
        match kind {
            QueryKind::MultiDivisionScoreboard => {
                let payload: ScoreboardPayload = decode(PROVIDER, payload)?;
                let games = payload
                    .games
                    .iter()
                    .map(|wrapper| {
                        wrapper
                            .game
                            .as_ref()
                            .ok_or_else(|| NormalizationError::missing(PROVIDER, "games.game"))
                            .and_then(|g| self.normalize_game(g))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(CanonicalResult::GameList(GameList { games })))
            }
            QueryKind::MultiDivisionRankings => {
                let payload: RankingsPayload = decode(PROVIDER, payload)?;
                let poll = Self::poll_slug(params.poll.as_deref()).ok_or_else(|| {
                    NormalizationError::invalid(PROVIDER, "poll", params.poll.as_deref().unwrap_or_default())
                })?;
                Ok(self
                    .normalize_rankings(payload, poll)?
                    .map(CanonicalResult::RankingList))
            }
            other => Err(NormalizationError::new(
                PROVIDER,
                format!("no normalizer for `{}`", other),
            )),
        }
    }
}
