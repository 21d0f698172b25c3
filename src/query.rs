//! Query kinds, request parameters and the cache fingerprint derived from
//! them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SPORT: &str = "football";

/// Which upstream provider serves a query kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderDomain {
    LiveScore,
    Analytics,
    MultiDivision,
}

impl ProviderDomain {
    pub const ALL: [ProviderDomain; 3] = [
        ProviderDomain::LiveScore,
        ProviderDomain::Analytics,
        ProviderDomain::MultiDivision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderDomain::LiveScore => "live-score",
            ProviderDomain::Analytics => "analytics",
            ProviderDomain::MultiDivision => "multi-division",
        }
    }
}

impl fmt::Display for ProviderDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    CurrentGame,
    Schedule,
    Scoreboard,
    Rankings,
    Analytics,
    Records,
    Betting,
    MultiDivisionScoreboard,
    MultiDivisionRankings,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::CurrentGame,
        QueryKind::Schedule,
        QueryKind::Scoreboard,
        QueryKind::Rankings,
        QueryKind::Analytics,
        QueryKind::Records,
        QueryKind::Betting,
        QueryKind::MultiDivisionScoreboard,
        QueryKind::MultiDivisionRankings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::CurrentGame => "current-game",
            QueryKind::Schedule => "schedule",
            QueryKind::Scoreboard => "scoreboard",
            QueryKind::Rankings => "rankings",
            QueryKind::Analytics => "analytics",
            QueryKind::Records => "records",
            QueryKind::Betting => "betting",
            QueryKind::MultiDivisionScoreboard => "multi-division-scoreboard",
            QueryKind::MultiDivisionRankings => "multi-division-rankings",
        }
    }

    pub fn provider(self) -> ProviderDomain {
        match self {
            QueryKind::CurrentGame
            | QueryKind::Schedule
            | QueryKind::Scoreboard
            | QueryKind::Rankings => ProviderDomain::LiveScore,
            QueryKind::Analytics | QueryKind::Records | QueryKind::Betting => {
                ProviderDomain::Analytics
            }
            QueryKind::MultiDivisionScoreboard | QueryKind::MultiDivisionRankings => {
                ProviderDomain::MultiDivision
            }
        }
    }

    /// Kinds that are meaningless without a team.
    pub fn requires_team(self) -> bool {
        matches!(
            self,
            QueryKind::CurrentGame
                | QueryKind::Schedule
                | QueryKind::Analytics
                | QueryKind::Records
                | QueryKind::Betting
        )
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        QueryKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown query kind `{}`", s))
    }
}

/// Caller-supplied parameters. Every field is optional; which ones matter
/// depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub team: Option<String>,
    pub sport: Option<String>,
    pub year: Option<i32>,
    pub date: Option<String>,
    pub division: Option<String>,
    pub poll: Option<String>,
}

impl QueryParams {
    pub fn team(name: impl Into<String>) -> Self {
        Self {
            team: Some(name.into()),
            ..Self::default()
        }
    }

    /// Lower-cased, whitespace-collapsed copy with blank values dropped and
    /// the default sport filled in.
    pub fn normalized(&self) -> Self {
        Self {
            team: clean(self.team.as_deref()),
            sport: clean(self.sport.as_deref()).or_else(|| Some(DEFAULT_SPORT.to_string())),
            year: self.year,
            date: clean(self.date.as_deref()),
            division: clean(self.division.as_deref()),
            poll: clean(self.poll.as_deref()),
        }
    }

    pub fn sport_or_default(&self) -> &str {
        self.sport.as_deref().unwrap_or(DEFAULT_SPORT)
    }

    fn pairs(&self) -> BTreeMap<&'static str, String> {
        let mut out = BTreeMap::new();
        if let Some(v) = &self.team {
            out.insert("team", v.clone());
        }
        if let Some(v) = &self.sport {
            out.insert("sport", v.clone());
        }
        if let Some(v) = self.year {
            out.insert("year", v.to_string());
        }
        if let Some(v) = &self.date {
            out.insert("date", v.clone());
        }
        if let Some(v) = &self.division {
            out.insert("division", v.clone());
        }
        if let Some(v) = &self.poll {
            out.insert("poll", v.clone());
        }
        out
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    let collapsed = value?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Deterministic cache key for a logical request.
///
/// Built from the kind and the normalized parameters in name order, so case,
/// surrounding whitespace and the order parameters were supplied in never
/// change the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(kind: QueryKind, params: &QueryParams) -> Self {
        let mut key = String::from(kind.as_str());
        for (name, value) in params.normalized().pairs() {
            key.push('|');
            key.push_str(name);
            key.push('=');
            key.push_str(&value);
        }
        Fingerprint(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
