//! Query orchestration: fingerprint, cache lookup, fetch, normalize,
//! classify, store.
//!
//! Each provider domain gets a [`ProviderService`] with its own cache store.
//! The [`Aggregator`] routes a query kind to the right service and is the
//! only entry point callers use.

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{QueryError, Result};
use crate::freshness::classify;
use crate::health::{ProviderHealth, ProviderHealthSnapshot};
use crate::model::{CanonicalResult, Game, GameList, GameStatus, ScheduleList};
use crate::providers::{AnalyticsProvider, LiveScoreProvider, MultiDivisionProvider, Provider};
use crate::query::{Fingerprint, ProviderDomain, QueryKind, QueryParams};
use crate::teams::TeamDirectory;
use crate::upstream::{HttpUpstream, Upstream};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Fetch/normalize/cache pipeline for one provider domain.
pub struct ProviderService<P: Provider> {
    provider: P,
    upstream: Arc<dyn Upstream>,
    cache: CacheStore,
    health: ProviderHealth,
    lookback: chrono::Duration,
}

impl<P: Provider> ProviderService<P> {
    pub fn new(provider: P, upstream: Arc<dyn Upstream>, cache: CacheStore) -> Self {
        Self {
            provider,
            upstream,
            cache,
            health: ProviderHealth::new(),
            lookback: chrono::Duration::days(DEFAULT_LOOKBACK_DAYS),
        }
    }

    /// How far back a finished game still counts as a team's current game.
    pub fn with_lookback(mut self, lookback: chrono::Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }

    pub async fn query(&self, kind: QueryKind, params: &QueryParams) -> Result<Arc<CanonicalResult>> {
        let provider = P::DOMAIN;
        let params = params.normalized();
        let fingerprint = Fingerprint::new(kind, &params);
        let request = self.provider.request(kind, &params)?;

        if let Some(hit) = self.cache.get_if_fresh(&fingerprint).await {
            debug!(%provider, %fingerprint, "cache hit");
            return Ok(hit);
        }
        debug!(%provider, %fingerprint, "cache miss");

        let payload = match self.upstream.get_json(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                self.health.record_upstream_error().await;
                warn!(%provider, %fingerprint, "Upstream fetch failed: {}", e);
                return Err(e.into());
            }
        };
        self.health.record_success().await;

        let normalized = match self.provider.normalize(kind, &params, payload) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.health.record_normalization_error().await;
                error!(%provider, %fingerprint, "Upstream contract violation: {}", e);
                return Err(e.into());
            }
        };

        let result = normalized
            .ok_or_else(|| not_found(kind, &params))
            .and_then(|r| narrow(kind, &params, r, Utc::now(), self.lookback))
            .map_err(|e| {
                debug!(%provider, %fingerprint, "{}", e);
                e
            })?;

        let freshness = classify(kind, &result);
        let result = Arc::new(result);

        if result.games().iter().any(Game::is_missing_score) {
            warn!(
                %provider,
                %fingerprint,
                "Started game without a score; returning uncached"
            );
            return Ok(result);
        }

        self.cache
            .set(fingerprint.clone(), Arc::clone(&result), freshness.ttl())
            .await;
        debug!(
            %provider,
            %fingerprint,
            ?freshness,
            ttl_secs = freshness.ttl().as_secs(),
            "cached"
        );
        Ok(result)
    }
}

fn not_found(kind: QueryKind, params: &QueryParams) -> QueryError {
    match params.team.as_deref() {
        Some(team) => QueryError::NotFound(format!("no {} data for {}", kind, team)),
        None => QueryError::NotFound(format!("no {} data", kind)),
    }
}

/// Reduce a normalized result to what the query kind asks for.
fn narrow(
    kind: QueryKind,
    params: &QueryParams,
    result: CanonicalResult,
    now: DateTime<Utc>,
    lookback: chrono::Duration,
) -> Result<CanonicalResult> {
    match (kind, result) {
        (QueryKind::CurrentGame, CanonicalResult::ScheduleList(list)) => {
            current_game(list.games, now, lookback)
                .map(CanonicalResult::Game)
                .ok_or_else(|| {
                    QueryError::NotFound(format!(
                        "no live or recent game for {}",
                        params.team.as_deref().unwrap_or(&list.team.name)
                    ))
                })
        }
        (QueryKind::Schedule, CanonicalResult::ScheduleList(ScheduleList { team, games })) => {
            let mut upcoming: Vec<Game> = games
                .into_iter()
                .filter(|g| g.status == GameStatus::Scheduled)
                .collect();
            if upcoming.is_empty() {
                return Err(QueryError::NotFound(format!(
                    "no upcoming games for {}",
                    params.team.as_deref().unwrap_or(&team.name)
                )));
            }
            upcoming.sort_by_key(|g| (g.start_time.is_none(), g.start_time));
            Ok(CanonicalResult::ScheduleList(ScheduleList {
                team,
                games: upcoming,
            }))
        }
        (_, CanonicalResult::GameList(GameList { games })) if games.is_empty() => {
            Err(not_found(kind, params))
        }
        (_, result) => Ok(result),
    }
}

/// The live game if there is one, else the latest finished game inside the
/// lookback window.
fn current_game(games: Vec<Game>, now: DateTime<Utc>, lookback: chrono::Duration) -> Option<Game> {
    let mut games = games;
    if let Some(pos) = games.iter().position(|g| g.status == GameStatus::Live) {
        return Some(games.swap_remove(pos));
    }

    let window_start = now.checked_sub_signed(lookback)?;
    games
        .into_iter()
        .filter(|g| g.status == GameStatus::Final)
        .filter(|g| {
            g.start_time
                .is_some_and(|t| t >= window_start && t <= now)
        })
        .max_by_key(|g| g.start_time)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderDomain,
    pub cache: CacheStats,
    pub health: ProviderHealthSnapshot,
}

/// Single entry point for queries across all providers.
pub struct Aggregator {
    live_score: ProviderService<LiveScoreProvider>,
    analytics: ProviderService<AnalyticsProvider>,
    multi_division: ProviderService<MultiDivisionProvider>,
}

impl Aggregator {
    pub fn new(
        live_score: ProviderService<LiveScoreProvider>,
        analytics: ProviderService<AnalyticsProvider>,
        multi_division: ProviderService<MultiDivisionProvider>,
    ) -> Self {
        Self {
            live_score,
            analytics,
            multi_division,
        }
    }

    /// Wire every provider to its HTTP upstream and a fresh cache store.
    pub fn from_config(
        config: &Config,
        teams: Arc<dyn TeamDirectory>,
    ) -> std::result::Result<Self, reqwest::Error> {
        let live_upstream = HttpUpstream::new(
            ProviderDomain::LiveScore.as_str(),
            config.upstream(&config.live_score_base_url, None),
        )?;
        let analytics_upstream = HttpUpstream::new(
            ProviderDomain::Analytics.as_str(),
            config.upstream(&config.analytics_base_url, config.analytics_api_key.clone()),
        )?;
        let multi_upstream = HttpUpstream::new(
            ProviderDomain::MultiDivision.as_str(),
            config.upstream(&config.multi_division_base_url, None),
        )?;

        Ok(Self::new(
            ProviderService::new(
                LiveScoreProvider::new(Arc::clone(&teams)),
                Arc::new(live_upstream),
                CacheStore::new(),
            )
            .with_lookback(chrono::Duration::days(config.current_game_lookback_days)),
            ProviderService::new(
                AnalyticsProvider::new(Arc::clone(&teams)),
                Arc::new(analytics_upstream),
                CacheStore::new(),
            ),
            ProviderService::new(
                MultiDivisionProvider::new(teams),
                Arc::new(multi_upstream),
                CacheStore::new(),
            ),
        ))
    }

    pub async fn query(&self, kind: QueryKind, params: &QueryParams) -> Result<Arc<CanonicalResult>> {
        match kind.provider() {
            ProviderDomain::LiveScore => self.live_score.query(kind, params).await,
            ProviderDomain::Analytics => self.analytics.query(kind, params).await,
            ProviderDomain::MultiDivision => self.multi_division.query(kind, params).await,
        }
    }

    /// Operator action: empty every provider's cache. Returns entries dropped.
    pub async fn clear_all(&self) -> usize {
        let live = self.live_score.cache().clear().await;
        let analytics = self.analytics.cache().clear().await;
        let multi = self.multi_division.cache().clear().await;
        info!(
            "Cleared all caches ({} live-score, {} analytics, {} multi-division entries)",
            live, analytics, multi
        );
        live + analytics + multi
    }

    pub async fn status(&self) -> Vec<ProviderStatus> {
        let mut out = Vec::with_capacity(ProviderDomain::ALL.len());
        for domain in ProviderDomain::ALL {
            let (cache, health) = match domain {
                ProviderDomain::LiveScore => (self.live_score.cache(), self.live_score.health()),
                ProviderDomain::Analytics => (self.analytics.cache(), self.analytics.health()),
                ProviderDomain::MultiDivision => {
                    (self.multi_division.cache(), self.multi_division.health())
                }
            };
            out.push(ProviderStatus {
                provider: domain,
                cache: cache.stats().await,
                health: health.snapshot().await,
            });
        }
        out
    }
}
