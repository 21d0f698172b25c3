//! Adaptive caching and normalization layer over three college sports data
//! providers.
//!
//! Callers ask the [`Aggregator`] for a [`QueryKind`] with [`QueryParams`]
//! and get back a shared [`CanonicalResult`]. Results are cached per
//! provider with a TTL chosen from how fast the underlying data changes.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
pub mod health;
pub mod model;
pub mod providers;
pub mod query;
pub mod server;
pub mod teams;
pub mod upstream;

pub use aggregator::{Aggregator, ProviderService, ProviderStatus};
pub use cache::{CacheStats, CacheStore};
pub use config::Config;
pub use error::{NormalizationError, QueryError, UpstreamError};
pub use freshness::FreshnessClass;
pub use model::CanonicalResult;
pub use query::{Fingerprint, ProviderDomain, QueryKind, QueryParams};
pub use teams::{StaticTeamDirectory, TeamDirectory};
pub use upstream::{HttpUpstream, Upstream, UpstreamRequest};
