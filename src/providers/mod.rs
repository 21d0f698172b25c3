//! Provider adapters: request construction plus one entity normalizer per
//! upstream.
//!
//! Each adapter decodes the provider's raw JSON into its own explicit input
//! types first, then maps those onto [`crate::model`] shapes. A payload that
//! does not decode, or decodes without a required field, is a
//! [`NormalizationError`].
//!
//! # Adding a provider
//!
//! 1. Describe its payloads with `Deserialize` structs.
//! 2. Implement [`Provider`]: build the [`UpstreamRequest`] for each supported
//!    kind and map decoded payloads to a [`CanonicalResult`].
//! 3. Route the kinds to it in [`crate::query::QueryKind::provider`].

pub mod analytics;
pub mod live_score;
pub mod multi_division;

pub use analytics::AnalyticsProvider;
pub use live_score::LiveScoreProvider;
pub use multi_division::MultiDivisionProvider;

use crate::error::{NormalizationError, QueryError};
use crate::model::{CanonicalResult, TeamRef};
use crate::query::{ProviderDomain, QueryKind, QueryParams};
use crate::teams::TeamDirectory;
use crate::upstream::UpstreamRequest;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Request building and normalization for one upstream provider.
pub trait Provider: Send + Sync + 'static {
    const DOMAIN: ProviderDomain;

    /// Build the single upstream call for a query. Rejects parameters the
    /// provider cannot serve with [`QueryError::InvalidQuery`].
    fn request(&self, kind: QueryKind, params: &QueryParams) -> Result<UpstreamRequest, QueryError>;

    /// Map a raw payload to a canonical result.
    ///
    /// `Ok(None)` means the payload was well formed but holds nothing for
    /// this request (for example, no row for the requested team).
    fn normalize(
        &self,
        kind: QueryKind,
        params: &QueryParams,
        payload: Value,
    ) -> Result<Option<CanonicalResult>, NormalizationError>;
}

/// Decode a raw payload into a provider's input type.
pub(crate) fn decode<T: DeserializeOwned>(
    provider: &'static str,
    payload: Value,
) -> Result<T, NormalizationError> {
    serde_json::from_value(payload)
        .map_err(|e| NormalizationError::new(provider, format!("unexpected payload shape: {}", e)))
}

pub(crate) fn unsupported(provider: ProviderDomain, kind: QueryKind) -> QueryError {
    QueryError::InvalidQuery(format!("{} does not serve `{}` queries", provider, kind))
}

pub(crate) fn require_team(kind: QueryKind, params: &QueryParams) -> Result<&str, QueryError> {
    params
        .team
        .as_deref()
        .ok_or_else(|| QueryError::InvalidQuery(format!("`{}` requires a team", kind)))
}

pub(crate) fn team_ref(directory: &dyn TeamDirectory, name: &str) -> TeamRef {
    let name = name.trim();
    TeamRef {
        name: name.to_string(),
        id: directory.resolve(name),
    }
}

/// True when a payload team name and a requested team denote the same team.
pub(crate) fn same_team(directory: &dyn TeamDirectory, payload_name: &str, requested: &str) -> bool {
    match (directory.resolve(payload_name), directory.resolve(requested)) {
        (Some(a), Some(b)) => a == b,
        _ => payload_name.trim().eq_ignore_ascii_case(requested.trim()),
    }
}

/// A number that providers send as a JSON number, a numeric string, or an
/// object carrying `value`/`displayValue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlexNumber {
    Number(f64),
    Text(String),
    Detail {
        value: Option<f64>,
        #[serde(rename = "displayValue")]
        display_value: Option<String>,
    },
}

impl FlexNumber {
    /// `Ok(None)` for blank or placeholder text, an error for anything else
    /// that is not a number.
    pub fn to_f64(&self, provider: &'static str, field: &str) -> Result<Option<f64>, NormalizationError> {
        match self {
            FlexNumber::Number(n) => Ok(Some(*n)),
            FlexNumber::Text(text) => parse_numeric_text(provider, field, text),
            FlexNumber::Detail { value: Some(n), .. } => Ok(Some(*n)),
            FlexNumber::Detail {
                value: None,
                display_value: Some(text),
            } => parse_numeric_text(provider, field, text),
            FlexNumber::Detail { .. } => Ok(None),
        }
    }
}

fn parse_numeric_text(
    provider: &'static str,
    field: &str,
    text: &str,
) -> Result<Option<f64>, NormalizationError> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" || cleaned == "--" {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| NormalizationError::invalid(provider, field, text))
}

pub(crate) fn optional_number(
    provider: &'static str,
    field: &str,
    raw: Option<&FlexNumber>,
) -> Result<Option<f64>, NormalizationError> {
    match raw {
        Some(n) => n.to_f64(provider, field),
        None => Ok(None),
    }
}

/// Parse a score. Absent stays absent; a present value must be a
/// non-negative whole number.
pub(crate) fn parse_score(
    provider: &'static str,
    field: &str,
    raw: Option<&FlexNumber>,
) -> Result<Option<u32>, NormalizationError> {
    match optional_number(provider, field, raw)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(Some(n as u32)),
        Some(n) => Err(NormalizationError::invalid(provider, field, n)),
    }
}

/// Parse provider timestamps. Accepts RFC 3339 and the minute-precision
/// `2024-10-12T19:30Z` form.
pub(crate) fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn flex(value: Value) -> FlexNumber {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_scores_in_every_shape() {
        assert_eq!(parse_score("p", "score", Some(&flex(json!("24")))), Ok(Some(24)));
        assert_eq!(parse_score("p", "score", Some(&flex(json!(17)))), Ok(Some(17)));
        assert_eq!(
            parse_score("p", "score", Some(&flex(json!({"value": 31.0, "displayValue": "31"})))),
            Ok(Some(31))
        );
        assert_eq!(
            parse_score("p", "score", Some(&flex(json!({"displayValue": "7"})))),
            Ok(Some(7))
        );
    }

    #[test]
    fn test_absent_score_is_not_zero() {
        assert_eq!(parse_score("p", "score", None), Ok(None));
        assert_eq!(parse_score("p", "score", Some(&flex(json!("")))), Ok(None));
        assert_eq!(parse_score("p", "score", Some(&flex(json!({})))), Ok(None));
    }

    #[test]
    fn test_garbage_score_is_rejected() {
        assert!(parse_score("p", "score", Some(&flex(json!("TBD")))).is_err());
        assert!(parse_score("p", "score", Some(&flex(json!(-3)))).is_err());
        assert!(parse_score("p", "score", Some(&flex(json!(10.5)))).is_err());
    }

    #[test]
    fn test_numbers_with_separators() {
        assert_eq!(flex(json!("1,550")).to_f64("p", "points"), Ok(Some(1550.0)));
        assert_eq!(flex(json!("-3.5")).to_f64("p", "spread"), Ok(Some(-3.5)));
    }

    #[test]
    fn test_parse_time_formats() {
        let minute = parse_time("2024-10-12T19:30Z").unwrap();
        assert_eq!((minute.hour(), minute.minute()), (19, 30));
        assert!(parse_time("2024-10-12T19:30:00.000Z").is_some());
        assert!(parse_time("next saturday").is_none());
    }
}
