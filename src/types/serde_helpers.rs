//! Serde helpers for the upstream's loose JSON conventions.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating `null`, a missing field and a blank
/// string all as `None`.
///
/// The upstream sends `""` for unknown countries and URLs as often as it sends
/// `null`, and both mean "not provided".
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use gecko_market_client::types::serde_helpers::non_empty_string;
///
/// #[derive(Deserialize)]
/// struct Record {
///     #[serde(default, deserialize_with = "non_empty_string")]
///     country: Option<String>,
/// }
///
/// let record: Record = serde_json::from_str(r#"{"country":"  "}"#).unwrap();
/// assert_eq!(record.country, None);
/// ```
pub fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
