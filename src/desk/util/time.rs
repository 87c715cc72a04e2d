use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a purchase date as sent by the bill service. The service may send
/// an RFC 3339 timestamp or a local date-time without offset; both are kept
/// as the wall-clock time they denote.
pub(crate) fn parse_purchase_date(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, NAIVE_ISO_FORMAT))
        .ok()
}

pub(crate) fn format_date(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub(crate) fn deserialize_purchase_date<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_purchase_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid purchase date: {raw}")))
}

/// Best effort: an absent or unreadable date is `None`, never an error.
pub(crate) fn deserialize_optional_purchase_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_purchase_date))
}
