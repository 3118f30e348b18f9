//! Lenient deserializers for fields whose JSON shape varies by backend revision

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Numeric array where individual entries may be `null`; nulls become NaN
pub fn nullable_f64_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Boolean array where entries may be `null`, with `null` for the whole field
/// treated as empty
pub fn nullable_bool_vec<'de, D>(deserializer: D) -> Result<Vec<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<bool>>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

/// A single value or a list of values, always returned as a list
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

/// An integer that protobuf-style JSON may encode as a string
pub fn flexible_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Number(f64),
        Text(String),
    }

    match Option::<Flexible>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flexible::Number(n)) if n >= 0.0 => Ok(Some(n as u64)),
        Some(Flexible::Number(n)) => Err(de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            n
        ))),
        Some(Flexible::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid integer '{}': {}", s, e))),
    }
}

/// A point in time as Unix seconds
///
/// Accepts a number of seconds, an RFC 3339 string (`2026-10-19T08:00:00Z`)
/// or an RFC 2822 / HTTP date (`Mon, 19 Oct 2026 08:00:00 GMT`).
pub fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Seconds(f64),
        Text(String),
    }

    match Option::<Flexible>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flexible::Seconds(secs)) => Ok(Some(secs)),
        Some(Flexible::Text(text)) => parse_timestamp(&text).map(Some).ok_or_else(|| {
            de::Error::custom(format!("unrecognized timestamp '{}'", text))
        }),
    }
}

/// Parse a textual timestamp into Unix seconds
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(secs) = text.parse::<f64>() {
        return Some(secs);
    }
    let parsed = chrono::DateTime::parse_from_rfc3339(text)
        .or_else(|_| chrono::DateTime::parse_from_rfc2822(text))
        .ok()?;
    Some(parsed.timestamp_millis() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "nullable_f64_vec")]
        values: Vec<f64>,
        #[serde(default, deserialize_with = "one_or_many")]
        items: Vec<u32>,
        #[serde(default, deserialize_with = "flexible_u64")]
        count: Option<u64>,
        #[serde(default, deserialize_with = "flexible_timestamp")]
        at: Option<f64>,
    }

    #[test]
    fn test_nullable_values_become_nan() {
        let h: Holder = serde_json::from_str(r#"{"values": [1.0, null, 3]}"#).unwrap();
        assert_eq!(h.values.len(), 3);
        assert!(h.values[1].is_nan());
        assert_eq!(h.values[2], 3.0);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let h: Holder = serde_json::from_str(r#"{"values": null}"#).unwrap();
        assert!(h.values.is_empty());
        assert!(h.items.is_empty());
        assert_eq!(h.count, None);
        assert_eq!(h.at, None);
    }

    #[test]
    fn test_one_or_many() {
        let h: Holder = serde_json::from_str(r#"{"items": 7}"#).unwrap();
        assert_eq!(h.items, vec![7]);
        let h: Holder = serde_json::from_str(r#"{"items": [1, 2]}"#).unwrap();
        assert_eq!(h.items, vec![1, 2]);
    }

    #[test]
    fn test_flexible_u64() {
        let h: Holder = serde_json::from_str(r#"{"count": "86400"}"#).unwrap();
        assert_eq!(h.count, Some(86400));
        let h: Holder = serde_json::from_str(r#"{"count": 12}"#).unwrap();
        assert_eq!(h.count, Some(12));
        assert!(serde_json::from_str::<Holder>(r#"{"count": "abc"}"#).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(parse_timestamp("1700000000.5"), Some(1_700_000_000.5));
        assert_eq!(parse_timestamp("2023-11-14T22:13:20Z"), Some(1_700_000_000.0));
        assert_eq!(
            parse_timestamp("Tue, 14 Nov 2023 22:13:20 GMT"),
            Some(1_700_000_000.0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);

        let h: Holder = serde_json::from_str(r#"{"at": "2023-11-14T22:13:20Z"}"#).unwrap();
        assert_eq!(h.at, Some(1_700_000_000.0));
    }
}
