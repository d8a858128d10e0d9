//! Lenient timestamp (de)serialization.
//!
//! Timestamps are written as RFC 3339 in UTC. On the way in, naive ISO-8601
//! values (no offset) are read as UTC and empty strings mean "unset".
//! Anything else is treated as malformed: it is logged and replaced by a
//! conservative value instead of failing the whole load.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a persisted timestamp.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Render a timestamp in the persisted form.
pub fn format(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serde adapter for timestamps that must always be present.
///
/// A malformed value loads as the Unix epoch, which sorts it first and keeps
/// it visible rather than pretending it was just created.
pub mod required {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "malformed timestamp, using the Unix epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }))
    }
}

/// Serde adapter for timestamps that may be unset.
pub mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => {
                let parsed = super::parse(value);
                if parsed.is_none() {
                    tracing::warn!(value, "malformed timestamp, treating as unset");
                }
                parsed
            }
        })
    }
}
