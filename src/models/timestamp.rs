//! Wire timestamp handling for the shopping list API.
//!
//! The server exchanges timestamps as `yyyy-MM-dd'T'HH:mm:ssZ` strings,
//! e.g. `2026-08-07T14:03:21+0000`. The format carries whole seconds only.

use chrono::{DateTime, SubsecRound, Utc};

/// strftime spelling of the server's timestamp format.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Formats a timestamp the way the server expects it.
pub fn to_wire(dt: &DateTime<Utc>) -> String {
    dt.format(WIRE_FORMAT).to_string()
}

/// Parses a server timestamp. `%z` also accepts the `+00:00` spelling.
pub fn from_wire(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(s, WIRE_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

/// Current time truncated to whole seconds.
///
/// The wire format has no sub-second field, so timestamps are generated
/// at second precision. A record pushed to the server then compares equal
/// to the copy the server echoes back instead of looking newer forever.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// serde adapter for wire-format timestamp fields:
/// `#[serde(with = "crate::models::timestamp::wire")]`.
pub mod wire {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_wire(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::from_wire(&s).map_err(serde::de::Error::custom)
    }
}
