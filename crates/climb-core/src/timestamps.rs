use chrono::{DateTime, NaiveDateTime};
use tracing::warn;

/// Layout of the first line of every log document,
/// e.g. `"March 3, 2024 at 10:00 AM"`.
pub const HEADER_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Layout used for the `date` field of the corpus document.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses the timestamp shapes found in session logs and corpus documents.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a session header line in [`HEADER_FORMAT`].
    pub fn parse_header(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s.trim(), HEADER_FORMAT).ok()
    }

    /// Parse a corpus `date` value.
    ///
    /// Handles:
    /// * naive ISO 8601 (`2024-03-03T10:00:00`, optional fractional seconds)
    /// * RFC 3339 with an offset or `Z` suffix; the wall-clock time is kept
    ///   and the offset dropped, matching how the logs record local time
    /// * a space instead of the `T` separator
    pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];

        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        warn!("TimestampProcessor: could not parse timestamp string \"{}\"", s);
        None
    }

    /// Format a timestamp for the corpus document.
    pub fn format_iso(ts: &NaiveDateTime) -> String {
        ts.format(ISO_FORMAT).to_string()
    }
}

// ── serde adapter ─────────────────────────────────────────────────────────────

/// `#[serde(with = "...")]` adapter writing [`ISO_FORMAT`] and reading
/// anything [`TimestampProcessor::parse_iso`] accepts.
pub mod iso_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TimestampProcessor;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&TimestampProcessor::format_iso(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimestampProcessor::parse_iso(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid session date \"{}\"", raw)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
