use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timestamps::iso_timestamp;

/// Calories at or below this value are treated as missing.
pub const MISSING_CALORIES: u32 = 0;

/// Shortest session duration (minutes) accepted as a real measurement.
pub const MIN_VALID_DURATION: u32 = 10;

/// Longest session duration (minutes) accepted as a real measurement.
pub const MAX_VALID_DURATION: u32 = 300;

/// One bouldering outing parsed from a single log document.
///
/// Field names on the wire match the canonical corpus document:
/// `type`, `date`, `time`, `cal`, `attempted`, `climbed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Free-text activity type from the second log line, e.g. `"Boulder"`.
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Session start taken from the log header (local wall-clock time).
    #[serde(rename = "date", with = "iso_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Session length in minutes; `0` when the log carried no duration.
    #[serde(rename = "time", default)]
    pub duration_minutes: u32,
    /// Energy in kilocalories; `0` when the log carried none.
    #[serde(rename = "cal", default)]
    pub calories: u32,
    /// One grade label per unsuccessful attempt, in source line order.
    #[serde(default)]
    pub attempted: Vec<String>,
    /// One grade label per successful ascent, in source line order.
    #[serde(default)]
    pub climbed: Vec<String>,
}

impl SessionRecord {
    /// Number of successful ascents.
    pub fn climb_count(&self) -> usize {
        self.climbed.len()
    }

    /// Successful ascents plus unsuccessful attempts.
    pub fn total_tries(&self) -> usize {
        self.climbed.len() + self.attempted.len()
    }

    /// `false` when calories are missing and should be interpolated.
    pub fn has_valid_calories(&self) -> bool {
        self.calories != MISSING_CALORIES
    }

    /// `false` when the duration is outside the plausible session range.
    pub fn has_valid_duration(&self) -> bool {
        (MIN_VALID_DURATION..=MAX_VALID_DURATION).contains(&self.duration_minutes)
    }
}

// ── Corpus ────────────────────────────────────────────────────────────────────

/// All parsed sessions, ascending by timestamp.
///
/// Every constructor sorts (stably), so the ordering holds for any value of
/// this type, including one deserialised from an unsorted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SessionRecord>", into = "Vec<SessionRecord>")]
pub struct Corpus {
    sessions: Vec<SessionRecord>,
}

impl Corpus {
    /// Build a corpus from sessions in any order.
    pub fn new(mut sessions: Vec<SessionRecord>) -> Self {
        sessions.sort_by_key(|s| s.timestamp);
        Self { sessions }
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SessionRecord> {
        self.sessions.iter()
    }

    pub fn into_sessions(self) -> Vec<SessionRecord> {
        self.sessions
    }
}

impl From<Vec<SessionRecord>> for Corpus {
    fn from(sessions: Vec<SessionRecord>) -> Self {
        Self::new(sessions)
    }
}

impl From<Corpus> for Vec<SessionRecord> {
    fn from(corpus: Corpus) -> Self {
        corpus.sessions
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a SessionRecord;
    type IntoIter = std::slice::Iter<'a, SessionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
