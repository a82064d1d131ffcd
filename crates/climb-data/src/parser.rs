//! Parser for a single free-text climbing log document.
//!
//! A log looks like:
//!
//! ```text
//! March 3, 2024 at 10:00 AM
//! Boulder
//! V3: 🟢🟢
//! V4: 🟢🟡🟡
//! Max: V4
//! 1h 15m · 1,234 Cal
//! ```
//!
//! Grade lines are read until the first terminator line; duration and
//! calories are taken from the first matching text anywhere in the document.

use std::path::Path;
use std::sync::OnceLock;

use climb_core::error::{ClimbLogError, Result};
use climb_core::models::SessionRecord;
use climb_core::timestamps::TimestampProcessor;
use regex::Regex;
use tracing::debug;

/// Marker for one successful ascent on a grade line.
pub const SUCCESS_MARKER: char = '🟢';

/// Marker for one unsuccessful attempt on a grade line.
pub const ATTEMPT_MARKER: char = '🟡';

/// Line prefixes that end the grade section.
const TERMINATORS: &[&str] = &["Max:", "Pinnacle Climb Log"];

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+)h ([0-9]+)m").expect("regex is valid"))
}

fn calories_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9][0-9,]*) Cal").expect("regex is valid"))
}

// ── LogParser ─────────────────────────────────────────────────────────────────

/// Turns one raw log document into a [`SessionRecord`].
pub struct LogParser;

impl LogParser {
    /// Parse the full text of a log document.
    pub fn parse(text: &str) -> Result<SessionRecord> {
        let text = text.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = text.lines().collect();
        Self::parse_lines(&lines)
    }

    /// Parse a document given as lines. Lines are trimmed and blank lines
    /// dropped before the header is located.
    pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<SessionRecord> {
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .collect();

        let header = *lines.first().ok_or(ClimbLogError::EmptyDocument)?;
        let timestamp =
            TimestampProcessor::parse_header(header).ok_or_else(|| ClimbLogError::DateFormat {
                header: header.to_string(),
            })?;

        let activity_type = lines
            .get(1)
            .ok_or(ClimbLogError::MissingActivityType)?
            .to_string();

        let (climbed, attempted) = tally_grades(&lines[2..]);

        let content = lines.join(" ");
        let duration_minutes = extract_duration(&content);
        let calories = extract_calories(&content);

        Ok(SessionRecord {
            activity_type,
            timestamp,
            duration_minutes,
            calories,
            attempted,
            climbed,
        })
    }

    /// Read `path` and parse it.
    pub fn parse_file(path: &Path) -> Result<SessionRecord> {
        let text = std::fs::read_to_string(path).map_err(|source| ClimbLogError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Expand `"V4: 🟢🟢🟡"` style lines into `(climbed, attempted)` label lists.
fn tally_grades(lines: &[&str]) -> (Vec<String>, Vec<String>) {
    let mut climbed = Vec::new();
    let mut attempted = Vec::new();

    for line in lines {
        if TERMINATORS.iter().any(|t| line.starts_with(t)) {
            break;
        }
        let Some((grade, markers)) = line.split_once(':') else {
            continue;
        };
        let grade = grade.trim();

        let sends = markers.chars().filter(|&c| c == SUCCESS_MARKER).count();
        let fails = markers.chars().filter(|&c| c == ATTEMPT_MARKER).count();

        climbed.extend(std::iter::repeat(grade.to_string()).take(sends));
        attempted.extend(std::iter::repeat(grade.to_string()).take(fails));
    }

    (climbed, attempted)
}

/// Minutes from the first `"<h>h <m>m"` in `content`, or `0`.
fn extract_duration(content: &str) -> u32 {
    let Some(caps) = duration_regex().captures(content) else {
        return 0;
    };
    let hours = caps[1].parse::<u32>().ok();
    let minutes = caps[2].parse::<u32>().ok();
    match (hours, minutes) {
        (Some(h), Some(m)) => h
            .checked_mul(60)
            .and_then(|h| h.checked_add(m))
            .unwrap_or_else(|| {
                debug!("Duration \"{}\" out of range, treating as missing", &caps[0]);
                0
            }),
        _ => {
            debug!("Duration \"{}\" out of range, treating as missing", &caps[0]);
            0
        }
    }
}

/// Calories from the first `"<n> Cal"` in `content` (thousands separators
/// allowed), or `0`.
fn extract_calories(content: &str) -> u32 {
    let Some(caps) = calories_regex().captures(content) else {
        return 0;
    };
    let digits: String = caps[1].chars().filter(|&c| c != ',').collect();
    digits.parse::<u32>().unwrap_or_else(|_| {
        debug!("Calories \"{}\" out of range, treating as missing", &caps[0]);
        0
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
