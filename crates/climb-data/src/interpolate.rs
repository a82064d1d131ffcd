//! Repair of missing calories and implausible durations.
//!
//! Each field is estimated from a corpus-wide per-climb rate computed over
//! the sessions where that field is valid. The two fields are handled
//! independently and the input corpus is never modified.

use climb_core::models::{Corpus, SessionRecord};
use serde::Serialize;
use tracing::{info, warn};

// ── RepairField ───────────────────────────────────────────────────────────────

/// Numeric session field the interpolator can repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairField {
    /// `cal`, invalid when `0`.
    Calories,
    /// `time`, invalid outside `10..=300` minutes.
    Duration,
}

impl RepairField {
    pub fn label(self) -> &'static str {
        match self {
            RepairField::Calories => "calories",
            RepairField::Duration => "time",
        }
    }

    fn value(self, session: &SessionRecord) -> u32 {
        match self {
            RepairField::Calories => session.calories,
            RepairField::Duration => session.duration_minutes,
        }
    }

    fn is_valid(self, session: &SessionRecord) -> bool {
        match self {
            RepairField::Calories => session.has_valid_calories(),
            RepairField::Duration => session.has_valid_duration(),
        }
    }

    fn set(self, session: &mut SessionRecord, value: u32) {
        match self {
            RepairField::Calories => session.calories = value,
            RepairField::Duration => session.duration_minutes = value,
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// What happened to one field during a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldRepair {
    /// Per-climb rate, or `None` when no valid reference data exists.
    pub rate: Option<f64>,
    /// Sessions whose value failed the validity check.
    pub invalid: usize,
    /// Sessions that received an estimated value.
    pub repaired: usize,
}

/// Summary of an interpolation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterpolationReport {
    pub calories: FieldRepair,
    pub duration: FieldRepair,
}

// ── Interpolator ──────────────────────────────────────────────────────────────

/// Stateless corpus repair pass.
pub struct Interpolator;

impl Interpolator {
    /// Return a repaired copy of `corpus` and a report of the changes.
    ///
    /// Invalid values are replaced with `round(rate * climbs)`, halves to
    /// even. A field with no valid reference sessions (or whose reference
    /// sessions hold no climbs) is left as it is.
    pub fn interpolate(corpus: &Corpus) -> (Corpus, InterpolationReport) {
        let sessions = corpus.sessions();

        let cal_rate = per_climb_rate(sessions, RepairField::Calories);
        let time_rate = per_climb_rate(sessions, RepairField::Duration);

        let mut report = InterpolationReport {
            calories: FieldRepair {
                rate: cal_rate,
                ..Default::default()
            },
            duration: FieldRepair {
                rate: time_rate,
                ..Default::default()
            },
        };

        let repaired: Vec<SessionRecord> = sessions
            .iter()
            .map(|session| {
                let mut out = session.clone();
                repair_field(&mut out, session, RepairField::Calories, cal_rate, &mut report.calories);
                repair_field(&mut out, session, RepairField::Duration, time_rate, &mut report.duration);
                out
            })
            .collect();

        for (field, repair) in [
            (RepairField::Calories, &report.calories),
            (RepairField::Duration, &report.duration),
        ] {
            match repair.rate {
                Some(rate) => info!(
                    "Interpolated {} for {} of {} sessions ({:.2} per climb)",
                    field.label(),
                    repair.repaired,
                    sessions.len(),
                    rate
                ),
                None => warn!(
                    "No valid {} data for interpolation; {} sessions left unchanged",
                    field.label(),
                    repair.invalid
                ),
            }
        }

        (Corpus::new(repaired), report)
    }
}

/// `sum(field over valid sessions) / sum(climbs over valid sessions)`.
///
/// `None` when no session is valid for `field` or the valid sessions hold
/// no climbs at all.
pub fn per_climb_rate(sessions: &[SessionRecord], field: RepairField) -> Option<f64> {
    let (total_value, total_climbs) = sessions
        .iter()
        .filter(|s| field.is_valid(s))
        .fold((0u64, 0u64), |(value, climbs), s| {
            (value + u64::from(field.value(s)), climbs + s.climb_count() as u64)
        });

    if total_climbs == 0 {
        return None;
    }
    Some(total_value as f64 / total_climbs as f64)
}

fn repair_field(
    out: &mut SessionRecord,
    original: &SessionRecord,
    field: RepairField,
    rate: Option<f64>,
    repair: &mut FieldRepair,
) {
    if field.is_valid(original) {
        return;
    }
    repair.invalid += 1;

    if let Some(rate) = rate {
        let estimate = (rate * original.climb_count() as f64).round_ties_even();
        field.set(out, estimate as u32);
        repair.repaired += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
