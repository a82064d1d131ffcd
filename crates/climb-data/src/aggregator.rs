//! Performance statistics over a subset of sessions.
//!
//! Sessions are addressed by their positional identifier inside a
//! [`SessionView`](crate::analysis::SessionView). Everything here is a pure
//! function of the slice and the identifiers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use climb_core::formatting::percentage;
use climb_core::grade::GradeCodec;
use climb_core::models::SessionRecord;
use climb_core::timestamps::iso_timestamp;
use serde::Serialize;

// ── Options ───────────────────────────────────────────────────────────────────

/// Tunables for [`StatsAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsOptions {
    /// Grade at or above which a send counts as "hard" (V6+ by default).
    pub threshold: i32,
    /// Number of best climbs averaged for long sessions.
    pub top_n: usize,
    /// Grades at or below this are ignored in the per-session top average.
    pub top_floor: i32,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            threshold: 6,
            top_n: 20,
            top_floor: 3,
        }
    }
}

// ── Report types ──────────────────────────────────────────────────────────────

/// Headline numbers for the selected sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_completed: usize,
    pub total_attempts: usize,
    /// Percentage of tries that failed, one decimal; `0` without tries.
    pub failure_rate: f64,
    pub average_grade: Option<f64>,
    pub hardest_send: Option<i32>,
    /// Mean of the per-session top averages.
    pub top_average: Option<f64>,
    pub threshold: i32,
    /// Share of sends at or above `threshold`, one decimal.
    pub threshold_percentage: f64,
}

/// Volume totals for the selected sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRollup {
    pub session_count: usize,
    pub average_climbs_per_session: Option<f64>,
    pub total_duration_minutes: u64,
    pub average_duration_minutes: Option<f64>,
    pub total_calories: u64,
}

/// Sends and failed attempts recorded at one grade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeCount {
    pub grade: i32,
    pub completed: usize,
    pub attempted: usize,
}

/// Output of [`StatsAggregator::compute`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub performance: PerformanceMetrics,
    pub sessions: SessionRollup,
    /// Ordered by ascending grade.
    pub distribution: Vec<GradeCount>,
    /// Decoded grade of every send, in session then line order.
    pub completed: Vec<i32>,
    /// Decoded grade of every failed attempt, in session then line order.
    pub attempted: Vec<i32>,
}

/// One row of the per-session table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: usize,
    #[serde(with = "iso_timestamp")]
    pub date: NaiveDateTime,
    pub total_climbs: usize,
    pub attempts: usize,
    pub duration_minutes: u32,
    pub calories: u32,
    pub failure_rate: f64,
    /// Mean decoded grade of the sends; `0` for a session without sends.
    pub average_grade: f64,
    /// Sends at or above the threshold.
    pub hard_sends: usize,
    /// Sends at or above the threshold plus one.
    pub harder_sends: usize,
}

// ── StatsAggregator ───────────────────────────────────────────────────────────

/// Computes [`StatsReport`]s and [`SessionSummary`] rows.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    options: StatsOptions,
}

impl StatsAggregator {
    pub fn new(options: StatsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StatsOptions {
        &self.options
    }

    /// Aggregate the sessions at `ids` (positions in `sessions`).
    ///
    /// Duplicate identifiers count once and identifiers past the end of
    /// `sessions` are ignored, so the session count is the number of
    /// sessions actually aggregated.
    pub fn compute(&self, sessions: &[SessionRecord], ids: &[usize]) -> StatsReport {
        let selected = select(sessions, ids);

        let mut completed = Vec::new();
        let mut attempted = Vec::new();
        let mut top_averages = Vec::new();
        let mut total_duration = 0u64;
        let mut total_calories = 0u64;

        for (_, session) in &selected {
            let sends = GradeCodec::decode_all(&session.climbed);
            if let Some(avg) = self.session_top_average(&sends) {
                top_averages.push(avg);
            }
            completed.extend(sends);
            attempted.extend(GradeCodec::decode_all(&session.attempted));
            total_duration += u64::from(session.duration_minutes);
            total_calories += u64::from(session.calories);
        }

        let total_completed = completed.len();
        let total_attempts = attempted.len();
        let hard = completed
            .iter()
            .filter(|&&g| g >= self.options.threshold)
            .count();

        let performance = PerformanceMetrics {
            total_completed,
            total_attempts,
            failure_rate: percentage(
                total_attempts as f64,
                (total_completed + total_attempts) as f64,
                1,
            ),
            average_grade: mean_grades(&completed),
            hardest_send: completed.iter().copied().max(),
            top_average: mean(&top_averages),
            threshold: self.options.threshold,
            threshold_percentage: percentage(hard as f64, total_completed as f64, 1),
        };

        let session_count = selected.len();
        let per_session = |total: f64| (session_count > 0).then(|| total / session_count as f64);
        let rollup = SessionRollup {
            session_count,
            average_climbs_per_session: per_session(total_completed as f64),
            total_duration_minutes: total_duration,
            average_duration_minutes: per_session(total_duration as f64),
            total_calories,
        };

        StatsReport {
            performance,
            sessions: rollup,
            distribution: distribution(&completed, &attempted),
            completed,
            attempted,
        }
    }

    /// Top average for one session's decoded sends.
    ///
    /// Up to `top_n` sends: mean of the grades above `top_floor` (`None`
    /// when there are none). More than `top_n`: mean of the `top_n` highest
    /// grades, floor not applied.
    pub fn session_top_average(&self, sends: &[i32]) -> Option<f64> {
        if sends.len() > self.options.top_n {
            let mut sorted = sends.to_vec();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            sorted.truncate(self.options.top_n);
            return mean_grades(&sorted);
        }

        let above_floor: Vec<i32> = sends
            .iter()
            .copied()
            .filter(|&g| g > self.options.top_floor)
            .collect();
        mean_grades(&above_floor)
    }

    /// One [`SessionSummary`] per selected session, ascending by id.
    pub fn summarize_sessions(&self, sessions: &[SessionRecord], ids: &[usize]) -> Vec<SessionSummary> {
        select(sessions, ids)
            .into_iter()
            .map(|(id, session)| self.summarize(id, session))
            .collect()
    }

    fn summarize(&self, session_id: usize, session: &SessionRecord) -> SessionSummary {
        let sends = GradeCodec::decode_all(&session.climbed);
        let attempts = session.attempted.len();
        let at_least = |grade: i32| sends.iter().filter(|&&g| g >= grade).count();

        SessionSummary {
            session_id,
            date: session.timestamp,
            total_climbs: sends.len(),
            attempts,
            duration_minutes: session.duration_minutes,
            calories: session.calories,
            failure_rate: percentage(attempts as f64, session.total_tries() as f64, 1),
            average_grade: mean_grades(&sends).unwrap_or(0.0),
            hard_sends: at_least(self.options.threshold),
            harder_sends: at_least(self.options.threshold.saturating_add(1)),
        }
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Resolve `ids` to `(id, session)` pairs: deduplicated, ascending, in range.
fn select<'a>(sessions: &'a [SessionRecord], ids: &[usize]) -> Vec<(usize, &'a SessionRecord)> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<usize>>()
        .into_iter()
        .filter_map(|id| sessions.get(id).map(|s| (id, s)))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn mean_grades(grades: &[i32]) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }
    let total: i64 = grades.iter().map(|&g| i64::from(g)).sum();
    Some(total as f64 / grades.len() as f64)
}

fn distribution(completed: &[i32], attempted: &[i32]) -> Vec<GradeCount> {
    let mut map: BTreeMap<i32, GradeCount> = BTreeMap::new();
    for &grade in completed {
        map.entry(grade)
            .or_insert_with(|| GradeCount {
                grade,
                ..Default::default()
            })
            .completed += 1;
    }
    for &grade in attempted {
        map.entry(grade)
            .or_insert_with(|| GradeCount {
                grade,
                ..Default::default()
            })
            .attempted += 1;
    }
    map.into_values().collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_session(day: u32, time: u32, cal: u32, climbed: &[&str], attempted: &[&str]) -> SessionRecord {
        SessionRecord {
            activity_type: "Boulder".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap(),
            duration_minutes: time,
            calories: cal,
            attempted: attempted.iter().map(|s| s.to_string()).collect(),
            climbed: climbed.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sample_sessions() -> Vec<SessionRecord> {
        vec![
            make_session(1, 60, 500, &["V4", "V5", "V6"], &["V7"]),
            make_session(2, 90, 700, &["V2", "V7"], &["V6", "V6"]),
        ]
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let value = actual.expect("expected a value");
        assert!((value - expected).abs() < 1e-9, "{value} != {expected}");
    }

    // ── compute ───────────────────────────────────────────────────────────────

    #[test]
    fn test_compute_performance_metrics() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[0, 1]);
        let perf = &report.performance;

        assert_eq!(perf.total_completed, 5);
        assert_eq!(perf.total_attempts, 3);
        assert!((perf.failure_rate - 37.5).abs() < 1e-9);
        approx(perf.average_grade, 4.8);
        assert_eq!(perf.hardest_send, Some(7));
        assert_eq!(perf.threshold, 6);
        assert!((perf.threshold_percentage - 40.0).abs() < 1e-9);
        // session 0: mean(4, 5, 6) = 5; session 1: mean(7) = 7
        approx(perf.top_average, 6.0);
    }

    #[test]
    fn test_compute_session_rollup() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[0, 1]);
        let rollup = &report.sessions;

        assert_eq!(rollup.session_count, 2);
        approx(rollup.average_climbs_per_session, 2.5);
        assert_eq!(rollup.total_duration_minutes, 150);
        approx(rollup.average_duration_minutes, 75.0);
        assert_eq!(rollup.total_calories, 1200);
    }

    #[test]
    fn test_compute_keeps_decoded_lists_in_order() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[1, 0]);
        assert_eq!(report.completed, vec![4, 5, 6, 2, 7]);
        assert_eq!(report.attempted, vec![7, 6, 6]);
    }

    #[test]
    fn test_compute_grade_distribution() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[0, 1]);
        let rows: Vec<(i32, usize, usize)> = report
            .distribution
            .iter()
            .map(|g| (g.grade, g.completed, g.attempted))
            .collect();
        assert_eq!(rows, vec![(2, 1, 0), (4, 1, 0), (5, 1, 0), (6, 1, 2), (7, 1, 1)]);
    }

    #[test]
    fn test_compute_empty_subset() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[]);
        let perf = &report.performance;

        assert_eq!(perf.total_completed, 0);
        assert_eq!(perf.failure_rate, 0.0);
        assert!(perf.average_grade.is_none());
        assert!(perf.hardest_send.is_none());
        assert!(perf.top_average.is_none());
        assert_eq!(perf.threshold_percentage, 0.0);
        assert_eq!(report.sessions.session_count, 0);
        assert!(report.sessions.average_climbs_per_session.is_none());
        assert!(report.sessions.average_duration_minutes.is_none());
        assert!(report.distribution.is_empty());
    }

    #[test]
    fn test_compute_collapses_duplicates_and_ignores_unknown_ids() {
        let report = StatsAggregator::default().compute(&sample_sessions(), &[0, 0, 9]);
        assert_eq!(report.sessions.session_count, 1);
        assert_eq!(report.performance.total_completed, 3);
        assert_eq!(report.sessions.total_calories, 500);
    }

    #[test]
    fn test_compute_attempts_only() {
        let sessions = vec![make_session(1, 60, 100, &[], &["V5", "V5"])];
        let report = StatsAggregator::default().compute(&sessions, &[0]);

        assert!((report.performance.failure_rate - 100.0).abs() < 1e-9);
        assert!(report.performance.average_grade.is_none());
        assert_eq!(report.performance.threshold_percentage, 0.0);
    }

    #[test]
    fn test_compute_custom_threshold() {
        let aggregator = StatsAggregator::new(StatsOptions {
            threshold: 5,
            ..Default::default()
        });
        let report = aggregator.compute(&sample_sessions(), &[0, 1]);
        assert_eq!(report.performance.threshold, 5);
        // 5, 6 and 7 out of five sends
        assert!((report.performance.threshold_percentage - 60.0).abs() < 1e-9);
    }

    // ── session_top_average ───────────────────────────────────────────────────

    #[test]
    fn test_top_average_ignores_easy_climbs_in_short_sessions() {
        let aggregator = StatsAggregator::default();
        approx(aggregator.session_top_average(&[1, 2, 4, 6]), 5.0);
        assert!(aggregator.session_top_average(&[0, 2, 3]).is_none());
        assert!(aggregator.session_top_average(&[]).is_none());
    }

    #[test]
    fn test_top_average_takes_best_of_long_sessions() {
        let aggregator = StatsAggregator::default();
        let mut sends = vec![5i32; 20];
        sends.push(1);
        approx(aggregator.session_top_average(&sends), 5.0);
    }

    #[test]
    fn test_top_average_long_session_skips_floor() {
        let aggregator = StatsAggregator::default();
        let sends = vec![2i32; 25];
        approx(aggregator.session_top_average(&sends), 2.0);
    }

    #[test]
    fn test_top_average_respects_custom_options() {
        let aggregator = StatsAggregator::new(StatsOptions {
            top_n: 2,
            top_floor: 0,
            ..Default::default()
        });
        approx(aggregator.session_top_average(&[1, 9, 3]), 6.0);
        approx(aggregator.session_top_average(&[1, 3]), 2.0);
    }

    // ── summarize_sessions ────────────────────────────────────────────────────

    #[test]
    fn test_summaries_per_session() {
        let summaries = StatsAggregator::default().summarize_sessions(&sample_sessions(), &[1, 0]);
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.session_id, 0);
        assert_eq!(first.total_climbs, 3);
        assert_eq!(first.attempts, 1);
        assert!((first.failure_rate - 25.0).abs() < 1e-9);
        assert!((first.average_grade - 5.0).abs() < 1e-9);
        assert_eq!(first.hard_sends, 1);
        assert_eq!(first.harder_sends, 0);

        let second = &summaries[1];
        assert_eq!(second.session_id, 1);
        assert_eq!(second.duration_minutes, 90);
        assert_eq!(second.calories, 700);
        assert!((second.failure_rate - 50.0).abs() < 1e-9);
        assert!((second.average_grade - 4.5).abs() < 1e-9);
        assert_eq!(second.hard_sends, 1);
        assert_eq!(second.harder_sends, 1);
    }

    #[test]
    fn test_summary_without_tries() {
        let sessions = vec![make_session(4, 45, 0, &[], &[])];
        let summaries = StatsAggregator::default().summarize_sessions(&sessions, &[0]);
        assert_eq!(summaries[0].failure_rate, 0.0);
        assert_eq!(summaries[0].average_grade, 0.0);
        assert_eq!(summaries[0].hard_sends, 0);
    }

    #[test]
    fn test_summary_serializes_iso_date() {
        let summaries = StatsAggregator::default().summarize_sessions(&sample_sessions(), &[0]);
        let value = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(value["date"], "2024-03-01T18:30:00");
        assert_eq!(value["session_id"], 0);
    }

    #[test]
    fn test_summary_with_maximum_threshold() {
        let aggregator = StatsAggregator::new(StatsOptions {
            threshold: i32::MAX,
            ..Default::default()
        });
        let summaries = aggregator.summarize_sessions(&sample_sessions(), &[0]);
        assert_eq!(summaries[0].hard_sends, 0);
        assert_eq!(summaries[0].harder_sends, 0);
    }

    // ── signed and spaced labels ──────────────────────────────────────────────

    #[test]
    fn test_compute_decodes_spaced_and_negative_grades() {
        let sessions = vec![make_session(6, 60, 300, &["V 5", "V-1"], &["Vx"])];
        let report = StatsAggregator::default().compute(&sessions, &[0]);

        assert_eq!(report.completed, vec![5, -1]);
        assert_eq!(report.attempted, vec![0]);
        assert_eq!(report.performance.hardest_send, Some(5));
        approx(report.performance.average_grade, 2.0);
        let grades: Vec<i32> = report.distribution.iter().map(|g| g.grade).collect();
        assert_eq!(grades, vec![-1, 0, 5]);
    }
}
