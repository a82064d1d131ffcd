//! Plain-text rendering of statistics and the per-session table.

use std::fmt::Write;

use climb_core::formatting::{format_grade, format_number};
use climb_core::grade::GradeCodec;
use climb_data::aggregator::{SessionSummary, StatsReport};
use climb_data::interpolate::{FieldRepair, InterpolationReport};

const LABEL_WIDTH: usize = 24;

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Render the two-section statistics block shown by `climb-log stats`.
pub fn render_stats(report: &StatsReport) -> String {
    let perf = &report.performance;
    let rollup = &report.sessions;
    let mut out = String::new();

    section(&mut out, "Performance Metrics");
    line(&mut out, "Total Completed", perf.total_completed.to_string());
    line(&mut out, "Total Attempts", perf.total_attempts.to_string());
    line(&mut out, "Failure Rate", format!("{:.1}%", perf.failure_rate));
    line(&mut out, "Average Grade", format_grade(perf.average_grade));
    line(
        &mut out,
        "Hardest Send",
        perf.hardest_send
            .map(GradeCodec::encode)
            .unwrap_or_else(|| "N/A".to_string()),
    );
    line(&mut out, "Average of Top 20", format_grade(perf.top_average));
    line(
        &mut out,
        &format!("V{}+ Percentage", perf.threshold),
        format!("{:.1}%", perf.threshold_percentage),
    );

    out.push('\n');
    section(&mut out, "Session Data");
    line(&mut out, "Number of Sessions", rollup.session_count.to_string());
    line(
        &mut out,
        "Average Climbs/Session",
        optional(rollup.average_climbs_per_session, ""),
    );
    line(
        &mut out,
        "Total Duration",
        format!("{} min", format_number(rollup.total_duration_minutes as f64, 0)),
    );
    line(
        &mut out,
        "Average Duration",
        optional(rollup.average_duration_minutes, " min"),
    );
    line(
        &mut out,
        "Total Calories",
        format!("{} cal", format_number(rollup.total_calories as f64, 0)),
    );

    if !report.distribution.is_empty() {
        out.push('\n');
        section(&mut out, "Grade Distribution");
        for row in &report.distribution {
            line(
                &mut out,
                &GradeCodec::encode(row.grade),
                format!("{} sent, {} failed", row.completed, row.attempted),
            );
        }
    }

    out
}

// ── Session table ─────────────────────────────────────────────────────────────

/// Render one row per session plus a totals row.
///
/// `threshold` labels the two hard-send columns (`V6+`, `V7+` by default).
pub fn render_sessions(summaries: &[SessionSummary], threshold: i32) -> String {
    if summaries.is_empty() {
        return "No sessions selected\n".to_string();
    }

    let hard = format!("V{}+", threshold);
    let harder = format!("V{}+", threshold.saturating_add(1));
    let header = [
        "Session",
        "Date",
        "Climbs",
        "Duration",
        "Calories",
        "Failure Rate",
        "Avg Grade",
        hard.as_str(),
        harder.as_str(),
    ];

    let mut rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.session_id.to_string(),
                s.date.format("%Y-%m-%d %H:%M").to_string(),
                s.total_climbs.to_string(),
                format!("{} min", s.duration_minutes),
                format_number(f64::from(s.calories), 0),
                format!("{:.1}%", s.failure_rate),
                format_grade(Some(s.average_grade)),
                s.hard_sends.to_string(),
                s.harder_sends.to_string(),
            ]
        })
        .collect();

    // Totals row
    let sum = |f: fn(&SessionSummary) -> u64| summaries.iter().map(f).sum::<u64>();
    rows.push(vec![
        "TOTAL".to_string(),
        format!("{} sessions", summaries.len()),
        sum(|s| s.total_climbs as u64).to_string(),
        format!("{} min", sum(|s| u64::from(s.duration_minutes))),
        format_number(sum(|s| u64::from(s.calories)) as f64, 0),
        String::new(),
        String::new(),
        sum(|s| s.hard_sends as u64).to_string(),
        sum(|s| s.harder_sends as u64).to_string(),
    ]);

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, header.iter().map(|h| h.to_string()), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, rule.into_iter(), &widths);
    for row in rows {
        push_row(&mut out, row.into_iter(), &widths);
    }
    out
}

// ── Interpolation ─────────────────────────────────────────────────────────────

/// Summary printed by `climb-log interpolate`.
pub fn render_interpolation(report: &InterpolationReport) -> String {
    let mut out = String::new();
    field_summary(&mut out, "calories", "Average calories per climb", &report.calories);
    field_summary(&mut out, "time", "Average time per climb", &report.duration);
    out
}

fn field_summary(out: &mut String, label: &str, rate_label: &str, repair: &FieldRepair) {
    match repair.rate {
        Some(rate) => {
            let _ = writeln!(out, "{}: {:.2}", rate_label, rate);
            let _ = writeln!(out, "Interpolated {} for {} sessions", label, repair.repaired);
        }
        None => {
            let _ = writeln!(out, "No valid {} data for interpolation", label);
        }
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
}

fn line(out: &mut String, label: &str, value: String) {
    let label = format!("{}:", label);
    let _ = writeln!(out, "  {:<width$} {}", label, value, width = LABEL_WIDTH);
}

fn optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{}{}", format_number(v, 1), suffix),
        None => "N/A".to_string(),
    }
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join("  ").trim_end());
}

// ── Tests ─────────────────────────────────────────────────────────────────────
