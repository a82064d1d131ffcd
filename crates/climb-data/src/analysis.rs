//! Analysis pipeline.
//!
//! Filters the corpus down to one activity type, numbers the remaining
//! sessions and runs the [`StatsAggregator`] over the requested subset,
//! returning an [`AnalysisResult`] ready for rendering.

use std::time::Instant;

use chrono::Local;
use climb_core::models::{Corpus, SessionRecord};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::{SessionSummary, StatsAggregator, StatsOptions, StatsReport};

// ── SessionView ───────────────────────────────────────────────────────────────

/// Sessions of one activity type, addressed by position.
///
/// Identifiers are `0..len()` in corpus (timestamp) order, assigned after
/// the optional calibration session has been dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    sessions: Vec<&'a SessionRecord>,
}

impl<'a> SessionView<'a> {
    /// Keep the sessions whose type equals `activity_type` exactly.
    ///
    /// With `skip_calibration` the earliest matching session is left out.
    pub fn select(corpus: &'a Corpus, activity_type: &str, skip_calibration: bool) -> Self {
        let sessions: Vec<&SessionRecord> = corpus
            .iter()
            .filter(|s| s.activity_type == activity_type)
            .skip(usize::from(skip_calibration))
            .collect();

        debug!(
            "Selected {} {:?} sessions out of {}",
            sessions.len(),
            activity_type,
            corpus.len()
        );
        Self { sessions }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&'a SessionRecord> {
        self.sessions.get(id).copied()
    }

    /// Every identifier in the view.
    pub fn all_ids(&self) -> Vec<usize> {
        (0..self.sessions.len()).collect()
    }

    /// Owned copy of the selected sessions, indexed by identifier.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.iter().map(|s| (*s).clone()).collect()
    }
}

// ── Request / result ──────────────────────────────────────────────────────────

/// Parameters for [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub activity_type: String,
    /// Drop the first matching session.
    pub skip_calibration: bool,
    /// Identifiers to aggregate; `None` selects the whole view.
    pub session_ids: Option<Vec<usize>>,
    pub options: StatsOptions,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            activity_type: "Boulder".to_string(),
            skip_calibration: true,
            session_ids: None,
            options: StatsOptions::default(),
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub activity_type: String,
    /// Sessions in the view after filtering.
    pub sessions_in_view: usize,
    /// Identifiers that resolved to a session.
    pub sessions_selected: usize,
    pub compute_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub report: StatsReport,
    pub summaries: Vec<SessionSummary>,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the analysis pipeline.
///
/// 1. Build the [`SessionView`] for the requested activity type.
/// 2. Resolve the identifiers (all of them when none are given).
/// 3. Aggregate statistics and per-session summaries.
pub fn analyze(corpus: &Corpus, request: &AnalysisRequest) -> AnalysisResult {
    let start = Instant::now();

    let view = SessionView::select(corpus, &request.activity_type, request.skip_calibration);
    let ids = request
        .session_ids
        .clone()
        .unwrap_or_else(|| view.all_ids());
    let sessions = view.sessions();

    let aggregator = StatsAggregator::new(request.options.clone());
    let report = aggregator.compute(&sessions, &ids);
    let summaries = aggregator.summarize_sessions(&sessions, &ids);

    let metadata = AnalysisMetadata {
        generated_at: Local::now().to_rfc3339(),
        activity_type: request.activity_type.clone(),
        sessions_in_view: view.len(),
        sessions_selected: report.sessions.session_count,
        compute_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "Analyzed {} of {} {} sessions",
        metadata.sessions_selected, metadata.sessions_in_view, metadata.activity_type
    );

    AnalysisResult {
        report,
        summaries,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
