//! Log discovery, batch ingestion and corpus document I/O.
//!
//! A folder holds one log file per session. Every file is parsed
//! independently; a malformed file is recorded as a failure and never stops
//! the rest of the batch.

use std::path::{Path, PathBuf};

use climb_core::error::{ClimbLogError, Result};
use climb_core::models::{Corpus, SessionRecord};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::parser::LogParser;

// ── Public types ──────────────────────────────────────────────────────────────

/// A document that could not be turned into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    /// File name (or caller-supplied name) of the document.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Successfully parsed sessions, ascending by timestamp.
    pub corpus: Corpus,
    /// One entry per document that failed, in discovery order.
    pub failures: Vec<IngestFailure>,
    pub succeeded: usize,
    pub failed: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find every log file directly inside `logs_dir`, sorted by path.
///
/// Hidden files (leading `.`) are skipped; subdirectories are not descended.
pub fn find_log_files(logs_dir: &Path) -> Vec<PathBuf> {
    if !logs_dir.exists() {
        warn!("Log folder does not exist: {}", logs_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(logs_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && !entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with('.'))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Parse every log file in `logs_dir` into a sorted corpus.
///
/// Fails only when the folder itself is missing or not a directory;
/// per-file problems end up in [`IngestReport::failures`].
pub fn ingest_directory(logs_dir: &Path) -> Result<IngestReport> {
    if !logs_dir.exists() {
        return Err(ClimbLogError::NotFound(logs_dir.to_path_buf()));
    }
    if !logs_dir.is_dir() {
        return Err(ClimbLogError::FileRead {
            path: logs_dir.to_path_buf(),
            source: std::io::Error::other("not a directory"),
        });
    }

    let files = find_log_files(logs_dir);
    if files.is_empty() {
        warn!("No log files found in {}", logs_dir.display());
    }

    let results: Vec<(String, Result<SessionRecord>)> = files
        .par_iter()
        .map(|path| (display_name(path), LogParser::parse_file(path)))
        .collect();

    Ok(collect_results(results))
}

/// Parse in-memory documents given as `(name, text)` pairs with the same
/// isolation policy as [`ingest_directory`].
pub fn ingest_documents<N, T>(documents: &[(N, T)]) -> IngestReport
where
    N: AsRef<str> + Sync,
    T: AsRef<str> + Sync,
{
    let results: Vec<(String, Result<SessionRecord>)> = documents
        .par_iter()
        .map(|(name, text)| (name.as_ref().to_string(), LogParser::parse(text.as_ref())))
        .collect();

    collect_results(results)
}

/// Load a corpus document from disk.
///
/// * missing file → [`ClimbLogError::NotFound`]
/// * unreadable file → [`ClimbLogError::FileRead`]
/// * not a session array → [`ClimbLogError::CorpusFormat`]
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ClimbLogError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ClimbLogError::FileRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let corpus: Corpus =
        serde_json::from_str(&content).map_err(|source| ClimbLogError::CorpusFormat {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("Loaded {} sessions from {}", corpus.len(), path.display());
    Ok(corpus)
}

/// Write `corpus` as a pretty-printed JSON array.
pub fn write_corpus(path: &Path, corpus: &Corpus) -> Result<()> {
    let json = serde_json::to_string_pretty(corpus)?;
    std::fs::write(path, json).map_err(|source| ClimbLogError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {} sessions to {}", corpus.len(), path.display());
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Split parse results into a corpus and a failure list. The corpus sort
/// runs only after every document has been parsed.
fn collect_results(results: Vec<(String, Result<SessionRecord>)>) -> IngestReport {
    let mut sessions = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (name, result) in results {
        match result {
            Ok(session) => {
                debug!(
                    "Parsed {}: {} climbed, {} attempted",
                    name,
                    session.climbed.len(),
                    session.attempted.len()
                );
                sessions.push(session);
            }
            Err(e) => {
                if e.is_parse_error() {
                    warn!("Skipping malformed log {}: {}", name, e);
                } else {
                    warn!("Error processing {}: {}", name, e);
                }
                failures.push(IngestFailure {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    let succeeded = sessions.len();
    let failed = failures.len();
    info!("Ingested {} documents ({} failed)", succeeded + failed, failed);

    IngestReport {
        corpus: Corpus::new(sessions),
        failures,
        succeeded,
        failed,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
