mod bootstrap;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use climb_core::error::ClimbLogError;
use climb_core::settings::{Command, Settings};
use climb_data::aggregator::StatsOptions;
use climb_data::analysis::{analyze, AnalysisRequest, AnalysisResult};
use climb_data::interpolate::Interpolator;
use climb_data::reader::{ingest_directory, load_corpus, write_corpus};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("climb-log v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Activity type: {}, grade threshold: V{}",
        settings.activity_type,
        settings.grade_threshold
    );

    match &settings.command {
        Command::Ingest { folder, output } => run_ingest(folder, output),
        Command::Interpolate { input, output } => run_interpolate(input, output),
        Command::Stats {
            corpus,
            sessions,
            keep_first,
            json,
        } => {
            let ids = (!sessions.is_empty()).then(|| sessions.clone());
            let result = run_analysis(&settings, corpus.as_deref(), ids, *keep_first)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result.report)?);
            } else {
                print!("{}", report::render_stats(&result.report));
            }
            Ok(())
        }
        Command::Sessions {
            corpus,
            keep_first,
            json,
        } => {
            let result = run_analysis(&settings, corpus.as_deref(), None, *keep_first)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result.summaries)?);
            } else {
                print!(
                    "{}",
                    report::render_sessions(&result.summaries, settings.grade_threshold)
                );
            }
            Ok(())
        }
    }
}

// ── Subcommands ────────────────────────────────────────────────────────────────

fn run_ingest(folder: &Path, output: &Path) -> Result<()> {
    let ingest = ingest_directory(folder)
        .with_context(|| format!("Failed to ingest {}", folder.display()))?;

    for failure in &ingest.failures {
        eprintln!("Error processing file {}: {}", failure.name, failure.reason);
    }

    write_corpus(output, &ingest.corpus)
        .with_context(|| format!("Failed to save results to {}", output.display()))?;

    println!(
        "Processed {} files. Results saved to {}",
        ingest.succeeded,
        output.display()
    );
    Ok(())
}

fn run_interpolate(input: &Path, output: &Path) -> Result<()> {
    let corpus =
        load_corpus(input).with_context(|| format!("Failed to load {}", input.display()))?;

    let (repaired, summary) = Interpolator::interpolate(&corpus);

    write_corpus(output, &repaired)
        .with_context(|| format!("Failed to save results to {}", output.display()))?;

    print!("{}", report::render_interpolation(&summary));
    println!("Results saved to {}", output.display());
    Ok(())
}

fn run_analysis(
    settings: &Settings,
    corpus: Option<&Path>,
    session_ids: Option<Vec<usize>>,
    keep_first: bool,
) -> Result<AnalysisResult> {
    let path = corpus.ok_or_else(|| {
        ClimbLogError::Config(
            "No corpus document given and none remembered; run `climb-log ingest` first"
                .to_string(),
        )
    })?;

    let corpus =
        load_corpus(path).with_context(|| format!("Failed to load {}", path.display()))?;

    let request = AnalysisRequest {
        activity_type: settings.activity_type.clone(),
        skip_calibration: !keep_first,
        session_ids,
        options: StatsOptions {
            threshold: settings.grade_threshold,
            ..Default::default()
        },
    };

    let result = analyze(&corpus, &request);
    if let Some(ids) = &request.session_ids {
        let unknown: Vec<usize> = ids
            .iter()
            .copied()
            .filter(|&id| id >= result.metadata.sessions_in_view)
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(
                "Ignoring session ids {:?}; the view holds {} sessions",
                unknown,
                result.metadata.sessions_in_view
            );
        }
    }
    Ok(result)
}
