use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name of the corpus document written by `ingest`.
pub const DEFAULT_CORPUS_FILE: &str = "climbing_results.json";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Turn bouldering workout logs into a corpus and session statistics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "climb-log",
    about = "Turn bouldering workout logs into a corpus and session statistics",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Activity type selected for statistics
    #[arg(long, global = true, default_value = "Boulder")]
    pub activity_type: String,

    /// Grade counted as a hard send (V-scale number)
    #[arg(long, global = true, default_value = "6", allow_negative_numbers = true)]
    pub grade_threshold: i32,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long, global = true)]
    pub clear: bool,
}

/// Subcommands of the `climb-log` binary.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse every log file in a folder into a corpus document
    Ingest {
        /// Folder containing one log file per session
        folder: PathBuf,

        /// Output corpus document
        #[arg(short, long, default_value = DEFAULT_CORPUS_FILE)]
        output: PathBuf,
    },

    /// Fill in missing calories and implausible durations from per-climb rates
    Interpolate {
        /// Input corpus document
        input: PathBuf,

        /// Output corpus document
        output: PathBuf,
    },

    /// Performance and session statistics for the selected sessions
    Stats {
        /// Corpus document (defaults to the last one used)
        corpus: Option<PathBuf>,

        /// Comma-separated session ids; all sessions when omitted
        #[arg(long, value_delimiter = ',')]
        sessions: Vec<usize>,

        /// Keep the first session of the activity type instead of
        /// discarding it as calibration
        #[arg(long)]
        keep_first: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// One summary row per session
    Sessions {
        /// Corpus document (defaults to the last one used)
        corpus: Option<PathBuf>,

        /// Keep the first session of the activity type
        #[arg(long)]
        keep_first: bool,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Corpus document this command reads, if it reads one.
    pub fn corpus_path(&self) -> Option<&Path> {
        match self {
            Command::Ingest { .. } => None,
            Command::Interpolate { input, .. } => Some(input),
            Command::Stats { corpus, .. } | Command::Sessions { corpus, .. } => corpus.as_deref(),
        }
    }

    /// Corpus document worth remembering after this command runs, as an
    /// absolute path.
    fn remembered_corpus(&self) -> Option<PathBuf> {
        let path = match self {
            Command::Ingest { output, .. } | Command::Interpolate { output, .. } => output,
            Command::Stats { corpus, .. } | Command::Sessions { corpus, .. } => corpus.as_ref()?,
        };
        Some(std::path::absolute(path).unwrap_or_else(|_| path.clone()))
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.climb-log/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.climb-log/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".climb-log").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_flags(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "activity_type") {
            if let Some(v) = last.activity_type {
                settings.activity_type = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "grade_threshold") {
            if let Some(v) = last.grade_threshold {
                settings.grade_threshold = v;
            }
        }
        match &mut settings.command {
            Command::Stats { corpus, .. } | Command::Sessions { corpus, .. } if corpus.is_none() => {
                *corpus = last.corpus;
            }
            _ => {}
        }

        settings = Self::resolve_flags(settings);

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Apply the `--debug` flag.
    fn resolve_flags(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            activity_type: Some(s.activity_type.clone()),
            grade_threshold: Some(s.grade_threshold),
            corpus: s.command.remembered_corpus(),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
///
/// Global args are propagated to the top-level matches with their highest
/// value source, so a flag given after the subcommand is still seen here.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| std::ffi::OsString::from(*s)).collect()
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            activity_type: Some("Boulder".to_string()),
            grade_threshold: Some(7),
            corpus: Some(PathBuf::from("/data/climbing_results.json")),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.activity_type, Some("Boulder".to_string()));
        assert_eq!(loaded.grade_threshold, Some(7));
        assert_eq!(
            loaded.corpus,
            Some(PathBuf::from("/data/climbing_results.json"))
        );
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.activity_type.is_none());
        assert!(loaded.grade_threshold.is_none());
        assert!(loaded.corpus.is_none());
    }

    #[test]
    fn test_last_used_params_default_when_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).corpus.is_none());
    }

    // ── CLI parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["climb-log", "stats"]);

        assert_eq!(settings.activity_type, "Boulder");
        assert_eq!(settings.grade_threshold, 6);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
        assert_eq!(
            settings.command,
            Command::Stats {
                corpus: None,
                sessions: vec![],
                keep_first: false,
                json: false,
            }
        );
    }

    #[test]
    fn test_ingest_default_output() {
        let settings = Settings::parse_from(["climb-log", "ingest", "logs/"]);
        assert_eq!(
            settings.command,
            Command::Ingest {
                folder: PathBuf::from("logs/"),
                output: PathBuf::from(DEFAULT_CORPUS_FILE),
            }
        );
    }

    #[test]
    fn test_interpolate_positional_paths() {
        let settings = Settings::parse_from(["climb-log", "interpolate", "in.json", "out.json"]);
        assert_eq!(
            settings.command,
            Command::Interpolate {
                input: PathBuf::from("in.json"),
                output: PathBuf::from("out.json"),
            }
        );
        assert_eq!(settings.command.corpus_path(), Some(Path::new("in.json")));
    }

    #[test]
    fn test_stats_session_list() {
        let settings =
            Settings::parse_from(["climb-log", "stats", "c.json", "--sessions", "0,3,5"]);
        match settings.command {
            Command::Stats { sessions, corpus, .. } => {
                assert_eq!(sessions, vec![0, 3, 5]);
                assert_eq!(corpus, Some(PathBuf::from("c.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let settings =
            Settings::parse_from(["climb-log", "sessions", "--grade-threshold", "7", "--debug"]);
        assert_eq!(settings.grade_threshold, 7);
        assert!(settings.debug);
    }

    #[test]
    fn test_from_settings_to_last_used() {
        let settings = Settings::parse_from([
            "climb-log",
            "--activity-type",
            "Top Rope",
            "ingest",
            "logs",
            "-o",
            "out.json",
        ]);
        let last = LastUsedParams::from(&settings);
        assert_eq!(last.activity_type, Some("Top Rope".to_string()));
        assert_eq!(last.grade_threshold, Some(6));
        let corpus = last.corpus.expect("corpus remembered");
        assert!(corpus.is_absolute());
        assert!(corpus.ends_with("out.json"));
    }

    #[test]
    fn test_remembered_corpus_keeps_absolute_path() {
        let settings = Settings::parse_from(["climb-log", "stats", "/data/results.json"]);
        let last = LastUsedParams::from(&settings);
        assert_eq!(last.corpus, Some(PathBuf::from("/data/results.json")));
    }

    #[test]
    fn test_remembered_corpus_resolves_relative_output() {
        let settings = Settings::parse_from(["climb-log", "interpolate", "in.json", "out/fixed.json"]);
        let last = LastUsedParams::from(&settings);
        let expected = std::env::current_dir().unwrap().join("out/fixed.json");
        assert_eq!(last.corpus, Some(expected));
    }

    #[test]
    fn test_negative_grade_threshold() {
        let settings = Settings::parse_from(["climb-log", "--grade-threshold", "-1", "sessions"]);
        assert_eq!(settings.grade_threshold, -1);
    }

    // ── load_with_last_used (uses config path injection) ──────────────────────

    #[test]
    fn test_load_with_last_used_fills_corpus() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            corpus: Some(PathBuf::from("saved.json")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(args(&["climb-log", "stats"]), &config_path);
        assert_eq!(settings.command.corpus_path(), Some(Path::new("saved.json")));
    }

    #[test]
    fn test_load_with_last_used_merges_threshold() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            grade_threshold: Some(8),
            activity_type: Some("Board".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["climb-log", "stats", "c.json"]),
            &config_path,
        );
        assert_eq!(settings.grade_threshold, 8);
        assert_eq!(settings.activity_type, "Board");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            grade_threshold: Some(8),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["climb-log", "stats", "c.json", "--grade-threshold", "5"]),
            &config_path,
        );
        assert_eq!(settings.grade_threshold, 5);
    }

    #[test]
    fn test_load_with_last_used_explicit_corpus_wins() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            corpus: Some(PathBuf::from("saved.json")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["climb-log", "sessions", "other.json"]),
            &config_path,
        );
        assert_eq!(settings.command.corpus_path(), Some(Path::new("other.json")));
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            corpus: Some(PathBuf::from("saved.json")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["climb-log", "stats", "--clear"]),
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
        assert_eq!(settings.command.corpus_path(), None);
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            args(&["climb-log", "stats", "--debug"]),
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_ingest_output() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["climb-log", "ingest", "logs", "--output", "fresh.json"]),
            &config_path,
        );

        assert!(config_path.exists(), "config file must be persisted after run");
        let loaded = LastUsedParams::load_from(&config_path);
        let corpus = loaded.corpus.expect("corpus persisted");
        assert!(corpus.is_absolute(), "relative output must be stored absolute");
        assert!(corpus.ends_with("fresh.json"));
        assert_eq!(loaded.activity_type, Some("Boulder".to_string()));
    }
}
