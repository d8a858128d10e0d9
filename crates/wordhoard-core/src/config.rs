//! Collection configuration and loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Performance;

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "wordhoard.toml";

/// Upper bound for any interval, in days (about a century).
pub const MAX_INTERVAL_DAYS: f64 = 36_500.0;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which scheduling algorithm drives reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    #[default]
    Simple,
    Sm2,
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlgorithmKind::Simple => write!(f, "simple"),
            AlgorithmKind::Sm2 => write!(f, "sm2"),
        }
    }
}

impl std::str::FromStr for AlgorithmKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(AlgorithmKind::Simple),
            "sm2" | "sm-2" => Ok(AlgorithmKind::Sm2),
            other => Err(format!("unknown algorithm: {other}")),
        }
    }
}

/// Base review interval in days for each performance rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseIntervals {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_good")]
    pub good: f64,
    #[serde(default = "default_fair")]
    pub fair: f64,
    #[serde(default = "default_poor")]
    pub poor: f64,
}

fn default_excellent() -> f64 {
    7.0
}
fn default_good() -> f64 {
    3.0
}
fn default_fair() -> f64 {
    1.0
}
fn default_poor() -> f64 {
    0.5
}

impl Default for BaseIntervals {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            good: default_good(),
            fair: default_fair(),
            poor: default_poor(),
        }
    }
}

impl BaseIntervals {
    pub fn get(&self, performance: Performance) -> f64 {
        match performance {
            Performance::Excellent => self.excellent,
            Performance::Good => self.good,
            Performance::Fair => self.fair,
            Performance::Poor => self.poor,
        }
    }
}

/// Defaults applied when a word is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddWordConfig {
    /// Move a new word straight to learning when it arrives with a definition.
    #[serde(default = "default_true")]
    pub auto_promote_to_learning: bool,
    /// Tags attached to every new word.
    #[serde(default)]
    pub default_tags: Vec<String>,
}

impl Default for AddWordConfig {
    fn default() -> Self {
        Self {
            auto_promote_to_learning: true,
            default_tags: Vec::new(),
        }
    }
}

/// Top-level wordhoard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabConfig {
    /// Flush dirty state periodically in the background.
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Seconds between background flushes.
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval_secs: u64,
    /// Path of the collection file.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_true")]
    pub backup_enabled: bool,
    /// Number of backups kept; older ones are removed.
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
    /// Minimum accuracy for promotion, in `[0, 1]`.
    #[serde(default = "default_mastery_threshold")]
    pub mastery_threshold: f64,
    /// Reviews required before promotion is considered.
    #[serde(default = "default_mastery_review_count")]
    pub mastery_review_count: u32,
    /// Hard cap on any computed interval.
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: f64,
    /// Width of a note's single-line form.
    #[serde(default = "default_note_simplified_length")]
    pub note_simplified_length: usize,
    /// Default result limit for search.
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,
    #[serde(default)]
    pub base_intervals: BaseIntervals,
    #[serde(default)]
    pub algorithm: AlgorithmKind,
    #[serde(default)]
    pub add_word: AddWordConfig,
}

fn default_true() -> bool {
    true
}
fn default_auto_save_interval() -> u64 {
    300
}
fn default_data_file() -> PathBuf {
    PathBuf::from("vocabulary.json")
}
fn default_backup_count() -> usize {
    5
}
fn default_mastery_threshold() -> f64 {
    0.8
}
fn default_mastery_review_count() -> u32 {
    3
}
fn default_max_interval_days() -> f64 {
    30.0
}
fn default_note_simplified_length() -> usize {
    crate::model::DEFAULT_NOTE_WIDTH
}
fn default_search_result_limit() -> usize {
    20
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval_secs: default_auto_save_interval(),
            data_file: default_data_file(),
            backup_enabled: true,
            backup_count: default_backup_count(),
            mastery_threshold: default_mastery_threshold(),
            mastery_review_count: default_mastery_review_count(),
            max_interval_days: default_max_interval_days(),
            note_simplified_length: default_note_simplified_length(),
            search_result_limit: default_search_result_limit(),
            base_intervals: BaseIntervals::default(),
            algorithm: AlgorithmKind::default(),
            add_word: AddWordConfig::default(),
        }
    }
}

impl VocabConfig {
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval_secs)
    }

    /// Reject values no collection could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(0.0..=1.0).contains(&self.mastery_threshold) {
            return invalid(format!(
                "mastery_threshold must be within [0, 1], got {}",
                self.mastery_threshold
            ));
        }
        if self.auto_save && self.auto_save_interval_secs == 0 {
            return invalid("auto_save_interval_secs must be positive".into());
        }
        if !is_positive(self.max_interval_days) || self.max_interval_days > MAX_INTERVAL_DAYS {
            return invalid(format!(
                "max_interval_days must be within (0, {MAX_INTERVAL_DAYS}], got {}",
                self.max_interval_days
            ));
        }
        if self.search_result_limit == 0 {
            return invalid("search_result_limit must be positive".into());
        }
        if self.note_simplified_length < 4 {
            return invalid("note_simplified_length must be at least 4".into());
        }
        if self.data_file.as_os_str().is_empty() {
            return invalid("data_file must not be empty".into());
        }
        for performance in Performance::ALL {
            let days = self.base_intervals.get(performance);
            if !is_positive(days) || days > MAX_INTERVAL_DAYS {
                return invalid(format!(
                    "base interval for {performance} must be within (0, {MAX_INTERVAL_DAYS}], got {days}"
                ));
            }
        }
        Ok(())
    }

    /// Apply `WORDHOARD_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("WORDHOARD_DATA_FILE") {
            if !path.trim().is_empty() {
                self.data_file = PathBuf::from(path);
            }
        }
        if let Some(secs) = lookup("WORDHOARD_AUTO_SAVE_INTERVAL") {
            self.auto_save_interval_secs = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("WORDHOARD_AUTO_SAVE_INTERVAL is not a number: {secs}"))
            })?;
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `wordhoard.toml` in the current directory
/// 2. `~/.config/wordhoard/config.toml`
///
/// Environment variable overrides: `WORDHOARD_DATA_FILE`,
/// `WORDHOARD_AUTO_SAVE_INTERVAL`.
pub fn load_config() -> Result<VocabConfig, ConfigError> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VocabConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => {
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                global_config_path().filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_file(&path)?
        }
        None => VocabConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<VocabConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `~/.config/wordhoard/config.toml`, if `HOME` is set.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("wordhoard")
            .join("config.toml")
    })
}

/// Commented sample written by `wordhoard init`.
pub const SAMPLE_CONFIG: &str = r#"# wordhoard configuration

# Collection file, relative to the working directory.
data_file = "vocabulary.json"

auto_save = true
auto_save_interval_secs = 300

backup_enabled = true
backup_count = 5

# Promotion needs at least this many reviews at this accuracy.
mastery_review_count = 3
mastery_threshold = 0.8

max_interval_days = 30.0
note_simplified_length = 50
search_result_limit = 20

# "simple" or "sm2"
algorithm = "simple"

[base_intervals]
excellent = 7.0
good = 3.0
fair = 1.0
poor = 0.5

[add_word]
auto_promote_to_learning = true
default_tags = []
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = VocabConfig::default();
        assert!(config.auto_save);
        assert_eq!(config.auto_save_interval_secs, 300);
        assert_eq!(config.data_file, PathBuf::from("vocabulary.json"));
        assert_eq!(config.backup_count, 5);
        assert_eq!(config.mastery_review_count, 3);
        assert_eq!(config.base_intervals.get(Performance::Poor), 0.5);
        assert_eq!(config.algorithm, AlgorithmKind::Simple);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sample_config_matches_defaults() {
        let parsed: VocabConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, VocabConfig::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
mastery_threshold = 0.9
algorithm = "sm2"

[base_intervals]
excellent = 10.0

[add_word]
default_tags = ["toefl"]
"#;
        let config: VocabConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.mastery_threshold, 0.9);
        assert_eq!(config.algorithm, AlgorithmKind::Sm2);
        assert_eq!(config.base_intervals.excellent, 10.0);
        assert_eq!(config.base_intervals.good, 3.0);
        assert_eq!(config.add_word.default_tags, vec!["toefl"]);
        assert!(config.add_word.auto_promote_to_learning);
    }

    #[test]
    fn validate_rejects_nonsense() {
        let mut config = VocabConfig {
            mastery_threshold: 1.5,
            ..VocabConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.mastery_threshold = 0.8;
        config.base_intervals.fair = 0.0;
        assert!(config.validate().is_err());

        config.base_intervals.fair = 1.0;
        config.search_result_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bounds_intervals() {
        let mut config = VocabConfig {
            max_interval_days: 1e9,
            ..VocabConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.max_interval_days = MAX_INTERVAL_DAYS;
        assert!(config.validate().is_ok());

        config.base_intervals.excellent = 1e9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("excellent"));
    }

    #[test]
    fn env_overrides() {
        let mut config = VocabConfig::default();
        config
            .apply_env_overrides(|key| match key {
                "WORDHOARD_DATA_FILE" => Some("/tmp/words.json".into()),
                "WORDHOARD_AUTO_SAVE_INTERVAL" => Some("60".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.data_file, PathBuf::from("/tmp/words.json"));
        assert_eq!(config.auto_save_interval(), Duration::from_secs(60));

        let err = config
            .apply_env_overrides(|key| (key == "WORDHOARD_AUTO_SAVE_INTERVAL").then(|| "soon".into()))
            .unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn explicit_path_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "search_result_limit = 5\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.search_result_limit, 5);

        std::fs::write(&path, "search_result_limit = \"many\"\n").unwrap();
        assert!(matches!(
            load_config_from(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
