use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Placeholder patterns per protection category
    #[serde(default)]
    pub patterns: PatternConfig,

    /// Extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Reconstruction settings
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,

    /// Coherence check settings
    #[serde(default)]
    pub coherence: CoherenceConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Placeholder patterns, one per generated category.
///
/// Structural empty-text placeholders are fixed and not configurable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PatternConfig {
    /// Pattern for code/tag tokens
    #[serde(default = "default_code_pattern")]
    pub code: String,

    /// Pattern for `*emphasis*` spans
    #[serde(default = "default_emphasis_pattern")]
    pub emphasis: String,

    /// Pattern for `~whisper~` spans
    #[serde(default = "default_whisper_pattern")]
    pub whisper: String,
}

impl PatternConfig {
    pub const DEFAULT_CODE: &'static str = "RENPY_CODE_001";
    pub const DEFAULT_EMPHASIS: &'static str = "RENPY_ASTERISK_001";
    pub const DEFAULT_WHISPER: &'static str = "RENPY_TILDE_001";
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            code: default_code_pattern(),
            emphasis: default_emphasis_pattern(),
            whisper: default_whisper_pattern(),
        }
    }
}

/// Extraction settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Route repeated units into a separate duplicate pool
    #[serde(default = "default_true")]
    pub detect_duplicates: bool,

    /// Maximum units per unit file before splitting into `_2`, `_3`, ...
    /// 0 disables splitting.
    #[serde(default)]
    pub max_lines_per_file: usize,

    /// Largest accepted source file, in bytes
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,

    /// Accepted source file extensions (without the dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            detect_duplicates: true,
            max_lines_per_file: 0,
            max_source_bytes: default_max_source_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Reconstruction settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReconstructionConfig {
    /// Upper bound on restoration sweeps per line
    #[serde(default = "default_max_restore_iterations")]
    pub max_restore_iterations: usize,

    /// Whether the extraction run routed repeated units into a duplicate pool
    #[serde(default = "default_true")]
    pub detect_duplicates: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            max_restore_iterations: default_max_restore_iterations(),
            detect_duplicates: true,
        }
    }
}

/// Coherence check settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CoherenceConfig {
    /// Flag lines whose NEW text is identical to OLD
    #[serde(default = "default_true")]
    pub check_untranslated: bool,

    /// Emit the non-blocking length-ratio warning
    #[serde(default = "default_true")]
    pub check_length_ratio: bool,

    /// NEW/OLD length ratio above which a warning is emitted
    #[serde(default = "default_length_ratio_threshold")]
    pub length_ratio_threshold: f64,

    /// OLD lines shorter than this are never ratio-checked
    #[serde(default = "default_min_length_for_ratio")]
    pub min_length_for_ratio: usize,

    /// Short words that may legitimately stay untranslated inside paired tags
    #[serde(default = "default_technical_words")]
    pub technical_words: Vec<String>,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            check_untranslated: true,
            check_length_ratio: true,
            length_ratio_threshold: default_length_ratio_threshold(),
            min_length_for_ratio: default_min_length_for_ratio(),
            technical_words: default_technical_words(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_code_pattern() -> String {
    PatternConfig::DEFAULT_CODE.to_string()
}

fn default_emphasis_pattern() -> String {
    PatternConfig::DEFAULT_EMPHASIS.to_string()
}

fn default_whisper_pattern() -> String {
    PatternConfig::DEFAULT_WHISPER.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_source_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["rpy".to_string()]
}

fn default_max_restore_iterations() -> usize {
    10
}

fn default_length_ratio_threshold() -> f64 {
    2.5
}

fn default_min_length_for_ratio() -> usize {
    10
}

fn default_technical_words() -> Vec<String> {
    [
        "ok", "id", "hp", "mp", "xp", "ui", "fps", "api", "url", "npc", "cpu", "gpu", "dlc", "pc",
        "vs", "lv", "exp", "max", "min",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.reconstruction.max_restore_iterations == 0 {
            return Err(anyhow!("reconstruction.max_restore_iterations must be at least 1"));
        }

        if !(self.coherence.length_ratio_threshold > 0.0) {
            return Err(anyhow!(
                "coherence.length_ratio_threshold must be positive, got {}",
                self.coherence.length_ratio_threshold
            ));
        }

        if self.extraction.allowed_extensions.is_empty() {
            return Err(anyhow!("extraction.allowed_extensions must not be empty"));
        }

        if self.extraction.max_source_bytes == 0 {
            return Err(anyhow!("extraction.max_source_bytes must be positive"));
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            patterns: PatternConfig::default(),
            extraction: ExtractionConfig::default(),
            reconstruction: ReconstructionConfig::default(),
            coherence: CoherenceConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
