/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::fs;

use rentrans::app_config::{Config, LogLevel, PatternConfig};
use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&config_path)?;

    assert_eq!(config, Config::default());
    assert!(config_path.exists());
    let written: Config = serde_json::from_str(&fs::read_to_string(&config_path)?)?;
    assert_eq!(written, config);
    Ok(())
}

/// Test that an existing config file is read and not overwritten
#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = r#"{
        "patterns": { "code": "(B1)", "emphasis": "AST_01" },
        "extraction": { "detect_duplicates": false, "max_lines_per_file": 200 },
        "log_level": "warn"
    }"#;
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", content)?;

    let config = Config::load_or_create(&config_path)?;

    assert_eq!(config.patterns.code, "(B1)");
    assert_eq!(config.patterns.emphasis, "AST_01");
    assert_eq!(config.patterns.whisper, PatternConfig::DEFAULT_WHISPER);
    assert!(!config.extraction.detect_duplicates);
    assert_eq!(config.extraction.max_lines_per_file, 200);
    assert_eq!(config.extraction.allowed_extensions, vec!["rpy".to_string()]);
    assert_eq!(config.log_level, LogLevel::Warn);
    assert_eq!(fs::read_to_string(&config_path)?, content);
    Ok(())
}

/// Test that an unreadable config file is reported, not replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", "{ broken")?;

    let result = Config::load_or_create(&config_path);

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Failed to parse config file"));
    Ok(())
}

/// Test that a bad placeholder pattern is not a validation error
#[test]
fn test_validate_withUnusablePattern_shouldStillPass() {
    let mut config = Config::default();
    config.patterns.code = "!!!".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withNegativeRatio_shouldFail() {
    let mut config = Config::default();
    config.coherence.length_ratio_threshold = -1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withoutExtensions_shouldFail() {
    let mut config = Config::default();
    config.extraction.allowed_extensions.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
}
