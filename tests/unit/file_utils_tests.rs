/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use rentrans::app_config::ExtractionConfig;
use rentrans::errors::PipelineError;
use rentrans::file_utils::{ArtifactPaths, FileManager, UnitFileKind};
use crate::common;

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.rpy"));
}

/// Test that a directory is not reported as a file
#[test]
fn test_file_exists_withDirectory_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(!FileManager::file_exists(temp_dir.path()));
    assert!(FileManager::dir_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_validateSource_withMissingFile_shouldReportNotFound() {
    let result = FileManager::validate_source("missing/script.rpy", &ExtractionConfig::default());
    assert!(matches!(result, Err(PipelineError::SourceNotFound(_))));
}

#[test]
fn test_validateSource_withWrongExtension_shouldReportExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "notes.TXT", "e \"Hi\"\n")?;

    let result = FileManager::validate_source(&path, &ExtractionConfig::default());

    match result {
        Err(PipelineError::UnsupportedExtension { extension, .. }) => assert_eq!(extension, "txt"),
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_validateSource_withUppercaseExtension_shouldBeAccepted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "SCRIPT.RPY", "e \"Hi\"\n")?;
    assert!(FileManager::validate_source(&path, &ExtractionConfig::default()).is_ok());
    Ok(())
}

#[test]
fn test_validateSource_withEmptyFile_shouldReportEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "empty.rpy", "")?;
    let result = FileManager::validate_source(&path, &ExtractionConfig::default());
    assert!(matches!(result, Err(PipelineError::EmptySource(_))));
    Ok(())
}

#[test]
fn test_validateSource_overSizeLimit_shouldReportTooLarge() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "big.rpy", "e \"0123456789\"\n")?;
    let config = ExtractionConfig {
        max_source_bytes: 8,
        ..ExtractionConfig::default()
    };

    let result = FileManager::validate_source(&path, &config);

    assert!(matches!(result, Err(PipelineError::SourceTooLarge { limit: 8, .. })));
    Ok(())
}

#[test]
fn test_readSourceLines_withInvalidUtf8_shouldReportEncoding() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("latin1.rpy");
    fs::write(&path, [b'e', b' ', b'"', 0xE9, b'"', b'\n'])?;

    let result = FileManager::read_source_lines(&path, &ExtractionConfig::default());

    assert!(matches!(result, Err(PipelineError::InvalidEncoding(_))));
    Ok(())
}

#[test]
fn test_readSourceLines_shouldKeepEveryTerminator() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "mixed.rpy", "a \"1\"\r\nb \"2\"\nc \"3\"")?;

    let lines = FileManager::read_source_lines(&path, &ExtractionConfig::default())?;

    assert_eq!(lines, vec!["a \"1\"\r\n", "b \"2\"\n", "c \"3\""]);
    Ok(())
}

#[test]
fn test_parseUnitLines_shouldDropCarriageReturnsAndFinalNewline() {
    assert_eq!(FileManager::parse_unit_lines("One\r\nTwo\r\n"), vec!["One", "Two"]);
    assert_eq!(FileManager::parse_unit_lines("One\n\nThree"), vec!["One", "", "Three"]);
    assert!(FileManager::parse_unit_lines("").is_empty());
}

/// Test that split unit files are read back in numeric, not lexical, order
#[test]
fn test_unitFiles_splitPastTen_shouldReadBackInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let paths = ArtifactPaths::new(temp_dir.path(), "script");
    let units: Vec<String> = (1..=23).map(|i| format!("Line {}", i)).collect();

    let written = FileManager::write_unit_files(&paths, UnitFileKind::Units, &units, 2)?;

    assert_eq!(written.len(), 12);
    assert_eq!(written[0], temp_dir.path().join("script_units.txt"));
    assert_eq!(written[11], temp_dir.path().join("script_units_12.txt"));
    assert_eq!(FileManager::read_unit_files(&paths, UnitFileKind::Units)?, units);
    Ok(())
}

/// Test that a run without duplicates needs no duplicate file
#[test]
fn test_readUnitFiles_missingDuplicates_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let paths = ArtifactPaths::new(temp_dir.path(), "script");
    assert!(FileManager::read_unit_files(&paths, UnitFileKind::Duplicates)?.is_empty());
    Ok(())
}

#[test]
fn test_readUnitFiles_missingUnits_shouldReportArtifact() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let paths = ArtifactPaths::new(temp_dir.path(), "script");

    let result = FileManager::read_unit_files(&paths, UnitFileKind::Units);

    assert!(matches!(result, Err(PipelineError::MissingArtifact(path)) if path.ends_with("script_units.txt")));
    Ok(())
}

/// Test that another script's unit files in the same directory are ignored
#[test]
fn test_readUnitFiles_shouldIgnoreOtherBases() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let ours = ArtifactPaths::new(temp_dir.path(), "day1");
    let theirs = ArtifactPaths::new(temp_dir.path(), "day1_extra");
    FileManager::write_unit_files(&ours, UnitFileKind::Units, &["Mine".to_string()], 0)?;
    FileManager::write_unit_files(&theirs, UnitFileKind::Units, &["Theirs".to_string()], 0)?;

    assert_eq!(FileManager::read_unit_files(&ours, UnitFileKind::Units)?, vec!["Mine"]);
    Ok(())
}

/// Test that an empty pool still produces its first file
#[test]
fn test_writeUnitFiles_withNoUnits_shouldWriteEmptyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let paths = ArtifactPaths::new(temp_dir.path(), "script");

    let written = FileManager::write_unit_files(&paths, UnitFileKind::Units, &[], 10)?;

    assert_eq!(written.len(), 1);
    assert_eq!(fs::read_to_string(&written[0])?, "");
    Ok(())
}

#[test]
fn test_artifactPaths_shouldNameEveryArtifact() {
    let paths = ArtifactPaths::new("/work", "chapter1");
    assert_eq!(paths.positions(), Path::new("/work/chapter1_positions.json"));
    assert_eq!(paths.mapping(), Path::new("/work/chapter1_mapping.txt"));
    assert_eq!(paths.summary(), Path::new("/work/chapter1_summary.json"));
    assert_eq!(
        paths.unit_file(UnitFileKind::Duplicates, 3),
        Path::new("/work/chapter1_duplicates_3.txt")
    );
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/game/script.rpy"), Path::new("/out"));
    assert_eq!(output_path, Path::new("/out/script.translated.rpy"));
}

/// Test that find_files only returns allowed extensions, sorted
#[test]
fn test_find_files_shouldFilterAndSort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.rpy", "e \"B\"\n")?;
    common::create_test_file(temp_dir.path(), "sub/a.rpy", "e \"A\"\n")?;
    common::create_test_file(temp_dir.path(), "a.rpyc", "binary")?;
    common::create_test_file(temp_dir.path(), "readme.txt", "text")?;

    let files = FileManager::find_files(temp_dir.path(), &["rpy".to_string()])?;

    assert_eq!(files, vec![temp_dir.path().join("b.rpy"), temp_dir.path().join("sub/a.rpy")]);
    Ok(())
}
