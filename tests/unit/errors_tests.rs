/*!
 * Tests for error types and diagnostics
 */

use std::path::PathBuf;

use rentrans::errors::{Diagnostic, DiagnosticKind, PipelineError};

#[test]
fn test_pipelineError_sourceNotFound_shouldDisplayPath() {
    let error = PipelineError::SourceNotFound(PathBuf::from("game/missing.rpy"));
    let display = format!("{}", error);
    assert!(display.contains("Source file not found"));
    assert!(display.contains("missing.rpy"));
}

#[test]
fn test_pipelineError_unsupportedExtension_shouldDisplayExtension() {
    let error = PipelineError::UnsupportedExtension {
        path: PathBuf::from("notes.txt"),
        extension: "txt".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("'txt'"));
    assert!(display.contains("notes.txt"));
}

#[test]
fn test_pipelineError_sourceTooLarge_shouldDisplaySizeAndLimit() {
    let error = PipelineError::SourceTooLarge {
        path: PathBuf::from("big.rpy"),
        size: 2048,
        limit: 1024,
    };
    let display = format!("{}", error);
    assert!(display.contains("2048 bytes"));
    assert!(display.contains("limit 1024"));
}

#[test]
fn test_pipelineError_malformedMapping_shouldDisplayLineAndContent() {
    let error = PipelineError::MalformedMapping {
        line: 7,
        content: "garbage".to_string(),
    };
    assert_eq!(format!("{}", error), "Malformed mapping file at line 7: garbage");
}

#[test]
fn test_pipelineError_fromIoError_shouldWrap() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: PipelineError = io_error.into();
    assert!(matches!(error, PipelineError::Io(_)));
    assert!(format!("{}", error).contains("denied"));
}

#[test]
fn test_pipelineError_fromJsonError_shouldWrap() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    let error: PipelineError = json_error.into();
    assert!(matches!(error, PipelineError::Json(_)));
}

#[test]
fn test_pipelineError_intoAnyhow_shouldKeepMessage() {
    let error: anyhow::Error = PipelineError::InvalidPositionMap("unit 3 is used twice".to_string()).into();
    assert!(format!("{}", error).contains("unit 3 is used twice"));
}

#[test]
fn test_diagnostic_layoutMismatch_shouldDisplayOneBasedLine() {
    let diagnostic = Diagnostic::new(DiagnosticKind::LayoutMismatch {
        line: 4,
        expected: 2,
        found: 1,
    });
    let display = format!("{}", diagnostic);
    assert!(display.starts_with("Line 5 owns 2 units"));
    assert!(display.contains("1 regions"));
}

#[test]
fn test_diagnostic_restorationNotConverged_shouldDisplayIterations() {
    let diagnostic = Diagnostic::new(DiagnosticKind::RestorationNotConverged { line: 0, iterations: 10 });
    let display = format!("{}", diagnostic);
    assert!(display.contains("line 1"));
    assert!(display.contains("10 passes"));
}

#[test]
fn test_diagnostic_patternSubstituted_shouldNameBothPatterns() {
    let diagnostic = Diagnostic::new(DiagnosticKind::PatternSubstituted {
        requested: "???".to_string(),
        substituted: "RENPY_CODE_001".to_string(),
    });
    let display = format!("{}", diagnostic);
    assert!(display.contains("'???'"));
    assert!(display.contains("'RENPY_CODE_001'"));
}

#[test]
fn test_diagnostic_structuralPlaceholderInSource_shouldNamePlaceholder() {
    let diagnostic = Diagnostic::new(DiagnosticKind::StructuralPlaceholderInSource {
        placeholder: "RENPY_EMPTY".to_string(),
    });
    assert!(format!("{}", diagnostic).contains("'RENPY_EMPTY'"));
}
