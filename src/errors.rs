/*!
 * Error types for the rentrans pipeline.
 *
 * Fatal problems (a source file that cannot be processed at all, an artifact
 * that cannot be read back) are reported as `PipelineError`. Everything the
 * pipeline can recover from locally is reported as a `Diagnostic` attached to
 * an otherwise successful result, so that one malformed line never costs the
 * translator the rest of the file.
 */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop processing of the current file
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source file does not exist
    #[error("Source file not found: {0:?}")]
    SourceNotFound(PathBuf),

    /// The source file has an extension the pipeline does not handle
    #[error("Unsupported file extension '{extension}' for {path:?}")]
    UnsupportedExtension {
        path: PathBuf,
        extension: String,
    },

    /// The source file is empty
    #[error("Source file is empty: {0:?}")]
    EmptySource(PathBuf),

    /// The source file exceeds the configured size limit
    #[error("Source file {path:?} is too large: {size} bytes (limit {limit})")]
    SourceTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// The source file is not valid UTF-8
    #[error("Source file is not valid UTF-8: {0:?}")]
    InvalidEncoding(PathBuf),

    /// A placeholder pattern cannot be used
    #[error("Invalid placeholder pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    /// The position map does not match the lines it is applied to
    #[error("Invalid position map: {0}")]
    InvalidPositionMap(String),

    /// A required artifact from the extraction run is missing
    #[error("Missing artifact: {0:?}")]
    MissingArtifact(PathBuf),

    /// The mapping file contains a line that is neither a mapping nor an annotation
    #[error("Malformed mapping file at line {line}: {content}")]
    MalformedMapping {
        line: usize,
        content: String,
    },

    /// Error from a file operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while (de)serializing an artifact
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kinds of recoverable problems met during a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A placeholder pattern was replaced by the category default
    PatternSubstituted {
        requested: String,
        substituted: String,
    },
    /// A unit had no translation and was backfilled with its original text
    MissingTranslation {
        unit_index: usize,
    },
    /// A stored line no longer decomposes into the regions it owned
    LayoutMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// The restoration sweep hit its iteration cap on a line
    RestorationNotConverged {
        line: usize,
        iterations: usize,
    },
    /// The script already contains a fixed empty-text placeholder, which
    /// reconstruction will turn into quotes
    StructuralPlaceholderInSource {
        placeholder: String,
    },
}

/// A recovered problem, kept on the result for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::PatternSubstituted { requested, substituted } => {
                write!(f, "Placeholder pattern '{}' replaced by '{}'", requested, substituted)
            }
            DiagnosticKind::MissingTranslation { unit_index } => {
                write!(f, "No translation for unit {}, original text kept", unit_index)
            }
            DiagnosticKind::LayoutMismatch { line, expected, found } => {
                write!(
                    f,
                    "Line {} owns {} units but decomposes into {} regions, original kept",
                    line + 1,
                    expected,
                    found
                )
            }
            DiagnosticKind::RestorationNotConverged { line, iterations } => {
                write!(
                    f,
                    "Placeholder restoration on line {} did not settle after {} passes",
                    line + 1,
                    iterations
                )
            }
            DiagnosticKind::StructuralPlaceholderInSource { placeholder } => {
                write!(f, "Script already contains '{}'; it will not survive reconstruction", placeholder)
            }
        }
    }
}
