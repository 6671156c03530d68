/*!
 * # rentrans - Ren'Py dialogue extraction and reconstruction
 *
 * A Rust library that prepares Ren'Py scripts for translation and rebuilds
 * them afterwards.
 *
 * ## Features
 *
 * - Replace code tags, variables, empty dialogue and emphasis markers with
 *   configurable placeholders
 * - Extract plain translation units with duplicate detection
 * - Persist a position map and a human-editable mapping file
 * - Rebuild the script from translated units, restoring every placeholder
 * - Check translated lines against their originals
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `protection`: Placeholder generation and the protection passes:
 *   - `protection::placeholder`: Pattern classification and token series
 *   - `protection::engine`: Ordered protection passes
 * - `extraction`: Line decomposition, position map and translation pools
 * - `reconstruction`: Rebuilding lines and restoring placeholders
 * - `validation`: Coherence rules over OLD/NEW line pairs
 * - `file_utils`: File system operations and artifact naming
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod protection;
pub mod reconstruction;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{Diagnostic, DiagnosticKind, PipelineError};
pub use extraction::{ExtractionResult, Extractor, PositionMap, TranslatedUnits};
pub use protection::{PlaceholderGenerator, ProtectionEngine};
pub use reconstruction::{ReconstructionResult, Reconstructor};
pub use validation::{CoherenceChecker, CoherenceReport};
