/*!
 * Protection of non-linguistic spans.
 *
 * - `placeholder`: placeholder pattern classification and token series
 * - `mapping`: original-token/placeholder tables and symbol metadata
 * - `markers`: balanced-marker scanner shared by emphasis and whisper passes
 * - `engine`: the ordered protection passes
 */

pub mod engine;
pub mod mapping;
pub mod markers;
pub mod placeholder;

pub use engine::ProtectionEngine;
pub use mapping::{ProtectionCategory, ProtectionMapping, ProtectionTables, SymbolMetadata};
pub use markers::{MarkerScanner, MarkerSpan};
pub use placeholder::{PatternInfo, PatternShape, PlaceholderGenerator};
