/*!
 * Validation of translated lines against their originals.
 *
 * - `coherence`: ordered rule chain, one issue per line at most
 * - `pairing`: builds OLD/NEW pairs from translation files or aligned scripts
 */

pub mod coherence;
pub mod pairing;

pub use coherence::{CoherenceChecker, CoherenceIssue, CoherenceReport, IssueType, Severity};
pub use pairing::{LinePair, pairs_from_aligned, pairs_from_translation_file};
