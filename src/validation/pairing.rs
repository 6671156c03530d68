/*!
 * Pairing of OLD/NEW lines for coherence analysis.
 *
 * Two sources are supported:
 * - translation files, where `# speaker "old"` comments precede the translated
 *   dialogue line and string tables use `old "…"` / `new "…"` pairs
 * - two aligned line sequences, such as a source script and its rebuilt output
 */

use crate::extraction::decomposer::{LineKind, split_line_ending};

/// One OLD/NEW pair, tagged with the 0-based index of the NEW line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePair {
    pub line: usize,
    pub old: String,
    pub new: String,
}

impl LinePair {
    pub fn new(line: usize, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            line,
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Quoted part of a line, from its first to its last quote; the trimmed line otherwise
pub fn dialogue_content(line: &str) -> &str {
    let trimmed = split_line_ending(line).0.trim_start_matches('\u{feff}').trim();
    match (trimmed.find('"'), trimmed.rfind('"')) {
        (Some(first), Some(last)) if last > first => &trimmed[first..=last],
        _ => trimmed,
    }
}

/// Pairs found in a Ren'Py translation file
pub fn pairs_from_translation_file(lines: &[String]) -> Vec<LinePair> {
    let mut pairs = Vec::new();
    let mut pending_comment: Option<String> = None;
    let mut pending_old: Option<String> = None;

    for (index, raw) in lines.iter().enumerate() {
        let trimmed = split_line_ending(raw).0.trim_start_matches('\u{feff}').trim();

        if let Some(comment) = trimmed.strip_prefix('#') {
            // location comments carry no quotes and never start a pair
            if comment.contains('"') {
                pending_comment = Some(dialogue_content(comment).to_string());
            }
            continue;
        }
        if trimmed.starts_with("translate ") {
            pending_comment = None;
            pending_old = None;
            continue;
        }
        if let Some(old) = trimmed.strip_prefix("old ") {
            pending_old = Some(dialogue_content(old).to_string());
            continue;
        }
        if let Some(new) = trimmed.strip_prefix("new ") {
            if let Some(old) = pending_old.take() {
                pairs.push(LinePair::new(index, old, dialogue_content(new)));
            }
            continue;
        }
        if LineKind::of(raw) == LineKind::Dialogue {
            if let Some(old) = pending_comment.take() {
                pairs.push(LinePair::new(index, old, dialogue_content(raw)));
            }
        }
    }

    pairs
}

/// Pairs of the dialogue lines of two aligned sequences, index by index
pub fn pairs_from_aligned(old_lines: &[String], new_lines: &[String]) -> Vec<LinePair> {
    old_lines
        .iter()
        .zip(new_lines)
        .enumerate()
        .filter(|(_, (old, _))| LineKind::of(old) == LineKind::Dialogue)
        .map(|(index, (old, new))| LinePair::new(index, dialogue_content(old), dialogue_content(new)))
        .collect()
}
