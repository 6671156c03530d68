/*!
 * Reconstruction: rebuild a script from its position map, its mapping file
 * and the translated units.
 *
 * Every processed line is re-decomposed from its stored protected text, the
 * translated units are put back into its regions together with the peeled
 * tag fragments, and a bounded sweep then replaces placeholders until the
 * line stops changing. Symbol placeholders restore to their translated content
 * wrapped in the exact marker runs recorded at extraction.
 */

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::app_config::Config;
use crate::errors::{Diagnostic, DiagnosticKind, PipelineError};
use crate::extraction::decomposer::{EMPTY_UNIT_SENTINEL, LineDecomposer, LineKind, split_line_ending};
use crate::extraction::mapping_file::MappingEntry;
use crate::extraction::pools::{TranslatedUnits, TranslationPools};
use crate::extraction::position_map::PositionMap;
use crate::protection::mapping::{EMPTY_IDIOMS, ProtectionCategory, SymbolMetadata};

/// Output of a reconstruction run
#[derive(Debug, Clone, Default)]
pub struct ReconstructionResult {
    /// Rebuilt lines, terminators included
    pub lines: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReconstructionResult {
    /// The rebuilt script as one string
    pub fn text(&self) -> String {
        self.lines.concat()
    }
}

/// Rebuilds translated scripts
#[derive(Debug, Clone)]
pub struct Reconstructor {
    max_restore_iterations: usize,
    detect_duplicates: bool,
}

impl Reconstructor {
    /// Create a new reconstructor from the application configuration
    pub fn new(config: &Config) -> Self {
        Self::with_options(
            config.reconstruction.max_restore_iterations,
            config.reconstruction.detect_duplicates,
        )
    }

    pub fn with_options(max_restore_iterations: usize, detect_duplicates: bool) -> Self {
        Self {
            max_restore_iterations: max_restore_iterations.max(1),
            detect_duplicates,
        }
    }

    /// Rebuild `source_lines` with the translated units
    pub fn reconstruct(
        &self,
        source_lines: &[String],
        map: &PositionMap,
        mappings: &[MappingEntry],
        translations: &TranslatedUnits,
    ) -> Result<ReconstructionResult, PipelineError> {
        map.validate()?;
        if let Some(line) = map.lines().find(|line| line.index >= source_lines.len()) {
            return Err(PipelineError::InvalidPositionMap(format!(
                "line {} is beyond the {} source lines",
                line.index,
                source_lines.len()
            )));
        }

        let mut diagnostics = Vec::new();
        let units = self.resolve_units(map, translations, &mut diagnostics);
        let restorations = restoration_table(map, mappings, &units);
        debug!("{} placeholders to restore", restorations.len());

        let mut lines = source_lines.to_vec();
        for line in map.lines() {
            let (body, ending) = split_line_ending(line.protected_line);
            let layout = LineDecomposer::layout(body);

            if layout.regions.len() != line.unit_indices.len() {
                warn!(
                    "Line {} owns {} units but has {} regions; keeping its original text",
                    line.index + 1,
                    line.unit_indices.len(),
                    layout.regions.len()
                );
                diagnostics.push(Diagnostic::new(DiagnosticKind::LayoutMismatch {
                    line: line.index,
                    expected: line.unit_indices.len(),
                    found: layout.regions.len(),
                }));
                lines[line.index] = line.protected_line.to_string();
                continue;
            }

            let mut rebuilt = String::with_capacity(line.protected_line.len());
            let mut cursor = 0;
            for (region, &unit) in layout.regions.iter().zip(line.unit_indices) {
                rebuilt.push_str(&body[cursor..region.start]);
                rebuilt.extend(map.content_prefixes[unit].iter().map(String::as_str));
                rebuilt.push_str(&units[unit]);
                rebuilt.extend(map.content_suffixes[unit].iter().map(String::as_str));
                cursor = region.end;
            }
            rebuilt.push_str(&body[cursor..layout.core_end]);
            rebuilt.push_str(line.suffix);
            rebuilt.push_str(ending);
            lines[line.index] = rebuilt;
        }

        for (index, line) in lines.iter_mut().enumerate() {
            if LineKind::of(line) == LineKind::Comment {
                continue;
            }
            if !self.restore_line(line, &restorations) {
                warn!(
                    "Placeholder restoration on line {} did not settle after {} passes",
                    index + 1,
                    self.max_restore_iterations
                );
                diagnostics.push(Diagnostic::new(DiagnosticKind::RestorationNotConverged {
                    line: index,
                    iterations: self.max_restore_iterations,
                }));
            }
        }

        info!(
            "Rebuilt {} lines ({} diagnostics)",
            map.line_count(),
            diagnostics.len()
        );
        Ok(ReconstructionResult { lines, diagnostics })
    }

    /// Final text of every unit, backfilling missing translations with the original
    fn resolve_units(
        &self,
        map: &PositionMap,
        translations: &TranslatedUnits,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<String> {
        let pools = TranslationPools::build(&map.all_contents_linear, self.detect_duplicates);
        let resolved = translations.resolve(&pools);

        resolved
            .into_iter()
            .zip(&map.all_contents_linear)
            .enumerate()
            .map(|(unit_index, (translation, original))| {
                let text = match translation {
                    Some(text) => text,
                    None => {
                        warn!("No translation for unit {}, keeping the original text", unit_index);
                        diagnostics.push(Diagnostic::new(DiagnosticKind::MissingTranslation { unit_index }));
                        original.clone()
                    }
                };
                if text.trim() == EMPTY_UNIT_SENTINEL {
                    String::new()
                } else {
                    text
                }
            })
            .collect()
    }

    /// Replace placeholders until a pass changes nothing; false if the cap was hit first
    fn restore_line(&self, line: &mut String, restorations: &[(String, String)]) -> bool {
        for _ in 0..self.max_restore_iterations {
            let mut changed = false;
            for (placeholder, replacement) in restorations {
                if line.contains(placeholder.as_str()) {
                    *line = line.replace(placeholder.as_str(), replacement);
                    changed = true;
                }
            }
            if !changed {
                return true;
            }
        }
        false
    }
}

/// Placeholder → replacement pairs, longest placeholder first.
///
/// Pairs are classified by the content of their original token, so a pattern
/// change between extraction and reconstruction does not misfile them.
fn restoration_table(map: &PositionMap, mappings: &[MappingEntry], units: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut table = Vec::new();

    for entry in mappings {
        if !seen.insert(entry.placeholder.clone()) {
            continue;
        }
        let category = ProtectionCategory::classify_token(&entry.original);
        let replacement = match category.marker() {
            Some(marker) => match symbol_metadata(map, category, &entry.placeholder) {
                Some(meta) => restore_symbol(meta, marker, units),
                None => entry.original.clone(),
            },
            None => entry.original.clone(),
        };
        table.push((entry.placeholder.clone(), replacement));
    }

    for (category, metadata) in [
        (ProtectionCategory::Emphasis, &map.asterix_metadata),
        (ProtectionCategory::Whisper, &map.tilde_metadata),
    ] {
        let Some(marker) = category.marker() else {
            continue;
        };
        for (placeholder, meta) in metadata {
            if seen.insert(placeholder.clone()) {
                table.push((placeholder.clone(), restore_symbol(meta, marker, units)));
            }
        }
    }

    for (idiom, placeholder) in EMPTY_IDIOMS {
        if seen.insert(placeholder.to_string()) {
            table.push((placeholder.to_string(), idiom.to_string()));
        }
    }

    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
    table
}

fn symbol_metadata<'a>(
    map: &'a PositionMap,
    category: ProtectionCategory,
    placeholder: &str,
) -> Option<&'a SymbolMetadata> {
    let (own, other) = match category {
        ProtectionCategory::Whisper => (&map.tilde_metadata, &map.asterix_metadata),
        _ => (&map.asterix_metadata, &map.tilde_metadata),
    };
    own.get(placeholder).or_else(|| other.get(placeholder))
}

fn restore_symbol(meta: &SymbolMetadata, marker: char, units: &[String]) -> String {
    let content = meta
        .unit_index
        .and_then(|index| units.get(index))
        .map(String::as_str)
        .unwrap_or(&meta.content);
    meta.wrap(marker, content)
}
