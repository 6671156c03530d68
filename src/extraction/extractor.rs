/*!
 * Extraction: protect a script, cut it into translatable units and record
 * where every unit belongs.
 */

use std::path::Path;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::app_config::{Config, PatternConfig};
use crate::errors::{Diagnostic, PipelineError};
use crate::protection::engine::ProtectionEngine;
use crate::protection::mapping::{ProtectionTables, SymbolMetadata};

use super::decomposer::{LineDecomposer, LineKind, split_line_ending};
use super::mapping_file;
use super::pools::TranslationPools;
use super::position_map::PositionMap;

/// Number of protected items per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub dialogue: usize,
    pub emphasis: usize,
    pub whisper: usize,
    pub empty: usize,
    pub code: usize,
}

/// Identity and size of one extraction run, for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub base_name: String,
    pub line_count: usize,
    pub processed_lines: usize,
    pub counts: CategoryCounts,
    pub total_units: usize,
    pub unique_units: usize,
    pub duplicate_units: usize,
    /// SHA-256 over the base name, counts and unit list
    pub digest: String,
}

/// Everything an extraction run produces
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub position_map: PositionMap,
    pub pools: TranslationPools,
    pub tables: ProtectionTables,
    pub counts: CategoryCounts,
    pub summary: ExtractionSummary,
    /// Leftover-scan regexes for the generators that were actually used
    pub detection_regexes: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// Content of the human-readable mapping file
    pub fn mapping_file(&self) -> String {
        mapping_file::render(&self.tables)
    }
}

/// Runs the protection passes and the decomposition over a script
#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: PatternConfig,
    detect_duplicates: bool,
}

impl Extractor {
    /// Create a new extractor from the application configuration
    pub fn new(config: &Config) -> Self {
        Self::with_options(config.patterns.clone(), config.extraction.detect_duplicates)
    }

    pub fn with_options(patterns: PatternConfig, detect_duplicates: bool) -> Self {
        Self {
            patterns,
            detect_duplicates,
        }
    }

    /// Extract the units of `lines`.
    ///
    /// `source` only names the run; it is never read.
    pub fn extract(&self, lines: &[String], source: &Path) -> Result<ExtractionResult, PipelineError> {
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(PipelineError::EmptySource(source.to_path_buf()));
        }
        let base_name = base_name(source);

        let processable: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| LineKind::of(line).is_processable())
            .map(|(idx, _)| idx)
            .collect();
        debug!("{}: {} of {} lines are dialogue", base_name, processable.len(), lines.len());

        let mut bodies: Vec<String> = processable
            .iter()
            .map(|&idx| split_line_ending(&lines[idx]).0.to_string())
            .collect();

        let mut engine = ProtectionEngine::new(&self.patterns, lines);
        engine.protect_lines(&mut bodies);
        let decomposer = LineDecomposer::new(engine.tag_placeholders());
        let detection_regexes = engine.detection_regexes();
        let empty_occurrences = engine.empty_occurrences();
        let (mut tables, diagnostics) = engine.into_parts();

        let symbol_finder = symbol_finder(&tables);
        let mut map = PositionMap::new();
        let mut dialogue_units = 0;

        for (body, &idx) in bodies.iter().zip(&processable) {
            let ending = split_line_ending(&lines[idx]).1;
            let layout = LineDecomposer::layout(body);

            let mut unit_indices = Vec::with_capacity(layout.regions.len());
            for region in &layout.regions {
                let peeled = decomposer.peel(&body[region.clone()]);
                unit_indices.push(map.push_unit(peeled.text, peeled.prefixes, peeled.suffixes));
            }
            dialogue_units += unit_indices.len();

            if let Some(finder) = &symbol_finder {
                push_symbol_units(body, finder, &mut tables, &mut map);
            }

            map.push_line(
                idx,
                unit_indices,
                format!("{}{}", body, ending),
                layout.parameter_suffix(body).to_string(),
            );
        }

        map.asterix_metadata = tables.emphasis_metadata.clone();
        map.tilde_metadata = tables.whisper_metadata.clone();

        let counts = CategoryCounts {
            dialogue: dialogue_units,
            emphasis: tables.emphasis.len(),
            whisper: tables.whisper.len(),
            empty: empty_occurrences,
            code: tables.code.len(),
        };
        let pools = TranslationPools::build(&map.all_contents_linear, self.detect_duplicates);
        let summary = ExtractionSummary {
            digest: digest(&base_name, &counts, &map.all_contents_linear),
            base_name,
            line_count: lines.len(),
            processed_lines: map.line_count(),
            counts,
            total_units: map.unit_count(),
            unique_units: pools.standard.len(),
            duplicate_units: pools.duplicates.len(),
        };

        info!(
            "Extracted {} units ({} unique, {} duplicate) from {}",
            summary.total_units, summary.unique_units, summary.duplicate_units, summary.base_name
        );

        Ok(ExtractionResult {
            position_map: map,
            pools,
            tables,
            counts,
            summary,
            detection_regexes,
            diagnostics,
        })
    }
}

/// Stable artifact base name of a source path
pub fn base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "script".to_string())
}

/// Alternation of every symbol placeholder, longest first
fn symbol_finder(tables: &ProtectionTables) -> Option<Regex> {
    let mut placeholders: Vec<&str> = tables
        .emphasis_metadata
        .keys()
        .chain(tables.whisper_metadata.keys())
        .map(String::as_str)
        .collect();
    if placeholders.is_empty() {
        return None;
    }
    placeholders.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = placeholders
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    compile_finder(&alternation)
}

/// Compile a finder; without one, symbol spans are simply not linked to units
fn compile_finder(alternation: &str) -> Option<Regex> {
    match Regex::new(alternation) {
        Ok(finder) => Some(finder),
        Err(e) => {
            warn!("Symbol placeholders cannot be located in units: {}", e);
            None
        }
    }
}

fn symbol_metadata_mut<'a>(tables: &'a mut ProtectionTables, placeholder: &str) -> Option<&'a mut SymbolMetadata> {
    if tables.emphasis_metadata.contains_key(placeholder) {
        tables.emphasis_metadata.get_mut(placeholder)
    } else {
        tables.whisper_metadata.get_mut(placeholder)
    }
}

/// Give each symbol found in `text` a unit slot for its content, depth first.
/// Orphans and whitespace-only contents keep no slot and restore verbatim.
fn push_symbol_units(text: &str, finder: &Regex, tables: &mut ProtectionTables, map: &mut PositionMap) {
    let found: Vec<String> = finder.find_iter(text).map(|m| m.as_str().to_string()).collect();

    for placeholder in found {
        let Some(meta) = symbol_metadata_mut(tables, &placeholder) else {
            continue;
        };
        if meta.unit_index.is_some() || meta.is_orphan || meta.content.trim().is_empty() {
            continue;
        }
        let content = meta.content.clone();
        meta.unit_index = Some(map.push_unit(content.clone(), Vec::new(), Vec::new()));
        push_symbol_units(&content, finder, tables, map);
    }
}

fn digest(base_name: &str, counts: &CategoryCounts, units: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_name.as_bytes());
    hasher.update(
        format!(
            "|{}|{}|{}|{}|{}|",
            counts.dialogue, counts.emphasis, counts.whisper, counts.empty, counts.code
        )
        .as_bytes(),
    );
    for unit in units {
        hasher.update(unit.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
