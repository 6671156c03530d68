/*!
 * The position map: the persisted bridge between an extraction run and a
 * later reconstruction run.
 *
 * Line indices are JSON object keys, so they serialize as strings; the
 * `BTreeMap` keeps them in ascending numeric order, which keeps `suffixes`
 * parallel to the line entries and the serialized form deterministic.
 */

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::protection::mapping::SymbolMetadata;

/// Where every translatable unit of a script belongs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMap {
    /// Processed line index → unit indices of its content regions, in order
    pub line_to_content_indices: BTreeMap<usize, Vec<usize>>,
    /// Processed line index → placeholder-protected line, terminator included
    pub original_lines: BTreeMap<usize, String>,
    /// Every unit of the run, in extraction order
    pub all_contents_linear: Vec<String>,
    /// Trailing parameter clause per processed line, in line order
    pub suffixes: Vec<String>,
    /// Tag fragments peeled off the front of each unit
    pub content_prefixes: Vec<Vec<String>>,
    /// Tag fragments peeled off the back of each unit
    pub content_suffixes: Vec<Vec<String>>,
    #[serde(default)]
    pub asterix_metadata: IndexMap<String, SymbolMetadata>,
    #[serde(default)]
    pub tilde_metadata: IndexMap<String, SymbolMetadata>,
}

/// One processed line, as seen through the position map
#[derive(Debug, Clone, Copy)]
pub struct MappedLine<'a> {
    pub index: usize,
    pub unit_indices: &'a [usize],
    pub protected_line: &'a str,
    pub suffix: &'a str,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit with its peeled fragments, returning its index
    pub fn push_unit(&mut self, text: String, prefixes: Vec<String>, suffixes: Vec<String>) -> usize {
        self.all_contents_linear.push(text);
        self.content_prefixes.push(prefixes);
        self.content_suffixes.push(suffixes);
        self.all_contents_linear.len() - 1
    }

    /// Record a processed line. Lines must be recorded in ascending order.
    pub fn push_line(&mut self, index: usize, unit_indices: Vec<usize>, protected_line: String, suffix: String) {
        self.line_to_content_indices.insert(index, unit_indices);
        self.original_lines.insert(index, protected_line);
        self.suffixes.push(suffix);
    }

    pub fn unit_count(&self) -> usize {
        self.all_contents_linear.len()
    }

    pub fn line_count(&self) -> usize {
        self.line_to_content_indices.len()
    }

    /// Processed lines in ascending order
    pub fn lines(&self) -> impl Iterator<Item = MappedLine<'_>> {
        self.line_to_content_indices
            .iter()
            .enumerate()
            .map(move |(position, (&index, unit_indices))| MappedLine {
                index,
                unit_indices,
                protected_line: self.original_lines.get(&index).map(String::as_str).unwrap_or(""),
                suffix: self.suffixes.get(position).map(String::as_str).unwrap_or(""),
            })
    }

    /// Check the structural invariants a reconstruction relies on
    pub fn validate(&self) -> Result<(), PipelineError> {
        let units = self.all_contents_linear.len();
        if self.content_prefixes.len() != units || self.content_suffixes.len() != units {
            return Err(PipelineError::InvalidPositionMap(format!(
                "{} units but {} prefix and {} suffix lists",
                units,
                self.content_prefixes.len(),
                self.content_suffixes.len()
            )));
        }
        if self.suffixes.len() != self.line_to_content_indices.len() {
            return Err(PipelineError::InvalidPositionMap(format!(
                "{} lines but {} line suffixes",
                self.line_to_content_indices.len(),
                self.suffixes.len()
            )));
        }
        if let Some(line) = self
            .line_to_content_indices
            .keys()
            .find(|line| !self.original_lines.contains_key(line))
        {
            return Err(PipelineError::InvalidPositionMap(format!(
                "line {} has no stored text",
                line
            )));
        }

        let symbol_slots = self
            .asterix_metadata
            .values()
            .chain(self.tilde_metadata.values())
            .filter_map(|meta| meta.unit_index);
        let line_slots = self.line_to_content_indices.values().flatten().copied();

        let mut seen = HashSet::new();
        for slot in line_slots.chain(symbol_slots) {
            if slot >= units {
                return Err(PipelineError::InvalidPositionMap(format!(
                    "unit index {} out of range ({} units)",
                    slot, units
                )));
            }
            if !seen.insert(slot) {
                return Err(PipelineError::InvalidPositionMap(format!(
                    "unit index {} referenced more than once",
                    slot
                )));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingArtifact(path.to_path_buf()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }
}
