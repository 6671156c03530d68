/*!
 * Human-readable mapping file.
 *
 * One `PLACEHOLDER => original` line per mapping. Code and empty-text
 * mappings come first, then one annotated section per symmetric-marker
 * category. Annotation lines start with `# ` and are ignored when the file is
 * read back; placeholders never contain whitespace, so no mapping line can be
 * mistaken for one.
 */

use std::fmt::Write as _;

use crate::errors::PipelineError;
use crate::protection::mapping::{ProtectionCategory, ProtectionMapping, ProtectionTables};

/// Separator between placeholder and original token
pub const MAPPING_SEPARATOR: &str = " => ";

/// One placeholder/original pair read back from a mapping file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub placeholder: String,
    pub original: String,
}

/// Render the mapping tables of an extraction run
pub fn render(tables: &ProtectionTables) -> String {
    let mut out = String::new();

    render_section(&mut out, "Code and tag placeholders", &tables.code);
    render_section(&mut out, "Empty-text placeholders", &tables.empty);

    for (title, category) in [
        ("Emphasis placeholders", ProtectionCategory::Emphasis),
        ("Whisper placeholders", ProtectionCategory::Whisper),
    ] {
        let mapping = tables.mapping(category);
        let orphans = tables
            .metadata(category)
            .map(|meta| meta.values().filter(|m| m.is_orphan).count())
            .unwrap_or(0);
        let _ = writeln!(out, "# {} ({}, {} orphan)", title, mapping.len(), orphans);

        for (original, placeholder) in mapping.iter() {
            let _ = writeln!(out, "{}{}{}", placeholder, MAPPING_SEPARATOR, original);
            if let Some(meta) = tables.metadata(category).and_then(|m| m.get(placeholder)) {
                if meta.is_orphan {
                    let _ = writeln!(out, "#   orphan run of {}", meta.prefix_count);
                } else {
                    let _ = writeln!(
                        out,
                        "#   markers {}/{}, content: {}",
                        meta.prefix_count, meta.suffix_count, meta.content
                    );
                }
            }
        }
    }

    out
}

fn render_section(out: &mut String, title: &str, mapping: &ProtectionMapping) {
    let _ = writeln!(out, "# {} ({})", title, mapping.len());
    for (original, placeholder) in mapping.iter() {
        let _ = writeln!(out, "{}{}{}", placeholder, MAPPING_SEPARATOR, original);
    }
}

fn is_annotation(line: &str) -> bool {
    line.split_whitespace().next() == Some("#")
}

/// Parse a mapping file back into its pairs, in file order
pub fn parse(text: &str) -> Result<Vec<MappingEntry>, PipelineError> {
    let mut entries = Vec::new();

    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() || is_annotation(line) {
            continue;
        }
        let Some((placeholder, original)) = line.split_once(MAPPING_SEPARATOR) else {
            return Err(PipelineError::MalformedMapping {
                line: number + 1,
                content: line.to_string(),
            });
        };
        if placeholder.is_empty() || placeholder.chars().any(char::is_whitespace) {
            return Err(PipelineError::MalformedMapping {
                line: number + 1,
                content: line.to_string(),
            });
        }
        entries.push(MappingEntry {
            placeholder: placeholder.to_string(),
            original: original.to_string(),
        });
    }

    Ok(entries)
}
