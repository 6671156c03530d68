/*!
 * Mapping tables produced by the protection passes.
 */

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Structural placeholder for the narrator idiom `"" "`
pub const NARRATOR_PLACEHOLDER: &str = "RENPY_NARRATOR";

/// Structural placeholder for the split-content separator `" "`
pub const SEPARATOR_PLACEHOLDER: &str = "RENPY_SEPARATOR";

/// Structural placeholder for an empty string `""`
pub const EMPTY_PLACEHOLDER: &str = "RENPY_EMPTY";

/// Empty-text idioms in replacement order, paired with their fixed placeholder
pub const EMPTY_IDIOMS: [(&str, &str); 3] = [
    ("\"\" \"", NARRATOR_PLACEHOLDER),
    ("\" \"", SEPARATOR_PLACEHOLDER),
    ("\"\"", EMPTY_PLACEHOLDER),
];

/// Emphasis marker character
pub const EMPHASIS_MARKER: char = '*';

/// Whisper marker character
pub const WHISPER_MARKER: char = '~';

/// What kind of span a placeholder stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionCategory {
    Code,
    Empty,
    Emphasis,
    Whisper,
}

impl ProtectionCategory {
    /// Classify an original token by its content, never by its placeholder.
    ///
    /// Placeholder patterns may change between extraction and reconstruction,
    /// so the shape of the placeholder says nothing reliable about the token.
    pub fn classify_token(original: &str) -> Self {
        if original.starts_with(EMPHASIS_MARKER) || original.ends_with(EMPHASIS_MARKER) {
            Self::Emphasis
        } else if original.starts_with(WHISPER_MARKER) || original.ends_with(WHISPER_MARKER) {
            Self::Whisper
        } else if EMPTY_IDIOMS.iter().any(|(idiom, _)| *idiom == original) {
            Self::Empty
        } else {
            // bracket/brace/angle tokens and everything unrecognised alike
            Self::Code
        }
    }

    /// Marker character for symmetric categories
    pub fn marker(&self) -> Option<char> {
        match self {
            Self::Emphasis => Some(EMPHASIS_MARKER),
            Self::Whisper => Some(WHISPER_MARKER),
            Self::Code | Self::Empty => None,
        }
    }
}

/// Insertion-ordered map from original token to placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionMapping {
    entries: IndexMap<String, String>,
}

impl ProtectionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder already assigned to `original`, if any
    pub fn placeholder_for(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// Record a pair; an existing pair for `original` is kept
    pub fn insert(&mut self, original: &str, placeholder: &str) {
        self.entries
            .entry(original.to_string())
            .or_insert_with(|| placeholder.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(original, placeholder)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Everything needed to restore one symmetric-marker span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMetadata {
    /// Number of markers before the content
    pub prefix_count: usize,
    /// Number of markers after the content
    pub suffix_count: usize,
    /// Text between the markers, empty for orphan runs
    pub content: String,
    /// Exact protected text, markers included
    pub full_text: String,
    /// 1 for balanced groups, 2 for orphan runs
    pub protection_pass: u8,
    #[serde(rename = "orphan", default, skip_serializing_if = "is_false")]
    pub is_orphan: bool,
    /// Slot of the content in the linear unit list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_index: Option<usize>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SymbolMetadata {
    pub fn balanced(marker: char, count: usize, content: &str) -> Self {
        let run = marker.to_string().repeat(count);
        Self {
            prefix_count: count,
            suffix_count: count,
            content: content.to_string(),
            full_text: format!("{}{}{}", run, content, run),
            protection_pass: 1,
            is_orphan: false,
            unit_index: None,
        }
    }

    pub fn orphan(marker: char, count: usize) -> Self {
        Self {
            prefix_count: count,
            suffix_count: 0,
            content: String::new(),
            full_text: marker.to_string().repeat(count),
            protection_pass: 2,
            is_orphan: true,
            unit_index: None,
        }
    }

    /// Re-wrap a (translated) content with this span's exact marker runs
    pub fn wrap(&self, marker: char, content: &str) -> String {
        if self.is_orphan {
            return self.full_text.clone();
        }
        let mut out = String::with_capacity(content.len() + self.prefix_count + self.suffix_count);
        out.extend(std::iter::repeat_n(marker, self.prefix_count));
        out.push_str(content);
        out.extend(std::iter::repeat_n(marker, self.suffix_count));
        out
    }
}

/// All mapping tables of one extraction run
#[derive(Debug, Clone, Default)]
pub struct ProtectionTables {
    pub code: ProtectionMapping,
    pub empty: ProtectionMapping,
    pub emphasis: ProtectionMapping,
    pub whisper: ProtectionMapping,
    pub emphasis_metadata: IndexMap<String, SymbolMetadata>,
    pub whisper_metadata: IndexMap<String, SymbolMetadata>,
}

impl ProtectionTables {
    pub fn mapping(&self, category: ProtectionCategory) -> &ProtectionMapping {
        match category {
            ProtectionCategory::Code => &self.code,
            ProtectionCategory::Empty => &self.empty,
            ProtectionCategory::Emphasis => &self.emphasis,
            ProtectionCategory::Whisper => &self.whisper,
        }
    }

    pub fn metadata(&self, category: ProtectionCategory) -> Option<&IndexMap<String, SymbolMetadata>> {
        match category {
            ProtectionCategory::Emphasis => Some(&self.emphasis_metadata),
            ProtectionCategory::Whisper => Some(&self.whisper_metadata),
            ProtectionCategory::Code | ProtectionCategory::Empty => None,
        }
    }

    /// Total number of placeholders across every category
    pub fn total(&self) -> usize {
        self.code.len() + self.empty.len() + self.emphasis.len() + self.whisper.len()
    }
}
