/*!
 * Decomposition of protected dialogue lines into translatable regions.
 *
 * A line body (terminator removed) is cut into a core and an optional
 * trailing parameter clause such as ` (multiple=2)`. The core is then read in
 * one of three shapes:
 * - narrator: `RENPY_NARRATOR…"`, the content follows the narrator placeholder
 * - split: `"…RENPY_SEPARATOR…"`, one region per separator-delimited part
 * - general: every `"…"` pair in the core
 *
 * Text tags at the very start or end of a region are peeled off so that
 * translators never have to move markup around.
 */

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::protection::mapping::{NARRATOR_PLACEHOLDER, SEPARATOR_PLACEHOLDER};

/// Stand-in for a region whose text is empty once tags are peeled
pub const EMPTY_UNIT_SENTINEL: &str = "¤";

/// Statements whose quoted text is not dialogue
const DIRECTIVE_KEYWORDS: [&str; 19] = [
    "translate", "old", "voice", "define", "default", "image", "label", "jump", "call", "play",
    "queue", "stop", "style", "screen", "init", "python", "show", "scene", "hide",
];

/// Trailing parenthesized parameter clause, anchored at the end of the body
static PARAMETER_CLAUSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+\((?:[^()"]|"[^"]*")*\)\s*$"#).expect("Invalid parameter clause regex")
});

/// Quoted region in the general shape
static QUOTED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("Invalid quoted region regex"));

static LEADING_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{[^{}]*\}").expect("Invalid leading tag regex"));

static TRAILING_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}$").expect("Invalid trailing tag regex"));

/// Coarse classification of a raw script line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Directive,
    Dialogue,
    Other,
}

impl LineKind {
    pub fn of(line: &str) -> Self {
        let trimmed = line.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        if trimmed.starts_with('#') {
            return Self::Comment;
        }
        if trimmed.starts_with('$') {
            return Self::Directive;
        }

        let keyword = trimmed
            .split(|c: char| c.is_whitespace() || c == ':' || c == '"')
            .next()
            .unwrap_or("");
        if DIRECTIVE_KEYWORDS.contains(&keyword) {
            return Self::Directive;
        }

        if trimmed.contains('"') {
            Self::Dialogue
        } else {
            Self::Other
        }
    }

    pub fn is_processable(&self) -> bool {
        matches!(self, Self::Dialogue)
    }
}

/// Split a line into its body and its terminator (`\n`, `\r\n` or nothing)
pub fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Which reading of the line produced its regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineShape {
    Narrator,
    Split,
    General,
}

/// Regions of a line body, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLayout {
    pub shape: LineShape,
    pub regions: Vec<Range<usize>>,
    /// Where the trailing parameter clause starts (body length when absent)
    pub core_end: usize,
}

impl LineLayout {
    pub fn parameter_suffix<'a>(&self, body: &'a str) -> &'a str {
        &body[self.core_end..]
    }
}

/// A region's text once leading and trailing tags are peeled off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeledContent {
    pub prefixes: Vec<String>,
    pub text: String,
    pub suffixes: Vec<String>,
}

/// Splits protected lines into translatable regions
#[derive(Debug, Clone, Default)]
pub struct LineDecomposer {
    tag_placeholders: Vec<String>,
}

impl LineDecomposer {
    /// `tag_placeholders` are the placeholders that stand for `{...}` tags
    pub fn new(tag_placeholders: HashSet<String>) -> Self {
        let mut tag_placeholders: Vec<String> = tag_placeholders.into_iter().collect();
        tag_placeholders.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        Self { tag_placeholders }
    }

    /// Locate the content regions of a protected line body
    pub fn layout(body: &str) -> LineLayout {
        let core_end = PARAMETER_CLAUSE_REGEX
            .find(body)
            .map(|m| m.start())
            .unwrap_or(body.len());
        let core = &body[..core_end];

        if let Some(pos) = core.find(NARRATOR_PLACEHOLDER) {
            if let Some(regions) = Self::separated_regions(core, pos + NARRATOR_PLACEHOLDER.len()) {
                return LineLayout {
                    shape: LineShape::Narrator,
                    regions,
                    core_end,
                };
            }
        }

        if let Some(sep) = core.find(SEPARATOR_PLACEHOLDER) {
            if let Some(quote) = core[..sep].find('"') {
                if let Some(regions) = Self::separated_regions(core, quote + 1) {
                    return LineLayout {
                        shape: LineShape::Split,
                        regions,
                        core_end,
                    };
                }
            }
        }

        let regions = QUOTED_REGEX
            .captures_iter(core)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.range())
            .collect();
        LineLayout {
            shape: LineShape::General,
            regions,
            core_end,
        }
    }

    /// Regions between `start` and the last quote, cut at every separator
    fn separated_regions(core: &str, start: usize) -> Option<Vec<Range<usize>>> {
        let end = core.rfind('"')?;
        if end < start {
            return None;
        }

        let mut regions = Vec::new();
        let mut cursor = start;
        for (pos, _) in core[start..end].match_indices(SEPARATOR_PLACEHOLDER) {
            regions.push(cursor..start + pos);
            cursor = start + pos + SEPARATOR_PLACEHOLDER.len();
        }
        regions.push(cursor..end);
        Some(regions)
    }

    /// Peel leading and trailing tags off a region's content
    pub fn peel(&self, content: &str) -> PeeledContent {
        let mut prefixes = Vec::new();
        let mut suffixes = Vec::new();
        let mut rest = content;

        while let Some(tag) = self.leading_tag(rest) {
            prefixes.push(tag.to_string());
            rest = &rest[tag.len()..];
        }
        while let Some(tag) = self.trailing_tag(rest) {
            suffixes.push(tag.to_string());
            rest = &rest[..rest.len() - tag.len()];
        }
        suffixes.reverse();

        let text = if rest.trim().is_empty() {
            if !rest.is_empty() {
                prefixes.push(rest.to_string());
            }
            EMPTY_UNIT_SENTINEL.to_string()
        } else {
            rest.to_string()
        };

        PeeledContent {
            prefixes,
            text,
            suffixes,
        }
    }

    fn leading_tag<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(m) = LEADING_TAG_REGEX.find(text) {
            return Some(m.as_str());
        }
        self.tag_placeholders
            .iter()
            .find(|p| text.starts_with(p.as_str()))
            .map(|p| &text[..p.len()])
    }

    fn trailing_tag<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(m) = TRAILING_TAG_REGEX.find(text) {
            return Some(m.as_str());
        }
        self.tag_placeholders
            .iter()
            .find(|p| text.ends_with(p.as_str()))
            .map(|p| &text[text.len() - p.len()..])
    }
}
