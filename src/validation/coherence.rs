/*!
 * Coherence checks between an original line and its translation.
 *
 * Rules run in a fixed priority order and the first one that fires is the
 * only issue reported for the line:
 * 1. untranslated line
 * 2. `{tag}` sequence
 * 3. untranslated paired-tag content
 * 4. `[variable]` multiset
 * 5. escape sequence counts
 * 6. leftover placeholders
 * 7. percent signs
 * 8. quotes
 * 9. parentheses
 * 10. malformed escapes
 * 11. bracketed ellipsis artifacts
 * 12. isolated percent signs
 * 13. structural special characters
 * 14. length ratio
 */

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::app_config::CoherenceConfig;

use super::pairing::LinePair;

static TEXT_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("Invalid text tag regex"));

static VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("Invalid variable regex"));

/// Conversion flags such as `!t`, `!u` or `!cl` at the end of a variable
static VARIABLE_FLAGS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:![a-z]+)+$").expect("Invalid variable flags regex"));

/// Generic shape of a placeholder left behind by a protection pass
static LEFTOVER_PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[A-Z]+_)+(?:CODE|ASTERISK|TILDE|EMPTY|NARRATOR|SEPARATOR)(?:_\d+)?|(?:CODE|ASTERISK|TILDE)_\d+")
        .expect("Invalid leftover placeholder regex")
});

static BRACKETED_ELLIPSIS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:\.\.\.|…)\]").expect("Invalid bracketed ellipsis regex"));

static ISOLATED_PERCENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)%(?:\s|$)").expect("Invalid isolated percent regex"));

/// Quote characters counted together, straight and typographic alike
const QUOTE_CHARS: [char; 8] = ['"', '“', '”', '«', '»', '‹', '›', '„'];

/// Single quotes, counted unless they sit between two letters
const APOSTROPHE_CHARS: [char; 3] = ['\'', '‘', '’'];

/// Characters whose count must not change
const SPECIAL_CHARS: [char; 7] = ['{', '}', '[', ']', '<', '>', '|'];

/// Characters that may follow a backslash
const VALID_ESCAPES: [char; 9] = ['n', 't', 'r', '\\', '"', '\'', '[', '{', '%'];

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Which rule produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Untranslated,
    TagMismatch,
    UntranslatedTagContent,
    VariableMismatch,
    EscapeSequenceMismatch,
    PlaceholderNotRestored,
    PercentMismatch,
    QuoteMismatch,
    ParenthesisMismatch,
    MalformedEscape,
    BracketedEllipsis,
    IsolatedPercent,
    SpecialCharacterMismatch,
    LengthRatio,
}

impl IssueType {
    pub fn severity(&self) -> Severity {
        match self {
            Self::UntranslatedTagContent | Self::LengthRatio => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Untranslated => "untranslated line",
            Self::TagMismatch => "tag mismatch",
            Self::UntranslatedTagContent => "untranslated tag content",
            Self::VariableMismatch => "variable mismatch",
            Self::EscapeSequenceMismatch => "escape sequence mismatch",
            Self::PlaceholderNotRestored => "placeholder not restored",
            Self::PercentMismatch => "percent sign mismatch",
            Self::QuoteMismatch => "quote mismatch",
            Self::ParenthesisMismatch => "parenthesis mismatch",
            Self::MalformedEscape => "malformed escape",
            Self::BracketedEllipsis => "bracketed ellipsis",
            Self::IsolatedPercent => "isolated percent sign",
            Self::SpecialCharacterMismatch => "special character mismatch",
            Self::LengthRatio => "length ratio",
        };
        write!(f, "{}", label)
    }
}

/// One problem found on one line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoherenceIssue {
    /// 0-based index of the NEW line
    pub line: usize,
    pub issue_type: IssueType,
    pub description: String,
    pub old_content: String,
    pub new_content: String,
}

impl CoherenceIssue {
    pub fn severity(&self) -> Severity {
        self.issue_type.severity()
    }
}

impl fmt::Display for CoherenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}: {}", self.line + 1, self.issue_type, self.description)
    }
}

/// Issues of one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoherenceReport {
    pub lines_checked: usize,
    pub issues: Vec<CoherenceIssue>,
}

impl CoherenceReport {
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity() == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning).count()
    }

    /// Whether no blocking issue was found
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }
}

/// Counts of the recognized escape sequences `\n`, `\t`, `\r`, `\\`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EscapeCounts {
    newline: usize,
    tab: usize,
    carriage_return: usize,
    backslash: usize,
}

/// Rule engine comparing OLD/NEW pairs
#[derive(Debug, Clone)]
pub struct CoherenceChecker {
    config: CoherenceConfig,
    technical_words: HashSet<String>,
    placeholder_regexes: Vec<Regex>,
}

impl CoherenceChecker {
    /// Create a new checker with the given settings
    pub fn new(config: &CoherenceConfig) -> Self {
        Self {
            technical_words: config.technical_words.iter().map(|w| w.to_lowercase()).collect(),
            config: config.clone(),
            placeholder_regexes: Vec::new(),
        }
    }

    /// Also report tokens matching these regexes as leftover placeholders
    pub fn with_detection_regexes(mut self, sources: &[String]) -> Self {
        for source in sources {
            match Regex::new(source) {
                Ok(re) => self.placeholder_regexes.push(re),
                Err(e) => warn!("Ignoring unusable placeholder detection regex '{}': {}", source, e),
            }
        }
        self
    }

    /// Run the rule chain over every pair
    pub fn analyze(&self, pairs: &[LinePair]) -> CoherenceReport {
        let issues: Vec<CoherenceIssue> = pairs
            .iter()
            .filter_map(|pair| self.check_line(pair.line, &pair.old, &pair.new))
            .collect();
        debug!("Coherence: {} issues over {} pairs", issues.len(), pairs.len());
        CoherenceReport {
            lines_checked: pairs.len(),
            issues,
        }
    }

    /// First issue found for one pair, if any
    pub fn check_line(&self, line: usize, old: &str, new: &str) -> Option<CoherenceIssue> {
        let (issue_type, description) = self.first_violation(old, new)?;
        Some(CoherenceIssue {
            line,
            issue_type,
            description,
            old_content: old.to_string(),
            new_content: new.to_string(),
        })
    }

    fn first_violation(&self, old: &str, new: &str) -> Option<(IssueType, String)> {
        if self.config.check_untranslated && old == new && has_letters(&strip_markup(old)) {
            return Some((IssueType::Untranslated, "Line is identical to the original".to_string()));
        }

        let old_tags = text_tags(old);
        let new_tags = text_tags(new);
        if old_tags != new_tags {
            return Some((
                IssueType::TagMismatch,
                format!("Tags {:?} became {:?}", old_tags, new_tags),
            ));
        }

        if let Some(content) = self.untranslated_tag_content(old, new) {
            return Some((
                IssueType::UntranslatedTagContent,
                format!("Tagged text '{}' was left untranslated", content),
            ));
        }

        let old_vars = variables(old);
        let new_vars = variables(new);
        if old_vars != new_vars {
            return Some((
                IssueType::VariableMismatch,
                format!("Variables {:?} became {:?}", old_vars, new_vars),
            ));
        }

        let old_escapes = escape_counts(old);
        let new_escapes = escape_counts(new);
        if old_escapes != new_escapes {
            return Some((
                IssueType::EscapeSequenceMismatch,
                format!(
                    "Escapes \\n/\\t/\\r/\\\\ went from {}/{}/{}/{} to {}/{}/{}/{}",
                    old_escapes.newline,
                    old_escapes.tab,
                    old_escapes.carriage_return,
                    old_escapes.backslash,
                    new_escapes.newline,
                    new_escapes.tab,
                    new_escapes.carriage_return,
                    new_escapes.backslash
                ),
            ));
        }

        if let Some(token) = self.leftover_placeholder(new) {
            return Some((
                IssueType::PlaceholderNotRestored,
                format!("Placeholder '{}' was not restored", token),
            ));
        }

        if let Some(description) = count_mismatch(old, new, &['%'], "Percent signs") {
            return Some((IssueType::PercentMismatch, description));
        }

        let old_quotes = quote_count(old);
        let new_quotes = quote_count(new);
        if old_quotes != new_quotes {
            return Some((
                IssueType::QuoteMismatch,
                format!("Quotes went from {} to {}", old_quotes, new_quotes),
            ));
        }

        if let Some(description) = count_mismatch(old, new, &['(', ')'], "Parentheses") {
            return Some((IssueType::ParenthesisMismatch, description));
        }

        let old_malformed = malformed_escapes(old);
        if let Some(escape) = malformed_escapes(new).into_iter().find(|e| !old_malformed.contains(e)) {
            return Some((IssueType::MalformedEscape, format!("Malformed escape '{}'", escape)));
        }

        if BRACKETED_ELLIPSIS_REGEX.is_match(new) && !BRACKETED_ELLIPSIS_REGEX.is_match(old) {
            return Some((
                IssueType::BracketedEllipsis,
                "Bracketed ellipsis introduced by the translation".to_string(),
            ));
        }

        if ISOLATED_PERCENT_REGEX.is_match(new) && !ISOLATED_PERCENT_REGEX.is_match(old) {
            return Some((IssueType::IsolatedPercent, "Isolated percent sign introduced".to_string()));
        }

        if let Some(description) = count_mismatch(old, new, &SPECIAL_CHARS, "Special characters") {
            return Some((IssueType::SpecialCharacterMismatch, description));
        }

        if self.config.check_length_ratio {
            let old_len = old.chars().count();
            if old_len > 0 && old_len >= self.config.min_length_for_ratio {
                let ratio = new.chars().count() as f64 / old_len as f64;
                if ratio > self.config.length_ratio_threshold {
                    return Some((
                        IssueType::LengthRatio,
                        format!(
                            "Translation is {:.2}x the original length (limit {:.2})",
                            ratio, self.config.length_ratio_threshold
                        ),
                    ));
                }
            }
        }

        None
    }

    /// Inner text of a paired tag that NEW kept byte-identical
    fn untranslated_tag_content(&self, old: &str, new: &str) -> Option<String> {
        let old_contents = paired_tag_contents(old);
        let new_contents = paired_tag_contents(new);

        old_contents
            .into_iter()
            .zip(new_contents)
            .find(|(o, n)| {
                o == n
                    && has_letters(&strip_markup(o))
                    && !self.technical_words.contains(&o.trim().to_lowercase())
            })
            .map(|(o, _)| o.to_string())
    }

    fn leftover_placeholder<'a>(&self, new: &'a str) -> Option<&'a str> {
        if let Some(m) = LEFTOVER_PLACEHOLDER_REGEX.find(new) {
            return Some(m.as_str());
        }
        self.placeholder_regexes
            .iter()
            .find_map(|re| re.find(new))
            .map(|m| m.as_str())
    }
}

fn has_letters(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Text with tags and variables removed
fn strip_markup(text: &str) -> String {
    let without_tags = TEXT_TAG_REGEX.replace_all(text, "");
    VARIABLE_REGEX.replace_all(&without_tags, "").into_owned()
}

fn text_tags(text: &str) -> Vec<&str> {
    TEXT_TAG_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

/// Tag name of `{name}`, `{name=value}` or `{/name}`
fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('{').trim_end_matches('}');
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    inner.split('=').next().unwrap_or("")
}

/// Text enclosed by each opening tag and its next matching closing tag
fn paired_tag_contents(text: &str) -> Vec<&str> {
    let tags: Vec<_> = TEXT_TAG_REGEX.find_iter(text).collect();
    let mut contents = Vec::new();

    for (i, open) in tags.iter().enumerate() {
        if open.as_str().starts_with("{/") {
            continue;
        }
        let name = tag_name(open.as_str());
        if name.is_empty() {
            continue;
        }
        let closer = tags[i + 1..]
            .iter()
            .find(|t| t.as_str().starts_with("{/") && tag_name(t.as_str()) == name);
        if let Some(close) = closer {
            contents.push(&text[open.end()..close.start()]);
        }
    }

    contents
}

/// Sorted variable names, conversion flags removed; `[...]` is not a variable
fn variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = VARIABLE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !matches!(m.as_str(), "..." | "…"))
        .map(|m| VARIABLE_FLAGS_REGEX.replace(m.as_str(), "").trim().to_string())
        .collect();
    names.sort();
    names
}

fn escape_counts(text: &str) -> EscapeCounts {
    let mut counts = EscapeCounts::default();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('n') => counts.newline += 1,
            Some('t') => counts.tab += 1,
            Some('r') => counts.carriage_return += 1,
            Some('\\') => counts.backslash += 1,
            _ => {}
        }
    }
    counts
}

/// Backslash sequences that are not a known escape
fn malformed_escapes(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some(next) if VALID_ESCAPES.contains(&next) => {}
            Some(next) => found.push(format!("\\{}", next)),
            None => found.push("\\".to_string()),
        }
    }
    found
}

fn quote_count(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, c)| {
            if QUOTE_CHARS.contains(c) {
                return true;
            }
            if !APOSTROPHE_CHARS.contains(c) {
                return false;
            }
            let elision = i > 0
                && chars[i - 1].is_alphabetic()
                && chars.get(i + 1).is_some_and(|next| next.is_alphabetic());
            !elision
        })
        .count()
}

/// Describe the first character of `set` whose count differs
fn count_mismatch(old: &str, new: &str, set: &[char], label: &str) -> Option<String> {
    set.iter().find_map(|&c| {
        let before = old.matches(c).count();
        let after = new.matches(c).count();
        (before != after).then(|| format!("{}: '{}' count went from {} to {}", label, c, before, after))
    })
}
