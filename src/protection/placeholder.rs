/*!
 * Placeholder token generation.
 *
 * A user-supplied pattern such as `RENPY_CODE_001` or `(B1)` is classified
 * into one of a fixed set of shapes. The first matching shape wins, and the
 * generator then emits an endless, strictly increasing series of tokens in
 * that shape, seeded from the number embedded in the pattern.
 */

use std::fmt;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Diagnostic, DiagnosticKind, PipelineError};

/// Longest pattern accepted from configuration
const MAX_PATTERN_LEN: usize = 48;

/// Most digits a seed number may carry; the counter then never overflows
const MAX_SEED_DIGITS: usize = 18;

/// Zero-padding width used by the fallback shape
const FALLBACK_WIDTH: usize = 3;

/// Characters that would break later passes if they appeared in a placeholder
const FORBIDDEN_CHARS: [char; 5] = ['"', '*', '~', '\\', '%'];

static UNDERSCORE_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+_)(\d+)$").expect("Invalid underscore-numeric regex"));
static ALPHA_IN_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([A-Z])(\d+)\)$").expect("Invalid alpha-in-parens regex"));
static DASH_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+-)(\d+)$").expect("Invalid dash-numeric regex"));
static PAREN_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\((\d+)\)$").expect("Invalid paren-numeric regex"));
static BRACKET_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+)\]$").expect("Invalid bracket-numeric regex"));
static DOT_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+\.)(\d+)$").expect("Invalid dot-numeric regex"));
static DIRECT_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)(\d+)$").expect("Invalid direct-numeric regex"));
static UNDERSCORE_ALPHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+_)([A-Z])$").expect("Invalid underscore-alpha regex"));

/// Structural shape of a placeholder pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternShape {
    /// `RENPY_CODE_001`
    UnderscoreNumeric,
    /// `(B1)`: the letter is fixed, the number increments
    AlphaNumericParens,
    /// `PH-01`
    DashNumeric,
    /// `(01)`
    ParenNumeric,
    /// `[01]`
    BracketNumeric,
    /// `PH.01`
    DotNumeric,
    /// `PH01`
    DirectNumeric,
    /// `CODE_A`: letters A..Z, then bare integers
    UnderscoreAlpha,
    /// Anything else: the whole pattern is a literal prefix followed by `_NNN`
    SimplePrefix,
}

impl fmt::Display for PatternShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnderscoreNumeric => "underscore-numeric",
            Self::AlphaNumericParens => "alpha-numeric-in-parens",
            Self::DashNumeric => "dash-numeric",
            Self::ParenNumeric => "paren-numeric",
            Self::BracketNumeric => "bracket-numeric",
            Self::DotNumeric => "dot-numeric",
            Self::DirectNumeric => "direct-numeric",
            Self::UnderscoreAlpha => "underscore-alpha",
            Self::SimplePrefix => "simple-prefix",
        };
        write!(f, "{}", name)
    }
}

/// Diagnostic view of a generator's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternInfo {
    pub pattern: String,
    pub shape: PatternShape,
    pub prefix: String,
    pub counter: u64,
    pub width: usize,
}

/// Emits placeholder tokens following a classified pattern
#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    pattern: String,
    shape: PatternShape,
    prefix: String,
    letter: char,
    width: usize,
    counter: u64,
}

impl PlaceholderGenerator {
    /// Classify `pattern` and build a generator, rejecting unusable patterns
    pub fn new(pattern: &str) -> Result<Self, PipelineError> {
        let normalized = pattern.trim().to_uppercase();
        Self::check_usable(pattern, &normalized)?;
        Self::classify(&normalized).ok_or_else(|| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("embedded number has more than {} digits", MAX_SEED_DIGITS),
        })
    }

    /// Build a generator, substituting `default` when `pattern` is unusable
    pub fn with_fallback(pattern: &str, default: &str) -> (Self, Option<Diagnostic>) {
        match Self::new(pattern) {
            Ok(generator) => (generator, None),
            Err(e) => {
                warn!("{}; using default pattern '{}'", e, default);
                let generator = Self::new(default).unwrap_or_else(|_| Self::simple_prefix(default));
                let diagnostic = Diagnostic::new(DiagnosticKind::PatternSubstituted {
                    requested: pattern.to_string(),
                    substituted: generator.pattern.clone(),
                });
                (generator, Some(diagnostic))
            }
        }
    }

    fn check_usable(original: &str, normalized: &str) -> Result<(), PipelineError> {
        let reason = if normalized.is_empty() {
            Some("pattern is empty".to_string())
        } else if normalized.chars().count() > MAX_PATTERN_LEN {
            Some(format!("pattern is longer than {} characters", MAX_PATTERN_LEN))
        } else if normalized.chars().any(char::is_whitespace) {
            Some("pattern contains whitespace".to_string())
        } else if let Some(c) = normalized.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            Some(format!("pattern contains reserved character '{}'", c))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::InvalidPattern {
                pattern: original.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn classify(pattern: &str) -> Option<Self> {
        let numeric = |shape: PatternShape, prefix: &str, digits: &str| -> Option<Self> {
            if digits.len() > MAX_SEED_DIGITS {
                return None;
            }
            let counter: u64 = digits.parse().ok()?;
            counter.checked_add(1)?;
            Some(Self {
                pattern: pattern.to_string(),
                shape,
                prefix: prefix.to_string(),
                letter: 'A',
                width: digits.len(),
                counter,
            })
        };

        if let Some(caps) = UNDERSCORE_NUMERIC.captures(pattern) {
            return numeric(PatternShape::UnderscoreNumeric, &caps[1], &caps[2]);
        }
        if let Some(caps) = ALPHA_IN_PARENS.captures(pattern) {
            let mut generator = numeric(PatternShape::AlphaNumericParens, "", &caps[2])?;
            generator.letter = caps[1].chars().next().unwrap_or('A');
            return Some(generator);
        }
        if let Some(caps) = DASH_NUMERIC.captures(pattern) {
            return numeric(PatternShape::DashNumeric, &caps[1], &caps[2]);
        }
        if let Some(caps) = PAREN_NUMERIC.captures(pattern) {
            return numeric(PatternShape::ParenNumeric, "", &caps[1]);
        }
        if let Some(caps) = BRACKET_NUMERIC.captures(pattern) {
            return numeric(PatternShape::BracketNumeric, "", &caps[1]);
        }
        if let Some(caps) = DOT_NUMERIC.captures(pattern) {
            return numeric(PatternShape::DotNumeric, &caps[1], &caps[2]);
        }
        if let Some(caps) = DIRECT_NUMERIC.captures(pattern) {
            return numeric(PatternShape::DirectNumeric, &caps[1], &caps[2]);
        }
        if let Some(caps) = UNDERSCORE_ALPHA.captures(pattern) {
            let letter = caps[2].chars().next().unwrap_or('A');
            return Some(Self {
                pattern: pattern.to_string(),
                shape: PatternShape::UnderscoreAlpha,
                prefix: caps[1].to_string(),
                letter,
                width: 0,
                counter: u64::from(letter) - u64::from('A'),
            });
        }

        Some(Self::simple_prefix(pattern))
    }

    fn simple_prefix(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            shape: PatternShape::SimplePrefix,
            prefix: format!("{}_", pattern),
            letter: 'A',
            width: FALLBACK_WIDTH,
            counter: 1,
        }
    }

    /// Return the next placeholder of the series and advance the counter
    pub fn next_placeholder(&mut self) -> String {
        let width = self.width;
        let n = self.counter;
        let token = match self.shape {
            PatternShape::AlphaNumericParens => format!("({}{:0width$})", self.letter, n),
            PatternShape::ParenNumeric => format!("({:0width$})", n),
            PatternShape::BracketNumeric => format!("[{:0width$}]", n),
            PatternShape::UnderscoreAlpha => {
                if n < 26 {
                    let letter = char::from(b'A' + n as u8);
                    format!("{}{}", self.prefix, letter)
                } else {
                    format!("{}{}", self.prefix, n + 1)
                }
            }
            PatternShape::UnderscoreNumeric
            | PatternShape::DashNumeric
            | PatternShape::DotNumeric
            | PatternShape::DirectNumeric
            | PatternShape::SimplePrefix => format!("{}{:0width$}", self.prefix, n),
        };
        self.counter = self.counter.saturating_add(1);
        token
    }

    /// Shape, prefix and current counter
    pub fn pattern_info(&self) -> PatternInfo {
        PatternInfo {
            pattern: self.pattern.clone(),
            shape: self.shape,
            prefix: self.prefix.clone(),
            counter: self.counter,
            width: self.width,
        }
    }

    /// The first `count` tokens this generator would emit, without advancing it
    pub fn preview(&self, count: usize) -> Vec<String> {
        self.clone().take(count).collect()
    }

    /// Normalized pattern the generator was built from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Regex source matching any token of this generator's series
    pub fn detection_regex(&self) -> String {
        match self.shape {
            PatternShape::AlphaNumericParens => format!(r"\({}\d+\)", self.letter),
            // bare numbers need the seed's padding, or every `(1)` in prose would match
            PatternShape::ParenNumeric => format!(r"\(\d{{{},}}\)", self.width),
            PatternShape::BracketNumeric => format!(r"\[\d{{{},}}\]", self.width),
            PatternShape::UnderscoreAlpha => {
                format!(r"{}(?:[A-Z]|\d+)\b", regex::escape(&self.prefix))
            }
            _ => format!(r"{}\d+", regex::escape(&self.prefix)),
        }
    }
}

impl Iterator for PlaceholderGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_placeholder())
    }
}
