/*!
 * Multi-pass protection of dialogue lines.
 *
 * Passes run in a fixed order over every line before the next pass starts:
 * 1. code and tag tokens (`[var]`, `<tag>`, `{tag}`, printf codes, `\n`, `\"`)
 * 2. structural empty-string idioms
 * 3. balanced emphasis markers (`*`)
 * 4. balanced whisper markers (`~`), then orphan whisper runs
 *
 * A later pass never sees the text an earlier pass replaced, because that text
 * is already hidden behind a placeholder.
 */

use std::collections::HashSet;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::app_config::PatternConfig;
use crate::errors::{Diagnostic, DiagnosticKind};

use super::mapping::{
    EMPTY_IDIOMS, EMPTY_PLACEHOLDER, NARRATOR_PLACEHOLDER, ProtectionCategory, ProtectionTables,
    SEPARATOR_PLACEHOLDER, SymbolMetadata,
};
use super::markers::{MarkerScanner, MarkerSpan};
use super::placeholder::PlaceholderGenerator;

/// Token sources for the code pass
static CODE_TOKEN_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // engine variables
        r"\[[^\[\]\r\n]+\]",
        // html-like tags
        r"</?[A-Za-z][^<>\r\n]*>",
        // text tags
        r"\{[^{}\r\n]+\}",
        // named printf codes
        r"%\([A-Za-z_][A-Za-z0-9_]*\)[-#0 +]*\d*(?:\.\d+)?[sdifrxXeEgGc]",
    ]
    .iter()
    .map(|source| Regex::new(source).expect("Invalid code token regex"))
    .collect()
});

/// Backslash escapes, read as pairs so `\\` never swallows the quote after it
static ESCAPE_PAIR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\[\\"n]"#).expect("Invalid escape pair regex"));

/// Places where symmetric markers may never pair across
static MARKER_BARRIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "\"|{}|{}|{}",
        NARRATOR_PLACEHOLDER, SEPARATOR_PLACEHOLDER, EMPTY_PLACEHOLDER
    ))
    .expect("Invalid marker barrier regex")
});

/// Rewrites lines, replacing protectable spans with placeholders
pub struct ProtectionEngine {
    code_generator: PlaceholderGenerator,
    emphasis_generator: PlaceholderGenerator,
    whisper_generator: PlaceholderGenerator,
    tables: ProtectionTables,
    used: HashSet<String>,
    source_text: String,
    empty_occurrences: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ProtectionEngine {
    /// Build an engine for one run over `source_lines`.
    ///
    /// Unusable or duplicated patterns are replaced by the category default and
    /// reported as diagnostics.
    pub fn new(patterns: &PatternConfig, source_lines: &[String]) -> Self {
        let mut diagnostics = Vec::new();

        let (code_generator, d) =
            PlaceholderGenerator::with_fallback(&patterns.code, PatternConfig::DEFAULT_CODE);
        diagnostics.extend(d);
        let (mut emphasis_generator, d) =
            PlaceholderGenerator::with_fallback(&patterns.emphasis, PatternConfig::DEFAULT_EMPHASIS);
        diagnostics.extend(d);
        let (mut whisper_generator, d) =
            PlaceholderGenerator::with_fallback(&patterns.whisper, PatternConfig::DEFAULT_WHISPER);
        diagnostics.extend(d);

        if emphasis_generator.pattern() == code_generator.pattern() {
            let (generator, d) = Self::substitute_duplicate(&emphasis_generator, PatternConfig::DEFAULT_EMPHASIS);
            emphasis_generator = generator;
            diagnostics.push(d);
        }
        if whisper_generator.pattern() == code_generator.pattern()
            || whisper_generator.pattern() == emphasis_generator.pattern()
        {
            let (generator, d) = Self::substitute_duplicate(&whisper_generator, PatternConfig::DEFAULT_WHISPER);
            whisper_generator = generator;
            diagnostics.push(d);
        }

        let source_text = source_lines.concat();
        for placeholder in [NARRATOR_PLACEHOLDER, SEPARATOR_PLACEHOLDER, EMPTY_PLACEHOLDER] {
            if source_text.contains(placeholder) {
                warn!("Script already contains '{}'; that text will be rewritten on reconstruction", placeholder);
                diagnostics.push(Diagnostic::new(DiagnosticKind::StructuralPlaceholderInSource {
                    placeholder: placeholder.to_string(),
                }));
            }
        }

        let used = [NARRATOR_PLACEHOLDER, SEPARATOR_PLACEHOLDER, EMPTY_PLACEHOLDER]
            .iter()
            .map(|s| s.to_string())
            .collect();

        Self {
            code_generator,
            emphasis_generator,
            whisper_generator,
            tables: ProtectionTables::default(),
            used,
            source_text,
            empty_occurrences: 0,
            diagnostics,
        }
    }

    fn substitute_duplicate(duplicate: &PlaceholderGenerator, default: &str) -> (PlaceholderGenerator, Diagnostic) {
        warn!(
            "Placeholder pattern '{}' is used by more than one category; using '{}'",
            duplicate.pattern(),
            default
        );
        let (generator, _) = PlaceholderGenerator::with_fallback(default, default);
        let diagnostic = Diagnostic::new(DiagnosticKind::PatternSubstituted {
            requested: duplicate.pattern().to_string(),
            substituted: generator.pattern().to_string(),
        });
        (generator, diagnostic)
    }

    /// Run every pass, in order, over all `bodies`
    pub fn protect_lines(&mut self, bodies: &mut [String]) {
        for body in bodies.iter_mut() {
            *body = self.protect_codes(body);
        }
        debug!("Code pass: {} distinct tokens", self.tables.code.len());

        for body in bodies.iter_mut() {
            *body = self.protect_empty(body);
        }
        debug!("Empty-text pass: {} occurrences", self.empty_occurrences);

        for body in bodies.iter_mut() {
            *body = self.protect_symbols(body, ProtectionCategory::Emphasis);
        }
        debug!("Emphasis pass: {} spans", self.tables.emphasis.len());

        for body in bodies.iter_mut() {
            *body = self.protect_symbols(body, ProtectionCategory::Whisper);
        }
        debug!("Whisper pass: {} spans", self.tables.whisper.len());
    }

    /// Code/tag pass over one line body
    pub fn protect_codes(&mut self, body: &str) -> String {
        // escapes are replaced where they stand; a plain text replace of `\n`
        // would also hit the tail of `\\n`
        let body = ESCAPE_PAIR_REGEX
            .replace_all(body, |caps: &Captures| self.code_placeholder(&caps[0]))
            .into_owned();

        let mut tokens: Vec<(String, usize)> = Vec::new();
        for re in CODE_TOKEN_REGEXES.iter() {
            for m in re.find_iter(&body) {
                match tokens.iter_mut().find(|(t, _)| t == m.as_str()) {
                    Some(existing) => existing.1 = existing.1.min(m.start()),
                    None => tokens.push((m.as_str().to_string(), m.start())),
                }
            }
        }
        if tokens.is_empty() {
            return body;
        }

        // longest first so a token that is a substring of another never splits it
        tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.1.cmp(&b.1)));

        let mut out = body;
        for (token, _) in tokens {
            if !out.contains(&token) {
                continue;
            }
            let placeholder = self.code_placeholder(&token);
            out = out.replace(&token, &placeholder);
        }
        out
    }

    /// Placeholder of a code token, allocated on first sight
    fn code_placeholder(&mut self, token: &str) -> String {
        if let Some(existing) = self.tables.code.placeholder_for(token) {
            return existing.to_string();
        }
        let placeholder = self.allocate(ProtectionCategory::Code);
        self.tables.code.insert(token, &placeholder);
        placeholder
    }

    /// Empty-text pass over one line body
    pub fn protect_empty(&mut self, body: &str) -> String {
        let mut out = body.to_string();
        for (idiom, placeholder) in EMPTY_IDIOMS {
            let occurrences = out.matches(idiom).count();
            if occurrences > 0 {
                out = out.replace(idiom, placeholder);
                self.tables.empty.insert(idiom, placeholder);
                self.empty_occurrences += occurrences;
            }
        }
        out
    }

    /// Symmetric-marker pass for `category` over one line body
    pub fn protect_symbols(&mut self, body: &str, category: ProtectionCategory) -> String {
        let Some(marker) = category.marker() else {
            return body.to_string();
        };
        let scanner = MarkerScanner::new(marker, category == ProtectionCategory::Whisper);

        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for barrier in MARKER_BARRIER_REGEX.find_iter(body) {
            out.push_str(&self.protect_segment(&body[last..barrier.start()], &scanner, category));
            out.push_str(barrier.as_str());
            last = barrier.end();
        }
        out.push_str(&self.protect_segment(&body[last..], &scanner, category));
        out
    }

    fn protect_segment(&mut self, text: &str, scanner: &MarkerScanner, category: ProtectionCategory) -> String {
        let spans = scanner.scan(text);
        if spans.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            out.push_str(&text[cursor..span.range().start]);
            let metadata = match &span {
                MarkerSpan::Balanced { content, count, .. } => {
                    let inner = self.protect_segment(&text[content.clone()], scanner, category);
                    SymbolMetadata::balanced(scanner.marker(), *count, &inner)
                }
                MarkerSpan::Orphan { count, .. } => SymbolMetadata::orphan(scanner.marker(), *count),
            };
            out.push_str(&self.symbol_placeholder(category, metadata));
            cursor = span.range().end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    fn symbol_placeholder(&mut self, category: ProtectionCategory, metadata: SymbolMetadata) -> String {
        let existing = match category {
            ProtectionCategory::Emphasis => self.tables.emphasis.placeholder_for(&metadata.full_text),
            _ => self.tables.whisper.placeholder_for(&metadata.full_text),
        };
        if let Some(placeholder) = existing {
            return placeholder.to_string();
        }

        let placeholder = self.allocate(category);
        let (mapping, table) = match category {
            ProtectionCategory::Emphasis => (&mut self.tables.emphasis, &mut self.tables.emphasis_metadata),
            _ => (&mut self.tables.whisper, &mut self.tables.whisper_metadata),
        };
        mapping.insert(&metadata.full_text, &placeholder);
        table.insert(placeholder.clone(), metadata);
        placeholder
    }

    /// Next placeholder of `category` that collides with nothing issued or present in the source
    fn allocate(&mut self, category: ProtectionCategory) -> String {
        loop {
            let candidate = match category {
                ProtectionCategory::Emphasis => self.emphasis_generator.next_placeholder(),
                ProtectionCategory::Whisper => self.whisper_generator.next_placeholder(),
                ProtectionCategory::Code | ProtectionCategory::Empty => self.code_generator.next_placeholder(),
            };
            if !self.used.contains(&candidate) && !self.source_text.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Placeholders standing for `{...}` text tags
    pub fn tag_placeholders(&self) -> HashSet<String> {
        self.tables
            .code
            .iter()
            .filter(|(original, _)| original.starts_with('{') && original.ends_with('}'))
            .map(|(_, placeholder)| placeholder.to_string())
            .collect()
    }

    pub fn tables(&self) -> &ProtectionTables {
        &self.tables
    }

    pub fn empty_occurrences(&self) -> usize {
        self.empty_occurrences
    }

    /// Detection regexes of the three generators, for leftover scans
    pub fn detection_regexes(&self) -> Vec<String> {
        vec![
            self.code_generator.detection_regex(),
            self.emphasis_generator.detection_regex(),
            self.whisper_generator.detection_regex(),
        ]
    }

    pub fn into_parts(self) -> (ProtectionTables, Vec<Diagnostic>) {
        (self.tables, self.diagnostics)
    }
}
