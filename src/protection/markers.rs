/*!
 * Balanced-marker scanning for symmetric markup such as `*emphasis*` and
 * `~whisper~`.
 *
 * The scanner works in two steps. A small state machine walks the characters
 * once and records every maximal run of the marker character. The runs are
 * then paired left to right: an opening run of N markers is closed by the next
 * run of N or more markers, and only N markers of that closing run are
 * consumed. Runs that never find a partner are left alone, or reported as
 * orphans when they are at least two markers long and orphan protection is on.
 */

use std::ops::Range;

/// Minimum run length that is protected as an orphan
const MIN_ORPHAN_RUN: usize = 2;

/// A protectable span found by the scanner, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSpan {
    /// `count` markers, content, `count` markers
    Balanced {
        range: Range<usize>,
        content: Range<usize>,
        count: usize,
    },
    /// A run of markers with no partner
    Orphan {
        range: Range<usize>,
        count: usize,
    },
}

impl MarkerSpan {
    pub fn range(&self) -> &Range<usize> {
        match self {
            Self::Balanced { range, .. } | Self::Orphan { range, .. } => range,
        }
    }
}

/// Maximal run of marker characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy)]
enum LexState {
    Text,
    InRun { start: usize, count: usize },
}

/// Scanner for one marker character
#[derive(Debug, Clone, Copy)]
pub struct MarkerScanner {
    marker: char,
    protect_orphans: bool,
}

impl MarkerScanner {
    pub fn new(marker: char, protect_orphans: bool) -> Self {
        Self {
            marker,
            protect_orphans,
        }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    /// Top-level spans of `text`, ordered by position and never overlapping
    pub fn scan(&self, text: &str) -> Vec<MarkerSpan> {
        let mut runs = self.lex_runs(text);
        let width = self.marker.len_utf8();
        let mut spans = Vec::new();
        let mut unmatched = Vec::new();

        let mut idx = 0;
        while idx < runs.len() {
            let open = runs[idx];
            let closer = (idx + 1..runs.len()).find(|&j| runs[j].count >= open.count);

            match closer {
                Some(j) => {
                    let close_start = runs[j].start;
                    let consumed = open.count * width;
                    spans.push(MarkerSpan::Balanced {
                        range: open.start..close_start + consumed,
                        content: open.start + consumed..close_start,
                        count: open.count,
                    });

                    let rest = runs[j].count - open.count;
                    if rest == 0 {
                        idx = j + 1;
                    } else {
                        runs[j] = Run {
                            start: close_start + consumed,
                            count: rest,
                        };
                        idx = j;
                    }
                }
                None => {
                    unmatched.push(open);
                    idx += 1;
                }
            }
        }

        if self.protect_orphans {
            spans.extend(
                unmatched
                    .into_iter()
                    .filter(|run| run.count >= MIN_ORPHAN_RUN)
                    .map(|run| MarkerSpan::Orphan {
                        range: run.start..run.start + run.count * width,
                        count: run.count,
                    }),
            );
            spans.sort_by_key(|span| span.range().start);
        }

        spans
    }

    fn lex_runs(&self, text: &str) -> Vec<Run> {
        let mut runs = Vec::new();
        let mut state = LexState::Text;

        for (pos, c) in text.char_indices() {
            state = match (state, c == self.marker) {
                (LexState::Text, true) => LexState::InRun { start: pos, count: 1 },
                (LexState::Text, false) => LexState::Text,
                (LexState::InRun { start, count }, true) => LexState::InRun {
                    start,
                    count: count + 1,
                },
                (LexState::InRun { start, count }, false) => {
                    runs.push(Run { start, count });
                    LexState::Text
                }
            };
        }
        if let LexState::InRun { start, count } = state {
            runs.push(Run { start, count });
        }

        runs
    }
}
