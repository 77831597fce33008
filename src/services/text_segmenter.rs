use once_cell::sync::Lazy;
use regex::Regex;

/// Separator placed between rewritten chunks when a refined document is reassembled.
pub const JOIN_SEPARATOR: &str = "\n\n";

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n\s*\n").expect("PARAGRAPH_BREAK is a valid regex pattern")
});

// The punctuation stays with its sentence; only the whitespace run is a boundary.
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("SENTENCE_BREAK is a valid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Boundary text consumed between this chunk and the next one. Empty on
    /// the last chunk.
    pub separator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn char_len(&self, text: &str) -> usize {
        text[self.start..self.end].chars().count()
    }
}

/// Splits `text` into ordered chunks of at most `max_chars` characters,
/// cutting on blank lines first and on sentence ends inside paragraphs that
/// are too long on their own. A sentence longer than `max_chars` is kept whole.
pub fn segment(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.chars().count() <= max_chars {
        return vec![Chunk {
            index: 0,
            text: text.to_string(),
            separator: String::new(),
        }];
    }

    let whole = Span {
        start: 0,
        end: text.len(),
    };
    let paragraphs = split_units(text, whole, &PARAGRAPH_BREAK, 0);

    let mut spans = Vec::new();
    pack(text, &paragraphs, max_chars, true, &mut spans);

    spans
        .iter()
        .enumerate()
        .map(|(index, span)| {
            let separator = spans
                .get(index + 1)
                .map(|next| text[span.end..next.start].to_string())
                .unwrap_or_default();
            Chunk {
                index,
                text: text[span.start..span.end].to_string(),
                separator,
            }
        })
        .collect()
}

/// Inverse of [`segment`]: puts the consumed boundaries back between chunks.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&chunk.text);
        out.push_str(&chunk.separator);
    }
    out
}

// Boundaries touching either end of the range are left inside the outer units
// so every unit is non-empty.
fn split_units(text: &str, range: Span, boundary: &Regex, skip: usize) -> Vec<Span> {
    let slice = &text[range.start..range.end];
    let mut units = Vec::new();
    let mut cursor = 0;

    for found in boundary.find_iter(slice) {
        let boundary_start = found.start() + skip;
        if boundary_start == 0 || found.end() == slice.len() {
            continue;
        }
        units.push(Span {
            start: range.start + cursor,
            end: range.start + boundary_start,
        });
        cursor = found.end();
    }

    units.push(Span {
        start: range.start + cursor,
        end: range.end,
    });
    units
}

fn pack(text: &str, units: &[Span], max_chars: usize, split_long: bool, out: &mut Vec<Span>) {
    let mut buffer: Option<Span> = None;

    for unit in units {
        let candidate = match buffer {
            Some(current) => Span {
                start: current.start,
                end: unit.end,
            },
            None => *unit,
        };

        if candidate.char_len(text) <= max_chars {
            buffer = Some(candidate);
            continue;
        }

        if let Some(current) = buffer.take() {
            out.push(current);
        }

        if split_long && unit.char_len(text) > max_chars {
            let sentences = split_units(text, *unit, &SENTENCE_BREAK, 1);
            pack(text, &sentences, max_chars, false, out);
        } else {
            buffer = Some(*unit);
        }
    }

    if let Some(current) = buffer {
        out.push(current);
    }
}
