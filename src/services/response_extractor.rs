use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").expect("FENCED_BLOCK is a valid regex pattern")
});

/// Root shape the caller will parse the payload as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    Array,
    Object,
}

/// Best-effort isolation of a JSON payload inside a model completion.
///
/// Checks, in order: a fenced code block, the outermost `[...]` span, and for
/// object expectations the outermost `{...}` span (the larger of the two spans
/// wins). When nothing matches the input is returned unchanged so the JSON
/// parse downstream fails loudly.
pub fn extract(raw: &str, shape: ExpectedShape) -> &str {
    if let Some(inner) = FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .filter(|m| !m.as_str().is_empty())
    {
        return inner.as_str();
    }

    let array = bracket_span(raw, '[', ']');
    let candidate = match shape {
        ExpectedShape::Array => array,
        ExpectedShape::Object => match (array, bracket_span(raw, '{', '}')) {
            (Some(array), Some(object)) if array.len() > object.len() => Some(array),
            (_, Some(object)) => Some(object),
            (array, None) => array,
        },
    };

    candidate.unwrap_or(raw)
}

fn bracket_span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..end + close.len_utf8()])
}
