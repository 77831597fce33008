use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        generation::{MAX_DIFFICULTY, MIN_DIFFICULTY},
        question::{MCQ_OPTION_KEYS, MULTI_LABELS},
        CandidateItem, GenerationMode, McqItem, MultiItem, OpenItem, Proposition,
    },
    services::duplicate_index::normalize,
};

/// Parses an extracted payload that must be a JSON array.
pub fn parse_array(extracted: &str, raw: &str, preview_chars: usize) -> AppResult<Vec<Value>> {
    match serde_json::from_str::<Value>(extracted) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(AppError::malformed(
            "model output root is not a JSON array",
            raw,
            preview_chars,
        )),
        Err(e) => Err(AppError::malformed(
            format!("model output is not valid JSON: {}", e),
            raw,
            preview_chars,
        )),
    }
}

/// Parses an extracted payload that must be a JSON object.
pub fn parse_object(
    extracted: &str,
    raw: &str,
    preview_chars: usize,
) -> AppResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(extracted) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(AppError::malformed(
            "model output root is not a JSON object",
            raw,
            preview_chars,
        )),
        Err(e) => Err(AppError::malformed(
            format!("model output is not valid JSON: {}", e),
            raw,
            preview_chars,
        )),
    }
}

/// Checks one backend item against the structural rules of `mode`.
/// `item_number` is 1-based and only used in error messages.
pub fn validate_item(
    mode: GenerationMode,
    item_number: usize,
    value: &Value,
    fallback_difficulty: i16,
) -> AppResult<CandidateItem> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::schema(item_number, "item is not a JSON object"))?;
    let fields = Fields {
        item_number,
        object,
    };

    let item = match mode {
        GenerationMode::Mcq => CandidateItem::Mcq(validate_mcq(&fields, fallback_difficulty)?),
        GenerationMode::Open => CandidateItem::Open(validate_open(&fields, fallback_difficulty)?),
        GenerationMode::Multi => CandidateItem::Multi(validate_multi(&fields, fallback_difficulty)?),
    };

    // Every stem needs a non-empty dedup key.
    if normalize(item.stem()).is_empty() {
        return Err(fields.violation("stem has no alphanumeric content"));
    }
    Ok(item)
}

fn validate_mcq(fields: &Fields<'_>, fallback_difficulty: i16) -> AppResult<McqItem> {
    let question = fields.required_text("question")?;

    let raw_options = fields
        .object
        .get("options")
        .and_then(Value::as_object)
        .ok_or_else(|| fields.violation("missing or invalid field 'options'"))?;

    let mut options = BTreeMap::new();
    for (key, text) in raw_options {
        let key = key.trim().to_ascii_uppercase();
        if !MCQ_OPTION_KEYS.contains(&key.as_str()) {
            return Err(fields.violation(format!("unexpected option key '{}'", key)));
        }
        let text = text
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| fields.violation(format!("option {} has no text", key)))?;
        if options.insert(key.clone(), text.to_string()).is_some() {
            return Err(fields.violation(format!("duplicate option key {}", key)));
        }
    }
    if let Some(missing) = MCQ_OPTION_KEYS.iter().find(|k| !options.contains_key(**k)) {
        return Err(fields.violation(format!("missing option {}", missing)));
    }

    let answer = fields.required_text("answer")?.to_ascii_uppercase();
    if !MCQ_OPTION_KEYS.contains(&answer.as_str()) {
        return Err(fields.violation(format!(
            "answer '{}' must be exactly one of A, B, C, D",
            answer
        )));
    }

    Ok(McqItem {
        question,
        options,
        answer,
        explanation: fields.text("explanation")?,
        difficulty: fields.difficulty(fallback_difficulty)?,
    })
}

fn validate_open(fields: &Fields<'_>, fallback_difficulty: i16) -> AppResult<OpenItem> {
    Ok(OpenItem {
        prompt: fields.required_text("prompt")?,
        reference_answer: fields.required_text("reference_answer")?,
        difficulty: fields.difficulty(fallback_difficulty)?,
    })
}

fn validate_multi(fields: &Fields<'_>, fallback_difficulty: i16) -> AppResult<MultiItem> {
    let stem = fields.required_text("stem")?;

    let raw_propositions = fields
        .object
        .get("propositions")
        .and_then(Value::as_array)
        .ok_or_else(|| fields.violation("missing or invalid field 'propositions'"))?;

    let mut propositions: Vec<Proposition> = Vec::with_capacity(raw_propositions.len());
    for (position, raw) in raw_propositions.iter().enumerate() {
        let object = raw.as_object().ok_or_else(|| {
            fields.violation(format!("proposition {} is not a JSON object", position + 1))
        })?;
        let prop = Fields {
            item_number: fields.item_number,
            object,
        };

        let label = prop.required_text("label")?.to_ascii_uppercase();
        if !MULTI_LABELS.contains(&label.as_str()) {
            return Err(fields.violation(format!("unexpected proposition label '{}'", label)));
        }
        if propositions.iter().any(|p| p.label == label) {
            return Err(fields.violation(format!("duplicate proposition label {}", label)));
        }

        propositions.push(Proposition {
            text: prop
                .required_text("text")
                .map_err(|_| fields.violation(format!("proposition {} has no text", label)))?,
            is_true: prop.flag("is_true").ok_or_else(|| {
                fields.violation(format!("proposition {} has no boolean 'is_true'", label))
            })?,
            explanation: prop.text("explanation")?,
            label,
        });
    }

    if let Some(missing) = MULTI_LABELS
        .iter()
        .find(|l| !propositions.iter().any(|p| p.label == **l))
    {
        return Err(fields.violation(format!("missing proposition label {}", missing)));
    }
    if !propositions.iter().any(|p| p.is_true) {
        return Err(fields.violation("at least one proposition must be true"));
    }

    propositions.sort_by(|a, b| a.label.cmp(&b.label));

    Ok(MultiItem {
        stem,
        propositions,
        difficulty: fields.difficulty(fallback_difficulty)?,
    })
}

struct Fields<'a> {
    item_number: usize,
    object: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn violation(&self, detail: impl Into<String>) -> AppError {
        AppError::schema(self.item_number, detail)
    }

    fn required_text(&self, name: &str) -> AppResult<String> {
        self.object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| self.violation(format!("missing or empty field '{}'", name)))
    }

    // Present as a string, possibly empty.
    fn text(&self, name: &str) -> AppResult<String> {
        match self.object.get(name) {
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Null) | None => Err(self.violation(format!("missing field '{}'", name))),
            Some(_) => Err(self.violation(format!("field '{}' is not a string", name))),
        }
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match self.object.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    fn difficulty(&self, fallback: i16) -> AppResult<i16> {
        let level = match self.object.get("difficulty") {
            None | Some(Value::Null) => return Ok(fallback),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        match level {
            Some(l) if l.fract() == 0.0 && (MIN_DIFFICULTY as f64..=MAX_DIFFICULTY as f64).contains(&l) => {
                Ok(l as i16)
            }
            _ => Err(self.violation("difficulty must be an integer between 1 and 5")),
        }
    }
}
