use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MCQ_OPTION_KEYS: [&str; 4] = ["A", "B", "C", "D"];
pub const MULTI_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Mcq,   // four options, one answer
    Open,  // free answer graded against a reference
    Multi, // five propositions, any number true
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 3] =
        [GenerationMode::Mcq, GenerationMode::Open, GenerationMode::Multi];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Mcq => "mcq",
            GenerationMode::Open => "open",
            GenerationMode::Multi => "multi",
        }
    }

    /// Collection holding the items of this mode.
    pub fn collection_name(&self) -> &'static str {
        match self {
            GenerationMode::Mcq => "questions",
            GenerationMode::Open => "open_questions",
            GenerationMode::Multi => "ms_questions",
        }
    }

    pub fn default_count(&self) -> usize {
        match self {
            GenerationMode::Open => 5,
            GenerationMode::Mcq | GenerationMode::Multi => 10,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcq" => Ok(GenerationMode::Mcq),
            "open" => Ok(GenerationMode::Open),
            "multi" => Ok(GenerationMode::Multi),
            other => Err(format!("unknown question kind '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct McqItem {
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub answer: String,
    pub explanation: String,
    pub difficulty: i16,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OpenItem {
    pub prompt: String,
    pub reference_answer: String,
    pub difficulty: i16,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Proposition {
    pub label: String,
    pub text: String,
    pub is_true: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MultiItem {
    pub stem: String,
    pub propositions: Vec<Proposition>, // always A..E in label order
    pub difficulty: i16,
}

/// A validated item of one of the three generation modes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CandidateItem {
    Mcq(McqItem),
    Open(OpenItem),
    Multi(MultiItem),
}

impl CandidateItem {
    /// Text used as the deduplication key.
    pub fn stem(&self) -> &str {
        match self {
            CandidateItem::Mcq(item) => &item.question,
            CandidateItem::Open(item) => &item.prompt,
            CandidateItem::Multi(item) => &item.stem,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        match self {
            CandidateItem::Mcq(_) => GenerationMode::Mcq,
            CandidateItem::Open(_) => GenerationMode::Open,
            CandidateItem::Multi(_) => GenerationMode::Multi,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRecord {
    pub id: String,
    pub set_code: String,
    pub course_id: String,
    pub question_index: i16, // 1-based, dense within a set
    #[serde(flatten)]
    pub item: CandidateItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionSet {
    pub set_code: String,
    pub course_id: String,
    pub mode: GenerationMode,
    pub items: Vec<QuestionRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetSummary {
    #[serde(rename = "type")]
    pub kind: GenerationMode,
    pub set_code: String,
    pub count: usize,
    pub first_created_at: Option<DateTime<Utc>>,
    pub last_created_at: Option<DateTime<Utc>>,
}
