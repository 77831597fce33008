use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answer to an MCQ question.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct McqAttempt {
    pub id: String,
    pub set_code: String,
    pub question_id: String,
    pub question_index: i16,
    pub user_id: Option<String>,
    pub chosen: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl McqAttempt {
    pub fn new(
        set_code: &str,
        question_id: &str,
        question_index: i16,
        user_id: Option<String>,
        chosen: &str,
        is_correct: bool,
    ) -> Self {
        McqAttempt {
            id: Uuid::new_v4().to_string(),
            set_code: set_code.to_string(),
            question_id: question_id.to_string(),
            question_index,
            user_id,
            chosen: chosen.to_string(),
            is_correct,
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GradeBreakdown {
    pub exactitude: f64,
    pub completude: f64,
    pub clarte: f64,
}

/// A graded answer to an open question.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OpenAnswer {
    pub id: String,
    pub open_question_id: String,
    pub set_code: String,
    pub question_index: i16,
    pub user_id: Option<String>,
    pub answer: String,
    pub score: f64,
    pub feedback: String,
    pub breakdown: GradeBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
