use serde::Serialize;

use crate::models::domain::{Course, GradeBreakdown, QuestionRecord, QuestionSet, SetSummary};

#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    pub course: Course,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitListResponse {
    pub ues: Vec<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteCourseResponse {
    pub success: bool,
    pub deleted_id: String,
}

/// Payload returned for a freshly generated set.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSetResponse {
    pub set_code: String,
    pub items: Vec<QuestionRecord>,
}

impl From<QuestionSet> for QuestionSetResponse {
    fn from(set: QuestionSet) -> Self {
        QuestionSetResponse {
            set_code: set.set_code,
            items: set.items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetListResponse {
    pub sets: Vec<SetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefineCourseResponse {
    #[serde(rename = "courseId")]
    pub course_id: String,
    pub refined_length: usize,
    pub chunks: usize,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerMcqResponse {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResponse {
    pub total: usize,
    pub correct: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropositionResult {
    pub label: String,
    pub expected: bool,
    pub checked: bool,
    pub correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeMultiResponse {
    pub score: f64,
    pub detail: Vec<PropositionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOpenResponse {
    pub score: f64,
    pub feedback: String,
    pub breakdown: GradeBreakdown,
}
