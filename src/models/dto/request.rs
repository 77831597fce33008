use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(range(min = 1, max = 12, message = "ue_number must be between 1 and 12"))]
    pub ue_number: i16,

    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MoveCourseRequest {
    #[validate(range(min = 1, max = 12, message = "new_ue_number must be between 1 and 12"))]
    pub new_ue_number: i16,
}

/// Body of the three `generate-*` routes. `n` and `difficulty` are clamped,
/// not rejected.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[validate(length(min = 1, message = "courseId is required"))]
    pub course_id: String,
    pub n: Option<i64>,
    pub difficulty: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefineCourseRequest {
    #[validate(length(min = 1, message = "courseId is required"))]
    pub course_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMcqRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[validate(length(equal = 1, message = "chosen must be one of A, B, C, D"))]
    pub chosen: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuestionsQuery {
    #[serde(default)]
    pub set_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScoreQuery {
    #[validate(length(min = 1))]
    pub set_code: String,
    #[validate(length(min = 1))]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeMultiRequest {
    #[validate(length(min = 1))]
    pub ms_question_id: String,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeOpenRequest {
    #[validate(length(min = 1))]
    pub open_question_id: String,
    #[validate(length(min = 1, message = "answer is required"))]
    pub answer: String,
    pub user_id: Option<String>,
}
