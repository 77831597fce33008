use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    config::PipelineConfig,
    errors::{AppError, AppResult},
    models::{
        domain::{
            question::MCQ_OPTION_KEYS, CandidateItem, GenerationMode, GradeBreakdown, McqAttempt,
            OpenAnswer, Proposition, QuestionRecord,
        },
        dto::response::{
            AnswerMcqResponse, GradeMultiResponse, GradeOpenResponse, PropositionResult,
            ScoreResponse,
        },
    },
    repositories::{AttemptRepository, CourseRepository, QuestionRepository},
    services::{
        backend::{CompletionOptions, TextBackend},
        candidate_validator::parse_object,
        prompt_builder::PromptBuilder,
        response_extractor::{extract, ExpectedShape},
    },
};

/// Raw grader output kept on a parse failure is cut to this many characters.
pub const GRADING_RAW_PREVIEW_CHARS: usize = 1200;

pub fn grading_options() -> CompletionOptions {
    CompletionOptions::new(0.0, 600)
}

pub struct GradingService {
    backend: Arc<dyn TextBackend>,
    questions: Arc<dyn QuestionRepository>,
    courses: Arc<dyn CourseRepository>,
    attempts: Arc<dyn AttemptRepository>,
    prompts: PromptBuilder,
}

impl GradingService {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        questions: Arc<dyn QuestionRepository>,
        courses: Arc<dyn CourseRepository>,
        attempts: Arc<dyn AttemptRepository>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            backend,
            questions,
            courses,
            attempts,
            prompts: PromptBuilder::new(config),
        }
    }

    async fn load(&self, mode: GenerationMode, id: &str) -> AppResult<QuestionRecord> {
        self.questions
            .find_by_id(mode, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }

    pub async fn answer_mcq(
        &self,
        question_id: &str,
        chosen: &str,
        user_id: Option<String>,
    ) -> AppResult<AnswerMcqResponse> {
        let chosen = chosen.trim().to_ascii_uppercase();
        if !MCQ_OPTION_KEYS.contains(&chosen.as_str()) {
            return Err(AppError::InvalidRequest(
                "chosen must be one of A, B, C, D".to_string(),
            ));
        }

        let record = self.load(GenerationMode::Mcq, question_id).await?;
        let CandidateItem::Mcq(item) = &record.item else {
            return Err(AppError::InternalError(format!(
                "Question '{}' is not a multiple-choice question",
                question_id
            )));
        };

        let is_correct = chosen == item.answer;
        let attempt = McqAttempt::new(
            &record.set_code,
            &record.id,
            record.question_index,
            user_id,
            &chosen,
            is_correct,
        );
        self.attempts.record_mcq_attempt(attempt).await?;

        Ok(AnswerMcqResponse {
            is_correct,
            correct_answer: item.answer.clone(),
            explanation: item.explanation.clone(),
        })
    }

    pub async fn score(&self, set_code: &str, user_id: &str) -> AppResult<ScoreResponse> {
        let attempts = self.attempts.find_mcq_attempts(set_code, user_id).await?;
        Ok(score_attempts(&attempts))
    }

    pub async fn grade_multi(
        &self,
        question_id: &str,
        selected: &[String],
    ) -> AppResult<GradeMultiResponse> {
        let record = self.load(GenerationMode::Multi, question_id).await?;
        let CandidateItem::Multi(item) = &record.item else {
            return Err(AppError::InternalError(format!(
                "Question '{}' is not a multi-select question",
                question_id
            )));
        };

        Ok(grade_propositions(&item.propositions, selected))
    }

    pub async fn grade_open(
        &self,
        question_id: &str,
        answer: &str,
        user_id: Option<String>,
    ) -> AppResult<GradeOpenResponse> {
        let record = self.load(GenerationMode::Open, question_id).await?;
        let CandidateItem::Open(item) = &record.item else {
            return Err(AppError::InternalError(format!(
                "Question '{}' is not an open question",
                question_id
            )));
        };

        let course_text = self
            .courses
            .find_by_id(&record.course_id)
            .await?
            .map(|course| course.generation_source().to_string())
            .unwrap_or_default();

        let prompt = self
            .prompts
            .grade_open(&course_text, &item.prompt, &item.reference_answer, answer);
        let completion = self
            .backend
            .complete(&prompt.to_chat(), &grading_options())
            .await?;

        let extracted = extract(&completion.text, ExpectedShape::Object);
        let grading = parse_object(extracted, &completion.text, GRADING_RAW_PREVIEW_CHARS)?;
        let response = read_grading(&grading);

        let stored = OpenAnswer {
            id: Uuid::new_v4().to_string(),
            open_question_id: record.id.clone(),
            set_code: record.set_code.clone(),
            question_index: record.question_index,
            user_id,
            answer: answer.to_string(),
            score: response.score,
            feedback: response.feedback.clone(),
            breakdown: response.breakdown.clone(),
            created_at: Some(Utc::now()),
        };
        self.attempts.record_open_answer(stored).await?;

        log::info!(
            "Graded answer to open question {} with score {:.2}",
            record.id,
            response.score
        );
        Ok(response)
    }
}

pub fn score_attempts(attempts: &[McqAttempt]) -> ScoreResponse {
    let total = attempts.len();
    let correct = attempts.iter().filter(|a| a.is_correct).count();
    let percent = if total == 0 {
        0
    } else {
        ((correct as f64 / total as f64) * 100.0).round() as u32
    };

    ScoreResponse {
        total,
        correct,
        percent,
    }
}

/// One point per proposition whose checked state matches its truth,
/// normalised over the number of propositions.
pub fn grade_propositions(propositions: &[Proposition], selected: &[String]) -> GradeMultiResponse {
    let chosen: HashSet<String> = selected
        .iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .collect();

    let detail: Vec<PropositionResult> = propositions
        .iter()
        .map(|p| {
            let checked = chosen.contains(&p.label);
            PropositionResult {
                label: p.label.clone(),
                expected: p.is_true,
                checked,
                correct: checked == p.is_true,
                explanation: p.explanation.clone(),
            }
        })
        .collect();

    let good = detail.iter().filter(|d| d.correct).count();
    let score = if detail.is_empty() {
        0.0
    } else {
        good as f64 / detail.len() as f64
    };

    GradeMultiResponse { score, detail }
}

fn clamp01(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn read_grading(grading: &Map<String, Value>) -> GradeOpenResponse {
    GradeOpenResponse {
        score: clamp01(grading.get("score_final")),
        feedback: grading
            .get("feedback")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        breakdown: GradeBreakdown {
            exactitude: clamp01(grading.get("exactitude")),
            completude: clamp01(grading.get("completude")),
            clarte: clamp01(grading.get("clarte")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{McqItem, MultiItem, OpenItem},
        repositories::{
            attempt_repository::MockAttemptRepository,
            course_repository::MockCourseRepository,
            question_repository::MockQuestionRepository,
        },
        services::backend::{Completion, MockTextBackend},
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(item: CandidateItem) -> QuestionRecord {
        QuestionRecord {
            id: "q-1".to_string(),
            set_code: "set-1".to_string(),
            course_id: "course-1".to_string(),
            question_index: 2,
            item,
            created_at: None,
        }
    }

    fn mcq_record() -> QuestionRecord {
        let options: BTreeMap<String, String> = MCQ_OPTION_KEYS
            .iter()
            .map(|k| (k.to_string(), format!("Option {}", k)))
            .collect();
        record(CandidateItem::Mcq(McqItem {
            question: "Quel ion est majoritairement réabsorbé ?".to_string(),
            options,
            answer: "B".to_string(),
            explanation: "Le sodium.".to_string(),
            difficulty: 2,
        }))
    }

    fn proposition(label: &str, is_true: bool) -> Proposition {
        Proposition {
            label: label.to_string(),
            text: format!("Proposition {}", label),
            is_true,
            explanation: String::new(),
        }
    }

    fn attempt(is_correct: bool) -> McqAttempt {
        McqAttempt::new("set-1", "q-1", 1, Some("u-1".to_string()), "A", is_correct)
    }

    fn service(
        backend: MockTextBackend,
        questions: MockQuestionRepository,
        courses: MockCourseRepository,
        attempts: MockAttemptRepository,
    ) -> GradingService {
        GradingService::new(
            Arc::new(backend),
            Arc::new(questions),
            Arc::new(courses),
            Arc::new(attempts),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn score_rounds_percent_and_handles_no_attempts() {
        assert_eq!(
            score_attempts(&[]),
            ScoreResponse {
                total: 0,
                correct: 0,
                percent: 0
            }
        );

        let attempts = vec![attempt(true), attempt(true), attempt(false)];
        assert_eq!(
            score_attempts(&attempts),
            ScoreResponse {
                total: 3,
                correct: 2,
                percent: 67
            }
        );
    }

    #[test]
    fn propositions_score_one_point_per_matching_box() {
        let propositions = vec![
            proposition("A", true),
            proposition("B", false),
            proposition("C", true),
            proposition("D", false),
            proposition("E", false),
        ];
        let selected = vec!["a".to_string(), "B".to_string()];

        let graded = grade_propositions(&propositions, &selected);

        assert!((graded.score - 0.6).abs() < f64::EPSILON);
        assert!(graded.detail[0].correct);
        assert!(!graded.detail[1].correct && graded.detail[1].checked);
        assert!(!graded.detail[2].correct && !graded.detail[2].checked);
    }

    #[test]
    fn grading_values_are_clamped() {
        let grading = json!({
            "exactitude": 1.7,
            "completude": "0.25",
            "clarte": -3,
            "score_final": "n/a",
            "feedback": "  Bonne structure.  "
        });
        let response = read_grading(grading.as_object().expect("fixture is an object"));

        assert_eq!(response.score, 0.0);
        assert_eq!(response.breakdown.exactitude, 1.0);
        assert_eq!(response.breakdown.completude, 0.25);
        assert_eq!(response.breakdown.clarte, 0.0);
        assert_eq!(response.feedback, "Bonne structure.");
    }

    #[tokio::test]
    async fn answer_mcq_records_the_attempt() {
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_find_by_id()
            .withf(|mode, _| *mode == GenerationMode::Mcq)
            .returning(|_, _| Ok(Some(mcq_record())));

        let mut attempts = MockAttemptRepository::new();
        attempts
            .expect_record_mcq_attempt()
            .withf(|a| a.chosen == "B" && a.is_correct && a.question_index == 2)
            .times(1)
            .returning(|a| Ok(a));

        let service = service(
            MockTextBackend::new(),
            questions,
            MockCourseRepository::new(),
            attempts,
        );
        let response = service
            .answer_mcq("q-1", " b ", Some("u-1".to_string()))
            .await
            .expect("answer should be recorded");

        assert!(response.is_correct);
        assert_eq!(response.correct_answer, "B");
    }

    #[tokio::test]
    async fn answer_mcq_rejects_unknown_letters() {
        let service = service(
            MockTextBackend::new(),
            MockQuestionRepository::new(),
            MockCourseRepository::new(),
            MockAttemptRepository::new(),
        );
        let result = service.answer_mcq("q-1", "E", None).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn grade_multi_on_missing_question_is_not_found() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_id().returning(|_, _| Ok(None));

        let service = service(
            MockTextBackend::new(),
            questions,
            MockCourseRepository::new(),
            MockAttemptRepository::new(),
        );
        let result = service.grade_multi("missing", &[]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn grade_multi_reads_stored_propositions() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_id().returning(|_, _| {
            Ok(Some(record(CandidateItem::Multi(MultiItem {
                stem: "À propos du rein :".to_string(),
                propositions: vec![
                    proposition("A", true),
                    proposition("B", true),
                    proposition("C", true),
                    proposition("D", true),
                    proposition("E", true),
                ],
                difficulty: 3,
            }))))
        });

        let service = service(
            MockTextBackend::new(),
            questions,
            MockCourseRepository::new(),
            MockAttemptRepository::new(),
        );
        let selected: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        let graded = service
            .grade_multi("q-1", &selected)
            .await
            .expect("grading should succeed");

        assert_eq!(graded.score, 1.0);
        assert_eq!(graded.detail.len(), 5);
    }

    #[tokio::test]
    async fn grade_open_parses_object_and_stores_answer() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_id().returning(|_, _| {
            Ok(Some(record(CandidateItem::Open(OpenItem {
                prompt: "Définir la clairance rénale.".to_string(),
                reference_answer: "Volume de plasma épuré par unité de temps.".to_string(),
                difficulty: 3,
            }))))
        });

        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|_| Ok(None));

        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .withf(|messages, options| {
                messages[1].content.contains("Student answer: Le plasma épuré.")
                    && options.temperature == 0.0
                    && options.max_output_tokens == 600
            })
            .times(1)
            .returning(|_, _| {
                Ok(Completion {
                    text: "Évaluation : {\"exactitude\": 0.3, \"completude\": 0.2, \"clarte\": 0.2, \"score_final\": 0.7, \"feedback\": \"Précis.\"}".to_string(),
                })
            });

        let mut attempts = MockAttemptRepository::new();
        attempts
            .expect_record_open_answer()
            .withf(|a| a.open_question_id == "q-1" && a.set_code == "set-1" && a.score == 0.7)
            .times(1)
            .returning(|a| Ok(a));

        let service = service(backend, questions, courses, attempts);
        let graded = service
            .grade_open("q-1", "Le plasma épuré.", None)
            .await
            .expect("grading should succeed");

        assert_eq!(graded.score, 0.7);
        assert_eq!(graded.feedback, "Précis.");
        assert_eq!(graded.breakdown.exactitude, 0.3);
    }

    #[tokio::test]
    async fn grade_open_with_unreadable_output_is_malformed() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_id().returning(|_, _| {
            Ok(Some(record(CandidateItem::Open(OpenItem {
                prompt: "P".to_string(),
                reference_answer: "R".to_string(),
                difficulty: 3,
            }))))
        });
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|_| Ok(None));

        let long_reply = "x".repeat(5000);
        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .returning(move |_, _| Ok(Completion { text: long_reply.clone() }));

        let mut attempts = MockAttemptRepository::new();
        attempts.expect_record_open_answer().times(0);

        let service = service(backend, questions, courses, attempts);
        match service.grade_open("q-1", "réponse", None).await {
            Err(AppError::MalformedOutput { raw, .. }) => {
                assert_eq!(raw.chars().count(), GRADING_RAW_PREVIEW_CHARS)
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
