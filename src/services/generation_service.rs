use std::{fmt, sync::Arc};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::PipelineConfig,
    errors::{AppError, AppResult, RAW_OUTPUT_PREVIEW_CHARS},
    models::domain::{
        generation::{MAX_COUNT, MAX_DIFFICULTY, MIN_COUNT, MIN_DIFFICULTY},
        CandidateItem, GenerationMode, GenerationRequest, QuestionRecord, QuestionSet,
    },
    repositories::{CourseRepository, QuestionRepository},
    services::{
        backend::{CompletionOptions, TextBackend},
        candidate_validator::{parse_array, validate_item},
        duplicate_index::DuplicateIndex,
        prompt_builder::{truncate_chars, PromptBuilder, SourceContext},
        response_extractor::{extract, ExpectedShape},
    },
};

/// Steps of one generation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    BuildPrompt,
    InvokeBackend,
    Extract,
    Parse,
    Validate,
    Deduplicate,
    AssignOrder,
    Persist,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::BuildPrompt => write!(f, "build_prompt"),
            PipelineStage::InvokeBackend => write!(f, "invoke_backend"),
            PipelineStage::Extract => write!(f, "extract"),
            PipelineStage::Parse => write!(f, "parse"),
            PipelineStage::Validate => write!(f, "validate"),
            PipelineStage::Deduplicate => write!(f, "deduplicate"),
            PipelineStage::AssignOrder => write!(f, "assign_order"),
            PipelineStage::Persist => write!(f, "persist"),
            PipelineStage::Done => write!(f, "done"),
        }
    }
}

pub fn completion_options(mode: GenerationMode) -> CompletionOptions {
    match mode {
        GenerationMode::Mcq | GenerationMode::Open => CompletionOptions::new(0.2, 3000),
        GenerationMode::Multi => CompletionOptions::new(0.2, 3500),
    }
}

pub struct GenerationService {
    backend: Arc<dyn TextBackend>,
    questions: Arc<dyn QuestionRepository>,
    courses: Arc<dyn CourseRepository>,
    prompts: PromptBuilder,
    config: PipelineConfig,
}

impl GenerationService {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        questions: Arc<dyn QuestionRepository>,
        courses: Arc<dyn CourseRepository>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            backend,
            questions,
            courses,
            prompts: PromptBuilder::new(&config),
            config,
        }
    }

    /// Loads the course and its history for `mode`, then runs the pipeline.
    pub async fn generate_for_course(
        &self,
        course_id: &str,
        mode: GenerationMode,
        n: Option<i64>,
        difficulty: Option<i64>,
    ) -> AppResult<QuestionSet> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", course_id)))?;

        let source_text = course.generation_source().trim();
        if source_text.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Course '{}' has no content to generate from",
                course_id
            )));
        }

        let historical_stems = self.history_snapshot(mode, course_id).await?;
        log::info!(
            "Generating {} questions for course {} with {} historical stems",
            mode,
            course_id,
            historical_stems.len()
        );

        let request = GenerationRequest {
            course_id: course.id.clone(),
            course_title: course.title.clone(),
            unit_number: course.ue_number,
            source_text: source_text.to_string(),
            mode,
            count: GenerationRequest::clamp_count(mode, n),
            difficulty: GenerationRequest::clamp_difficulty(difficulty),
            historical_stems,
        };

        self.run(request).await
    }

    /// Stems already generated for a course, oldest first.
    pub async fn history_snapshot(
        &self,
        mode: GenerationMode,
        course_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut records = self.questions.list_by_course(mode, course_id).await?;
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.question_index.cmp(&b.question_index))
        });
        Ok(records
            .into_iter()
            .map(|record| record.item.stem().to_string())
            .collect())
    }

    /// One full pipeline run. Any failure aborts the run; nothing is stored
    /// unless every stage before persistence succeeded.
    pub async fn run(&self, request: GenerationRequest) -> AppResult<QuestionSet> {
        let set_code = Uuid::new_v4().to_string();
        let mut stage = PipelineStage::BuildPrompt;

        let result = self.execute(&request, &set_code, &mut stage).await;
        match &result {
            Ok(set) => log::info!(
                "Stored {} set {} with {} items for course {}",
                set.mode,
                set.set_code,
                set.items.len(),
                set.course_id
            ),
            Err(e) => log::error!(
                "Generation of {} set {} failed at stage {}: {}",
                request.mode,
                set_code,
                stage,
                e
            ),
        }
        result
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        set_code: &str,
        stage: &mut PipelineStage,
    ) -> AppResult<QuestionSet> {
        let mode = request.mode;

        advance(stage, PipelineStage::BuildPrompt, set_code);
        check_request(request)?;
        let source = SourceContext {
            title: &request.course_title,
            unit_number: request.unit_number,
            text: &request.source_text,
        };
        let prompt = self.prompts.build(
            mode,
            &source,
            request.count,
            request.difficulty,
            &request.historical_stems,
        );

        advance(stage, PipelineStage::InvokeBackend, set_code);
        let completion = self
            .backend
            .complete(&prompt.to_chat(), &completion_options(mode))
            .await?;
        log::debug!(
            "Backend output for set {}: {}",
            set_code,
            truncate_chars(&completion.text, 500)
        );

        advance(stage, PipelineStage::Extract, set_code);
        let extracted = extract(&completion.text, ExpectedShape::Array);

        advance(stage, PipelineStage::Parse, set_code);
        let values = parse_array(extracted, &completion.text, RAW_OUTPUT_PREVIEW_CHARS)?;
        if values.is_empty() {
            return Err(AppError::malformed(
                "model output contains no items",
                &completion.text,
                RAW_OUTPUT_PREVIEW_CHARS,
            ));
        }

        advance(stage, PipelineStage::Validate, set_code);
        let fallback_difficulty = request.fallback_difficulty();
        let candidates = values
            .iter()
            .enumerate()
            .map(|(i, value)| validate_item(mode, i + 1, value, fallback_difficulty))
            .collect::<AppResult<Vec<_>>>()?;

        advance(stage, PipelineStage::Deduplicate, set_code);
        let received = candidates.len();
        let accepted = deduplicate(
            candidates,
            &request.historical_stems,
            request.count,
            self.config.duplicate_containment_threshold,
        )?;
        log::info!(
            "Set {}: kept {} of {} candidates (target {})",
            set_code,
            accepted.len(),
            received,
            request.count
        );

        advance(stage, PipelineStage::AssignOrder, set_code);
        let records = assign_order(accepted, set_code, &request.course_id);

        advance(stage, PipelineStage::Persist, set_code);
        let items = self.questions.insert_set(mode, records).await?;

        advance(stage, PipelineStage::Done, set_code);
        Ok(QuestionSet {
            set_code: set_code.to_string(),
            course_id: request.course_id.clone(),
            mode,
            items,
        })
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage, set_code: &str) {
    *stage = next;
    log::debug!("Set {} entering stage {}", set_code, next);
}

fn check_request(request: &GenerationRequest) -> AppResult<()> {
    if request.source_text.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "source text is empty".to_string(),
        ));
    }
    if !(MIN_COUNT..=MAX_COUNT).contains(&request.count) {
        return Err(AppError::InvalidRequest(format!(
            "count must be between {} and {}, got {}",
            MIN_COUNT, MAX_COUNT, request.count
        )));
    }
    if let Some(level) = request.difficulty {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&level) {
            return Err(AppError::InvalidRequest(format!(
                "difficulty must be between {} and {}, got {}",
                MIN_DIFFICULTY, MAX_DIFFICULTY, level
            )));
        }
    }
    Ok(())
}

/// Drops candidates that repeat the history or an earlier candidate, keeping
/// at most `count` in their original order.
pub fn deduplicate(
    candidates: Vec<CandidateItem>,
    history: &[String],
    count: usize,
    containment_threshold: usize,
) -> AppResult<Vec<CandidateItem>> {
    let mut index = DuplicateIndex::from_history(history, containment_threshold);
    let mut accepted = Vec::with_capacity(count.min(candidates.len()));

    for candidate in candidates {
        if accepted.len() >= count {
            break;
        }
        if index.accept(candidate.stem()) {
            accepted.push(candidate);
        } else {
            log::debug!("Dropping duplicate candidate: {}", candidate.stem());
        }
    }

    if accepted.is_empty() {
        return Err(AppError::ExhaustedCandidates);
    }
    Ok(accepted)
}

/// Wraps accepted candidates into records numbered 1..=n under one set code.
pub fn assign_order(
    accepted: Vec<CandidateItem>,
    set_code: &str,
    course_id: &str,
) -> Vec<QuestionRecord> {
    let created_at = Utc::now();
    accepted
        .into_iter()
        .enumerate()
        .map(|(i, item)| QuestionRecord {
            id: Uuid::new_v4().to_string(),
            set_code: set_code.to_string(),
            course_id: course_id.to_string(),
            question_index: (i + 1) as i16,
            item,
            created_at: Some(created_at),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::Course,
        repositories::{
            course_repository::MockCourseRepository,
            question_repository::MockQuestionRepository,
        },
        services::backend::{Completion, MockTextBackend},
        test_utils::fixtures::open_item,
    };
    use serde_json::json;

    fn open_items(prompts: &[&str]) -> String {
        let items: Vec<_> = prompts
            .iter()
            .map(|p| json!({ "prompt": p, "reference_answer": "Réponse attendue", "difficulty": 2 }))
            .collect();
        serde_json::to_string(&items).expect("fixture should serialize")
    }

    fn request(mode: GenerationMode, count: usize, history: &[&str]) -> GenerationRequest {
        GenerationRequest {
            course_id: "course-1".to_string(),
            course_title: "Physiologie rénale".to_string(),
            unit_number: 3,
            source_text: "Le néphron est l'unité fonctionnelle du rein.".to_string(),
            mode,
            count,
            difficulty: None,
            historical_stems: history.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn backend_returning(text: String) -> MockTextBackend {
        let mut backend = MockTextBackend::new();
        backend
            .expect_complete()
            .times(1)
            .returning(move |_, _| Ok(Completion { text: text.clone() }));
        backend
    }

    fn storing_repository() -> MockQuestionRepository {
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_insert_set()
            .times(1)
            .returning(|_, records| Ok(records));
        questions
    }

    fn service(
        backend: MockTextBackend,
        questions: MockQuestionRepository,
        courses: MockCourseRepository,
    ) -> GenerationService {
        GenerationService::new(
            Arc::new(backend),
            Arc::new(questions),
            Arc::new(courses),
            PipelineConfig::default(),
        )
    }

    #[test]
    fn stages_display_as_snake_case() {
        assert_eq!(PipelineStage::InvokeBackend.to_string(), "invoke_backend");
        assert_eq!(PipelineStage::AssignOrder.to_string(), "assign_order");
    }

    #[test]
    fn deduplicate_keeps_first_occurrence_and_stops_at_count() {
        let candidates = vec![
            open_item("Décrire le rôle de l'anse de Henlé."),
            open_item("décrire le rôle de l'anse de henle"),
            open_item("Expliquer la sécrétion de rénine."),
            open_item("Définir la clairance."),
        ];

        let accepted = deduplicate(candidates, &[], 2, 20).expect("two candidates survive");
        let stems: Vec<&str> = accepted.iter().map(|c| c.stem()).collect();
        assert_eq!(
            stems,
            vec!["Décrire le rôle de l'anse de Henlé.", "Expliquer la sécrétion de rénine."]
        );
    }

    #[test]
    fn deduplicate_fails_when_nothing_survives() {
        let history = vec!["Définir la clairance.".to_string()];
        let result = deduplicate(vec![open_item("Définir la clairance")], &history, 5, 20);
        assert!(matches!(result, Err(AppError::ExhaustedCandidates)));
    }

    #[test]
    fn assign_order_numbers_densely_from_one() {
        let records = assign_order(
            vec![open_item("a"), open_item("b"), open_item("c")],
            "set-9",
            "course-1",
        );
        let indexes: Vec<i16> = records.iter().map(|r| r.question_index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(records.iter().all(|r| r.set_code == "set-9"));
    }

    #[tokio::test]
    async fn run_stores_an_ordered_set() {
        let text = format!(
            "Voici les questions :\n```json\n{}\n```",
            open_items(&["Expliquer la filtration glomérulaire.", "Citer les segments du néphron."])
        );
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_insert_set()
            .withf(|mode, records| *mode == GenerationMode::Open && records.len() == 2)
            .times(1)
            .returning(|_, records| Ok(records));

        let service = service(backend_returning(text), questions, MockCourseRepository::new());
        let set = service
            .run(request(GenerationMode::Open, 5, &[]))
            .await
            .expect("run should succeed");

        assert_eq!(set.items.len(), 2);
        assert_eq!(set.items[0].question_index, 1);
        assert_eq!(set.items[1].item.stem(), "Citer les segments du néphron.");
        assert!(set.items.iter().all(|r| r.set_code == set.set_code));
    }

    #[tokio::test]
    async fn identical_history_exhausts_candidates() {
        let stems = [
            "Expliquer la filtration glomérulaire.",
            "Citer les segments du néphron.",
            "Décrire la réabsorption du sodium.",
        ];
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert_set().times(0);

        let service = service(
            backend_returning(open_items(&stems)),
            questions,
            MockCourseRepository::new(),
        );
        let result = service.run(request(GenerationMode::Open, 10, &stems)).await;

        assert!(matches!(result, Err(AppError::ExhaustedCandidates)));
    }

    #[tokio::test]
    async fn multi_candidate_missing_label_is_a_schema_violation() {
        let item = json!([{
            "stem": "Concernant l'aldostérone :",
            "propositions": [
                {"label": "A", "text": "Elle est stéroïdienne", "is_true": true, "explanation": ""},
                {"label": "B", "text": "Elle agit sur le TCD", "is_true": true, "explanation": ""},
                {"label": "C", "text": "Elle est hypophysaire", "is_true": false, "explanation": ""},
                {"label": "D", "text": "Elle réduit la kaliémie", "is_true": true, "explanation": ""}
            ]
        }]);
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert_set().times(0);

        let service = service(
            backend_returning(item.to_string()),
            questions,
            MockCourseRepository::new(),
        );
        let result = service.run(request(GenerationMode::Multi, 1, &[])).await;

        match result {
            Err(AppError::SchemaViolation { item, detail }) => {
                assert_eq!(item, 1);
                assert!(detail.contains("label E"), "detail: {}", detail);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn repeated_punctuation_stems_fail_validation() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert_set().times(0);

        let service = service(
            backend_returning(open_items(&["Définir la clairance.", "???", "???"])),
            questions,
            MockCourseRepository::new(),
        );
        let result = service.run(request(GenerationMode::Open, 3, &[])).await;

        match result {
            Err(AppError::SchemaViolation { item, detail }) => {
                assert_eq!(item, 2);
                assert_eq!(detail, "stem has no alphanumeric content");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_array_output_is_malformed() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert_set().times(0);

        let service = service(
            backend_returning("Désolé, je ne peux pas répondre.".to_string()),
            questions,
            MockCourseRepository::new(),
        );
        let result = service.run(request(GenerationMode::Mcq, 3, &[])).await;

        match result {
            Err(AppError::MalformedOutput { raw, .. }) => {
                assert_eq!(raw, "Désolé, je ne peux pas répondre.")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced_without_persisting() {
        let mut backend = MockTextBackend::new();
        backend.expect_complete().times(1).returning(|_, _| {
            Err(AppError::BackendError {
                status: Some(503),
                body: "overloaded".to_string(),
            })
        });
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert_set().times(0);

        let service = service(backend, questions, MockCourseRepository::new());
        let result = service.run(request(GenerationMode::Open, 2, &[])).await;

        assert!(matches!(
            result,
            Err(AppError::BackendError { status: Some(503), .. })
        ));
    }

    #[tokio::test]
    async fn empty_source_is_rejected_before_calling_backend() {
        let mut backend = MockTextBackend::new();
        backend.expect_complete().times(0);

        let service = service(backend, MockQuestionRepository::new(), MockCourseRepository::new());
        let mut bad = request(GenerationMode::Open, 2, &[]);
        bad.source_text = "   ".to_string();

        assert!(matches!(
            service.run(bad).await,
            Err(AppError::InvalidRequest(_))
        ));

        let mut bad = request(GenerationMode::Open, 0, &[]);
        bad.difficulty = Some(3);
        assert!(matches!(
            service.run(bad).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn generate_for_course_uses_history_and_mode_options() {
        let mut course = Course::new(3, "Physiologie rénale", "transcription brute");
        course.id = "course-1".to_string();
        course.refined_content = Some("Document reformulé sur le néphron.".to_string());

        let mut courses = MockCourseRepository::new();
        let stored = course.clone();
        courses
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let mut questions = storing_repository();
        let previous = assign_order(
            vec![open_item("Quelle est la fonction du glomérule ?")],
            "old-set",
            "course-1",
        );
        questions
            .expect_list_by_course()
            .withf(|mode, course_id| *mode == GenerationMode::Open && course_id.to_string() == "course-1")
            .returning(move |_, _| Ok(previous.clone()));

        let mut backend = MockTextBackend::new();
        let reply = open_items(&["Quelle est la fonction du glomérule ?", "Définir la clairance."]);
        backend
            .expect_complete()
            .withf(|messages, options| {
                messages[1].content.contains("1. Quelle est la fonction du glomérule ?")
                    && messages[1].content.contains("Document reformulé")
                    && options.max_output_tokens == 3000
            })
            .times(1)
            .returning(move |_, _| Ok(Completion { text: reply.clone() }));

        let service = service(backend, questions, courses);
        let set = service
            .generate_for_course("course-1", GenerationMode::Open, Some(3), None)
            .await
            .expect("generation should succeed");

        assert_eq!(set.items.len(), 1);
        assert_eq!(set.items[0].item.stem(), "Définir la clairance.");
        assert_eq!(set.items[0].question_index, 1);
    }

    #[tokio::test]
    async fn generate_for_unknown_course_is_not_found() {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|_| Ok(None));

        let service = service(MockTextBackend::new(), MockQuestionRepository::new(), courses);
        let result = service
            .generate_for_course("missing", GenerationMode::Mcq, None, None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
