use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AttemptRepository, CourseRepository, MongoAttemptRepository, MongoCourseRepository,
        MongoQuestionRepository, QuestionRepository,
    },
    services::{
        CourseService, GenerationService, GradingService, HttpChatBackend, RefineService,
        SetService, TextBackend,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub course_service: Arc<CourseService>,
    pub generation_service: Arc<GenerationService>,
    pub refine_service: Arc<RefineService>,
    pub set_service: Arc<SetService>,
    pub grading_service: Arc<GradingService>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let courses = Arc::new(MongoCourseRepository::new(&db));
        courses.ensure_indexes().await?;
        let questions = Arc::new(MongoQuestionRepository::new(&db));
        questions.ensure_indexes().await?;
        let attempts = Arc::new(MongoAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;

        let backend: Arc<dyn TextBackend> = Arc::new(HttpChatBackend::new(&config)?);

        let mut state = Self::from_parts(config, backend, courses, questions, attempts);
        state.db = Some(db);
        Ok(state)
    }

    /// Wires the services over any repository and backend implementations.
    pub fn from_parts(
        config: Config,
        backend: Arc<dyn TextBackend>,
        courses: Arc<dyn CourseRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        let pipeline = config.pipeline.clone();

        Self {
            course_service: Arc::new(CourseService::new(courses.clone())),
            generation_service: Arc::new(GenerationService::new(
                backend.clone(),
                questions.clone(),
                courses.clone(),
                pipeline.clone(),
            )),
            refine_service: Arc::new(RefineService::new(
                backend.clone(),
                courses.clone(),
                pipeline.clone(),
            )),
            set_service: Arc::new(SetService::new(questions.clone())),
            grading_service: Arc::new(GradingService::new(
                backend,
                questions,
                courses,
                attempts,
                &pipeline,
            )),
            db: None,
            config: Arc::new(config),
        }
    }
}
