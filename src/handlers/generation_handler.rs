use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::GenerationMode,
        dto::{
            request::{GenerateQuestionsRequest, RefineCourseRequest},
            response::{QuestionSetResponse, RefineCourseResponse},
        },
    },
};

async fn generate(
    state: &AppState,
    mode: GenerationMode,
    request: GenerateQuestionsRequest,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let set = state
        .generation_service
        .generate_for_course(&request.course_id, mode, request.n, request.difficulty)
        .await?;
    Ok(HttpResponse::Ok().json(QuestionSetResponse::from(set)))
}

#[post("/api/generate-mcq")]
async fn generate_mcq(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GenerateQuestionsRequest>,
) -> Result<HttpResponse, AppError> {
    generate(&state, GenerationMode::Mcq, request.into_inner()).await
}

#[post("/api/generate-open")]
async fn generate_open(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GenerateQuestionsRequest>,
) -> Result<HttpResponse, AppError> {
    generate(&state, GenerationMode::Open, request.into_inner()).await
}

#[post("/api/generate-multi")]
async fn generate_multi(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GenerateQuestionsRequest>,
) -> Result<HttpResponse, AppError> {
    generate(&state, GenerationMode::Multi, request.into_inner()).await
}

#[post("/api/refine-course")]
async fn refine_course(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RefineCourseRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let refined = state.refine_service.refine_course(&request.course_id).await?;
    Ok(HttpResponse::Ok().json(RefineCourseResponse {
        course_id: request.into_inner().course_id,
        refined_length: refined.char_len(),
        chunks: refined.chunks,
        ok: true,
    }))
}
