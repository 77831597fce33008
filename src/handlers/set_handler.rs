use std::sync::Arc;

use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::GenerationMode,
        dto::{
            request::SetQuestionsQuery,
            response::{QuestionListResponse, QuestionSetResponse, SetListResponse},
        },
    },
};

#[get("/api/course/{course_id}/sets")]
async fn list_course_sets(
    state: web::Data<Arc<AppState>>,
    course_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let sets = state.set_service.list_sets(&course_id).await?;
    Ok(HttpResponse::Ok().json(SetListResponse { sets }))
}

#[get("/api/set/{kind}/{set_code}")]
async fn get_set(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (kind, set_code) = path.into_inner();
    let mode: GenerationMode = kind.parse().map_err(AppError::InvalidRequest)?;

    let set = state.set_service.get_set(mode, &set_code).await?;
    Ok(HttpResponse::Ok().json(QuestionSetResponse::from(set)))
}

#[get("/api/questions")]
async fn list_set_questions(
    state: web::Data<Arc<AppState>>,
    query: web::Query<SetQuestionsQuery>,
) -> Result<HttpResponse, AppError> {
    let questions = state.set_service.list_set_questions(&query.set_code).await?;
    Ok(HttpResponse::Ok().json(QuestionListResponse { questions }))
}

#[get("/api/questions/{id}")]
async fn get_question(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let question = state.set_service.get_question(&id).await?;
    Ok(HttpResponse::Ok().json(question))
}
