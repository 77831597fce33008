use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::request::{AnswerMcqRequest, GradeMultiRequest, GradeOpenRequest, ScoreQuery},
};

#[post("/api/answer-mcq")]
async fn answer_mcq(
    state: web::Data<Arc<AppState>>,
    request: web::Json<AnswerMcqRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let response = state
        .grading_service
        .answer_mcq(&request.question_id, &request.chosen, request.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/score")]
async fn score(
    state: web::Data<Arc<AppState>>,
    query: web::Query<ScoreQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let response = state
        .grading_service
        .score(&query.set_code, &query.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/grade-multi")]
async fn grade_multi(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GradeMultiRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let response = state
        .grading_service
        .grade_multi(&request.ms_question_id, &request.selected)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/grade-open")]
async fn grade_open(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GradeOpenRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let response = state
        .grading_service
        .grade_open(&request.open_question_id, &request.answer, request.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
