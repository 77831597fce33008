use std::sync::Arc;

use actix_web::{delete, get, patch, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{CreateCourseRequest, MoveCourseRequest},
        response::{CourseListResponse, CourseResponse, DeleteCourseResponse, UnitListResponse},
    },
};

#[post("/api/courses")]
async fn create_course(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let course = state
        .course_service
        .create_course(request.ue_number, &request.title, &request.content)
        .await?;
    Ok(HttpResponse::Created().json(CourseResponse { course }))
}

#[get("/api/courses/{id}")]
async fn get_course(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let course = state.course_service.get_course(&id).await?;
    Ok(HttpResponse::Ok().json(CourseResponse { course }))
}

#[delete("/api/courses/{id}")]
async fn delete_course(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    state.course_service.delete_course(&id).await?;
    Ok(HttpResponse::Ok().json(DeleteCourseResponse {
        success: true,
        deleted_id: id,
    }))
}

#[patch("/api/courses/{id}/move")]
async fn move_course(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
    request: web::Json<MoveCourseRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let course = state
        .course_service
        .move_course(&id, request.new_ue_number)
        .await?;
    Ok(HttpResponse::Ok().json(CourseResponse { course }))
}

#[get("/api/ues")]
async fn list_units(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let ues = state.course_service.list_units().await?;
    Ok(HttpResponse::Ok().json(UnitListResponse { ues }))
}

#[get("/api/ues/{ue}/courses")]
async fn list_courses_by_unit(
    state: web::Data<Arc<AppState>>,
    ue: web::Path<i16>,
) -> Result<HttpResponse, AppError> {
    let courses = state
        .course_service
        .list_courses_by_unit(ue.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CourseListResponse { courses }))
}
