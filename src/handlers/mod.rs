pub mod course_handler;
pub mod generation_handler;
pub mod grading_handler;
pub mod health_handler;
pub mod set_handler;

use actix_web::web;

use crate::errors::AppError;

pub use health_handler::{health_check, health_check_ready};

/// Registers every route of the API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(course_handler::create_course)
        .service(course_handler::get_course)
        .service(course_handler::delete_course)
        .service(course_handler::move_course)
        .service(course_handler::list_units)
        .service(course_handler::list_courses_by_unit)
        .service(generation_handler::generate_mcq)
        .service(generation_handler::generate_open)
        .service(generation_handler::generate_multi)
        .service(generation_handler::refine_course)
        .service(set_handler::list_course_sets)
        .service(set_handler::get_set)
        .service(set_handler::list_set_questions)
        .service(set_handler::get_question)
        .service(grading_handler::answer_mcq)
        .service(grading_handler::score)
        .service(grading_handler::grade_multi)
        .service(grading_handler::grade_open);
}

/// JSON body settings: large course texts, and malformed bodies reported
/// in the API's error format.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into())
}
