pub mod backend;
pub mod candidate_validator;
pub mod course_service;
pub mod duplicate_index;
pub mod generation_service;
pub mod grading_service;
pub mod prompt_builder;
pub mod refine_service;
pub mod response_extractor;
pub mod set_service;
pub mod text_segmenter;

pub use backend::{HttpChatBackend, TextBackend};
pub use course_service::CourseService;
pub use generation_service::GenerationService;
pub use grading_service::GradingService;
pub use refine_service::RefineService;
pub use set_service::SetService;
