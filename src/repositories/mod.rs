pub mod attempt_repository;
pub mod course_repository;
pub mod question_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use course_repository::{CourseRepository, MongoCourseRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
