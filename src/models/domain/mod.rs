pub mod attempt;
pub mod course;
pub mod generation;
pub mod question;
pub use attempt::{GradeBreakdown, McqAttempt, OpenAnswer};
pub use course::Course;
pub use generation::GenerationRequest;
pub use question::{
    CandidateItem, GenerationMode, McqItem, MultiItem, OpenItem, Proposition, QuestionRecord,
    QuestionSet, SetSummary,
};
