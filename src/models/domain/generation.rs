use crate::models::domain::GenerationMode;

pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 50;
pub const MIN_DIFFICULTY: i16 = 1;
pub const MAX_DIFFICULTY: i16 = 5;
pub const DEFAULT_DIFFICULTY: i16 = 3;

/// Everything one generation run needs, including the history snapshot
/// taken before the backend is called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub course_id: String,
    pub course_title: String,
    pub unit_number: i16,
    pub source_text: String,
    pub mode: GenerationMode,
    pub count: usize,
    pub difficulty: Option<i16>,
    /// Previously accepted stems, oldest first.
    pub historical_stems: Vec<String>,
}

impl GenerationRequest {
    /// Clamps caller-supplied numbers into range; a missing or zero count
    /// takes the mode default.
    pub fn clamp_count(mode: GenerationMode, n: Option<i64>) -> usize {
        match n {
            None | Some(0) => mode.default_count(),
            Some(n) if n > 0 => (n as usize).clamp(MIN_COUNT, MAX_COUNT),
            Some(_) => MIN_COUNT,
        }
    }

    /// Zero means "no fixed level", like a missing difficulty.
    pub fn clamp_difficulty(difficulty: Option<i64>) -> Option<i16> {
        match difficulty {
            None | Some(0) => None,
            Some(d) => Some(d.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as i16),
        }
    }

    /// Difficulty stamped on items that come back without one.
    pub fn fallback_difficulty(&self) -> i16 {
        self.difficulty.unwrap_or(DEFAULT_DIFFICULTY)
    }
}
