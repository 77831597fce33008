use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    pub id: String,
    pub ue_number: i16, // teaching unit, 1..=12
    pub title: String,
    pub raw_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn new(ue_number: i16, title: &str, raw_content: &str) -> Self {
        Course {
            id: Uuid::new_v4().to_string(),
            ue_number,
            title: title.to_string(),
            raw_content: raw_content.to_string(),
            refined_content: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Text that question generation works from: the refined document when
    /// present, otherwise the raw transcript.
    pub fn generation_source(&self) -> &str {
        match self.refined_content.as_deref() {
            Some(refined) if !refined.trim().is_empty() => refined,
            _ => &self.raw_content,
        }
    }
}
