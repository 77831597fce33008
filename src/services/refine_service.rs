use std::sync::Arc;

use crate::{
    config::PipelineConfig,
    errors::{AppError, AppResult},
    repositories::CourseRepository,
    services::{
        backend::{CompletionOptions, TextBackend},
        prompt_builder::PromptBuilder,
        text_segmenter::{segment, JOIN_SEPARATOR},
    },
};

pub fn refine_options() -> CompletionOptions {
    CompletionOptions::new(0.1, 24_000)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedDocument {
    pub text: String,
    pub chunks: usize,
}

impl RefinedDocument {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Rewrites raw lecture transcripts into a cleaned document, one bounded
/// chunk at a time.
pub struct RefineService {
    backend: Arc<dyn TextBackend>,
    courses: Arc<dyn CourseRepository>,
    prompts: PromptBuilder,
    chunk_size: usize,
}

impl RefineService {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        courses: Arc<dyn CourseRepository>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            backend,
            courses,
            prompts: PromptBuilder::new(&config),
            chunk_size: config.refine_chunk_size,
        }
    }

    /// Chunk `i + 1` is only submitted once chunk `i` has come back. Any
    /// failing chunk aborts the whole document.
    pub async fn refine(&self, raw_text: &str) -> AppResult<RefinedDocument> {
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(AppError::InvalidRequest(
                "nothing to refine: text is empty".to_string(),
            ));
        }

        let chunks = segment(raw_text, self.chunk_size);
        let total = chunks.len();
        log::info!(
            "Refining {} characters in {} chunks",
            raw_text.chars().count(),
            total
        );

        let mut parts = Vec::with_capacity(total);
        for chunk in &chunks {
            let part = chunk.index + 1;
            let prompt = self.prompts.refine(part, total, &chunk.text);

            let completion = self
                .backend
                .complete(&prompt.to_chat(), &refine_options())
                .await
                .map_err(|e| {
                    log::error!("Refine of part {}/{} failed: {}", part, total, e);
                    e
                })?;

            let rewritten = completion.text.trim();
            if rewritten.is_empty() {
                log::error!("Refine of part {}/{} returned no text", part, total);
                return Err(AppError::BackendError {
                    status: None,
                    body: format!("empty completion for part {}/{}", part, total),
                });
            }

            log::debug!("Refined part {}/{}", part, total);
            parts.push(rewritten.to_string());
        }

        Ok(RefinedDocument {
            text: parts.join(JOIN_SEPARATOR),
            chunks: total,
        })
    }

    /// Refines a course's raw transcript and stores the result as its
    /// refined content.
    pub async fn refine_course(&self, course_id: &str) -> AppResult<RefinedDocument> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", course_id)))?;

        if course.raw_content.trim().is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Course '{}' has no raw content",
                course_id
            )));
        }

        let refined = self.refine(&course.raw_content).await?;

        if !self
            .courses
            .set_refined_content(course_id, &refined.text)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Course with id '{}' not found",
                course_id
            )));
        }

        log::info!(
            "Stored refined content for course {} ({} characters, {} chunks)",
            course_id,
            refined.char_len(),
            refined.chunks
        );
        Ok(refined)
    }
}
