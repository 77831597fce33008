use crate::{
    config::PipelineConfig,
    constants::prompts,
    models::domain::GenerationMode,
    services::backend::ChatMessage,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

impl PromptMessages {
    pub fn to_chat(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Course text and the labels shown above it in a prompt.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    pub title: &'a str,
    pub unit_number: i16,
    pub text: &'a str,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_source_chars: usize,
    grading_snippet_chars: usize,
    mcq_exclusions: usize,
    open_exclusions: usize,
    multi_exclusions: usize,
}

impl PromptBuilder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_source_chars: config.max_source_chars,
            grading_snippet_chars: config.grading_snippet_chars,
            mcq_exclusions: config.mcq_exclusions,
            open_exclusions: config.open_exclusions,
            multi_exclusions: config.multi_exclusions,
        }
    }

    pub fn exclusion_cap(&self, mode: GenerationMode) -> usize {
        match mode {
            GenerationMode::Mcq => self.mcq_exclusions,
            GenerationMode::Open => self.open_exclusions,
            GenerationMode::Multi => self.multi_exclusions,
        }
    }

    /// Generation prompt for `mode`. `exclusions` is the stem history, oldest
    /// first; only the most recent entries are rendered, newest first.
    pub fn build(
        &self,
        mode: GenerationMode,
        source: &SourceContext<'_>,
        count: usize,
        difficulty: Option<i16>,
        exclusions: &[String],
    ) -> PromptMessages {
        let (system, task, schema) = match mode {
            GenerationMode::Mcq => (
                prompts::MCQ_SYSTEM_PROMPT,
                prompts::MCQ_TASK,
                prompts::MCQ_SCHEMA,
            ),
            GenerationMode::Open => (
                prompts::OPEN_SYSTEM_PROMPT,
                prompts::OPEN_TASK,
                prompts::OPEN_SCHEMA,
            ),
            GenerationMode::Multi => (
                prompts::MULTI_SYSTEM_PROMPT,
                prompts::MULTI_TASK,
                prompts::MULTI_SCHEMA,
            ),
        };

        let user = format!(
            "Course: \"{title}\" (UE {unit})\n\"\"\"\n{content}\n\"\"\"\n\nTask:\n{task}\n- {difficulty}\n\nAvoid repeating these existing questions:\n{exclusions}\n\n{schema}",
            title = source.title,
            unit = source.unit_number,
            content = truncate_chars(source.text, self.max_source_chars),
            task = task.replace("{count}", &count.to_string()),
            difficulty = difficulty_line(difficulty),
            exclusions = exclusion_block(exclusions, self.exclusion_cap(mode)),
            schema = schema,
        );

        PromptMessages {
            system: system.to_string(),
            user,
        }
    }

    /// Prompt for rewriting chunk `part` (1-based) of `total`.
    pub fn refine(&self, part: usize, total: usize, chunk: &str) -> PromptMessages {
        PromptMessages {
            system: prompts::REFINE_SYSTEM_PROMPT.to_string(),
            user: format!(
                "Here is part {}/{}:\n\"\"\"\n{}\n\"\"\"\n\n{}",
                part,
                total,
                chunk,
                prompts::REFINE_TASK
            ),
        }
    }

    pub fn grade_open(
        &self,
        course_text: &str,
        question: &str,
        reference_answer: &str,
        answer: &str,
    ) -> PromptMessages {
        PromptMessages {
            system: prompts::GRADE_OPEN_SYSTEM_PROMPT.to_string(),
            user: format!(
                "Course (excerpt):\n\"\"\"\n{}\n\"\"\"\n\nQuestion: {}\n\nExpected answer: {}\n\nStudent answer: {}\n\n{}",
                truncate_chars(course_text, self.grading_snippet_chars),
                question,
                reference_answer,
                answer,
                prompts::GRADE_OPEN_SCHEMA
            ),
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn difficulty_line(difficulty: Option<i16>) -> String {
    match difficulty {
        Some(level) => format!(
            "Every question must have difficulty = {} (1 very easy, 5 hard but doable).",
            level
        ),
        None => "Spread the difficulty across the 1 to 5 range.".to_string(),
    }
}

fn exclusion_block(history: &[String], cap: usize) -> String {
    let recent: Vec<&String> = history
        .iter()
        .rev()
        .filter(|stem| !stem.trim().is_empty())
        .take(cap)
        .collect();

    if recent.is_empty() {
        return "None yet.".to_string();
    }

    recent
        .iter()
        .enumerate()
        .map(|(i, stem)| format!("{}. {}", i + 1, stem.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(&PipelineConfig {
            max_source_chars: 30,
            mcq_exclusions: 2,
            ..PipelineConfig::default()
        })
    }

    fn source(text: &str) -> SourceContext<'_> {
        SourceContext {
            title: "Biologie cellulaire",
            unit_number: 2,
            text,
        }
    }

    #[test]
    fn truncate_chars_keeps_a_character_prefix() {
        assert_eq!(truncate_chars("éléphant", 3), "élé");
        assert_eq!(truncate_chars("court", 30), "court");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn source_text_is_truncated_to_budget() {
        let text = "a".repeat(30) + "TAIL";
        let prompt = builder().build(GenerationMode::Open, &source(&text), 5, None, &[]);

        assert!(prompt.user.contains(&"a".repeat(30)));
        assert!(!prompt.user.contains("TAIL"));
        assert!(prompt.user.contains("\"Biologie cellulaire\" (UE 2)"));
    }

    #[test]
    fn difficulty_line_fixes_or_spreads_levels() {
        let fixed = builder().build(GenerationMode::Multi, &source("x"), 3, Some(4), &[]);
        assert!(fixed.user.contains("difficulty = 4"));

        let spread = builder().build(GenerationMode::Multi, &source("x"), 3, None, &[]);
        assert!(spread.user.contains("Spread the difficulty across the 1 to 5 range."));
    }

    #[test]
    fn exclusions_are_capped_and_newest_first() {
        let history = vec![
            "Oldest question".to_string(),
            "Middle question".to_string(),
            "Newest question".to_string(),
        ];
        let prompt = builder().build(GenerationMode::Mcq, &source("x"), 10, None, &history);

        assert!(prompt.user.contains("1. Newest question\n2. Middle question"));
        assert!(!prompt.user.contains("Oldest question"));
    }

    #[test]
    fn empty_history_is_stated() {
        let prompt = builder().build(GenerationMode::Open, &source("x"), 1, None, &[]);
        assert!(prompt.user.contains("None yet."));
    }

    #[test]
    fn every_mode_embeds_a_schema_and_count() {
        for mode in GenerationMode::ALL {
            let prompt = builder().build(mode, &source("x"), 7, None, &[]);
            assert!(prompt.user.contains("Generate 7 "));
            assert!(prompt.user.contains("STRICT JSON format (array)"));
            assert!(prompt.system.contains("JSON"));
        }

        let multi = builder().build(GenerationMode::Multi, &source("x"), 1, None, &[]);
        assert!(multi.user.contains("\"is_true\""));
    }

    #[test]
    fn refine_prompt_numbers_parts() {
        let prompt = builder().refine(2, 5, "transcription");
        assert!(prompt.user.starts_with("Here is part 2/5:"));
        assert!(prompt.user.contains("transcription"));
        assert_eq!(prompt.to_chat().len(), 2);
    }

    #[test]
    fn grading_prompt_requests_an_object() {
        let prompt = builder().grade_open("cours", "Question ?", "Référence", "Réponse");
        assert!(prompt.user.contains("Student answer: Réponse"));
        assert!(prompt.user.contains("\"score_final\""));
    }
}
