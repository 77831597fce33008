use std::{collections::BTreeMap, sync::Arc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{GenerationMode, QuestionRecord, QuestionSet, SetSummary},
    repositories::QuestionRepository,
};

/// Read access to stored question sets.
pub struct SetService {
    questions: Arc<dyn QuestionRepository>,
}

impl SetService {
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    pub async fn get_set(&self, mode: GenerationMode, set_code: &str) -> AppResult<QuestionSet> {
        let items = self.questions.find_by_set_code(mode, set_code).await?;
        let Some(course_id) = items.first().map(|r| r.course_id.clone()) else {
            return Err(AppError::NotFound(format!(
                "No {} set with code '{}'",
                mode, set_code
            )));
        };

        Ok(QuestionSet {
            set_code: set_code.to_string(),
            course_id,
            mode,
            items,
        })
    }

    /// Every set of a course across the three modes, most recent first.
    pub async fn list_sets(&self, course_id: &str) -> AppResult<Vec<SetSummary>> {
        let mut sets = Vec::new();
        for mode in GenerationMode::ALL {
            let records = self.questions.list_by_course(mode, course_id).await?;
            sets.extend(group_sets(mode, &records));
        }
        sets.sort_by(|a, b| b.last_created_at.cmp(&a.last_created_at));
        Ok(sets)
    }

    /// MCQ questions of one set in order; an unknown code yields an empty list.
    pub async fn list_set_questions(&self, set_code: &str) -> AppResult<Vec<QuestionRecord>> {
        let set_code = set_code.trim();
        if set_code.is_empty() {
            return Err(AppError::InvalidRequest("set_code is required".to_string()));
        }
        self.questions
            .find_by_set_code(GenerationMode::Mcq, set_code)
            .await
    }

    pub async fn get_question(&self, id: &str) -> AppResult<QuestionRecord> {
        self.questions
            .find_by_id(GenerationMode::Mcq, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }
}

/// Summarises records by set code.
pub fn group_sets(mode: GenerationMode, records: &[QuestionRecord]) -> Vec<SetSummary> {
    let mut by_code: BTreeMap<&str, SetSummary> = BTreeMap::new();

    for record in records {
        let summary = by_code
            .entry(record.set_code.as_str())
            .or_insert_with(|| SetSummary {
                kind: mode,
                set_code: record.set_code.clone(),
                count: 0,
                first_created_at: record.created_at,
                last_created_at: record.created_at,
            });

        summary.count += 1;
        summary.first_created_at = match (summary.first_created_at, record.created_at) {
            (Some(first), Some(at)) => Some(first.min(at)),
            (first, at) => first.or(at),
        };
        summary.last_created_at = summary.last_created_at.max(record.created_at);
    }

    by_code.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{CandidateItem, OpenItem},
        repositories::question_repository::MockQuestionRepository,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn record(set_code: &str, index: i16, minutes: i64) -> QuestionRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single();
        QuestionRecord {
            id: format!("{}-{}", set_code, index),
            set_code: set_code.to_string(),
            course_id: "course-1".to_string(),
            question_index: index,
            item: CandidateItem::Open(OpenItem {
                prompt: format!("Question {}", index),
                reference_answer: "r".to_string(),
                difficulty: 3,
            }),
            created_at: base.map(|b| b + Duration::minutes(minutes)),
        }
    }

    #[test]
    fn group_sets_counts_and_spans_each_code() {
        let records = vec![
            record("set-a", 1, 0),
            record("set-a", 2, 1),
            record("set-b", 1, 10),
        ];
        let sets = group_sets(GenerationMode::Open, &records);

        assert_eq!(sets.len(), 2);
        let a = &sets[0];
        assert_eq!(a.set_code, "set-a");
        assert_eq!(a.count, 2);
        assert_eq!(a.first_created_at, records[0].created_at);
        assert_eq!(a.last_created_at, records[1].created_at);
        assert_eq!(sets[1].count, 1);
    }

    #[tokio::test]
    async fn list_set_questions_trims_code_and_requires_it() {
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_find_by_set_code()
            .withf(|mode, code| *mode == GenerationMode::Mcq && code.to_string() == "set-a")
            .times(1)
            .returning(|_, _| Ok(vec![record("set-a", 1, 0), record("set-a", 2, 1)]));
        let service = SetService::new(Arc::new(questions));

        let listed = service
            .list_set_questions("  set-a ")
            .await
            .expect("listing should succeed");
        assert_eq!(listed.len(), 2);

        assert!(matches!(
            service.list_set_questions("   ").await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn list_sets_merges_modes_newest_first() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_list_by_course().returning(|mode, _| {
            Ok(match mode {
                GenerationMode::Mcq => vec![record("old-mcq", 1, 0)],
                GenerationMode::Open => vec![record("new-open", 1, 30)],
                GenerationMode::Multi => vec![],
            })
        });

        let sets = SetService::new(Arc::new(questions))
            .list_sets("course-1")
            .await
            .expect("listing should succeed");

        let codes: Vec<&str> = sets.iter().map(|s| s.set_code.as_str()).collect();
        assert_eq!(codes, vec!["new-open", "old-mcq"]);
        assert_eq!(sets[1].kind, GenerationMode::Mcq);
    }

    #[tokio::test]
    async fn unknown_set_is_not_found() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_find_by_set_code().returning(|_, _| Ok(vec![]));

        let result = SetService::new(Arc::new(questions))
            .get_set(GenerationMode::Multi, "nope")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
