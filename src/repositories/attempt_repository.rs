use async_trait::async_trait;
use futures::TryStreamExt;
#[cfg(test)]
use mockall::automock;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{McqAttempt, OpenAnswer},
};

/// Answers recorded against generated questions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn record_mcq_attempt(&self, attempt: McqAttempt) -> AppResult<McqAttempt>;
    async fn find_mcq_attempts(&self, set_code: &str, user_id: &str) -> AppResult<Vec<McqAttempt>>;
    async fn record_open_answer(&self, answer: OpenAnswer) -> AppResult<OpenAnswer>;
}

pub struct MongoAttemptRepository {
    attempts: Collection<McqAttempt>,
    open_answers: Collection<OpenAnswer>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            attempts: db.get_collection("attempts"),
            open_answers: db.get_collection("open_answers"),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collections");

        let set_user_index = IndexModel::builder()
            .keys(doc! { "set_code": 1, "user_id": 1 })
            .options(IndexOptions::builder().name("set_user".to_string()).build())
            .build();

        let open_question_index = IndexModel::builder()
            .keys(doc! { "open_question_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("open_question".to_string())
                    .build(),
            )
            .build();

        self.attempts.create_index(set_user_index).await?;
        self.open_answers.create_index(open_question_index).await?;

        log::info!("Successfully created indexes for attempts collections");
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn record_mcq_attempt(&self, attempt: McqAttempt) -> AppResult<McqAttempt> {
        self.attempts.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_mcq_attempts(&self, set_code: &str, user_id: &str) -> AppResult<Vec<McqAttempt>> {
        let cursor = self
            .attempts
            .find(doc! { "set_code": set_code, "user_id": user_id })
            .await?;
        let attempts: Vec<McqAttempt> = cursor.try_collect().await?;
        Ok(attempts)
    }

    async fn record_open_answer(&self, answer: OpenAnswer) -> AppResult<OpenAnswer> {
        self.open_answers.insert_one(&answer).await?;
        Ok(answer)
    }
}
