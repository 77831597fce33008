use async_trait::async_trait;
use futures::TryStreamExt;
#[cfg(test)]
use mockall::automock;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{GenerationMode, QuestionRecord},
};

/// Generated question sets. Each mode lives in its own collection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Writes all records of one set as a unit: on failure nothing under the
    /// set code is left behind.
    async fn insert_set(
        &self,
        mode: GenerationMode,
        records: Vec<QuestionRecord>,
    ) -> AppResult<Vec<QuestionRecord>>;

    /// Records of one set, by question index.
    async fn find_by_set_code(
        &self,
        mode: GenerationMode,
        set_code: &str,
    ) -> AppResult<Vec<QuestionRecord>>;

    async fn find_by_id(&self, mode: GenerationMode, id: &str) -> AppResult<Option<QuestionRecord>>;

    /// Every record generated for a course, oldest first.
    async fn list_by_course(
        &self,
        mode: GenerationMode,
        course_id: &str,
    ) -> AppResult<Vec<QuestionRecord>>;
}

pub struct MongoQuestionRepository {
    mcq: Collection<QuestionRecord>,
    open: Collection<QuestionRecord>,
    multi: Collection<QuestionRecord>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            mcq: db.get_collection(GenerationMode::Mcq.collection_name()),
            open: db.get_collection(GenerationMode::Open.collection_name()),
            multi: db.get_collection(GenerationMode::Multi.collection_name()),
        }
    }

    fn collection(&self, mode: GenerationMode) -> &Collection<QuestionRecord> {
        match mode {
            GenerationMode::Mcq => &self.mcq,
            GenerationMode::Open => &self.open,
            GenerationMode::Multi => &self.multi,
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        for mode in GenerationMode::ALL {
            let name = mode.collection_name();
            log::info!("Creating indexes for {} collection", name);

            let id_index = IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                )
                .build();

            let set_index = IndexModel::builder()
                .keys(doc! { "set_code": 1, "question_index": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("set_question_unique".to_string())
                        .build(),
                )
                .build();

            let course_index = IndexModel::builder()
                .keys(doc! { "course_id": 1, "created_at": 1 })
                .options(IndexOptions::builder().name("course_created".to_string()).build())
                .build();

            let collection = self.collection(mode);
            collection.create_index(id_index).await?;
            collection.create_index(set_index).await?;
            collection.create_index(course_index).await?;

            log::info!("Successfully created indexes for {} collection", name);
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn insert_set(
        &self,
        mode: GenerationMode,
        records: Vec<QuestionRecord>,
    ) -> AppResult<Vec<QuestionRecord>> {
        let Some(set_code) = records.first().map(|r| r.set_code.clone()) else {
            return Ok(records);
        };
        let collection = self.collection(mode);

        if let Err(e) = collection.insert_many(&records).await {
            log::error!(
                "Batch insert of set {} into {} failed: {}",
                set_code,
                mode.collection_name(),
                e
            );
            if let Err(cleanup) = collection.delete_many(doc! { "set_code": &set_code }).await {
                log::error!("Rollback of set {} failed: {}", set_code, cleanup);
            }
            return Err(AppError::PersistenceError(format!(
                "Failed to store set {}: {}",
                set_code, e
            )));
        }

        Ok(records)
    }

    async fn find_by_set_code(
        &self,
        mode: GenerationMode,
        set_code: &str,
    ) -> AppResult<Vec<QuestionRecord>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "question_index": 1 })
            .build();

        let cursor = self
            .collection(mode)
            .find(doc! { "set_code": set_code })
            .with_options(find_options)
            .await?;
        let records: Vec<QuestionRecord> = cursor.try_collect().await?;
        Ok(records)
    }

    async fn find_by_id(&self, mode: GenerationMode, id: &str) -> AppResult<Option<QuestionRecord>> {
        let record = self.collection(mode).find_one(doc! { "id": id }).await?;
        Ok(record)
    }

    async fn list_by_course(
        &self,
        mode: GenerationMode,
        course_id: &str,
    ) -> AppResult<Vec<QuestionRecord>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": 1, "question_index": 1 })
            .build();

        let cursor = self
            .collection(mode)
            .find(doc! { "course_id": course_id })
            .with_options(find_options)
            .await?;
        let records: Vec<QuestionRecord> = cursor.try_collect().await?;
        Ok(records)
    }
}
