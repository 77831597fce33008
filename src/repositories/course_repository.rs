use async_trait::async_trait;
use futures::TryStreamExt;
#[cfg(test)]
use mockall::automock;
use mongodb::{
    bson::{doc, Bson},
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Course};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: Course) -> AppResult<Course>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>>;
    /// Distinct unit numbers, ascending.
    async fn list_units(&self) -> AppResult<Vec<i16>>;
    /// Courses of one unit, newest first.
    async fn list_by_unit(&self, ue_number: i16) -> AppResult<Vec<Course>>;
    async fn update_unit(&self, id: &str, ue_number: i16) -> AppResult<bool>;
    async fn set_refined_content(&self, id: &str, refined_content: &str) -> AppResult<bool>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

pub struct MongoCourseRepository {
    collection: Collection<Course>,
}

impl MongoCourseRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("courses");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for courses collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let unit_index = IndexModel::builder()
            .keys(doc! { "ue_number": 1, "created_at": -1 })
            .options(IndexOptions::builder().name("ue_created".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(unit_index).await?;

        log::info!("Successfully created indexes for courses collection");
        Ok(())
    }
}

fn unit_from_bson(value: &Bson) -> Option<i16> {
    match value {
        Bson::Int32(n) => i16::try_from(*n).ok(),
        Bson::Int64(n) => i16::try_from(*n).ok(),
        _ => None,
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        self.collection.insert_one(&course).await?;
        Ok(course)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>> {
        let course = self.collection.find_one(doc! { "id": id }).await?;
        Ok(course)
    }

    async fn list_units(&self) -> AppResult<Vec<i16>> {
        let values = self.collection.distinct("ue_number", doc! {}).await?;

        let mut units: Vec<i16> = values.iter().filter_map(unit_from_bson).collect();
        units.sort_unstable();
        units.dedup();
        Ok(units)
    }

    async fn list_by_unit(&self, ue_number: i16) -> AppResult<Vec<Course>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "ue_number": ue_number as i32 })
            .with_options(find_options)
            .await?;
        let courses: Vec<Course> = cursor.try_collect().await?;
        Ok(courses)
    }

    async fn update_unit(&self, id: &str, ue_number: i16) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "ue_number": ue_number as i32 } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_refined_content(&self, id: &str, refined_content: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "refined_content": refined_content } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
