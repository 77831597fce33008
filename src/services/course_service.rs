use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Course,
    repositories::CourseRepository,
};

pub const MIN_UNIT: i16 = 1;
pub const MAX_UNIT: i16 = 12;

fn check_unit(ue_number: i16) -> AppResult<()> {
    if !(MIN_UNIT..=MAX_UNIT).contains(&ue_number) {
        return Err(AppError::InvalidRequest(format!(
            "ue_number must be between {} and {}, got {}",
            MIN_UNIT, MAX_UNIT, ue_number
        )));
    }
    Ok(())
}

pub struct CourseService {
    repository: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(repository: Arc<dyn CourseRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_course(&self, ue_number: i16, title: &str, content: &str) -> AppResult<Course> {
        check_unit(ue_number)?;

        let title = title.trim();
        if title.is_empty() || content.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "title and content are required".to_string(),
            ));
        }

        let course = self
            .repository
            .create(Course::new(ue_number, title, content))
            .await?;
        log::info!("Created course {} in UE {}", course.id, course.ue_number);
        Ok(course)
    }

    pub async fn get_course(&self, id: &str) -> AppResult<Course> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", id)))
    }

    pub async fn list_units(&self) -> AppResult<Vec<i16>> {
        self.repository.list_units().await
    }

    pub async fn list_courses_by_unit(&self, ue_number: i16) -> AppResult<Vec<Course>> {
        check_unit(ue_number)?;
        self.repository.list_by_unit(ue_number).await
    }

    pub async fn move_course(&self, id: &str, new_ue_number: i16) -> AppResult<Course> {
        check_unit(new_ue_number)?;

        if !self.repository.update_unit(id, new_ue_number).await? {
            return Err(AppError::NotFound(format!("Course with id '{}' not found", id)));
        }
        log::info!("Moved course {} to UE {}", id, new_ue_number);
        self.get_course(id).await
    }

    pub async fn delete_course(&self, id: &str) -> AppResult<()> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound(format!("Course with id '{}' not found", id)));
        }
        log::info!("Deleted course {}", id);
        Ok(())
    }
}
