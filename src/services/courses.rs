use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::{Course, NewCourseRequest, UpdateCourseRequest};
use crate::records::RecordClient;
use crate::records::dto::QueryRequest;
use crate::records::mapping::{COURSES, ID_FIELD};
use crate::services::memory::MemoryTable;

#[async_trait]
pub trait CourseService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Course>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Course, AppError>;
    async fn create(&self, req: NewCourseRequest) -> Result<Course, AppError>;
    async fn update(&self, id: i64, req: UpdateCourseRequest) -> Result<Course, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
    async fn get_active_courses(&self) -> Result<Vec<Course>, AppError>;
}

pub struct MockCourseService {
    courses: MemoryTable<Course>,
}

impl MockCourseService {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses: MemoryTable::new(courses),
        }
    }
}

#[async_trait]
impl CourseService for MockCourseService {
    async fn get_all(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.courses.all().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<Course, AppError> {
        self.courses
            .find(id)
            .await
            .ok_or_else(|| AppError::not_found("Course", id))
    }

    async fn create(&self, req: NewCourseRequest) -> Result<Course, AppError> {
        req.validate()?;
        let course = self
            .courses
            .insert_with(|id| Course::from_request(id, req))
            .await;
        info!("created course {} ({})", course.id, course.code);
        Ok(course)
    }

    async fn update(&self, id: i64, req: UpdateCourseRequest) -> Result<Course, AppError> {
        self.courses
            .update(id, |course| course.apply(req))
            .await
            .ok_or_else(|| AppError::not_found("Course", id))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.courses.remove(id).await {
            info!("deleted course {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Course", id))
        }
    }

    async fn get_active_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.courses.filter(|c| c.is_active).await)
    }
}

pub struct RemoteCourseService {
    client: Arc<dyn RecordClient>,
}

impl RemoteCourseService {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self { client }
    }

    async fn query(&self, query: QueryRequest) -> Result<Vec<Course>, AppError> {
        let records = self.client.fetch_records(COURSES.collection, &query).await?;
        Ok(COURSES.decode_all(&records))
    }
}

#[async_trait]
impl CourseService for RemoteCourseService {
    async fn get_all(&self) -> Result<Vec<Course>, AppError> {
        self.query(QueryRequest::new(&COURSES.storage_fields())).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Course, AppError> {
        let record = self
            .client
            .get_record(COURSES.collection, id)
            .await?
            .ok_or_else(|| AppError::not_found("Course", id))?;
        COURSES.decode(&record)
    }

    async fn create(&self, req: NewCourseRequest) -> Result<Course, AppError> {
        req.validate()?;
        let mut record = COURSES.encode(&Course::from_request(0, req))?;
        record.remove(ID_FIELD);
        let created = self.client.create_record(COURSES.collection, record).await?;
        let course: Course = COURSES.decode(&created)?;
        info!("created course {} ({})", course.id, course.code);
        Ok(course)
    }

    async fn update(&self, id: i64, req: UpdateCourseRequest) -> Result<Course, AppError> {
        let mut record = COURSES.encode(&req)?;
        record.insert(ID_FIELD.to_string(), json!(id));
        let updated = self
            .client
            .update_record(COURSES.collection, record)
            .await?
            .ok_or_else(|| AppError::not_found("Course", id))?;
        COURSES.decode(&updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.client.delete_record(COURSES.collection, id).await? {
            info!("deleted course {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Course", id))
        }
    }

    async fn get_active_courses(&self) -> Result<Vec<Course>, AppError> {
        let query = QueryRequest::new(&COURSES.storage_fields()).equal_to("is_active_c", json!(true));
        self.query(query).await
    }
}
