use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::{NewStudentRequest, Student, UpdateStudentRequest};
use crate::records::RecordClient;
use crate::records::dto::QueryRequest;
use crate::records::mapping::{ID_FIELD, STUDENTS};
use crate::services::memory::MemoryTable;

#[async_trait]
pub trait StudentService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Student>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Student, AppError>;
    async fn create(&self, req: NewStudentRequest) -> Result<Student, AppError>;
    async fn update(&self, id: i64, req: UpdateStudentRequest) -> Result<Student, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

fn check_id(id: i64) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest("Invalid student ID".to_string()));
    }
    Ok(())
}

pub struct MockStudentService {
    students: MemoryTable<Student>,
}

impl MockStudentService {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            students: MemoryTable::new(students),
        }
    }
}

#[async_trait]
impl StudentService for MockStudentService {
    async fn get_all(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.students.all().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<Student, AppError> {
        check_id(id)?;
        self.students
            .find(id)
            .await
            .ok_or_else(|| AppError::not_found("Student", id))
    }

    async fn create(&self, req: NewStudentRequest) -> Result<Student, AppError> {
        req.validate()?;
        let today = Local::now().date_naive();
        let student = self
            .students
            .insert_with(|id| Student::from_request(id, req, today))
            .await;
        info!("enrolled student {} {}", student.id, student.full_name());
        Ok(student)
    }

    async fn update(&self, id: i64, req: UpdateStudentRequest) -> Result<Student, AppError> {
        check_id(id)?;
        req.validate()?;
        self.students
            .update(id, |student| student.apply(req))
            .await
            .ok_or_else(|| AppError::not_found("Student", id))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        check_id(id)?;
        if self.students.remove(id).await {
            info!("deleted student {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Student", id))
        }
    }
}

pub struct RemoteStudentService {
    client: Arc<dyn RecordClient>,
}

impl RemoteStudentService {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StudentService for RemoteStudentService {
    async fn get_all(&self) -> Result<Vec<Student>, AppError> {
        let query = QueryRequest::new(&STUDENTS.storage_fields());
        let records = self.client.fetch_records(STUDENTS.collection, &query).await?;
        Ok(STUDENTS.decode_all(&records))
    }

    async fn get_by_id(&self, id: i64) -> Result<Student, AppError> {
        check_id(id)?;
        let record = self
            .client
            .get_record(STUDENTS.collection, id)
            .await?
            .ok_or_else(|| AppError::not_found("Student", id))?;
        STUDENTS.decode(&record)
    }

    async fn create(&self, req: NewStudentRequest) -> Result<Student, AppError> {
        req.validate()?;
        let today = Local::now().date_naive();
        let mut record = STUDENTS.encode(&Student::from_request(0, req, today))?;
        record.remove(ID_FIELD);
        let created = self.client.create_record(STUDENTS.collection, record).await?;
        let student: Student = STUDENTS.decode(&created)?;
        info!("enrolled student {} {}", student.id, student.full_name());
        Ok(student)
    }

    async fn update(&self, id: i64, req: UpdateStudentRequest) -> Result<Student, AppError> {
        check_id(id)?;
        req.validate()?;
        let mut record = STUDENTS.encode(&req)?;
        record.insert(ID_FIELD.to_string(), json!(id));
        let updated = self
            .client
            .update_record(STUDENTS.collection, record)
            .await?
            .ok_or_else(|| AppError::not_found("Student", id))?;
        STUDENTS.decode(&updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        check_id(id)?;
        if self.client.delete_record(STUDENTS.collection, id).await? {
            info!("deleted student {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Student", id))
        }
    }
}
