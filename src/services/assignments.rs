use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::{Assignment, AssignmentStatus, NewAssignmentRequest, UpdateAssignmentRequest};
use crate::records::RecordClient;
use crate::records::dto::QueryRequest;
use crate::records::mapping::{ASSIGNMENTS, ID_FIELD};
use crate::services::memory::MemoryTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Whole percent of completed assignments.
    pub completion_rate: u32,
}

pub fn assignment_stats(assignments: &[Assignment], now: DateTime<Utc>) -> AssignmentStats {
    let total = assignments.len();
    let completed = assignments.iter().filter(|a| a.is_completed()).count();
    let pending = assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Pending)
        .count();
    let overdue = assignments
        .iter()
        .filter(|a| a.due_date < now && !a.is_completed())
        .count();
    let completion_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };

    AssignmentStats {
        total,
        completed,
        pending,
        overdue,
        completion_rate,
    }
}

/// Open assignments due after `now`, soonest first.
pub fn upcoming(mut assignments: Vec<Assignment>, now: DateTime<Utc>, limit: usize) -> Vec<Assignment> {
    assignments.retain(|a| a.due_date > now && !a.is_completed());
    assignments.sort_by_key(|a| a.due_date);
    assignments.truncate(limit);
    assignments
}

#[async_trait]
pub trait AssignmentService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Assignment>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Assignment, AppError>;
    async fn create(&self, req: NewAssignmentRequest) -> Result<Assignment, AppError>;
    async fn update(&self, id: i64, req: UpdateAssignmentRequest) -> Result<Assignment, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
    async fn get_by_course(&self, course_id: i64) -> Result<Vec<Assignment>, AppError>;

    async fn get_upcoming(&self, limit: usize) -> Result<Vec<Assignment>, AppError> {
        Ok(upcoming(self.get_all().await?, Utc::now(), limit))
    }

    async fn get_stats(&self) -> Result<AssignmentStats, AppError> {
        Ok(assignment_stats(&self.get_all().await?, Utc::now()))
    }
}

pub struct MockAssignmentService {
    assignments: MemoryTable<Assignment>,
}

impl MockAssignmentService {
    pub fn new(assignments: Vec<Assignment>) -> Self {
        Self {
            assignments: MemoryTable::new(assignments),
        }
    }
}

#[async_trait]
impl AssignmentService for MockAssignmentService {
    async fn get_all(&self) -> Result<Vec<Assignment>, AppError> {
        Ok(self.assignments.all().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<Assignment, AppError> {
        self.assignments
            .find(id)
            .await
            .ok_or_else(|| AppError::not_found("Assignment", id))
    }

    async fn create(&self, req: NewAssignmentRequest) -> Result<Assignment, AppError> {
        req.validate()?;
        let assignment = self
            .assignments
            .insert_with(|id| Assignment::from_request(id, req))
            .await;
        info!("created assignment {} for course {}", assignment.id, assignment.course_id);
        Ok(assignment)
    }

    async fn update(&self, id: i64, req: UpdateAssignmentRequest) -> Result<Assignment, AppError> {
        self.assignments
            .update(id, |assignment| assignment.apply(req))
            .await
            .ok_or_else(|| AppError::not_found("Assignment", id))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.assignments.remove(id).await {
            info!("deleted assignment {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Assignment", id))
        }
    }

    async fn get_by_course(&self, course_id: i64) -> Result<Vec<Assignment>, AppError> {
        Ok(self.assignments.filter(|a| a.course_id == course_id).await)
    }
}

pub struct RemoteAssignmentService {
    client: Arc<dyn RecordClient>,
}

impl RemoteAssignmentService {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self { client }
    }

    async fn query(&self, query: QueryRequest) -> Result<Vec<Assignment>, AppError> {
        let records = self
            .client
            .fetch_records(ASSIGNMENTS.collection, &query)
            .await?;
        Ok(ASSIGNMENTS.decode_all(&records))
    }
}

#[async_trait]
impl AssignmentService for RemoteAssignmentService {
    async fn get_all(&self) -> Result<Vec<Assignment>, AppError> {
        self.query(QueryRequest::new(&ASSIGNMENTS.storage_fields()))
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Assignment, AppError> {
        let record = self
            .client
            .get_record(ASSIGNMENTS.collection, id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment", id))?;
        ASSIGNMENTS.decode(&record)
    }

    async fn create(&self, req: NewAssignmentRequest) -> Result<Assignment, AppError> {
        req.validate()?;
        let mut record = ASSIGNMENTS.encode(&Assignment::from_request(0, req))?;
        record.remove(ID_FIELD);
        let created = self
            .client
            .create_record(ASSIGNMENTS.collection, record)
            .await?;
        let assignment: Assignment = ASSIGNMENTS.decode(&created)?;
        info!("created assignment {} for course {}", assignment.id, assignment.course_id);
        Ok(assignment)
    }

    async fn update(&self, id: i64, req: UpdateAssignmentRequest) -> Result<Assignment, AppError> {
        let mut record = ASSIGNMENTS.encode(&req)?;
        record.insert(ID_FIELD.to_string(), json!(id));
        let updated = self
            .client
            .update_record(ASSIGNMENTS.collection, record)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment", id))?;
        ASSIGNMENTS.decode(&updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.client.delete_record(ASSIGNMENTS.collection, id).await? {
            info!("deleted assignment {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Assignment", id))
        }
    }

    async fn get_by_course(&self, course_id: i64) -> Result<Vec<Assignment>, AppError> {
        let query = QueryRequest::new(&ASSIGNMENTS.storage_fields())
            .equal_to("course_id_c", json!(course_id));
        self.query(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::seed;
    use chrono::TimeZone;

    fn service() -> MockAssignmentService {
        MockAssignmentService::new(seed::assignments().unwrap())
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_forces_pending_status() {
        let created = service()
            .create(NewAssignmentRequest {
                course_id: 2,
                title: "Problem Set 3".to_string(),
                description: String::new(),
                due_date: at(2024, 11, 20),
                priority: Priority::Medium,
                max_points: 50.0,
                category: "Homework".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 13);
        assert_eq!(created.status, AssignmentStatus::Pending);
    }

    #[tokio::test]
    async fn status_update_keeps_other_fields() {
        let service = service();
        let updated = service
            .update(
                7,
                UpdateAssignmentRequest {
                    status: Some(AssignmentStatus::Completed),
                    grade: Some(Some(18.0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AssignmentStatus::Completed);
        assert_eq!(updated.grade, Some(18.0));
        assert_eq!(updated.title, "Eigenvalues Quiz");
    }

    #[tokio::test]
    async fn by_course_filters_on_course_id() {
        let physics = service().get_by_course(4).await.unwrap();
        assert_eq!(physics.len(), 3);
        assert!(physics.iter().all(|a| a.course_id == 4));
    }

    #[tokio::test]
    async fn delete_unknown_assignment_is_not_found() {
        assert!(matches!(service().delete(404).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn stats_count_overdue_only_when_open() {
        let assignments = seed::assignments().unwrap();
        let stats = assignment_stats(&assignments, at(2024, 11, 10));
        assert_eq!(stats.total, 12);
        assert_eq!(stats.completed, 7);
        assert_eq!(stats.pending, 3);
        // Eigenvalues quiz and circuits homework are past due and open.
        assert_eq!(stats.overdue, 2);
        assert_eq!(stats.completion_rate, 58);
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        let stats = assignment_stats(&[], Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn upcoming_is_sorted_open_and_limited() {
        let list = upcoming(seed::assignments().unwrap(), at(2024, 11, 1), 3);
        let ids: Vec<i64> = list.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![7, 11, 9]);
    }
}
