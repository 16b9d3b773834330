use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::{NewStudySessionRequest, StudySession, UpdateStudySessionRequest};
use crate::records::RecordClient;
use crate::records::dto::QueryRequest;
use crate::records::mapping::{ID_FIELD, STUDY_SESSIONS};
use crate::services::memory::MemoryTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub total_sessions: usize,
    /// Hours, one decimal place.
    pub total_hours: f64,
    pub total_minutes: u64,
    /// Whole minutes per session.
    pub average_session: u64,
}

pub fn study_stats(sessions: &[StudySession]) -> StudyStats {
    let total_sessions = sessions.len();
    let total_minutes: u64 = sessions.iter().map(|s| u64::from(s.duration)).sum();
    let total_hours = (total_minutes as f64 / 60.0 * 10.0).round() / 10.0;
    let average_session = if total_sessions > 0 {
        (total_minutes as f64 / total_sessions as f64).round() as u64
    } else {
        0
    };

    StudyStats {
        total_sessions,
        total_hours,
        total_minutes,
        average_session,
    }
}

/// Most recent sessions first.
pub fn recent(mut sessions: Vec<StudySession>, limit: usize) -> Vec<StudySession> {
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
    sessions.truncate(limit);
    sessions
}

#[async_trait]
pub trait StudySessionService: Send + Sync {
    async fn get_all(&self) -> Result<Vec<StudySession>, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<StudySession, AppError>;
    async fn create(&self, req: NewStudySessionRequest) -> Result<StudySession, AppError>;
    async fn update(
        &self,
        id: i64,
        req: UpdateStudySessionRequest,
    ) -> Result<StudySession, AppError>;
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn get_stats(&self) -> Result<StudyStats, AppError> {
        Ok(study_stats(&self.get_all().await?))
    }

    async fn get_recent_sessions(&self, limit: usize) -> Result<Vec<StudySession>, AppError> {
        Ok(recent(self.get_all().await?, limit))
    }
}

fn validate(req: &NewStudySessionRequest) -> Result<(), AppError> {
    if req.course_id <= 0 {
        return Err(AppError::validation("courseId", "Please select a course first"));
    }
    Ok(())
}

pub struct MockStudySessionService {
    sessions: MemoryTable<StudySession>,
}

impl MockStudySessionService {
    pub fn new(sessions: Vec<StudySession>) -> Self {
        Self {
            sessions: MemoryTable::new(sessions),
        }
    }
}

#[async_trait]
impl StudySessionService for MockStudySessionService {
    async fn get_all(&self) -> Result<Vec<StudySession>, AppError> {
        Ok(self.sessions.all().await)
    }

    async fn get_by_id(&self, id: i64) -> Result<StudySession, AppError> {
        self.sessions
            .find(id)
            .await
            .ok_or_else(|| AppError::not_found("Study session", id))
    }

    async fn create(&self, req: NewStudySessionRequest) -> Result<StudySession, AppError> {
        validate(&req)?;
        let now = Utc::now();
        let session = self
            .sessions
            .insert_with(|id| StudySession::from_request(id, req, now))
            .await;
        info!(
            "recorded {} minute study session for course {}",
            session.duration, session.course_id
        );
        Ok(session)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateStudySessionRequest,
    ) -> Result<StudySession, AppError> {
        self.sessions
            .update(id, |session| session.apply(req))
            .await
            .ok_or_else(|| AppError::not_found("Study session", id))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.sessions.remove(id).await {
            info!("deleted study session {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Study session", id))
        }
    }
}

pub struct RemoteStudySessionService {
    client: Arc<dyn RecordClient>,
}

impl RemoteStudySessionService {
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self { client }
    }

    async fn query(&self, query: QueryRequest) -> Result<Vec<StudySession>, AppError> {
        let records = self
            .client
            .fetch_records(STUDY_SESSIONS.collection, &query)
            .await?;
        Ok(STUDY_SESSIONS.decode_all(&records))
    }
}

#[async_trait]
impl StudySessionService for RemoteStudySessionService {
    async fn get_all(&self) -> Result<Vec<StudySession>, AppError> {
        self.query(QueryRequest::new(&STUDY_SESSIONS.storage_fields()))
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<StudySession, AppError> {
        let record = self
            .client
            .get_record(STUDY_SESSIONS.collection, id)
            .await?
            .ok_or_else(|| AppError::not_found("Study session", id))?;
        STUDY_SESSIONS.decode(&record)
    }

    async fn create(&self, req: NewStudySessionRequest) -> Result<StudySession, AppError> {
        validate(&req)?;
        let mut record = STUDY_SESSIONS.encode(&StudySession::from_request(0, req, Utc::now()))?;
        record.remove(ID_FIELD);
        let created = self
            .client
            .create_record(STUDY_SESSIONS.collection, record)
            .await?;
        let session: StudySession = STUDY_SESSIONS.decode(&created)?;
        info!(
            "recorded {} minute study session for course {}",
            session.duration, session.course_id
        );
        Ok(session)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateStudySessionRequest,
    ) -> Result<StudySession, AppError> {
        let mut record = STUDY_SESSIONS.encode(&req)?;
        record.insert(ID_FIELD.to_string(), json!(id));
        let updated = self
            .client
            .update_record(STUDY_SESSIONS.collection, record)
            .await?
            .ok_or_else(|| AppError::not_found("Study session", id))?;
        STUDY_SESSIONS.decode(&updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        if self.client.delete_record(STUDY_SESSIONS.collection, id).await? {
            info!("deleted study session {}", id);
            Ok(true)
        } else {
            Err(AppError::not_found("Study session", id))
        }
    }

    async fn get_recent_sessions(&self, limit: usize) -> Result<Vec<StudySession>, AppError> {
        let query = QueryRequest::new(&STUDY_SESSIONS.storage_fields())
            .order_desc("date_c")
            .limit(u32::try_from(limit).unwrap_or(u32::MAX));
        // Store ordering of equal timestamps is unspecified; sort locally too.
        Ok(recent(self.query(query).await?, limit))
    }
}
