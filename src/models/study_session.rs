use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    #[serde(rename = "Id")]
    pub id: i64,
    pub course_id: i64,
    pub assignment_id: Option<i64>,
    /// Minutes studied.
    pub duration: u32,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudySessionRequest {
    pub course_id: i64,
    pub assignment_id: Option<i64>,
    pub duration: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudySessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StudySession {
    pub fn from_request(id: i64, req: NewStudySessionRequest, date: DateTime<Utc>) -> Self {
        Self {
            id,
            course_id: req.course_id,
            assignment_id: req.assignment_id,
            duration: req.duration,
            date,
            notes: req.notes,
        }
    }

    pub fn apply(&mut self, req: UpdateStudySessionRequest) {
        if let Some(course_id) = req.course_id {
            self.course_id = course_id;
        }
        if let Some(assignment_id) = req.assignment_id {
            self.assignment_id = Some(assignment_id);
        }
        if let Some(duration) = req.duration {
            self.duration = duration;
        }
        if let Some(notes) = req.notes {
            self.notes = notes;
        }
    }
}
