use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank; higher sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "Id")]
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: AssignmentStatus,
    pub grade: Option<f64>,
    pub max_points: f64,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignmentRequest {
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub max_points: f64,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AssignmentStatus>,
    /// `Some(None)` clears the grade, a missing key leaves it alone.
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub grade: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl Assignment {
    /// New assignments always start out pending and ungraded.
    pub fn from_request(id: i64, req: NewAssignmentRequest) -> Self {
        Self {
            id,
            course_id: req.course_id,
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            status: AssignmentStatus::Pending,
            grade: None,
            max_points: req.max_points,
            category: req.category,
        }
    }

    pub fn apply(&mut self, req: UpdateAssignmentRequest) {
        if let Some(course_id) = req.course_id {
            self.course_id = course_id;
        }
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(description) = req.description {
            self.description = description;
        }
        if let Some(due_date) = req.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = req.priority {
            self.priority = priority;
        }
        if let Some(status) = req.status {
            self.status = status;
        }
        if let Some(grade) = req.grade {
            self.grade = grade;
        }
        if let Some(max_points) = req.max_points {
            self.max_points = max_points;
        }
        if let Some(category) = req.category {
            self.category = category;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AssignmentStatus::Completed
    }

    /// Earned percentage of a graded assignment.
    pub fn percentage(&self) -> Option<f64> {
        let grade = self.grade?;
        if self.max_points > 0.0 {
            Some(grade / self.max_points * 100.0)
        } else {
            Some(0.0)
        }
    }
}

impl NewAssignmentRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.course_id <= 0 {
            errors.push("courseId", "Course is required");
        }
        if self.max_points.is_nan() || self.max_points <= 0.0 {
            errors.push("maxPoints", "Max points must be greater than 0");
        }
        errors.into_result()
    }
}
