use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "Id")]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Grade level, e.g. "9" through "12".
    pub grade: String,
    pub status: StudentStatus,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub parent_email: String,
    #[serde(default)]
    pub emergency_contact: String,
    pub enrollment_date: NaiveDate,
    pub last_active: NaiveDate,
}

/// Missing required fields deserialize as empty and fail [`validate`](Self::validate).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade: String,
    pub status: Option<StudentStatus>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn from_request(id: i64, req: NewStudentRequest, today: NaiveDate) -> Self {
        Self {
            id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            grade: req.grade,
            status: req.status.unwrap_or_default(),
            phone_number: req.phone_number.unwrap_or_default(),
            address: req.address.unwrap_or_default(),
            parent_name: req.parent_name.unwrap_or_default(),
            parent_email: req.parent_email.unwrap_or_default(),
            emergency_contact: req.emergency_contact.unwrap_or_default(),
            enrollment_date: today,
            last_active: today,
        }
    }

    pub fn apply(&mut self, req: UpdateStudentRequest) {
        if let Some(first_name) = req.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = req.email {
            self.email = email;
        }
        if let Some(grade) = req.grade {
            self.grade = grade;
        }
        if let Some(status) = req.status {
            self.status = status;
        }
        if let Some(phone_number) = req.phone_number {
            self.phone_number = phone_number;
        }
        if let Some(address) = req.address {
            self.address = address;
        }
        if let Some(parent_name) = req.parent_name {
            self.parent_name = parent_name;
        }
        if let Some(parent_email) = req.parent_email {
            self.parent_email = parent_email;
        }
        if let Some(emergency_contact) = req.emergency_contact {
            self.emergency_contact = emergency_contact;
        }
    }
}

impl NewStudentRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.first_name.trim().is_empty() {
            errors.push("firstName", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.push("lastName", "Last name is required");
        }
        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        }
        if self.grade.trim().is_empty() {
            errors.push("grade", "Grade is required");
        }
        errors.into_result()
    }
}

impl UpdateStudentRequest {
    /// Fields that are present must not be blanked out.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        let required = [
            ("firstName", &self.first_name, "First name is required"),
            ("lastName", &self.last_name, "Last name is required"),
            ("email", &self.email, "Email is required"),
            ("grade", &self.grade, "Grade is required"),
        ];
        for (field, value, message) in required {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.push(field, message);
            }
        }
        errors.into_result()
    }
}
