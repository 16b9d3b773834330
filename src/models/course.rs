use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub credits: u32,
    pub professor: String,
    pub color: String,
    pub semester: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourseRequest {
    pub name: String,
    pub code: String,
    pub credits: u32,
    pub professor: String,
    pub color: String,
    pub semester: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Course {
    pub fn from_request(id: i64, req: NewCourseRequest) -> Self {
        Self {
            id,
            name: req.name,
            code: req.code,
            credits: req.credits,
            professor: req.professor,
            color: req.color,
            semester: req.semester,
            is_active: true,
        }
    }

    pub fn apply(&mut self, req: UpdateCourseRequest) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(code) = req.code {
            self.code = code;
        }
        if let Some(credits) = req.credits {
            self.credits = credits;
        }
        if let Some(professor) = req.professor {
            self.professor = professor;
        }
        if let Some(color) = req.color {
            self.color = color;
        }
        if let Some(semester) = req.semester {
            self.semester = semester;
        }
        if let Some(is_active) = req.is_active {
            self.is_active = is_active;
        }
    }
}

impl NewCourseRequest {
    pub fn validate(&self) -> Result<(), crate::error::FieldErrors> {
        let mut errors = crate::error::FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Course name is required");
        }
        if self.code.trim().is_empty() {
            errors.push("code", "Course code is required");
        }
        if self.credits == 0 {
            errors.push("credits", "Credits must be at least 1");
        }
        errors.into_result()
    }
}
