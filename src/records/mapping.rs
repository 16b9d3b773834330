//! UI field name ↔ storage column tables, one per collection.
//!
//! Storage columns carry a `_c` suffix. `Id` is a system column and passes
//! through untouched. Reference columns come back from the store either as a
//! raw id or as an embedded `{ "Id": .., "Name": .. }` summary.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::dto::StoredRecord;
use crate::error::AppError;

pub const ID_FIELD: &str = "Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    Reference,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub ui: &'static str,
    pub storage: &'static str,
    pub kind: FieldKind,
}

const fn plain(ui: &'static str, storage: &'static str) -> Field {
    Field {
        ui,
        storage,
        kind: FieldKind::Plain,
    }
}

const fn reference(ui: &'static str, storage: &'static str) -> Field {
    Field {
        ui,
        storage,
        kind: FieldKind::Reference,
    }
}

#[derive(Debug)]
pub struct FieldMap {
    pub collection: &'static str,
    pub fields: &'static [Field],
}

pub const COURSES: FieldMap = FieldMap {
    collection: "course_c",
    fields: &[
        plain("name", "name_c"),
        plain("code", "code_c"),
        plain("credits", "credits_c"),
        plain("professor", "professor_c"),
        plain("color", "color_c"),
        plain("semester", "semester_c"),
        plain("isActive", "is_active_c"),
    ],
};

pub const ASSIGNMENTS: FieldMap = FieldMap {
    collection: "assignment_c",
    fields: &[
        plain("title", "title_c"),
        plain("description", "description_c"),
        plain("dueDate", "due_date_c"),
        plain("priority", "priority_c"),
        plain("status", "status_c"),
        plain("grade", "grade_c"),
        plain("maxPoints", "max_points_c"),
        plain("category", "category_c"),
        reference("courseId", "course_id_c"),
    ],
};

pub const STUDY_SESSIONS: FieldMap = FieldMap {
    collection: "study_session_c",
    fields: &[
        reference("courseId", "course_id_c"),
        reference("assignmentId", "assignment_id_c"),
        plain("duration", "duration_c"),
        plain("date", "date_c"),
        plain("notes", "notes_c"),
    ],
};

pub const STUDENTS: FieldMap = FieldMap {
    collection: "student_c",
    fields: &[
        plain("firstName", "first_name_c"),
        plain("lastName", "last_name_c"),
        plain("email", "email_c"),
        plain("grade", "grade_c"),
        plain("status", "status_c"),
        plain("phoneNumber", "phone_number_c"),
        plain("address", "address_c"),
        plain("parentName", "parent_name_c"),
        plain("parentEmail", "parent_email_c"),
        plain("emergencyContact", "emergency_contact_c"),
        plain("enrollmentDate", "enrollment_date_c"),
        plain("lastActive", "last_active_c"),
    ],
};

impl FieldMap {
    pub fn storage_name(&self, ui: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.ui == ui).map(|f| f.storage)
    }

    pub fn ui_name(&self, storage: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.storage == storage).map(|f| f.ui)
    }

    /// Column list for queries, `Id` first.
    pub fn storage_fields(&self) -> Vec<&'static str> {
        std::iter::once(ID_FIELD)
            .chain(self.fields.iter().map(|f| f.storage))
            .collect()
    }

    /// Renames UI keys to storage columns. Keys without a mapping are dropped,
    /// so derived/joined values never reach the store.
    pub fn to_storage(&self, ui: &StoredRecord) -> StoredRecord {
        let mut stored = StoredRecord::new();
        for (key, value) in ui {
            if key == ID_FIELD {
                stored.insert(ID_FIELD.to_string(), value.clone());
            } else if let Some(column) = self.storage_name(key) {
                stored.insert(column.to_string(), value.clone());
            }
        }
        stored
    }

    /// Renames storage columns back to UI keys, unwrapping references.
    /// Null columns are left out so that defaults apply on decode.
    pub fn from_storage(&self, stored: &StoredRecord) -> StoredRecord {
        let mut ui = StoredRecord::new();
        if let Some(id) = stored.get(ID_FIELD) {
            ui.insert(ID_FIELD.to_string(), id.clone());
        }
        for field in self.fields {
            let Some(value) = stored.get(field.storage) else {
                continue;
            };
            let value = match field.kind {
                FieldKind::Plain => value.clone(),
                FieldKind::Reference => unwrap_reference(value),
            };
            if !value.is_null() {
                ui.insert(field.ui.to_string(), value);
            }
        }
        ui
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<StoredRecord, AppError> {
        match serde_json::to_value(value)? {
            Value::Object(ui) => Ok(self.to_storage(&ui)),
            other => Err(AppError::Remote(format!(
                "cannot store non-object value in {}: {}",
                self.collection, other
            ))),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, stored: &StoredRecord) -> Result<T, AppError> {
        let ui = self.from_storage(stored);
        Ok(serde_json::from_value(Value::Object(ui))?)
    }

    /// Decodes a result set, skipping records that do not fit the model.
    pub fn decode_all<T: DeserializeOwned>(&self, records: &[StoredRecord]) -> Vec<T> {
        records
            .iter()
            .filter_map(|record| match self.decode(record) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        "Skipping malformed {} record {:?}: {}",
                        self.collection,
                        record.get(ID_FIELD),
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

/// `{ "Id": 3, "Name": "CS 201" }` → `3`; anything else is returned as is.
pub fn unwrap_reference(value: &Value) -> Value {
    match value {
        Value::Object(summary) => summary.get(ID_FIELD).cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}
