//! Seed dataset for the in-memory services, compiled into the binary.

use serde::de::DeserializeOwned;

use crate::models::{Assignment, Course, Student, StudySession};

const COURSES: &str = include_str!("../data/courses.json");
const ASSIGNMENTS: &str = include_str!("../data/assignments.json");
const STUDY_SESSIONS: &str = include_str!("../data/study_sessions.json");
const STUDENTS: &str = include_str!("../data/students.json");

fn load<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn courses() -> Result<Vec<Course>, serde_json::Error> {
    load(COURSES)
}

pub fn assignments() -> Result<Vec<Assignment>, serde_json::Error> {
    load(ASSIGNMENTS)
}

pub fn study_sessions() -> Result<Vec<StudySession>, serde_json::Error> {
    load(STUDY_SESSIONS)
}

pub fn students() -> Result<Vec<Student>, serde_json::Error> {
    load(STUDENTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_files_parse() {
        assert!(!courses().unwrap().is_empty());
        assert!(!assignments().unwrap().is_empty());
        assert!(!study_sessions().unwrap().is_empty());
        assert!(!students().unwrap().is_empty());
    }

    #[test]
    fn seed_references_resolve() {
        let courses = courses().unwrap();
        let assignments = assignments().unwrap();
        for assignment in &assignments {
            assert!(
                courses.iter().any(|c| c.id == assignment.course_id),
                "assignment {} points at a missing course",
                assignment.id
            );
        }
        for session in study_sessions().unwrap() {
            assert!(courses.iter().any(|c| c.id == session.course_id));
            if let Some(assignment_id) = session.assignment_id {
                assert!(assignments.iter().any(|a| a.id == assignment_id));
            }
        }
    }
}
