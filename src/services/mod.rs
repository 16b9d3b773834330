pub mod assignments;
pub mod courses;
pub mod memory;
pub mod students;
pub mod study_sessions;

use std::sync::Arc;

pub use assignments::{AssignmentService, AssignmentStats, MockAssignmentService, RemoteAssignmentService};
pub use courses::{CourseService, MockCourseService, RemoteCourseService};
pub use students::{MockStudentService, RemoteStudentService, StudentService};
pub use study_sessions::{
    MockStudySessionService, RemoteStudySessionService, StudySessionService, StudyStats,
};

use crate::error::AppError;
use crate::records::RecordClient;
use crate::seed;

/// One implementation per entity, chosen once when the app is composed.
#[derive(Clone)]
pub struct Services {
    pub courses: Arc<dyn CourseService>,
    pub assignments: Arc<dyn AssignmentService>,
    pub study_sessions: Arc<dyn StudySessionService>,
    pub students: Arc<dyn StudentService>,
}

impl Services {
    /// In-memory services over the bundled seed dataset.
    pub fn mock() -> Result<Self, AppError> {
        let courses = seed::courses().map_err(|e| AppError::Config(format!("course seed: {}", e)))?;
        let assignments =
            seed::assignments().map_err(|e| AppError::Config(format!("assignment seed: {}", e)))?;
        let sessions = seed::study_sessions()
            .map_err(|e| AppError::Config(format!("study session seed: {}", e)))?;
        let students =
            seed::students().map_err(|e| AppError::Config(format!("student seed: {}", e)))?;

        Ok(Self {
            courses: Arc::new(MockCourseService::new(courses)),
            assignments: Arc::new(MockAssignmentService::new(assignments)),
            study_sessions: Arc::new(MockStudySessionService::new(sessions)),
            students: Arc::new(MockStudentService::new(students)),
        })
    }

    /// Services proxying to the remote record store.
    pub fn remote(client: Arc<dyn RecordClient>) -> Self {
        Self {
            courses: Arc::new(RemoteCourseService::new(client.clone())),
            assignments: Arc::new(RemoteAssignmentService::new(client.clone())),
            study_sessions: Arc::new(RemoteStudySessionService::new(client.clone())),
            students: Arc::new(RemoteStudentService::new(client)),
        }
    }
}
