pub mod assignment;
pub mod course;
pub mod student;
pub mod study_session;

pub use assignment::{
    Assignment, AssignmentStatus, NewAssignmentRequest, Priority, UpdateAssignmentRequest,
};
pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use student::{NewStudentRequest, Student, StudentStatus, UpdateStudentRequest};
pub use study_session::{NewStudySessionRequest, StudySession, UpdateStudySessionRequest};
