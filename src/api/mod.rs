use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Local;
use serde::Deserialize;

use crate::error::AppError;
use crate::filters::{AssignmentFilter, StudentFilter};
use crate::models::*;
use crate::services::{AssignmentStats, StudyStats};
use crate::state::AppState;
use crate::timer::{TimerSelection, TimerSnapshot};
use crate::views::{self, CalendarQuery};

const DEFAULT_LIMIT: usize = 5;

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

impl LimitParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/active", get(list_active_courses))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{id}/assignments", get(list_course_assignments))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route("/assignments/upcoming", get(upcoming_assignments))
        .route("/assignments/stats", get(assignment_stats))
        .route(
            "/assignments/{id}",
            get(get_assignment)
                .patch(update_assignment)
                .delete(delete_assignment),
        )
        .route(
            "/study-sessions",
            get(list_study_sessions).post(create_study_session),
        )
        .route("/study-sessions/stats", get(study_stats))
        .route("/study-sessions/recent", get(recent_study_sessions))
        .route(
            "/study-sessions/{id}",
            get(get_study_session)
                .patch(update_study_session)
                .delete(delete_study_session),
        )
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
        .route("/pages/dashboard", get(dashboard_page))
        .route("/pages/courses", get(courses_page))
        .route("/pages/assignments", get(assignments_page))
        .route("/pages/grades", get(grades_page))
        .route("/pages/calendar", get(calendar_page))
        .route("/pages/students", get(students_page))
        .route("/pages/timer", get(timer_page))
        .route("/timer", get(timer_state))
        .route("/timer/start", post(start_timer))
        .route("/timer/pause", post(pause_timer))
        .route("/timer/reset", post(reset_timer))
        .route("/timer/save", post(save_timer))
        .route("/timer/select", post(select_timer))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

// courses

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.services.courses.get_all().await?;
    Ok(Json(courses))
}

async fn list_active_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.services.courses.get_active_courses().await?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.services.courses.get_by_id(id).await?))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.services.courses.create(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.services.courses.update(id, req).await?))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.services.courses.delete(id).await?))
}

async fn list_course_assignments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    Ok(Json(state.services.assignments.get_by_course(id).await?))
}

// assignments

async fn list_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    Ok(Json(state.services.assignments.get_all().await?))
}

async fn upcoming_assignments(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let assignments = state.services.assignments.get_upcoming(params.limit()).await?;
    Ok(Json(assignments))
}

async fn assignment_stats(
    State(state): State<AppState>,
) -> Result<Json<AssignmentStats>, AppError> {
    Ok(Json(state.services.assignments.get_stats().await?))
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(state.services.assignments.get_by_id(id).await?))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(req): Json<NewAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let assignment = state.services.assignments.create(req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(state.services.assignments.update(id, req).await?))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.services.assignments.delete(id).await?))
}

// study sessions

async fn list_study_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudySession>>, AppError> {
    Ok(Json(state.services.study_sessions.get_all().await?))
}

async fn study_stats(State(state): State<AppState>) -> Result<Json<StudyStats>, AppError> {
    Ok(Json(state.services.study_sessions.get_stats().await?))
}

async fn recent_study_sessions(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<StudySession>>, AppError> {
    let sessions = state
        .services
        .study_sessions
        .get_recent_sessions(params.limit())
        .await?;
    Ok(Json(sessions))
}

async fn get_study_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StudySession>, AppError> {
    Ok(Json(state.services.study_sessions.get_by_id(id).await?))
}

async fn create_study_session(
    State(state): State<AppState>,
    Json(req): Json<NewStudySessionRequest>,
) -> Result<(StatusCode, Json<StudySession>), AppError> {
    let session = state.services.study_sessions.create(req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_study_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStudySessionRequest>,
) -> Result<Json<StudySession>, AppError> {
    Ok(Json(state.services.study_sessions.update(id, req).await?))
}

async fn delete_study_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.services.study_sessions.delete(id).await?))
}

// students

async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    Ok(Json(state.services.students.get_all().await?))
}

async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.services.students.get_by_id(id).await?))
}

async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<NewStudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = state.services.students.create(req).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(state.services.students.update(id, req).await?))
}

async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.services.students.delete(id).await?))
}

// pages

async fn dashboard_page(
    State(state): State<AppState>,
) -> Result<Json<views::DashboardView>, AppError> {
    Ok(Json(views::dashboard(&state.services, &Local::now()).await?))
}

async fn courses_page(State(state): State<AppState>) -> Result<Json<views::CoursesView>, AppError> {
    Ok(Json(views::courses_page(&state.services).await?))
}

async fn assignments_page(
    State(state): State<AppState>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<views::AssignmentsView>, AppError> {
    let view = views::assignments_page(&state.services, &filter, &Local::now()).await?;
    Ok(Json(view))
}

async fn grades_page(State(state): State<AppState>) -> Result<Json<views::GradesView>, AppError> {
    Ok(Json(views::grades_page(&state.services).await?))
}

async fn calendar_page(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<views::CalendarView>, AppError> {
    let view = views::calendar_page(
        &state.services,
        &query,
        state.config.week_start,
        &Local::now(),
    )
    .await?;
    Ok(Json(view))
}

async fn students_page(
    State(state): State<AppState>,
    Query(filter): Query<StudentFilter>,
) -> Result<Json<views::StudentsView>, AppError> {
    Ok(Json(views::students_page(&state.services, &filter).await?))
}

async fn timer_page(State(state): State<AppState>) -> Result<Json<views::TimerView>, AppError> {
    let mut timer = state.timer.lock().await;
    Ok(Json(views::timer_page(&state.services, &mut timer).await?))
}

// timer

async fn timer_state(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.timer.lock().await.snapshot().await)
}

async fn start_timer(State(state): State<AppState>) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(state.timer.lock().await.start().await?))
}

async fn pause_timer(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.timer.lock().await.pause().await)
}

async fn reset_timer(State(state): State<AppState>) -> Json<TimerSnapshot> {
    Json(state.timer.lock().await.reset().await)
}

async fn save_timer(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StudySession>), AppError> {
    let mut timer = state.timer.lock().await;
    let session = timer.save(state.services.study_sessions.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn select_timer(
    State(state): State<AppState>,
    Json(selection): Json<TimerSelection>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let assignments = state.services.assignments.get_all().await?;
    let mut timer = state.timer.lock().await;
    Ok(Json(timer.select(selection, &assignments).await))
}
