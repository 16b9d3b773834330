//! Page view models.
//!
//! Each page loads what it needs from the services concurrently, joins
//! assignments and sessions to their course by id, and derives the numbers
//! the page displays. Nothing here is cached between requests.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, MonthGrid, WeekStart, YearMonth};
use crate::error::AppError;
use crate::filters::{self, AssignmentFilter, DueState, StudentFilter};
use crate::grades::{self, GradeTone, LetterGrade, round_to};
use crate::models::{Assignment, Course, Student, StudySession};
use crate::services::{AssignmentStats, Services, StudyStats};
use crate::timer::{StudyTimer, TimerSelection, TimerSnapshot};

pub const DASHBOARD_UPCOMING: usize = 5;
pub const DASHBOARD_SESSIONS: usize = 3;
pub const TIMER_SESSIONS: usize = 5;
pub const RECENT_GRADES: usize = 10;

/// The parts of a course shown next to an assignment or session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    #[serde(rename = "Id")]
    pub id: i64,
    pub name: String,
    pub code: String,
    pub color: String,
}

impl From<&Course> for CourseRef {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            name: course.name.clone(),
            code: course.code.clone(),
            color: course.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub course: Option<CourseRef>,
    pub due_state: Option<DueState>,
    pub due_label: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    #[serde(flatten)]
    pub session: StudySession,
    pub course: Option<CourseRef>,
    pub assignment_title: Option<String>,
}

struct Lookup<'a> {
    courses: HashMap<i64, &'a Course>,
}

impl<'a> Lookup<'a> {
    fn new(courses: &'a [Course]) -> Self {
        Self {
            courses: courses.iter().map(|c| (c.id, c)).collect(),
        }
    }

    fn course(&self, id: i64) -> Option<CourseRef> {
        self.courses.get(&id).map(|c| CourseRef::from(*c))
    }

    fn assignment_rows<Tz: TimeZone>(
        &self,
        assignments: Vec<Assignment>,
        now: &DateTime<Tz>,
    ) -> Vec<AssignmentRow> {
        assignments
            .into_iter()
            .map(|assignment| {
                let due_state = filters::due_state(&assignment, now);
                AssignmentRow {
                    course: self.course(assignment.course_id),
                    due_state,
                    due_label: due_state.map(DueState::label),
                    assignment,
                }
            })
            .collect()
    }

    fn session_rows(&self, sessions: Vec<StudySession>, assignments: &[Assignment]) -> Vec<SessionRow> {
        let titles: HashMap<i64, &str> = assignments.iter().map(|a| (a.id, a.title.as_str())).collect();
        sessions
            .into_iter()
            .map(|session| SessionRow {
                course: self.course(session.course_id),
                assignment_title: session
                    .assignment_id
                    .and_then(|id| titles.get(&id))
                    .map(|title| title.to_string()),
                session,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub courses: Vec<Course>,
    pub upcoming_assignments: Vec<AssignmentRow>,
    pub assignment_stats: AssignmentStats,
    pub study_stats: StudyStats,
    pub recent_sessions: Vec<SessionRow>,
}

pub async fn dashboard<Tz: TimeZone>(
    services: &Services,
    now: &DateTime<Tz>,
) -> Result<DashboardView, AppError> {
    let (all_courses, upcoming, assignment_stats, study_stats, sessions, assignments) = tokio::try_join!(
        services.courses.get_all(),
        services.assignments.get_upcoming(DASHBOARD_UPCOMING),
        services.assignments.get_stats(),
        services.study_sessions.get_stats(),
        services.study_sessions.get_recent_sessions(DASHBOARD_SESSIONS),
        services.assignments.get_all(),
    )?;

    let lookup = Lookup::new(&all_courses);
    let upcoming_assignments = lookup.assignment_rows(upcoming, now);
    let recent_sessions = lookup.session_rows(sessions, &assignments);
    Ok(DashboardView {
        upcoming_assignments,
        assignment_stats,
        study_stats,
        recent_sessions,
        courses: all_courses.iter().filter(|c| c.is_active).cloned().collect(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursesView {
    pub courses: Vec<Course>,
    pub active_count: usize,
    pub active_credits: u32,
}

pub async fn courses_page(services: &Services) -> Result<CoursesView, AppError> {
    let courses = services.courses.get_all().await?;
    let active = courses.iter().filter(|c| c.is_active);
    Ok(CoursesView {
        active_count: active.clone().count(),
        active_credits: active.map(|c| c.credits).sum(),
        courses,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsView {
    pub assignments: Vec<AssignmentRow>,
    /// Active courses, offered when creating an assignment.
    pub courses: Vec<Course>,
    pub total: usize,
}

pub async fn assignments_page<Tz: TimeZone>(
    services: &Services,
    filter: &AssignmentFilter,
    now: &DateTime<Tz>,
) -> Result<AssignmentsView, AppError> {
    let (assignments, courses) = tokio::try_join!(
        services.assignments.get_all(),
        services.courses.get_all(),
    )?;

    let matched = filters::filter_assignments(&assignments, &courses, filter);
    let rows = Lookup::new(&courses).assignment_rows(matched, now);
    Ok(AssignmentsView {
        assignments: rows,
        total: assignments.len(),
        courses: courses.into_iter().filter(|c| c.is_active).collect(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGradeSummary {
    pub total_assignments: usize,
    pub total_points: f64,
    pub earned_points: f64,
    /// One decimal place.
    pub percentage: f64,
    /// Progress ring value, capped at 100.
    pub ring: f64,
    pub letter_grade: LetterGrade,
    pub grade_points: f64,
    pub tone: GradeTone,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGradeRow {
    pub course: Course,
    pub stats: Option<CourseGradeSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGrade {
    pub assignment_id: i64,
    pub title: String,
    pub category: String,
    pub course: Option<CourseRef>,
    pub grade: f64,
    pub max_points: f64,
    pub percentage: f64,
    pub letter_grade: LetterGrade,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradesView {
    /// Two decimal places.
    pub gpa: f64,
    pub average_grade: f64,
    pub average_letter: LetterGrade,
    pub graded_assignments: usize,
    pub total_credits: u32,
    pub courses: Vec<CourseGradeRow>,
    pub recent_grades: Vec<RecentGrade>,
}

pub fn build_grades(courses: Vec<Course>, assignments: Vec<Assignment>) -> GradesView {
    let lookup = Lookup::new(&courses);
    let mut graded: Vec<&Assignment> = assignments.iter().filter(|a| a.grade.is_some()).collect();
    graded.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    let recent_grades = graded
        .iter()
        .take(RECENT_GRADES)
        .filter_map(|a| {
            let grade = a.grade?;
            let percentage = a.percentage().unwrap_or(0.0);
            Some(RecentGrade {
                assignment_id: a.id,
                title: a.title.clone(),
                category: a.category.clone(),
                course: lookup.course(a.course_id),
                grade,
                max_points: a.max_points,
                percentage: round_to(percentage, 1),
                letter_grade: LetterGrade::from_percentage(percentage),
            })
        })
        .collect();

    let average = grades::average_grade(&assignments);
    let active: Vec<Course> = courses.iter().filter(|c| c.is_active).cloned().collect();
    let rows = active
        .iter()
        .map(|course| CourseGradeRow {
            stats: grades::course_stats(course.id, &assignments).map(|stats| CourseGradeSummary {
                total_assignments: stats.total_assignments,
                total_points: stats.total_points,
                earned_points: stats.earned_points,
                percentage: round_to(stats.percentage, 1),
                ring: round_to(stats.ring_progress(), 1),
                letter_grade: stats.letter_grade,
                grade_points: stats.grade_points(),
                tone: stats.tone(),
            }),
            course: course.clone(),
        })
        .collect();

    GradesView {
        gpa: round_to(grades::overall_gpa(&active, &assignments), 2),
        average_grade: round_to(average, 1),
        average_letter: LetterGrade::from_percentage(average),
        graded_assignments: graded.len(),
        total_credits: active.iter().map(|c| c.credits).sum(),
        courses: rows,
        recent_grades,
    }
}

pub async fn grades_page(services: &Services) -> Result<GradesView, AppError> {
    let (assignments, courses) = tokio::try_join!(
        services.assignments.get_all(),
        services.courses.get_all(),
    )?;
    Ok(build_grades(courses, assignments))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    #[serde(default)]
    pub mode: CalendarMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub mode: CalendarMode,
    pub month: YearMonth,
    pub previous: YearMonth,
    pub next: YearMonth,
    pub selected_date: NaiveDate,
    pub selected: Vec<AssignmentRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<MonthGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<AssignmentRow>>,
    pub courses: Vec<CourseRef>,
}

/// Month defaults to the one containing `now`; the selected day defaults
/// to today inside that month and to the 1st elsewhere.
pub fn build_calendar<Tz: TimeZone>(
    query: &CalendarQuery,
    week_start: WeekStart,
    now: &DateTime<Tz>,
    courses: &[Course],
    assignments: &[Assignment],
) -> Result<CalendarView, AppError> {
    let today = now.date_naive();
    let month = YearMonth::new(
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )?;
    let selected_date = match query.day {
        Some(day) => NaiveDate::from_ymd_opt(month.year, month.month, day)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid day {}", day)))?,
        None if month.contains(today) => today,
        None => NaiveDate::from_ymd_opt(month.year, month.month, 1)
            .ok_or(AppError::InternalServerError)?,
    };

    let tz = now.timezone();
    let lookup = Lookup::new(courses);
    let selected = lookup.assignment_rows(calendar::assignments_on(selected_date, &tz, assignments), now);
    let (grid, list) = match query.mode {
        CalendarMode::Grid => (
            Some(calendar::month_grid(month, week_start, &tz, today, assignments)?),
            None,
        ),
        CalendarMode::List => (
            None,
            Some(lookup.assignment_rows(calendar::assignments_in_month(month, &tz, assignments), now)),
        ),
    };

    Ok(CalendarView {
        mode: query.mode,
        month,
        previous: month.previous(),
        next: month.next(),
        selected_date,
        selected,
        grid,
        list,
        courses: courses.iter().map(CourseRef::from).collect(),
    })
}

pub async fn calendar_page<Tz: TimeZone>(
    services: &Services,
    query: &CalendarQuery,
    week_start: WeekStart,
    now: &DateTime<Tz>,
) -> Result<CalendarView, AppError> {
    let (assignments, courses) = tokio::try_join!(
        services.assignments.get_all(),
        services.courses.get_all(),
    )?;
    build_calendar(query, week_start, now, &courses, &assignments)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentsView {
    pub students: Vec<Student>,
    pub total: usize,
    pub grade_options: Vec<String>,
}

pub async fn students_page(services: &Services, filter: &StudentFilter) -> Result<StudentsView, AppError> {
    let students = services.students.get_all().await?;
    Ok(StudentsView {
        students: filters::filter_students(&students, filter),
        total: students.len(),
        grade_options: filters::grade_options(&students),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub timer: TimerSnapshot,
    pub courses: Vec<Course>,
    /// Open assignments of the selected course.
    pub assignments: Vec<Assignment>,
    pub study_stats: StudyStats,
    pub recent_sessions: Vec<SessionRow>,
}

/// Selects the first active course when nothing is selected yet.
pub async fn timer_page(services: &Services, timer: &mut StudyTimer) -> Result<TimerView, AppError> {
    let (all_courses, assignments, study_stats, sessions) = tokio::try_join!(
        services.courses.get_all(),
        services.assignments.get_all(),
        services.study_sessions.get_stats(),
        services.study_sessions.get_recent_sessions(TIMER_SESSIONS),
    )?;

    let courses: Vec<Course> = all_courses.iter().filter(|c| c.is_active).cloned().collect();
    let mut snapshot = timer.snapshot().await;
    if snapshot.course_id.is_none() {
        if let Some(first) = courses.first() {
            let selection = TimerSelection {
                course_id: Some(first.id),
                ..Default::default()
            };
            snapshot = timer.select(selection, &assignments).await;
        }
    }

    let open: Vec<Assignment> = match snapshot.course_id {
        Some(course_id) => assignments
            .iter()
            .filter(|a| a.course_id == course_id && !a.is_completed())
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let recent_sessions = Lookup::new(&all_courses).session_rows(sessions, &assignments);
    Ok(TimerView {
        timer: snapshot,
        courses,
        assignments: open,
        study_stats,
        recent_sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateCourseRequest;
    use crate::seed;
    use chrono::{Local, Utc};

    fn services() -> Services {
        Services::mock().unwrap()
    }

    #[test]
    fn grades_cover_active_courses_only() {
        let view = build_grades(seed::courses().unwrap(), seed::assignments().unwrap());
        assert_eq!(view.courses.len(), 4);
        assert_eq!(view.total_credits, 13);
        assert_eq!(view.graded_assignments, 7);

        let data_structures = view.courses[0].stats.as_ref().unwrap();
        // 355 of 400 points
        assert_eq!(data_structures.percentage, 88.8);
        assert_eq!(data_structures.letter_grade, LetterGrade::BPlus);
        assert_eq!(data_structures.tone, GradeTone::Info);

        let physics = view.courses[3].stats.as_ref().unwrap();
        assert_eq!(physics.letter_grade, LetterGrade::CMinus);
        assert_eq!(physics.tone, GradeTone::Warning);
    }

    #[test]
    fn gpa_and_recent_grades_from_seed() {
        let view = build_grades(seed::courses().unwrap(), seed::assignments().unwrap());
        // B+ (3.3 x 4), B+ (3.3 x 3), B+ (3.3 x 2), C- (1.7 x 4) over 13 credits
        assert_eq!(view.gpa, 2.81);
        assert_eq!(view.recent_grades.len(), 7);
        assert_eq!(view.recent_grades[0].assignment_id, 3);
        assert_eq!(view.recent_grades[0].course.as_ref().unwrap().code, "CS 201");
        assert_eq!(view.recent_grades[0].percentage, 89.0);
    }

    #[test]
    fn course_without_grades_has_no_stats() {
        let mut courses = seed::courses().unwrap();
        courses.push(Course {
            id: 9,
            name: "Seminar".to_string(),
            code: "SEM 100".to_string(),
            credits: 1,
            professor: String::new(),
            color: "#000000".to_string(),
            semester: "Fall 2024".to_string(),
            is_active: true,
        });
        let view = build_grades(courses, seed::assignments().unwrap());
        let seminar = view.courses.iter().find(|row| row.course.id == 9).unwrap();
        assert!(seminar.stats.is_none());
        assert_eq!(view.gpa, 2.81);
    }

    #[test]
    fn calendar_defaults_to_requested_month_and_first_day() {
        let now = Utc.with_ymd_and_hms(2024, 10, 20, 12, 0, 0).unwrap();
        let query = CalendarQuery {
            year: Some(2024),
            month: Some(11),
            ..Default::default()
        };
        let view = build_calendar(
            &query,
            WeekStart::Sunday,
            &now,
            &seed::courses().unwrap(),
            &seed::assignments().unwrap(),
        )
        .unwrap();
        assert_eq!(view.selected_date, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
        assert!(view.selected.is_empty());
        assert_eq!(view.previous, YearMonth { year: 2024, month: 10 });
        let grid = view.grid.unwrap();
        assert_eq!(grid.cells().map(|c| c.count()).sum::<usize>(), 4);
    }

    #[test]
    fn calendar_selected_day_lists_its_assignments() {
        let now = Utc.with_ymd_and_hms(2024, 11, 12, 8, 0, 0).unwrap();
        let view = build_calendar(
            &CalendarQuery::default(),
            WeekStart::Monday,
            &now,
            &seed::courses().unwrap(),
            &seed::assignments().unwrap(),
        )
        .unwrap();
        assert_eq!(view.selected.len(), 1);
        assert_eq!(view.selected[0].assignment.id, 9);
        assert_eq!(view.selected[0].due_state, Some(DueState::DueToday));
    }

    #[test]
    fn calendar_list_mode_skips_grid() {
        let now = Utc.with_ymd_and_hms(2024, 11, 12, 8, 0, 0).unwrap();
        let query = CalendarQuery {
            mode: CalendarMode::List,
            ..Default::default()
        };
        let view = build_calendar(&query, WeekStart::Sunday, &now, &[], &seed::assignments().unwrap())
            .unwrap();
        assert!(view.grid.is_none());
        assert_eq!(view.list.unwrap().len(), 4);
    }

    #[test]
    fn calendar_rejects_impossible_days() {
        let query = CalendarQuery {
            year: Some(2024),
            month: Some(2),
            day: Some(30),
            ..Default::default()
        };
        let err = build_calendar(&query, WeekStart::Sunday, &Utc::now(), &[], &[]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn dashboard_joins_sessions_to_courses() {
        let view = dashboard(&services(), &Local::now()).await.unwrap();
        assert_eq!(view.courses.len(), 4);
        assert_eq!(view.recent_sessions.len(), 3);
        let latest = &view.recent_sessions[0];
        assert_eq!(latest.session.id, 7);
        assert_eq!(latest.course.as_ref().unwrap().code, "PHYS 152");
        assert_eq!(latest.assignment_title.as_deref(), Some("Circuits Homework"));
        assert_eq!(view.study_stats.total_minutes, 550);
    }

    #[tokio::test]
    async fn dashboard_names_courses_that_were_archived() {
        let services = services();
        let archive = UpdateCourseRequest {
            is_active: Some(false),
            ..Default::default()
        };
        services.courses.update(4, archive).await.unwrap();

        let view = dashboard(&services, &Local::now()).await.unwrap();
        assert_eq!(view.courses.len(), 3);
        let latest = &view.recent_sessions[0];
        assert_eq!(latest.session.course_id, 4);
        assert_eq!(latest.course.as_ref().unwrap().code, "PHYS 152");
        assert!(view.upcoming_assignments.iter().all(|row| row.course.is_some()));

        let mut timer = StudyTimer::new();
        let timer_view = timer_page(&services, &mut timer).await.unwrap();
        assert_eq!(timer_view.courses.len(), 3);
        assert!(timer_view.recent_sessions.iter().all(|row| row.course.is_some()));
    }

    #[tokio::test]
    async fn assignments_page_filters_and_joins() {
        let filter: AssignmentFilter = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        let view = assignments_page(&services(), &filter, &Utc::now()).await.unwrap();
        assert_eq!(view.total, 12);
        assert_eq!(view.courses.len(), 4);
        let ids: Vec<i64> = view.assignments.iter().map(|row| row.assignment.id).collect();
        assert_eq!(ids, vec![7, 9, 12]);
        assert!(view.assignments.iter().all(|row| row.course.is_some()));
    }

    #[tokio::test]
    async fn students_page_keeps_options_from_full_set() {
        let filter: StudentFilter = serde_json::from_str(r#"{"status":"suspended"}"#).unwrap();
        let view = students_page(&services(), &filter).await.unwrap();
        assert_eq!(view.students.len(), 1);
        assert_eq!(view.total, 6);
        assert_eq!(view.grade_options.len(), 4);
    }

    #[tokio::test]
    async fn timer_page_selects_first_course_and_open_assignment() {
        let mut timer = StudyTimer::new();
        let view = timer_page(&services(), &mut timer).await.unwrap();
        assert_eq!(view.timer.course_id, Some(1));
        assert_eq!(view.timer.assignment_id, Some(4));
        assert_eq!(view.assignments.iter().map(|a| a.id).collect::<Vec<_>>(), vec![4]);
        assert_eq!(view.recent_sessions.len(), 5);
    }

    #[tokio::test]
    async fn courses_page_counts_active_credits() {
        let view = courses_page(&services()).await.unwrap();
        assert_eq!(view.courses.len(), 5);
        assert_eq!(view.active_count, 4);
        assert_eq!(view.active_credits, 13);
    }
}
