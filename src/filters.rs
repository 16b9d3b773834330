//! Filter and sort pipelines behind the assignment and student lists.
//! Always applied to the full set, never to a previous result.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Days, TimeZone, Utc};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Assignment, AssignmentStatus, Course, Priority, Student, StudentStatus};

/// Treats a missing, empty or `all` value as no filter.
fn all_or<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) if value.is_empty() || value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => T::deserialize(value.into_deserializer()).map(Some),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignmentSort {
    #[default]
    DueDate,
    Title,
    Course,
    Priority,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFilter {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "all_or")]
    pub status: Option<AssignmentStatus>,
    #[serde(default, deserialize_with = "all_or")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub sort: AssignmentSort,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "all_or")]
    pub status: Option<StudentStatus>,
    #[serde(default, deserialize_with = "all_or")]
    pub grade: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn filter_assignments(
    assignments: &[Assignment],
    courses: &[Course],
    filter: &AssignmentFilter,
) -> Vec<Assignment> {
    let course_names: HashMap<i64, &str> = courses.iter().map(|c| (c.id, c.name.as_str())).collect();
    let course_name = |a: &Assignment| course_names.get(&a.course_id).copied().unwrap_or("");
    let needle = filter.q.trim().to_lowercase();

    let mut matched: Vec<Assignment> = assignments
        .iter()
        .filter(|a| {
            needle.is_empty()
                || contains_ignore_case(&a.title, &needle)
                || contains_ignore_case(course_name(a), &needle)
        })
        .filter(|a| filter.status.is_none_or(|status| a.status == status))
        .filter(|a| filter.priority.is_none_or(|priority| a.priority == priority))
        .cloned()
        .collect();

    matched.sort_by(|a, b| match filter.sort {
        AssignmentSort::DueDate => a.due_date.cmp(&b.due_date),
        AssignmentSort::Title => compare_text(&a.title, &b.title),
        AssignmentSort::Course => compare_text(course_name(a), course_name(b)),
        AssignmentSort::Priority => b.priority.rank().cmp(&a.priority.rank()),
    });
    matched
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

pub fn filter_students(students: &[Student], filter: &StudentFilter) -> Vec<Student> {
    let needle = filter.q.trim().to_lowercase();
    students
        .iter()
        .filter(|s| {
            needle.is_empty()
                || contains_ignore_case(&s.first_name, &needle)
                || contains_ignore_case(&s.last_name, &needle)
                || contains_ignore_case(&s.email, &needle)
        })
        .filter(|s| filter.status.is_none_or(|status| s.status == status))
        .filter(|s| filter.grade.as_ref().is_none_or(|grade| &s.grade == grade))
        .cloned()
        .collect()
}

/// Distinct grade levels present, sorted.
pub fn grade_options(students: &[Student]) -> Vec<String> {
    students
        .iter()
        .map(|s| s.grade.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueState {
    Overdue,
    DueToday,
    DueTomorrow,
}

impl DueState {
    pub fn label(self) -> &'static str {
        match self {
            DueState::Overdue => "Overdue",
            DueState::DueToday => "Due today",
            DueState::DueTomorrow => "Due tomorrow",
        }
    }
}

/// Urgency of an open assignment relative to `now`, judged on calendar
/// days in `now`'s time zone. Completed work has none.
pub fn due_state<Tz: TimeZone>(assignment: &Assignment, now: &DateTime<Tz>) -> Option<DueState> {
    if assignment.is_completed() {
        return None;
    }
    if assignment.due_date < now.with_timezone(&Utc) {
        return Some(DueState::Overdue);
    }
    let today = now.date_naive();
    let due = assignment.due_date.with_timezone(&now.timezone()).date_naive();
    if due == today {
        Some(DueState::DueToday)
    } else if today.checked_add_days(Days::new(1)) == Some(due) {
        Some(DueState::DueTomorrow)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use chrono::FixedOffset;

    fn assignment_filter(query: &str) -> AssignmentFilter {
        serde_json::from_str(query).unwrap()
    }

    fn ids(assignments: &[Assignment]) -> Vec<i64> {
        assignments.iter().map(|a| a.id).collect()
    }

    #[test]
    fn completed_and_high_must_both_match() {
        let assignments = seed::assignments().unwrap();
        let courses = seed::courses().unwrap();
        let filter = assignment_filter(r#"{"status":"completed","priority":"high"}"#);
        let matched = filter_assignments(&assignments, &courses, &filter);
        assert_eq!(ids(&matched), vec![1, 2, 3]);
        assert!(
            matched
                .iter()
                .all(|a| a.status == AssignmentStatus::Completed && a.priority == Priority::High)
        );
    }

    #[test]
    fn all_means_unfiltered() {
        let assignments = seed::assignments().unwrap();
        let filter = assignment_filter(r#"{"status":"all","priority":"all","q":""}"#);
        assert!(filter.status.is_none());
        assert_eq!(filter_assignments(&assignments, &[], &filter).len(), assignments.len());
    }

    #[test]
    fn query_matches_title_or_course_name() {
        let assignments = seed::assignments().unwrap();
        let courses = seed::courses().unwrap();
        let by_course = filter_assignments(&assignments, &courses, &assignment_filter(r#"{"q":"PHYSICS"}"#));
        assert_eq!(ids(&by_course), vec![10, 11, 12]);
        let by_title = filter_assignments(&assignments, &courses, &assignment_filter(r#"{"q":"quiz"}"#));
        assert_eq!(ids(&by_title), vec![7]);
    }

    #[test]
    fn priority_sort_puts_high_first() {
        let assignments = seed::assignments().unwrap();
        let matched = filter_assignments(&assignments, &[], &assignment_filter(r#"{"sort":"priority"}"#));
        let ranks: Vec<u8> = matched.iter().map(|a| a.priority.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(matched[0].priority, Priority::High);
    }

    #[test]
    fn course_sort_orders_by_course_name() {
        let assignments = seed::assignments().unwrap();
        let courses = seed::courses().unwrap();
        let matched = filter_assignments(&assignments, &courses, &assignment_filter(r#"{"sort":"course"}"#));
        // Data Structures, General Physics II, Linear Algebra, Technical Writing
        let order: Vec<i64> = matched.iter().map(|a| a.course_id).collect();
        assert_eq!(order, vec![1, 1, 1, 1, 4, 4, 4, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn title_sort_is_case_insensitive() {
        let assignments = seed::assignments().unwrap();
        let matched = filter_assignments(&assignments, &[], &assignment_filter(r#"{"sort":"title"}"#));
        assert_eq!(matched.first().unwrap().title, "Binary Search Tree Lab");
        assert_eq!(matched.last().unwrap().title, "Problem Set 2");
    }

    #[test]
    fn default_sort_is_due_date() {
        let assignments = seed::assignments().unwrap();
        let matched = filter_assignments(&assignments, &[], &AssignmentFilter::default());
        assert!(matched.windows(2).all(|w| w[0].due_date <= w[1].due_date));
    }

    #[test]
    fn students_filter_on_name_email_status_and_grade() {
        let students = seed::students().unwrap();
        let by_email: StudentFilter = serde_json::from_str(r#"{"q":"CHEN@"}"#).unwrap();
        let matched = filter_students(&students, &by_email);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].first_name, "Liam");

        let eleventh_active: StudentFilter =
            serde_json::from_str(r#"{"status":"active","grade":"11"}"#).unwrap();
        let matched = filter_students(&students, &eleventh_active);
        assert_eq!(matched.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);

        let everyone: StudentFilter = serde_json::from_str(r#"{"grade":"all"}"#).unwrap();
        assert_eq!(filter_students(&students, &everyone).len(), students.len());
    }

    #[test]
    fn grade_options_are_sorted_and_distinct() {
        assert_eq!(grade_options(&seed::students().unwrap()), vec!["10", "11", "12", "9"]);
    }

    #[test]
    fn due_states_use_local_calendar_days() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let now = tz.with_ymd_and_hms(2024, 11, 7, 9, 0, 0).unwrap();
        let assignments = seed::assignments().unwrap();
        let by_id = |id: i64| assignments.iter().find(|a| a.id == id).unwrap();

        // Eigenvalues quiz, due 11-05 and still pending.
        assert_eq!(due_state(by_id(7), &now), Some(DueState::Overdue));
        // Circuits homework, due 11-08 23:59.
        assert_eq!(due_state(by_id(11), &now), Some(DueState::DueTomorrow));
        assert_eq!(due_state(by_id(9), &now), None);
        // Completed work is never flagged.
        assert_eq!(due_state(by_id(1), &now), None);

        let evening = tz.with_ymd_and_hms(2024, 11, 8, 18, 0, 0).unwrap();
        assert_eq!(due_state(by_id(11), &evening), Some(DueState::DueToday));
        assert_eq!(DueState::DueToday.label(), "Due today");
    }
}
