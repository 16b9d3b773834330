//! Grade aggregation: per-course percentages, letter grades and the
//! credit-weighted GPA.
//!
//! Percentages are never clamped here. A grade above `maxPoints` yields a
//! percentage over 100 and an "A+"; only the progress ring clamps.

use serde::{Serialize, Serializer};

use crate::models::{Assignment, Course};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterGrade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

/// Lower bounds, inclusive, highest first.
const SCALE: [(f64, LetterGrade); 12] = [
    (97.0, LetterGrade::APlus),
    (93.0, LetterGrade::A),
    (90.0, LetterGrade::AMinus),
    (87.0, LetterGrade::BPlus),
    (83.0, LetterGrade::B),
    (80.0, LetterGrade::BMinus),
    (77.0, LetterGrade::CPlus),
    (73.0, LetterGrade::C),
    (70.0, LetterGrade::CMinus),
    (67.0, LetterGrade::DPlus),
    (63.0, LetterGrade::D),
    (60.0, LetterGrade::DMinus),
];

impl LetterGrade {
    pub fn from_percentage(percentage: f64) -> Self {
        SCALE
            .iter()
            .find(|(floor, _)| percentage >= *floor)
            .map(|(_, letter)| *letter)
            .unwrap_or(LetterGrade::F)
    }

    /// Points on the 4.0 scale.
    pub fn points(self) -> f64 {
        match self {
            LetterGrade::APlus | LetterGrade::A => 4.0,
            LetterGrade::AMinus => 3.7,
            LetterGrade::BPlus => 3.3,
            LetterGrade::B => 3.0,
            LetterGrade::BMinus => 2.7,
            LetterGrade::CPlus => 2.3,
            LetterGrade::C => 2.0,
            LetterGrade::CMinus => 1.7,
            LetterGrade::DPlus => 1.3,
            LetterGrade::D => 1.0,
            LetterGrade::DMinus => 0.7,
            LetterGrade::F => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::DMinus => "D-",
            LetterGrade::F => "F",
        }
    }
}

impl Serialize for LetterGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Display tone for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeTone {
    Success,
    Info,
    Warning,
    Danger,
}

impl GradeTone {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            GradeTone::Success
        } else if percentage >= 80.0 {
            GradeTone::Info
        } else if percentage >= 70.0 {
            GradeTone::Warning
        } else {
            GradeTone::Danger
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseGradeStats {
    pub course_id: i64,
    pub total_assignments: usize,
    pub total_points: f64,
    pub earned_points: f64,
    /// Unrounded, unclamped.
    pub percentage: f64,
    pub letter_grade: LetterGrade,
}

impl CourseGradeStats {
    pub fn grade_points(&self) -> f64 {
        self.letter_grade.points()
    }

    /// Value for the progress ring, capped at 100.
    pub fn ring_progress(&self) -> f64 {
        self.percentage.min(100.0)
    }

    /// Tone of the percentage as displayed, rounded to one decimal.
    pub fn tone(&self) -> GradeTone {
        GradeTone::from_percentage(round_to(self.percentage, 1))
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Aggregates the graded assignments of one course; `None` when nothing
/// in the course has been graded yet.
pub fn course_stats(course_id: i64, assignments: &[Assignment]) -> Option<CourseGradeStats> {
    let graded: Vec<(f64, f64)> = assignments
        .iter()
        .filter(|a| a.course_id == course_id)
        .filter_map(|a| a.grade.map(|grade| (grade, a.max_points)))
        .collect();
    if graded.is_empty() {
        return None;
    }

    let total_points: f64 = graded.iter().map(|(_, max)| max).sum();
    let earned_points: f64 = graded.iter().map(|(grade, _)| grade).sum();
    let percentage = if total_points > 0.0 {
        earned_points / total_points * 100.0
    } else {
        0.0
    };

    Some(CourseGradeStats {
        course_id,
        total_assignments: graded.len(),
        total_points,
        earned_points,
        percentage,
        letter_grade: LetterGrade::from_percentage(percentage),
    })
}

/// Credit-weighted mean of grade points over courses that have stats.
pub fn overall_gpa(courses: &[Course], assignments: &[Assignment]) -> f64 {
    let (weighted, credits) = courses
        .iter()
        .filter_map(|course| {
            course_stats(course.id, assignments)
                .map(|stats| (stats.grade_points(), f64::from(course.credits)))
        })
        .fold((0.0, 0.0), |(weighted, credits), (points, course_credits)| {
            (weighted + points * course_credits, credits + course_credits)
        });

    if credits > 0.0 { weighted / credits } else { 0.0 }
}

/// Mean of per-assignment percentages over graded assignments.
pub fn average_grade(assignments: &[Assignment]) -> f64 {
    let percentages: Vec<f64> = assignments.iter().filter_map(Assignment::percentage).collect();
    if percentages.is_empty() {
        return 0.0;
    }
    percentages.iter().sum::<f64>() / percentages.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, Priority};
    use chrono::{TimeZone, Utc};

    fn course(id: i64, credits: u32) -> Course {
        Course {
            id,
            name: format!("Course {}", id),
            code: format!("C{}", id),
            credits,
            professor: "Staff".to_string(),
            color: "#000000".to_string(),
            semester: "Fall 2024".to_string(),
            is_active: true,
        }
    }

    fn graded(id: i64, course_id: i64, grade: Option<f64>, max_points: f64) -> Assignment {
        Assignment {
            id,
            course_id,
            title: format!("Assignment {}", id),
            description: String::new(),
            due_date: Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap(),
            priority: Priority::Medium,
            status: AssignmentStatus::Completed,
            grade,
            max_points,
            category: String::new(),
        }
    }

    #[test]
    fn letter_bounds_are_closed_below() {
        assert_eq!(LetterGrade::from_percentage(92.999), LetterGrade::AMinus);
        assert_eq!(LetterGrade::from_percentage(93.0), LetterGrade::A);
        assert_eq!(LetterGrade::from_percentage(97.0), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_percentage(60.0), LetterGrade::DMinus);
        assert_eq!(LetterGrade::from_percentage(59.99), LetterGrade::F);
        assert_eq!(LetterGrade::from_percentage(0.0), LetterGrade::F);
    }

    #[test]
    fn letters_map_to_points() {
        assert_eq!(LetterGrade::APlus.points(), 4.0);
        assert_eq!(LetterGrade::B.points(), 3.0);
        assert_eq!(LetterGrade::DMinus.points(), 0.7);
        assert_eq!(LetterGrade::F.points(), 0.0);
    }

    #[test]
    fn letter_serializes_as_display_text() {
        assert_eq!(serde_json::to_string(&LetterGrade::BMinus).unwrap(), "\"B-\"");
    }

    #[test]
    fn ungraded_course_has_no_stats() {
        let assignments = vec![graded(1, 1, None, 100.0), graded(2, 2, Some(90.0), 100.0)];
        assert!(course_stats(1, &assignments).is_none());
        assert!(course_stats(3, &assignments).is_none());
    }

    #[test]
    fn course_stats_sum_points() {
        let assignments = vec![
            graded(1, 1, Some(45.0), 50.0),
            graded(2, 1, Some(80.0), 100.0),
            graded(3, 1, None, 100.0),
        ];
        let stats = course_stats(1, &assignments).unwrap();
        assert_eq!(stats.total_assignments, 2);
        assert_eq!(stats.total_points, 150.0);
        assert_eq!(stats.earned_points, 125.0);
        assert_eq!(round_to(stats.percentage, 1), 83.3);
        assert_eq!(stats.letter_grade, LetterGrade::B);
    }

    #[test]
    fn zero_max_points_yields_zero_percent() {
        let stats = course_stats(1, &[graded(1, 1, Some(5.0), 0.0)]).unwrap();
        assert_eq!(stats.percentage, 0.0);
        assert_eq!(stats.letter_grade, LetterGrade::F);
    }

    #[test]
    fn extra_credit_is_not_clamped_except_for_the_ring() {
        let stats = course_stats(1, &[graded(1, 1, Some(110.0), 100.0)]).unwrap();
        assert!(stats.percentage > 100.0);
        assert_eq!(stats.letter_grade, LetterGrade::APlus);
        assert_eq!(stats.ring_progress(), 100.0);
    }

    #[test]
    fn gpa_is_credit_weighted() {
        let courses = vec![course(1, 4), course(2, 2), course(3, 3)];
        let assignments = vec![
            graded(1, 1, Some(95.0), 100.0), // A, 4.0
            graded(2, 2, Some(85.0), 100.0), // B, 3.0
            graded(3, 3, None, 100.0),       // no stats
        ];
        let gpa = overall_gpa(&courses, &assignments);
        let expected = (4.0 * 4.0 + 3.0 * 2.0) / 6.0;
        assert!((gpa - expected).abs() < 1e-9);
    }

    #[test]
    fn gpa_without_grades_is_zero() {
        let courses = vec![course(1, 3)];
        assert_eq!(overall_gpa(&courses, &[]), 0.0);
        assert_eq!(overall_gpa(&[], &[]), 0.0);
    }

    #[test]
    fn zero_credit_courses_do_not_divide_by_zero() {
        let courses = vec![course(1, 0)];
        let assignments = vec![graded(1, 1, Some(90.0), 100.0)];
        assert_eq!(overall_gpa(&courses, &assignments), 0.0);
    }

    #[test]
    fn average_grade_uses_each_assignment_percentage() {
        let assignments = vec![graded(1, 1, Some(10.0), 20.0), graded(2, 1, Some(100.0), 100.0)];
        assert_eq!(average_grade(&assignments), 75.0);
        assert_eq!(average_grade(&[]), 0.0);
    }

    #[test]
    fn tone_matches_displayed_percentage_while_letter_does_not_round() {
        let stats = CourseGradeStats {
            course_id: 1,
            total_assignments: 1,
            total_points: 2500.0,
            earned_points: 2249.0,
            percentage: 89.96,
            letter_grade: LetterGrade::from_percentage(89.96),
        };
        assert_eq!(round_to(stats.percentage, 1), 90.0);
        assert_eq!(stats.tone(), GradeTone::Success);
        assert_eq!(stats.letter_grade, LetterGrade::BPlus);
    }

    #[test]
    fn tones_follow_ten_point_bands() {
        assert_eq!(GradeTone::from_percentage(90.0), GradeTone::Success);
        assert_eq!(GradeTone::from_percentage(85.0), GradeTone::Info);
        assert_eq!(GradeTone::from_percentage(70.0), GradeTone::Warning);
        assert_eq!(GradeTone::from_percentage(69.9), GradeTone::Danger);
    }
}
