//! Study stopwatch.
//!
//! [`Stopwatch`] is the plain state machine; [`StudyTimer`] drives it with a
//! one-second tokio interval that only exists while the stopwatch runs.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Assignment, NewStudySessionRequest, StudySession};
use crate::services::StudySessionService;

const TICK: Duration = Duration::from_secs(1);

/// `m:ss` below an hour, `h:mm:ss` from there on.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Keeps `current` when it is one of `open`, otherwise falls back to the
/// first open assignment of the course.
pub fn pick_assignment(course_id: i64, current: Option<i64>, open: &[Assignment]) -> Option<i64> {
    let mut of_course = open
        .iter()
        .filter(|a| a.course_id == course_id && !a.is_completed());
    let first = of_course.next().map(|a| a.id);
    match current {
        Some(id) if first == Some(id) || of_course.any(|a| a.id == id) => Some(id),
        _ => first,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    running: bool,
    elapsed: u64,
    course_id: Option<i64>,
    assignment_id: Option<i64>,
    notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub running: bool,
    pub elapsed: u64,
    pub display: String,
    pub course_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSelection {
    pub course_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub notes: Option<String>,
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn course_id(&self) -> Option<i64> {
        self.course_id
    }

    pub fn assignment_id(&self) -> Option<i64> {
        self.assignment_id
    }

    pub fn select(&mut self, course_id: Option<i64>, assignment_id: Option<i64>) {
        self.course_id = course_id;
        self.assignment_id = assignment_id;
    }

    pub fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    /// Restarts from zero.
    pub fn start(&mut self) -> Result<(), AppError> {
        if self.course_id.is_none() {
            return Err(AppError::validation("courseId", "Please select a course first"));
        }
        self.running = true;
        self.elapsed = 0;
        Ok(())
    }

    pub fn tick(&mut self) {
        if self.running {
            self.elapsed += 1;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Drops elapsed time and notes, keeps the selection.
    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed = 0;
        self.notes.clear();
    }

    /// Session to persist for the time recorded so far.
    pub fn session_request(&self) -> Result<NewStudySessionRequest, AppError> {
        let course_id = match self.course_id {
            Some(id) if self.elapsed > 0 => id,
            _ => {
                return Err(AppError::validation(
                    "elapsed",
                    "Please complete a study session first",
                ));
            }
        };
        Ok(NewStudySessionRequest {
            course_id,
            assignment_id: self.assignment_id,
            duration: u32::try_from(self.elapsed / 60).unwrap_or(u32::MAX),
            notes: self.notes.clone(),
        })
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            running: self.running,
            elapsed: self.elapsed,
            display: format_elapsed(self.elapsed),
            course_id: self.course_id,
            assignment_id: self.assignment_id,
            notes: self.notes.clone(),
        }
    }
}

/// Stopwatch plus the background task feeding it ticks.
#[derive(Default)]
pub struct StudyTimer {
    stopwatch: Arc<Mutex<Stopwatch>>,
    ticker: Option<JoinHandle<()>>,
}

impl StudyTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.stopwatch.lock().await.snapshot()
    }

    /// Applies a course, assignment or notes change. The assignment is
    /// re-picked from `assignments` so it always belongs to the course.
    pub async fn select(&mut self, selection: TimerSelection, assignments: &[Assignment]) -> TimerSnapshot {
        let mut stopwatch = self.stopwatch.lock().await;
        if let Some(course_id) = selection.course_id.or(stopwatch.course_id()) {
            let wanted = selection.assignment_id.or(stopwatch.assignment_id());
            stopwatch.select(Some(course_id), pick_assignment(course_id, wanted, assignments));
        }
        if let Some(notes) = selection.notes {
            stopwatch.set_notes(notes);
        }
        stopwatch.snapshot()
    }

    pub async fn start(&mut self) -> Result<TimerSnapshot, AppError> {
        self.stop_ticker();
        let snapshot = {
            let mut stopwatch = self.stopwatch.lock().await;
            stopwatch.start()?;
            stopwatch.snapshot()
        };

        let stopwatch = self.stopwatch.clone();
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        self.ticker = Some(tokio::spawn(async move {
            loop {
                interval.tick().await;
                stopwatch.lock().await.tick();
            }
        }));
        debug!("study timer started for course {:?}", snapshot.course_id);
        Ok(snapshot)
    }

    pub async fn pause(&mut self) -> TimerSnapshot {
        self.stop_ticker();
        let mut stopwatch = self.stopwatch.lock().await;
        stopwatch.pause();
        stopwatch.snapshot()
    }

    pub async fn reset(&mut self) -> TimerSnapshot {
        self.stop_ticker();
        let mut stopwatch = self.stopwatch.lock().await;
        stopwatch.reset();
        stopwatch.snapshot()
    }

    /// Persists the recorded time and resets. On failure the elapsed time
    /// is kept so the save can be retried.
    pub async fn save(&mut self, sessions: &dyn StudySessionService) -> Result<StudySession, AppError> {
        let req = self.stopwatch.lock().await.session_request()?;
        self.stop_ticker();
        self.stopwatch.lock().await.pause();

        let session = sessions.create(req).await?;
        self.stopwatch.lock().await.reset();
        info!(
            "saved {} minute study session {} from timer",
            session.duration, session.id
        );
        Ok(session)
    }

    fn stop_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
    }
}

impl Drop for StudyTimer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, Priority};
    use crate::seed;
    use crate::services::MockStudySessionService;
    use chrono::Utc;

    fn selected() -> Stopwatch {
        let mut stopwatch = Stopwatch::default();
        stopwatch.select(Some(2), None);
        stopwatch
    }

    fn open(id: i64, course_id: i64, status: AssignmentStatus) -> Assignment {
        Assignment {
            id,
            course_id,
            title: String::new(),
            description: String::new(),
            due_date: Utc::now(),
            priority: Priority::Low,
            status,
            grade: None,
            max_points: 10.0,
            category: String::new(),
        }
    }

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(3599), "59:59");
        assert_eq!(format_elapsed(3600), "1:00:00");
        assert_eq!(format_elapsed(3725), "1:02:05");
    }

    #[test]
    fn start_requires_a_course() {
        let mut stopwatch = Stopwatch::default();
        assert!(matches!(stopwatch.start(), Err(AppError::Validation(_))));
        assert!(!stopwatch.is_running());
    }

    #[test]
    fn three_ticks_round_down_to_zero_minutes() {
        let mut stopwatch = selected();
        stopwatch.start().unwrap();
        (0..3).for_each(|_| stopwatch.tick());
        assert_eq!(stopwatch.elapsed(), 3);
        assert_eq!(stopwatch.session_request().unwrap().duration, 0);
    }

    #[test]
    fn hundred_twenty_five_ticks_are_two_minutes() {
        let mut stopwatch = selected();
        stopwatch.start().unwrap();
        (0..125).for_each(|_| stopwatch.tick());
        let req = stopwatch.session_request().unwrap();
        assert_eq!(req.duration, 2);
        assert_eq!(req.course_id, 2);
    }

    #[test]
    fn paused_stopwatch_ignores_ticks() {
        let mut stopwatch = selected();
        stopwatch.start().unwrap();
        stopwatch.tick();
        stopwatch.pause();
        stopwatch.tick();
        assert_eq!(stopwatch.elapsed(), 1);
    }

    #[test]
    fn start_zeroes_previous_elapsed() {
        let mut stopwatch = selected();
        stopwatch.start().unwrap();
        stopwatch.tick();
        stopwatch.pause();
        stopwatch.start().unwrap();
        assert_eq!(stopwatch.elapsed(), 0);
    }

    #[test]
    fn reset_clears_time_and_notes_but_not_selection() {
        let mut stopwatch = selected();
        stopwatch.set_notes("chapter 4".to_string());
        stopwatch.start().unwrap();
        stopwatch.tick();
        stopwatch.reset();
        let snapshot = stopwatch.snapshot();
        assert_eq!(snapshot.elapsed, 0);
        assert!(snapshot.notes.is_empty());
        assert_eq!(snapshot.course_id, Some(2));
    }

    #[test]
    fn nothing_to_save_without_elapsed_time() {
        assert!(matches!(selected().session_request(), Err(AppError::Validation(_))));
    }

    #[test]
    fn picks_first_open_assignment_of_course() {
        let assignments = vec![
            open(1, 1, AssignmentStatus::Pending),
            open(2, 2, AssignmentStatus::Completed),
            open(3, 2, AssignmentStatus::Pending),
            open(4, 2, AssignmentStatus::InProgress),
        ];
        assert_eq!(pick_assignment(2, Some(1), &assignments), Some(3));
        assert_eq!(pick_assignment(2, Some(4), &assignments), Some(4));
        assert_eq!(pick_assignment(2, None, &assignments), Some(3));
        assert_eq!(pick_assignment(3, Some(1), &assignments), None);
    }

    #[tokio::test(start_paused = true)]
    async fn background_ticks_follow_the_clock() {
        let sessions = MockStudySessionService::new(seed::study_sessions().unwrap());
        let mut timer = StudyTimer::new();
        timer
            .select(
                TimerSelection {
                    course_id: Some(4),
                    assignment_id: Some(11),
                    notes: Some("RC circuits".to_string()),
                },
                &seed::assignments().unwrap(),
            )
            .await;
        timer.start().await.unwrap();
        assert!(timer.is_ticking());

        tokio::time::sleep(Duration::from_millis(125_500)).await;
        let paused = timer.pause().await;
        assert_eq!(paused.elapsed, 125);
        assert!(!timer.is_ticking());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(timer.snapshot().await.elapsed, 125);

        let session = timer.save(&sessions).await.unwrap();
        assert_eq!(session.duration, 2);
        assert_eq!(session.assignment_id, Some(11));
        assert_eq!(session.notes, "RC circuits");

        let after = timer.snapshot().await;
        assert_eq!(after.elapsed, 0);
        assert!(after.notes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_the_ticker() {
        let mut timer = StudyTimer::new();
        timer
            .select(
                TimerSelection {
                    course_id: Some(1),
                    ..Default::default()
                },
                &[],
            )
            .await;
        timer.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        timer.reset().await;
        assert!(!timer.is_ticking());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.snapshot().await.elapsed, 0);
    }
}
