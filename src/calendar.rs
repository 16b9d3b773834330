//! Month grid construction and bucketing of assignments by local due date.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::Assignment;

/// Indicators shown in a grid cell before the rest collapse into an overflow count.
pub const CELL_INDICATORS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Days between `date` and the first day of its week.
    fn offset(self, date: NaiveDate) -> u64 {
        let weekday = date.weekday();
        u64::from(match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        })
    }
}

impl FromStr for WeekStart {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" => Ok(WeekStart::Sunday),
            "monday" => Ok(WeekStart::Monday),
            other => Err(AppError::Config(format!(
                "unsupported week start '{}', expected sunday or monday",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::BadRequest(format!("Invalid month {}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    fn first_day(self) -> Result<NaiveDate, AppError> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid month {}-{}", self.year, self.month)))
    }

    fn last_day(self) -> Result<NaiveDate, AppError> {
        self.next()
            .first_day()?
            .pred_opt()
            .ok_or(AppError::InternalServerError)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub indicators: Vec<Assignment>,
    pub overflow: usize,
}

impl CalendarCell {
    pub fn count(&self) -> usize {
        self.indicators.len() + self.overflow
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub month: YearMonth,
    pub previous: YearMonth,
    pub next: YearMonth,
    pub week_start: WeekStart,
    pub weeks: Vec<Vec<CalendarCell>>,
}

impl MonthGrid {
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells().find(|cell| cell.date == date)
    }
}

/// Calendar day of `due` as seen in `tz`.
pub fn local_date<Tz: TimeZone>(due: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    due.with_timezone(tz).date_naive()
}

fn by_due_date<'a>(assignments: impl Iterator<Item = &'a Assignment>) -> Vec<Assignment> {
    let mut list: Vec<Assignment> = assignments.cloned().collect();
    list.sort_by_key(|a| a.due_date);
    list
}

/// Every day from the start of the week holding the 1st to the end of
/// the week holding the last day, seven cells per row.
pub fn month_grid<Tz: TimeZone>(
    month: YearMonth,
    week_start: WeekStart,
    tz: &Tz,
    today: NaiveDate,
    assignments: &[Assignment],
) -> Result<MonthGrid, AppError> {
    let first = month.first_day()?;
    let last = month.last_day()?;
    let grid_start = first
        .checked_sub_days(Days::new(week_start.offset(first)))
        .ok_or(AppError::InternalServerError)?;
    let grid_end = last
        .checked_add_days(Days::new(6 - week_start.offset(last)))
        .ok_or(AppError::InternalServerError)?;

    let mut buckets: HashMap<NaiveDate, Vec<&Assignment>> = HashMap::new();
    for assignment in assignments {
        let day = local_date(assignment.due_date, tz);
        if day >= grid_start && day <= grid_end {
            buckets.entry(day).or_default().push(assignment);
        }
    }

    let cells: Vec<CalendarCell> = grid_start
        .iter_days()
        .take_while(|date| *date <= grid_end)
        .map(|date| {
            let mut due = by_due_date(buckets.remove(&date).unwrap_or_default().into_iter());
            let overflow = due.len().saturating_sub(CELL_INDICATORS);
            due.truncate(CELL_INDICATORS);
            CalendarCell {
                date,
                in_month: month.contains(date),
                is_today: date == today,
                indicators: due,
                overflow,
            }
        })
        .collect();

    Ok(MonthGrid {
        month,
        previous: month.previous(),
        next: month.next(),
        week_start,
        weeks: cells.chunks(7).map(|week| week.to_vec()).collect(),
    })
}

/// Assignments due on `day` in `tz`, earliest first.
pub fn assignments_on<Tz: TimeZone>(
    day: NaiveDate,
    tz: &Tz,
    assignments: &[Assignment],
) -> Vec<Assignment> {
    by_due_date(
        assignments
            .iter()
            .filter(|a| local_date(a.due_date, tz) == day),
    )
}

/// List mode: everything due within the month, earliest first.
pub fn assignments_in_month<Tz: TimeZone>(
    month: YearMonth,
    tz: &Tz,
    assignments: &[Assignment],
) -> Vec<Assignment> {
    by_due_date(
        assignments
            .iter()
            .filter(|a| month.contains(local_date(a.due_date, tz))),
    )
}
