//! Faculty attendance sheets.
//!
//! A sheet is the editable state behind marking a day's attendance: one
//! row of period toggles per student on the visible roster. Rows are
//! independent of each other and only the toggles are stored. Day
//! statuses are derived whenever they are asked for.
//!
//! Saving a sheet always produces one record per visible student, so the
//! backend replaces the whole day instead of applying a diff.


use chrono::{Datelike, Duration, NaiveDate};

use crate::api::v1::attendance::SaveAttendanceRequest;
use crate::attendance::{AttendanceRecord, DayStatus, ReportingWindow, TOTAL_PERIODS};
use crate::error::{RollbookError, RollbookResult};
use crate::id::RecordId;
use crate::student::{sort_by_roll_number, RollNumber, Student, YearOfStudy};

/// The period toggles of one student for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodRow([bool; TOTAL_PERIODS as usize]);

/// The attendance sheet of a year on a day.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    date: NaiveDate,
    year: YearOfStudy,

    /// Students of `year`, sorted by roll number.
    roster: Vec<Student>,

    /// Toggles, in the same order as `roster`.
    rows: Vec<PeriodRow>,
}

impl PeriodRow {
    /// Returns a row with the first `count` periods marked present.
    pub fn with_present(count: u8) -> Self {
        let mut row = Self::default();
        for period in row.0.iter_mut().take(count as usize) {
            *period = true;
        }
        row
    }

    pub fn all(present: bool) -> Self {
        Self([present; TOTAL_PERIODS as usize])
    }

    /// Flips one period (1-based) and returns its new value.
    pub fn toggle(&mut self, period: u8) -> RollbookResult<bool> {
        let cell = &mut self.0[period_index(period)?];
        *cell = !*cell;
        Ok(*cell)
    }

    pub fn periods(&self) -> &[bool] {
        &self.0
    }

    pub fn periods_present(&self) -> u8 {
        self.0.iter().filter(|p| **p).count() as u8
    }

    pub fn status(&self) -> DayStatus {
        DayStatus::from_periods(self.periods_present())
    }
}

impl AttendanceSheet {
    /// Builds the sheet for a year on a day.
    ///
    /// Students outside `year` are left off the roster, and records of
    /// students not on the roster are ignored. Students without a record
    /// start out absent for every period.
    pub fn new(
        year: YearOfStudy,
        date: NaiveDate,
        today: NaiveDate,
        students: Vec<Student>,
        existing: &[AttendanceRecord],
    ) -> RollbookResult<Self> {
        ensure_not_future(date, today)?;

        let mut roster: Vec<Student> = students
            .into_iter()
            .filter(|s| s.year_of_study == year)
            .collect();
        sort_by_roll_number(&mut roster);

        let rows = roster
            .iter()
            .map(|student| {
                existing
                    .iter()
                    .rev()
                    .find(|r| r.student_id == student.id && r.date == date)
                    .map(|r| PeriodRow::with_present(r.clamped_periods()))
                    .unwrap_or_default()
            })
            .collect();

        Ok(Self {
            date,
            year,
            roster,
            rows,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> YearOfStudy {
        self.year
    }

    pub fn window(&self) -> ReportingWindow {
        ReportingWindow::for_date(self.date)
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Returns the students with their rows, in roster order.
    pub fn entries(&self) -> impl Iterator<Item = (&Student, &PeriodRow)> {
        self.roster.iter().zip(self.rows.iter())
    }

    pub fn row(&self, student: &RecordId) -> Option<&PeriodRow> {
        self.position(student).map(|i| &self.rows[i])
    }

    pub fn status_of(&self, student: &RecordId) -> Option<DayStatus> {
        self.row(student).map(PeriodRow::status)
    }

    /// Looks up a student on the roster by roll number.
    pub fn find_by_roll_number(&self, roll_number: &RollNumber) -> Option<&Student> {
        self.roster.iter().find(|s| &s.roll_number == roll_number)
    }

    /// Flips one period of one student and returns its new value.
    pub fn toggle(&mut self, student: &RecordId, period: u8) -> RollbookResult<bool> {
        self.row_mut(student)?.toggle(period)
    }

    /// Replaces a student's row with the first `count` periods present.
    pub fn set_periods_present(&mut self, student: &RecordId, count: u8) -> RollbookResult<()> {
        if count > TOTAL_PERIODS {
            return Err(RollbookError::TooManyPeriods {
                count,
                total: TOTAL_PERIODS,
            });
        }

        *self.row_mut(student)? = PeriodRow::with_present(count);
        Ok(())
    }

    /// Marks every period of every visible student present.
    pub fn mark_all_present(&mut self) {
        self.fill(true);
    }

    /// Marks every period of every visible student absent.
    pub fn mark_all_absent(&mut self) {
        self.fill(false);
    }

    /// Returns the number of visible students not absent for the day.
    pub fn present_count(&self) -> usize {
        self.rows.iter().filter(|r| r.status().is_present()).count()
    }

    pub fn absent_count(&self) -> usize {
        self.rows.len() - self.present_count()
    }

    /// Collapses every row into a record for the day.
    pub fn to_records(&self, marked_by: &RecordId) -> Vec<AttendanceRecord> {
        self.entries()
            .map(|(student, row)| AttendanceRecord {
                id: None,
                student_id: student.id.clone(),
                date: self.date,
                month: self.date.month(),
                year: self.date.year(),
                periods_present: row.periods_present(),
                total_periods: TOTAL_PERIODS,
                status: row.status(),
                marked_by: Some(marked_by.clone()),
            })
            .collect()
    }

    /// Builds the batch that replaces the day's attendance.
    pub fn to_request(&self, marked_by: &RecordId) -> SaveAttendanceRequest {
        SaveAttendanceRequest {
            records: self.to_records(marked_by),
            date: self.date,
        }
    }

    fn fill(&mut self, present: bool) {
        for row in self.rows.iter_mut() {
            *row = PeriodRow::all(present);
        }
    }

    fn position(&self, student: &RecordId) -> Option<usize> {
        self.roster.iter().position(|s| &s.id == student)
    }

    fn row_mut(&mut self, student: &RecordId) -> RollbookResult<&mut PeriodRow> {
        let index = self
            .position(student)
            .ok_or_else(|| RollbookError::NotOnRoster {
                student: student.to_string(),
            })?;
        Ok(&mut self.rows[index])
    }
}

/// Returns the day before.
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date - Duration::days(1)
}

/// Returns the day after, unless that would be after today.
pub fn next_day(date: NaiveDate, today: NaiveDate) -> RollbookResult<NaiveDate> {
    let next = date + Duration::days(1);
    ensure_not_future(next, today)?;
    Ok(next)
}

fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> RollbookResult<()> {
    if date > today {
        Err(RollbookError::FutureDate { date, today })
    } else {
        Ok(())
    }
}

fn period_index(period: u8) -> RollbookResult<usize> {
    if (1..=TOTAL_PERIODS).contains(&period) {
        Ok((period - 1) as usize)
    } else {
        Err(RollbookError::InvalidPeriod {
            period,
            total: TOTAL_PERIODS,
        })
    }
}
