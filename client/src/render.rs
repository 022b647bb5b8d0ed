//! Plain-text rendering of tables.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use rollbook::attendance::{AttendanceRecord, AttendanceSummary, MonthHalves, ReportingWindow};
use rollbook::marks::{DisplayMark, ExamType, Grade, Mark};
use rollbook::sheet::AttendanceSheet;
use rollbook::student::Student;
use rollbook::subject::Subject;

const PRESENT: char = '●';
const ABSENT: char = '·';

/// Starts a spinner on stderr while something loads.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style.tick_chars("🕛🕐🕑🕒🕓🕔🕕🕖🕗🕘🕙🕚✅"));
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn students(students: &[Student]) -> String {
    let mut lines = vec![format!(
        "{:<24} {:<14} {:<6} {:<8} {:<8} {:<14}",
        "ID", "Roll Number", "Year", "Branch", "Gender", "Phone"
    )];

    lines.extend(students.iter().map(|student| {
        format!(
            "{:<24} {:<14} {:<6} {:<8} {:<8} {:<14}",
            student.id.as_str(),
            student.roll_number.as_str(),
            student.year_of_study.get(),
            student.branch_code,
            student.gender.map(|g| g.as_str()).unwrap_or("-"),
            student.phone_number.as_deref().unwrap_or("-"),
        )
    }));

    join_lines(lines)
}

/// Renders a sheet with one column per period.
pub fn sheet(sheet: &AttendanceSheet) -> String {
    let mut lines = vec![format!(
        "Year {} on {} ({})",
        sheet.year(),
        sheet.date(),
        sheet.window().label()
    )];

    if sheet.is_empty() {
        lines.push("No students in this year.".to_owned());
        return join_lines(lines);
    }

    let header: String = (1..=rollbook::attendance::TOTAL_PERIODS)
        .map(|period| format!(" P{}", period))
        .collect();
    lines.push(format!("{:<14}{}  {:<8} Status", "Roll Number", header));

    for (student, row) in sheet.entries() {
        let cells: String = row
            .periods()
            .iter()
            .map(|present| format!("  {}", if *present { PRESENT } else { ABSENT }))
            .collect();

        lines.push(format!(
            "{:<14}{}  {:<8} {}",
            student.roll_number.as_str(),
            cells,
            format!("{}/{}", row.periods_present(), row.periods().len()),
            row.status()
        ));
    }

    lines.push(format!(
        "Present: {}  Absent: {}",
        sheet.present_count(),
        sheet.absent_count()
    ));

    join_lines(lines)
}

/// Renders the month of a student, split into reporting windows.
pub fn month_report(records: &[AttendanceRecord]) -> String {
    let summary = AttendanceSummary::from_records(records);
    let mut lines = vec![format!(
        "Attendance: {}% ({} of {} days, {} absent)",
        summary.percentage, summary.present_days, summary.total_days, summary.absent_days
    )];

    let halves = MonthHalves::split(records);
    for window in [ReportingWindow::FirstHalf, ReportingWindow::SecondHalf] {
        lines.push(String::new());
        lines.push(window.label().to_owned());

        let days = halves.window(window);
        if days.is_empty() {
            lines.push("  No records.".to_owned());
            continue;
        }

        lines.extend(days.iter().map(|record| {
            format!(
                "  {}  {}/{}  {}",
                record.date, record.periods_present, record.total_periods, record.status
            )
        }));
    }

    join_lines(lines)
}

pub fn subjects(subjects: &[Subject]) -> String {
    let mut lines = vec![format!(
        "{:<10} {:<32} {:<4} {:<8} {}",
        "Code", "Name", "Sem", "Type", "Marks"
    )];

    lines.extend(subjects.iter().map(|subject| {
        format!(
            "{:<10} {:<32} {:<4} {:<8} {}",
            subject.code,
            subject.name,
            subject.semester,
            subject.subject_type,
            subject
                .marks
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_owned()),
        )
    }));

    join_lines(lines)
}

/// Renders the lines of the faculty marks table.
pub fn marks(lines: &[DisplayMark]) -> String {
    let mut out = vec![format!(
        "{:<24} {:<14} {:<40} {:<22} {:>12} {:>7}",
        "ID", "Roll Number", "Subject", "Exam", "Marks", "%"
    )];

    for line in lines {
        let mark = &line.mark;
        let id = if line.is_deletable() {
            mark.id.as_str()
        } else {
            "-"
        };

        out.push(format!(
            "{:<24} {:<14} {:<40} {:<22} {:>12} {:>6.1}%",
            id,
            mark.student_roll.as_deref().unwrap_or("-"),
            subject_label(mark),
            if line.combined {
                "Combined"
            } else {
                mark.exam_type.label()
            },
            format!("{}/{}", mark.marks_obtained, mark.total_marks),
            mark.percentage(),
        ));
    }

    join_lines(out)
}

/// Renders the marks of a student grouped by exam type.
pub fn exam_groups(groups: &[(ExamType, Vec<&Mark>)]) -> String {
    let mut lines = Vec::new();

    for (exam_type, marks) in groups {
        lines.push(exam_type.to_string());
        lines.extend(marks.iter().map(|mark| {
            let percentage = mark.percentage();
            format!(
                "  {:<40} {:>12} {:>6.1}%  {}",
                subject_label(mark),
                format!("{}/{}", mark.marks_obtained, mark.total_marks),
                percentage,
                grade_label(Grade::of(percentage.round() as u32)),
            )
        }));
    }

    join_lines(lines)
}

pub fn grade_label(grade: Grade) -> &'static str {
    match grade {
        Grade::Good => "🟢",
        Grade::Fair => "🟡",
        Grade::Poor => "🔴",
    }
}

/// Joins lines, ending each with a newline.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn subject_label(mark: &Mark) -> String {
    match (&mark.subject_code, &mark.subject_name) {
        (Some(code), Some(name)) => format!("{} {}", code, name),
        (None, Some(name)) => name.clone(),
        (Some(code), None) => code.clone(),
        (None, None) => mark.subject_id.to_string(),
    }
}
