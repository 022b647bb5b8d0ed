use anyhow::Result;
use clap::Parser;

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::context::{own_student, Context};
use crate::render;
use rollbook::api::v1::attendance::AttendanceQuery;
use rollbook::api::v1::auth::{Role, User};
use rollbook::api::v1::marks::MarksQuery;
use rollbook::api::v1::stats::StatsQuery;
use rollbook::api::v1::students::StudentQuery;
use rollbook::attendance::AttendanceSummary;
use rollbook::marks::{average_percentage, Grade};
use rollbook::student::YearOfStudy;

/// How many students the faculty dashboard lists.
const RECENT_STUDENTS: usize = 5;

/// Show an overview for the signed-in user.
///
/// Faculty see the figures of a year of study. Students see
/// their own attendance and marks.
#[derive(Debug, Parser)]
pub struct Dashboard {
    /// The year of study to show, for faculty.
    #[clap(long, default_value = "1")]
    year: YearOfStudy,
}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_dashboard().unwrap();
    let ctx = Context::load()?;
    let api = ctx.api()?;

    let user = ctx.session.signed_in()?;

    match user.role {
        Role::Student => student_dashboard(&api, user).await,
        Role::Faculty | Role::Admin => faculty_dashboard(&api, user, sub.year).await,
    }
}

async fn faculty_dashboard(api: &ApiClient, user: &User, year: YearOfStudy) -> Result<()> {
    let stats_query = StatsQuery { year };
    let students_query = StudentQuery {
        year_of_study: Some(year),
        ..Default::default()
    };

    let spinner = render::spinner("Fetching overview");
    let fetched = futures::try_join!(
        api.get_stats(&stats_query),
        api.list_students(&students_query),
    );
    spinner.finish_and_clear();
    let (stats, mut students) = fetched?;
    students.truncate(RECENT_STUDENTS);

    println!("👋 Welcome, {}", user.full_name);
    println!();
    println!("Year {}", year);
    println!("      Total students: {}", stats.total_students);
    println!("    Attendance today: {}", stats.attendance_today);
    println!("  Average attendance: {}%", stats.avg_attendance);
    println!("      Total subjects: {}", stats.total_subjects);
    println!();

    if students.is_empty() {
        println!("No students in year {} yet.", year);
    } else {
        println!("Recent students");
        print!("{}", render::students(&students));
    }

    Ok(())
}

async fn student_dashboard(api: &ApiClient, user: &User) -> Result<()> {
    let spinner = render::spinner("Fetching overview");
    let fetched = async {
        let student = own_student(api, user).await?;

        let attendance_query = AttendanceQuery::of_student(student.id.clone());
        let marks_query = MarksQuery {
            student_id: Some(student.id.clone()),
            ..Default::default()
        };
        let (records, found, subjects) = futures::try_join!(
            api.list_attendance(&attendance_query),
            api.list_marks(&marks_query),
            api.list_subjects(),
        )?;

        Ok::<_, anyhow::Error>((student, records, found, subjects))
    }
    .await;
    spinner.finish_and_clear();
    let (student, records, found, subjects) = fetched?;

    let attendance = AttendanceSummary::from_records(&records);
    let average = average_percentage(&found);
    let subject_count = subjects
        .iter()
        .filter(|s| student.attends(s.semester))
        .count();

    println!("👋 Welcome, {}", user.full_name);
    println!();
    println!("         Roll number: {}", student.roll_number);
    println!("       Year of study: {}", student.year_of_study);
    println!(
        "          Attendance: {}% ({} of {} days) {}",
        attendance.percentage,
        attendance.present_days,
        attendance.total_days,
        render::grade_label(Grade::of(attendance.percentage))
    );
    println!("            Subjects: {}", subject_count);
    println!(
        "       Average marks: {}% {}",
        average,
        render::grade_label(Grade::of(average))
    );
    println!("         Exams taken: {}", found.len());

    Ok(())
}
