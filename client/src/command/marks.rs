use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::context::{own_student, Context};
use crate::render;
use rollbook::api::v1::auth::{Role, User};
use rollbook::api::v1::marks::MarksQuery;
use rollbook::api::v1::students::StudentQuery;
use rollbook::id::RecordId;
use rollbook::marks::{
    self, combine, filter_by_subject_type, group_by_exam_type, Grade, MarkForm, MarksView,
    SubjectFilter,
};
use rollbook::student::{RollNumber, Semester, Student};
use rollbook::subject::Subject;

/// Enter and review exam marks.
#[derive(Debug, Parser)]
pub struct Marks {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    List(List),
    Add(Add),
    Delete(Delete),
    Me(Me),
}

/// List the marks of a semester.
///
/// Unless a student is selected or only lab subjects are listed, the
/// marks of each theory subject are combined into one line per student.
///
/// You need a faculty account.
#[derive(Debug, Clone, Parser)]
struct List {
    #[clap(long, default_value = "1")]
    semester: Semester,

    /// One of all, theory and lab.
    #[clap(long = "type", default_value = "all")]
    subject_type: SubjectFilter,

    /// Only list the marks of the student with this roll number.
    #[clap(long)]
    student: Option<RollNumber>,
}

/// Enter the marks of a student.
///
/// Marks of theory subjects are entered as the internal unit test,
/// marks of lab subjects as the internal lab exam.
///
/// You need a faculty account.
#[derive(Debug, Clone, Parser)]
struct Add {
    #[clap(long)]
    semester: Semester,

    /// Roll number of the student.
    #[clap(long)]
    student: RollNumber,

    /// Code of the subject.
    #[clap(long)]
    subject: String,

    #[clap(long)]
    obtained: f64,

    #[clap(long, default_value = "100")]
    total: f64,

    /// Defaults to the current academic year.
    #[clap(long)]
    academic_year: Option<String>,
}

/// Delete a marks entry.
///
/// Combined lines have no ID and can't be deleted. Use
/// `--student` when listing to see the separate entries.
///
/// You need a faculty account.
#[derive(Debug, Clone, Parser)]
struct Delete {
    /// ID of the marks entry.
    id: RecordId,

    /// Don't ask for interactive confirmation.
    #[clap(long)]
    no_confirm: bool,
}

/// Show your own marks, grouped by exam.
///
/// You need a student account.
#[derive(Debug, Clone, Parser)]
struct Me {
    /// Defaults to the first semester of your year of study.
    #[clap(long)]
    semester: Option<Semester>,
}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_marks().unwrap();
    let ctx = Context::load()?;
    let api = ctx.api()?;

    match &sub.command {
        Command::List(sub) => {
            ctx.require(Role::Faculty)?;
            list_marks(&api, sub.to_owned()).await
        }
        Command::Add(sub) => {
            let user = ctx.require(Role::Faculty)?;
            add_marks(&api, user, sub.to_owned()).await
        }
        Command::Delete(sub) => {
            ctx.require(Role::Faculty)?;
            delete_marks(&api, sub.to_owned()).await
        }
        Command::Me(sub) => {
            let user = ctx.require(Role::Student)?;
            show_own(&api, user, sub.to_owned()).await
        }
    }
}

async fn list_marks(api: &ApiClient, sub: List) -> Result<()> {
    let spinner = render::spinner("Fetching marks");
    let fetched = fetch_semester(api, sub.semester, sub.student.as_ref()).await;
    spinner.finish_and_clear();
    let (students, subjects, selected, found) = fetched?;

    let found = fill_roll_numbers(found, &students);
    let found = filter_by_subject_type(found, &subjects, sub.subject_type);

    let view = MarksView {
        subject_type: sub.subject_type,
        student: selected,
    };
    let lines = combine(&found, &subjects, &view);

    if lines.is_empty() {
        eprintln!("No marks for semester {}.", sub.semester);
        return Ok(());
    }

    print!("{}", render::marks(&lines));

    Ok(())
}

/// Fetches everything the marks table of a semester needs.
async fn fetch_semester(
    api: &ApiClient,
    semester: Semester,
    student: Option<&RollNumber>,
) -> Result<(Vec<Student>, Vec<Subject>, Option<RecordId>, Vec<marks::Mark>)> {
    let everyone = StudentQuery::default();
    let (students, subjects) =
        futures::try_join!(api.list_students(&everyone), api.list_subjects())?;

    let selected = student
        .map(|roll_number| find_by_roll_number(&students, roll_number).map(|s| s.id.clone()))
        .transpose()?;

    let query = MarksQuery {
        semester: Some(semester),
        student_id: selected.clone(),
    };
    let found = api.list_marks(&query).await?;

    let subjects = subjects
        .into_iter()
        .filter(|s| s.semester == semester)
        .collect();

    Ok((students, subjects, selected, found))
}

async fn add_marks(api: &ApiClient, user: &User, sub: Add) -> Result<()> {
    let everyone = StudentQuery::default();
    let (students, subjects) =
        futures::try_join!(api.list_students(&everyone), api.list_subjects())?;

    let student = find_by_roll_number(&students, &sub.student)?;
    let subject = subjects
        .iter()
        .find(|s| s.code.eq_ignore_ascii_case(&sub.subject) && s.semester == sub.semester)
        .ok_or_else(|| {
            anyhow!(
                "Subject \"{}\" is not taught in semester {}",
                sub.subject,
                sub.semester
            )
        })?;

    let form = MarkForm {
        student_id: student.id.clone(),
        semester: sub.semester,
        marks_obtained: sub.obtained,
        total_marks: sub.total,
        academic_year: sub.academic_year,
    };
    let request = form.into_request(subject, &user.id)?;

    api.create_mark(&request).await?;
    eprintln!(
        "✨ Saved {}/{} in {} ({}) for \"{}\"",
        request.marks_obtained,
        request.total_marks,
        subject.name,
        request.exam_type,
        student.roll_number
    );

    Ok(())
}

async fn delete_marks(api: &ApiClient, sub: Delete) -> Result<()> {
    if !sub.no_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "⚠️ Are you sure you want to delete marks entry \"{}\"?",
                sub.id
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Err(anyhow!("Aborting..."));
        }
    }

    api.delete_mark(&sub.id).await?;
    eprintln!("🗑️ Deleted marks entry \"{}\"", sub.id);

    Ok(())
}

async fn show_own(api: &ApiClient, user: &User, sub: Me) -> Result<()> {
    let spinner = render::spinner("Fetching marks");
    let fetched = async {
        let student = own_student(api, user).await?;
        let semester = sub
            .semester
            .unwrap_or_else(|| student.year_of_study.first_semester());

        let query = MarksQuery {
            semester: Some(semester),
            student_id: Some(student.id.clone()),
        };
        let found = api.list_marks(&query).await?;

        Ok::<_, anyhow::Error>((student, semester, found))
    }
    .await;
    spinner.finish_and_clear();
    let (student, semester, found) = fetched?;

    println!("{}, semester {}", student.roll_number, semester);

    if found.is_empty() {
        eprintln!("No marks for semester {} yet.", semester);
        return Ok(());
    }

    print!("{}", render::exam_groups(&group_by_exam_type(&found)));

    let overall = marks::overall_percentage(&found);
    println!(
        "Overall: {}% {}",
        overall,
        render::grade_label(Grade::of(overall))
    );

    Ok(())
}

fn find_by_roll_number<'a>(students: &'a [Student], roll_number: &RollNumber) -> Result<&'a Student> {
    students
        .iter()
        .find(|s| &s.roll_number == roll_number)
        .ok_or_else(|| anyhow!("Student \"{}\" does not exist", roll_number))
}

/// Fills in roll numbers the backend left out.
fn fill_roll_numbers(mut found: Vec<marks::Mark>, students: &[Student]) -> Vec<marks::Mark> {
    for mark in found.iter_mut().filter(|m| m.student_roll.is_none()) {
        mark.student_roll = students
            .iter()
            .find(|s| s.id == mark.student_id)
            .map(|s| s.roll_number.to_string());
    }

    found
}
