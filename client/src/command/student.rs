use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::context::Context;
use crate::render;
use rollbook::api::v1::auth::Role;
use rollbook::api::v1::students::StudentQuery;
use rollbook::id::RecordId;
use rollbook::student::{sort_by_roll_number, Gender, Student, StudentForm, YearOfStudy};

/// Manage students.
///
/// You need a faculty account.
#[derive(Debug, Parser)]
pub struct StudentCommand {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    List(List),
    Add(Add),
    Edit(Edit),
    Delete(Delete),
}

/// List students, sorted by roll number.
#[derive(Debug, Clone, Parser)]
struct List {
    /// Only list students of this year of study.
    #[clap(long)]
    year: Option<YearOfStudy>,

    /// Only list students whose roll number or branch code contains this.
    #[clap(long)]
    search: Option<String>,
}

/// Add a student.
///
/// The student signs in with the roll number and the password
/// you set here.
#[derive(Debug, Clone, Parser)]
struct Add {
    #[clap(long)]
    roll_number: String,

    #[clap(long)]
    full_name: String,

    /// Year of study, from 1 to 3.
    #[clap(long)]
    year: u8,

    #[clap(long)]
    gender: Gender,

    #[clap(long)]
    branch_code: String,

    #[clap(long)]
    phone_number: Option<String>,
}

/// Edit a student.
///
/// Details that aren't given are kept. The full name and
/// password always have to be entered again.
#[derive(Debug, Clone, Parser)]
struct Edit {
    /// ID of the student.
    id: RecordId,

    #[clap(long)]
    roll_number: Option<String>,

    #[clap(long)]
    full_name: Option<String>,

    #[clap(long)]
    year: Option<u8>,

    #[clap(long)]
    gender: Option<Gender>,

    #[clap(long)]
    branch_code: Option<String>,

    #[clap(long)]
    phone_number: Option<String>,
}

/// Delete a student.
#[derive(Debug, Clone, Parser)]
struct Delete {
    /// ID of the student.
    id: RecordId,

    /// Don't ask for interactive confirmation.
    #[clap(long)]
    no_confirm: bool,
}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_student().unwrap();
    let ctx = Context::load()?;
    ctx.require(Role::Faculty)?;
    let api = ctx.api()?;

    match &sub.command {
        Command::List(sub) => list_students(&api, sub.to_owned()).await,
        Command::Add(sub) => add_student(&api, sub.to_owned()).await,
        Command::Edit(sub) => edit_student(&api, sub.to_owned()).await,
        Command::Delete(sub) => delete_student(&api, sub.to_owned()).await,
    }
}

async fn list_students(api: &ApiClient, sub: List) -> Result<()> {
    let query = StudentQuery {
        year_of_study: sub.year,
        ..Default::default()
    };

    let spinner = render::spinner("Fetching students");
    let students = api.list_students(&query).await;
    spinner.finish_and_clear();

    let mut students = students?;
    if let Some(search) = &sub.search {
        students.retain(|s| s.matches(search));
    }
    sort_by_roll_number(&mut students);

    if students.is_empty() {
        if sub.search.is_some() {
            eprintln!("No students found. Try adjusting your search.");
        } else {
            eprintln!("No students yet. Add one with `rollbook student add`.");
        }
        return Ok(());
    }

    print!("{}", render::students(&students));
    eprintln!("{} student(s)", students.len());

    Ok(())
}

async fn add_student(api: &ApiClient, sub: Add) -> Result<()> {
    let form = StudentForm {
        roll_number: sub.roll_number,
        full_name: sub.full_name,
        password: prompt_password()?,
        year_of_study: sub.year,
        gender: sub.gender,
        phone_number: sub.phone_number,
        branch_code: sub.branch_code,
    };
    let request = form.into_request()?;

    api.create_student(&request).await?;
    eprintln!(
        "✨ Added student \"{}\" to year {}",
        request.roll_number, request.year_of_study
    );

    Ok(())
}

async fn edit_student(api: &ApiClient, sub: Edit) -> Result<()> {
    let existing = find_student(api, &sub.id).await?;

    let full_name = match sub.full_name {
        Some(full_name) => full_name,
        None => Input::new().with_prompt("Full name").interact_text()?,
    };

    let form = StudentForm {
        roll_number: sub
            .roll_number
            .unwrap_or_else(|| existing.roll_number.to_string()),
        full_name,
        password: prompt_password()?,
        year_of_study: sub.year.unwrap_or_else(|| existing.year_of_study.get()),
        gender: sub
            .gender
            .or(existing.gender)
            .ok_or_else(|| anyhow!("The student has no gender on record. Pass `--gender`."))?,
        phone_number: sub.phone_number.or(existing.phone_number),
        branch_code: sub.branch_code.unwrap_or(existing.branch_code),
    };
    let request = form.into_request()?;

    api.update_student(&sub.id, &request).await?;
    eprintln!("✅ Updated student \"{}\"", request.roll_number);

    Ok(())
}

async fn delete_student(api: &ApiClient, sub: Delete) -> Result<()> {
    let student = find_student(api, &sub.id).await?;

    if !sub.no_confirm {
        let answer: String = Input::new()
            .with_prompt(format!(
                "⚠️ Type the roll number to confirm deleting student \"{}\"",
                student.roll_number
            ))
            .allow_empty(true)
            .interact()?;

        if answer != student.roll_number.as_str() {
            return Err(anyhow!("Incorrect answer. Aborting..."));
        }
    }

    api.delete_student(&student.id).await?;
    eprintln!("🗑️ Deleted student \"{}\"", student.roll_number);

    Ok(())
}

async fn find_student(api: &ApiClient, id: &RecordId) -> Result<Student> {
    api.list_students(&StudentQuery::default())
        .await?
        .into_iter()
        .find(|s| &s.id == id)
        .ok_or_else(|| anyhow!("Student \"{}\" does not exist", id))
}

fn prompt_password() -> Result<String> {
    Ok(Password::new()
        .with_prompt("Password for the student (min 6 characters)")
        .interact()?)
}
