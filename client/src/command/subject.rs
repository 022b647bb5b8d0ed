use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::context::Context;
use crate::render;
use rollbook::api::v1::auth::Role;
use rollbook::student::Semester;
use rollbook::subject::{SubjectForm, SubjectType};

/// Manage subjects.
///
/// You need a faculty account.
#[derive(Debug, Parser)]
pub struct SubjectCommand {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    List(List),
    Add(Add),
}

/// List subjects.
#[derive(Debug, Clone, Parser)]
struct List {
    /// Only list subjects of this semester.
    #[clap(long)]
    semester: Option<Semester>,
}

/// Add a subject.
///
/// Shares of the marks that aren't given take their defaults:
/// UT 20, sessional 40 and external 80.
#[derive(Debug, Clone, Parser)]
struct Add {
    /// Subject code, e.g. CS101.
    #[clap(long)]
    code: String,

    #[clap(long)]
    name: String,

    #[clap(long)]
    semester: Semester,

    #[clap(long, default_value = "")]
    branch_code: String,

    /// One of theory, lab and project.
    #[clap(long = "type", default_value = "theory")]
    subject_type: SubjectType,

    /// Unit test share of a theory or project subject.
    #[clap(long)]
    ut: Option<u32>,

    /// Sessional share of a lab subject.
    #[clap(long)]
    sessional: Option<u32>,

    /// External exam share.
    #[clap(long)]
    external: Option<u32>,
}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_subject().unwrap();
    let ctx = Context::load()?;
    ctx.require(Role::Faculty)?;
    let api = ctx.api()?;

    match &sub.command {
        Command::List(sub) => list_subjects(&api, sub.to_owned()).await,
        Command::Add(sub) => add_subject(&api, sub.to_owned()).await,
    }
}

async fn list_subjects(api: &ApiClient, sub: List) -> Result<()> {
    let mut subjects = api.list_subjects().await?;
    if let Some(semester) = sub.semester {
        subjects.retain(|s| s.semester == semester);
    }
    subjects.sort_by(|a, b| (a.semester, &a.code).cmp(&(b.semester, &b.code)));

    if subjects.is_empty() {
        eprintln!("No subjects yet. Add one with `rollbook subject add`.");
        return Ok(());
    }

    print!("{}", render::subjects(&subjects));

    Ok(())
}

async fn add_subject(api: &ApiClient, sub: Add) -> Result<()> {
    let form = SubjectForm {
        code: sub.code,
        name: sub.name,
        semester: sub.semester,
        branch_code: sub.branch_code,
        subject_type: sub.subject_type,
        ut: sub.ut,
        sessional: sub.sessional,
        external: sub.external,
    };
    let request = form.into_request()?;

    api.create_subject(&request).await?;
    eprintln!(
        "✨ Added {} subject \"{}\" ({}) to semester {}",
        request.subject_type, request.name, request.marks, request.semester
    );

    Ok(())
}
