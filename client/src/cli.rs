//! Global CLI Setup.

use std::env;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use enum_as_inner::EnumAsInner;

use crate::command::attendance::{self, Attendance};
use crate::command::dashboard::{self, Dashboard};
use crate::command::login::{self, Login, Logout, WhoAmI};
use crate::command::marks::{self, Marks};
use crate::command::signup::{self, Signup};
use crate::command::student::{self, StudentCommand};
use crate::command::subject::{self, SubjectCommand};

/// Student management client.
#[derive(Debug, Parser)]
#[clap(version)]
#[clap(propagate_version = true)]
pub struct Opts {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, EnumAsInner)]
pub enum Command {
    Login(Login),
    Signup(Signup),
    Logout(Logout),
    #[clap(name = "whoami")]
    WhoAmI(WhoAmI),
    Student(StudentCommand),
    Attendance(Attendance),
    Subject(SubjectCommand),
    Marks(Marks),
    Dashboard(Dashboard),
}

/// Generate shell autocompletion files.
#[derive(Debug, Parser)]
pub struct GenCompletions {
    /// The shell to generate autocompletion files for.
    shell: Shell,
}

pub async fn run() -> Result<()> {
    // https://github.com/clap-rs/clap/issues/1335
    if let Some("gen-completions") = env::args().nth(1).as_deref() {
        return gen_completions(env::args().nth(2)).await;
    }

    let opts = Opts::parse();

    match opts.command {
        Command::Login(_) => login::run(opts).await,
        Command::Signup(_) => signup::run(opts).await,
        Command::Logout(_) => login::run_logout(opts).await,
        Command::WhoAmI(_) => login::run_whoami(opts).await,
        Command::Student(_) => student::run(opts).await,
        Command::Attendance(_) => attendance::run(opts).await,
        Command::Subject(_) => subject::run(opts).await,
        Command::Marks(_) => marks::run(opts).await,
        Command::Dashboard(_) => dashboard::run(opts).await,
    }
}

async fn gen_completions(shell: Option<String>) -> Result<()> {
    let shell: Shell = shell
        .ok_or_else(|| anyhow!("Must specify a shell."))?
        .parse()
        .map_err(|e| anyhow!("Unknown shell: {}", e))?;

    clap_complete::generate(shell, &mut Opts::command(), "rollbook", &mut std::io::stdout());

    Ok(())
}
