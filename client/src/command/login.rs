use anyhow::{anyhow, Result};
use clap::Parser;
use dialoguer::{Input, Password};

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::config::{Config, ServerConfig};
use crate::server::ServerName;
use crate::session::Session;
use rollbook::api::v1::auth::{Role, SignInRequest};
use rollbook::student::RollNumber;

/// Sign in to a student management server.
///
/// Faculty and admins sign in with their email, students with
/// their roll number. The password is always asked for interactively.
#[derive(Debug, Parser)]
pub struct Login {
    /// Name of the server.
    name: ServerName,

    /// Endpoint of the server.
    endpoint: String,

    /// Sign in with an email address.
    #[clap(long, conflicts_with = "roll_number")]
    email: Option<String>,

    /// Sign in as the student with this roll number.
    #[clap(long)]
    roll_number: Option<RollNumber>,

    /// Set the server as the default.
    #[clap(long)]
    set_default: bool,
}

/// Sign out.
#[derive(Debug, Parser)]
pub struct Logout {}

/// Show the signed-in user.
#[derive(Debug, Parser)]
pub struct WhoAmI {}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_login().unwrap();
    let mut config = Config::load()?;

    {
        let mut config_m = config.as_mut();

        if let Some(server) = config_m.servers.get_mut(&sub.name) {
            eprintln!("✍️ Overwriting server \"{}\"", sub.name.as_str());
            server.endpoint = sub.endpoint.to_owned();
        } else {
            eprintln!("✍️ Configuring server \"{}\"", sub.name.as_str());
            config_m.servers.insert(
                sub.name.to_owned(),
                ServerConfig {
                    endpoint: sub.endpoint.to_owned(),
                },
            );
        }

        if sub.set_default || config_m.servers.len() == 1 {
            config_m.default_server = Some(sub.name.to_owned());
        }
    }

    let (server_name, server) = config.resolve_server(Some(&sub.name))?;
    let api = ApiClient::from_server_config(server)?;

    let request = match (&sub.email, &sub.roll_number) {
        (_, Some(roll_number)) => {
            SignInRequest::student(roll_number.to_owned(), prompt_password()?)
        }
        (Some(email), None) => SignInRequest::email(email.to_owned(), prompt_password()?),
        (None, None) => {
            let email: String = Input::new().with_prompt("Email").interact_text()?;
            SignInRequest::email(email.trim().to_owned(), prompt_password()?)
        }
    };

    let user = api
        .sign_in(&request)
        .await?
        .ok_or_else(|| anyhow!("The server did not return a user. Sign in failed."))?;

    let mut session = Session::load()?;
    session.store(server_name.to_owned(), user.clone())?;

    eprintln!(
        "✨ Signed in to \"{}\" as {} ({})",
        server_name.as_str(),
        display_name(&user.full_name, &user.email),
        user.role
    );

    Ok(())
}

pub async fn run_logout(opts: Opts) -> Result<()> {
    let _ = opts.command.as_logout().unwrap();
    let mut session = Session::load()?;

    match session.user() {
        Some(user) => {
            let name = display_name(&user.full_name, &user.email).to_owned();
            session.clear()?;
            eprintln!("👋 Signed out {}", name);
        }
        None => {
            session.clear()?;
            eprintln!("You are not signed in.");
        }
    }

    Ok(())
}

pub async fn run_whoami(opts: Opts) -> Result<()> {
    let _ = opts.command.as_who_am_i().unwrap();
    let session = Session::load()?;

    let user = session.signed_in()?;

    eprintln!("          Name: {}", user.full_name);
    eprintln!("         Email: {}", user.email);
    eprintln!("          Role: {}", user.role);
    if let Some(server) = session.server() {
        eprintln!("        Server: {}", server);
    }
    if user.role == Role::Student {
        eprintln!("         Menus: dashboard, attendance me, marks me");
    } else {
        eprintln!("         Menus: dashboard, student, attendance, subject, marks");
    }

    Ok(())
}

fn prompt_password() -> Result<String> {
    Ok(Password::new().with_prompt("Password").interact()?)
}

fn display_name<'a>(full_name: &'a str, email: &'a str) -> &'a str {
    if full_name.is_empty() {
        email
    } else {
        full_name
    }
}
