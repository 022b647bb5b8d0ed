use anyhow::{anyhow, Result};
use clap::Parser;
use dialoguer::Password;

use crate::api::ApiClient;
use crate::cli::Opts;
use crate::config::{Config, ServerConfig};
use crate::server::ServerName;
use crate::session::Session;
use rollbook::api::v1::auth::{Role, SignUpRequest};

/// Create an account on a student management server.
///
/// Students get their accounts from faculty, so only faculty
/// and admin accounts can be created here.
#[derive(Debug, Parser)]
pub struct Signup {
    /// Name of the server.
    name: ServerName,

    /// Endpoint of the server.
    endpoint: String,

    /// Email address of the account.
    #[clap(long)]
    email: String,

    /// Full name of the account holder.
    #[clap(long)]
    full_name: String,

    /// Role of the account.
    #[clap(long, default_value = "faculty")]
    role: Role,
}

pub async fn run(opts: Opts) -> Result<()> {
    let sub = opts.command.as_signup().unwrap();

    if sub.role == Role::Student {
        return Err(anyhow!(
            "Student accounts are created by faculty. Ask your faculty for your roll number login."
        ));
    }

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let request = SignUpRequest {
        email: sub.email.trim().to_owned(),
        password,
        full_name: sub.full_name.trim().to_owned(),
        role: sub.role,
    };
    request.validate()?;

    let mut config = Config::load()?;
    {
        let mut config_m = config.as_mut();
        config_m.servers.insert(
            sub.name.to_owned(),
            ServerConfig {
                endpoint: sub.endpoint.to_owned(),
            },
        );

        if config_m.servers.len() == 1 {
            config_m.default_server = Some(sub.name.to_owned());
        }
    }

    let (server_name, server) = config.resolve_server(Some(&sub.name))?;
    let api = ApiClient::from_server_config(server)?;

    let user = api
        .sign_up(&request)
        .await?
        .ok_or_else(|| anyhow!("The server did not return a user. Sign up failed."))?;

    let mut session = Session::load()?;
    session.store(server_name.to_owned(), user)?;

    eprintln!(
        "✨ Created {} account \"{}\" on \"{}\"",
        request.role,
        request.email,
        server_name.as_str()
    );

    Ok(())
}
