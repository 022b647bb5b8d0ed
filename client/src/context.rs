//! What every signed-in command needs.

use anyhow::{anyhow, Result};

use crate::api::ApiClient;
use crate::config::Config;
use crate::session::Session;
use rollbook::api::v1::auth::{Role, User};
use rollbook::student::Student;

#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub session: Session,
}

impl Context {
    pub fn load() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            session: Session::load()?,
        })
    }

    /// Returns a client for the server the user signed in to.
    ///
    /// Without a session, the default server is used.
    pub fn api(&self) -> Result<ApiClient> {
        let (_, server) = self.config.resolve_server(self.session.server())?;
        ApiClient::from_server_config(server)
    }

    /// Returns the signed-in user if they have the role.
    pub fn require(&self, role: Role) -> Result<&User> {
        self.session.require(role)
    }
}

/// Returns the student record of a signed-in student.
pub async fn own_student(api: &ApiClient, user: &User) -> Result<Student> {
    api.find_student_by_profile(&user.id).await?.ok_or_else(|| {
        anyhow!(
            "Your account is not yet linked to a student record. Please contact your faculty."
        )
    })
}
