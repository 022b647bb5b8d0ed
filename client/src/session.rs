//! The signed-in user.
//!
//! After signing in, a snapshot of the user is kept under the `auth_user`
//! key of `$XDG_STATE_HOME/rollbook/session.json`, together with the server
//! it came from. It's read once on start and removed on logout.
//!
//! The backend doesn't hand out tokens, so the snapshot is only used to
//! know who is acting (e.g., who marked attendance) and which commands
//! they may run.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

use crate::config::{write_private, XDG_PREFIX};
use crate::server::ServerName;
use rollbook::api::v1::auth::{Role, User};

/// The session store.
#[derive(Debug)]
pub struct Session {
    data: SessionData,

    /// Path to persist the session to.
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct SessionData {
    /// The server the user signed in to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server: Option<ServerName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_user: Option<User>,
}

impl Session {
    /// Loads the session from the system.
    pub fn load() -> Result<Self> {
        let path = get_session_path()
            .map_err(|e| {
                tracing::warn!("Could not get session path: {}", e);
                e
            })
            .ok();

        Ok(Self::load_from(path))
    }

    /// Loads a session, discarding it if it can't be read back.
    fn load_from(path: Option<PathBuf>) -> Self {
        let data = path
            .as_ref()
            .filter(|p| p.exists())
            .and_then(|p| match read_session(p) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session at {:?}: {}", p, e);
                    if let Err(e) = fs::remove_file(p) {
                        tracing::warn!("Could not remove session: {}", e);
                    }
                    None
                }
            })
            .unwrap_or_default();

        Self { data, path }
    }

    /// Returns the signed-in user.
    pub fn user(&self) -> Option<&User> {
        self.data.auth_user.as_ref()
    }

    /// Returns the server the user signed in to.
    pub fn server(&self) -> Option<&ServerName> {
        self.data.server.as_ref()
    }

    /// Returns the signed-in user, whatever their role.
    pub fn signed_in(&self) -> Result<&User> {
        self.user()
            .ok_or_else(|| anyhow!("You are not signed in. Run `rollbook login` first."))
    }

    /// Returns the signed-in user if they have the role.
    pub fn require(&self, role: Role) -> Result<&User> {
        let user = self.signed_in()?;

        if user.role != role {
            return Err(anyhow!(
                "This command is only available to {} accounts (signed in as {}).",
                role,
                user.role
            ));
        }

        Ok(user)
    }

    /// Remembers a newly signed-in user.
    pub fn store(&mut self, server: ServerName, user: User) -> Result<()> {
        self.data = SessionData {
            server: Some(server),
            auth_user: Some(user),
        };
        self.save()
    }

    /// Forgets the signed-in user.
    pub fn clear(&mut self) -> Result<()> {
        self.data = SessionData::default();

        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
                tracing::debug!("Removed session at {:?}", path);
            }
        }

        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let serialized = serde_json::to_vec_pretty(&self.data)?;
            write_private(path, &serialized)?;

            tracing::debug!("Saved session to {:?}", path);
        }

        Ok(())
    }
}

fn read_session(path: &PathBuf) -> Result<SessionData> {
    let contents = fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

fn get_session_path() -> Result<PathBuf> {
    let xdg_dirs = BaseDirectories::with_prefix(XDG_PREFIX)?;
    let session_path = xdg_dirs.place_state_file("session.json")?;

    Ok(session_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faculty() -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "email": "faculty@college.edu",
            "full_name": "Meera Iyer",
            "role": "faculty",
        }))
        .unwrap()
    }

    #[test]
    fn test_store_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let server = ServerName::new("main".to_string()).unwrap();

        let mut session = Session::load_from(Some(path.clone()));
        assert!(session.user().is_none());

        session.store(server.clone(), faculty()).unwrap();

        let contents: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!("faculty", contents["auth_user"]["role"]);

        let mut reloaded = Session::load_from(Some(path.clone()));
        assert_eq!(Some(&faculty()), reloaded.user());
        assert_eq!(Some(&server), reloaded.server());

        reloaded.clear().unwrap();
        assert!(reloaded.user().is_none());
        assert!(!path.exists());
        assert!(Session::load_from(Some(path)).user().is_none());
    }

    #[test]
    fn test_corrupt_session_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{ not json").unwrap();

        let session = Session::load_from(Some(path.clone()));
        assert!(session.user().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_require_role() {
        let mut session = Session::load_from(None);
        session.require(Role::Faculty).unwrap_err();

        session
            .store(ServerName::new("main".to_string()).unwrap(), faculty())
            .unwrap();
        session.require(Role::Faculty).unwrap();

        let err = session.require(Role::Student).unwrap_err();
        assert!(err.to_string().contains("student accounts"));
    }
}
