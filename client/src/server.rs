//! Server names.
//!
//! The client can talk to several deployments of the backend (e.g., one
//! per campus), each configured under a short name:
//!
//! ```text
//! rollbook login main https://sms.college.edu --email faculty@college.edu
//! ```
//!
//! Server names can be up to 50 characters long and can only consist of
//! ASCII alphanumeric characters (A-Za-z0-9), dashes ('-') and underscores
//! ('_'). They must start with an alphanumeric character.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Serialize};

lazy_static! {
    static ref SERVER_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-_]{0,49}$").unwrap();
}

/// The name of a configured server.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ServerName(#[serde(deserialize_with = "ServerName::deserialize")] String);

impl ServerName {
    pub fn new(name: String) -> Result<Self> {
        validate_server_name(&name)?;
        Ok(Self(name))
    }

    /// Returns the string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deserializes a potentially-invalid server name.
    fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        use de::Error;
        String::deserialize(deserializer).and_then(|s| {
            validate_server_name(&s).map_err(|e| Error::custom(e.to_string()))?;
            Ok(s)
        })
    }
}

impl FromStr for ServerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.to_owned())
    }
}

impl Display for ServerName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_server_name(name: &str) -> Result<()> {
    if SERVER_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(anyhow!("Invalid server name \"{}\"", name))
    }
}
