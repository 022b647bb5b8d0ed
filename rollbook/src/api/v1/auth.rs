//! Authentication endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RollbookError, RollbookResult};
use crate::id::RecordId;
use crate::student::RollNumber;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

/// An authenticated user.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: RecordId,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub full_name: String,

    pub role: Role,
}

/// Credentials to sign in with.
///
/// Students sign in with their roll number, everyone else with their email.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SignInRequest {
    Email {
        email: String,
        password: String,
    },
    RollNumber {
        role: Role,
        roll_number: RollNumber,
        password: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: Option<User>,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "admin" => Ok(Self::Admin),
            _ => Err(RollbookError::UnknownVariant {
                kind: "role",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SignInRequest {
    pub fn student(roll_number: RollNumber, password: String) -> Self {
        Self::RollNumber {
            role: Role::Student,
            roll_number,
            password,
        }
    }

    pub fn email(email: String, password: String) -> Self {
        Self::Email { email, password }
    }
}

impl SignUpRequest {
    /// Validates the sign-up details.
    pub fn validate(&self) -> RollbookResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;

        if self.full_name.trim().chars().count() < 2 {
            return Err(RollbookError::InvalidField {
                field: "Name",
                reason: "must be at least 2 characters",
            });
        }

        Ok(())
    }
}

pub fn validate_email(email: &str) -> RollbookResult<()> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);

    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(RollbookError::InvalidField {
            field: "Email",
            reason: "is not a valid email address",
        })
    }
}

pub fn validate_password(password: &str) -> RollbookResult<()> {
    if password.chars().count() >= 6 {
        Ok(())
    } else {
        Err(RollbookError::InvalidField {
            field: "Password",
            reason: "must be at least 6 characters",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_bodies() {
        let by_email = SignInRequest::email("a@b.edu".to_string(), "secret1".to_string());
        assert_eq!(
            serde_json::json!({ "email": "a@b.edu", "password": "secret1" }),
            serde_json::to_value(&by_email).unwrap()
        );

        let by_roll = SignInRequest::student("CS01".parse().unwrap(), "secret1".to_string());
        assert_eq!(
            serde_json::json!({ "role": "student", "roll_number": "CS01", "password": "secret1" }),
            serde_json::to_value(&by_roll).unwrap()
        );
    }

    #[test]
    fn test_auth_response() {
        let json = r#"{ "user": { "_id": "u1", "email": "f@x.edu", "full_name": "F", "role": "faculty" } }"#;
        let user = serde_json::from_str::<AuthResponse>(json).unwrap().user.unwrap();
        assert_eq!(Role::Faculty, user.role);
        assert_eq!("u1", user.id.as_str());

        assert!(serde_json::from_str::<AuthResponse>("{}").unwrap().user.is_none());
    }

    #[test]
    fn test_validate_sign_up() {
        let mut request = SignUpRequest {
            email: "new@college.edu".to_string(),
            password: "abcdef".to_string(),
            full_name: "Ravi".to_string(),
            role: Role::Faculty,
        };
        request.validate().unwrap();

        request.email = "not-an-email".to_string();
        request.validate().unwrap_err();

        request.email = "new@college.edu".to_string();
        request.password = "abc".to_string();
        request.validate().unwrap_err();
    }
}
