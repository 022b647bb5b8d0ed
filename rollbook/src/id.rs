//! Backend record identifiers.
//!
//! The backend is not consistent about how it names identifiers. Documents
//! carry either `id` or `_id`, and references to other documents are either
//! the bare identifier or the referenced document itself when the backend
//! decided to populate it:
//!
//! - `"student_id": "65a1..."`
//! - `"student_id": { "_id": "65a1...", "roll_number": "CS2021001" }`
//!
//! Both forms of a reference deserialize to the same [`RecordId`].

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{RollbookError, RollbookResult};

/// The opaque identifier of a backend record.
#[derive(Serialize, Deserialize, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RecordId(#[serde(deserialize_with = "RecordId::deserialize")] String);

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceRepr {
    Id(String),
    Document {
        #[serde(alias = "_id")]
        id: String,
    },
}

impl RecordId {
    /// Creates an identifier from a String.
    pub fn new(id: String) -> RollbookResult<Self> {
        validate_record_id(&id)?;
        Ok(Self(id))
    }

    /// Returns the string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deserializes a potentially-empty identifier.
    fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        use de::Error;
        String::deserialize(deserializer).and_then(|s| {
            validate_record_id(&s).map_err(|e| Error::custom(e.to_string()))?;
            Ok(s)
        })
    }
}

impl FromStr for RecordId {
    type Err = RollbookError;

    fn from_str(id: &str) -> RollbookResult<Self> {
        Self::new(id.to_owned())
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deserializes a reference that may have been populated into a document.
pub fn deserialize_reference<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    use de::Error;
    let id = match ReferenceRepr::deserialize(deserializer)? {
        ReferenceRepr::Id(id) => id,
        ReferenceRepr::Document { id } => id,
    };

    RecordId::new(id).map_err(|e| Error::custom(e.to_string()))
}

fn validate_record_id(id: &str) -> RollbookResult<()> {
    if id.trim().is_empty() {
        Err(RollbookError::InvalidField {
            field: "identifier",
            reason: "must not be empty",
        })
    } else {
        Ok(())
    }
}
