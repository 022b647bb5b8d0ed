//! Request and response bodies of the backend.

pub mod attendance;
pub mod auth;
pub mod marks;
pub mod stats;
pub mod students;
pub mod subjects;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A list of documents.
///
/// Most endpoints return a bare array. Some wrap it in an object.
/// Documents that don't parse are skipped with a warning, so one bad row
/// doesn't hide the rest.
#[derive(Debug, Clone)]
pub struct Listing<T>(Vec<T>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawListing {
    Bare(Vec<Value>),
    Data { data: Vec<Value> },
    Students { students: Vec<Value> },
}

/// Zero or one document, sent as either an array or the document itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// An error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Listing<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let values = match RawListing::deserialize(deserializer)? {
            RawListing::Bare(v) => v,
            RawListing::Data { data } => data,
            RawListing::Students { students } => students,
        };

        let documents = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match T::deserialize(value) {
                Ok(document) => Some(document),
                Err(e) => {
                    tracing::warn!("Skipping malformed document #{}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(Self(documents))
    }
}

impl<T> OneOrMany<T> {
    /// Returns the first document, if any.
    pub fn into_first(self) -> Option<T> {
        match self {
            Self::Many(v) => v.into_iter().next(),
            Self::One(t) => Some(t),
        }
    }
}
