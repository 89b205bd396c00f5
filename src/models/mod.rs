//! Records exchanged with clients and persisted in storage.

pub mod project;
pub mod user;

pub use project::{Page, Project, ProjectCreate, ProjectUpdate};
pub use user::{LoginRequest, Token, User, UserCreate, UserUpdate};

use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Serialize a unix timestamp as an RFC 3339 string.
fn rfc3339<S: Serializer>(ts: &i64, s: S) -> Result<S::Ok, S::Error> {
    let formatted = OffsetDateTime::from_unix_timestamp(*ts)
        .map_err(serde::ser::Error::custom)?
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    s.serialize_str(&formatted)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}
