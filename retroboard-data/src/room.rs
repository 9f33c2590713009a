//! Room registration payload.

use crate::DataError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ROOM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z0-9_-]+$").unwrap());

/// Credentials submitted when creating or joining a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub password: String,
}

impl Room {
    /// Checks the id character set and that the password is present.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.password.is_empty() {
            return Err(DataError::EmptyPassword);
        }

        if !ROOM_ID_PATTERN.is_match(&self.id) {
            return Err(DataError::InvalidRoomId(self.id.clone()));
        }

        Ok(())
    }
}

/// Whether a path segment is a well-formed room id.
#[must_use]
pub fn is_valid_room_id(id: &str) -> bool {
    ROOM_ID_PATTERN.is_match(id)
}
