//! Retro cards and the `<uuid>-pk-<n>` identifier scheme.
//!
//! Moving a card between groups never mutates it in place: the copy in the
//! source group is marked deleted and a successor with the next `-pk-` index
//! is created in the destination group. All cards sharing a uuid prefix form
//! a chain — the lifetime of one conceptual card across moves.

use crate::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Separator between a card id's uuid prefix and its chain index.
pub const PK_SEPARATOR: &str = "-pk-";

/// A single card on the board.
///
/// `num_votes` is monotonically non-decreasing over the card's lifetime and
/// equal across its whole chain; `is_deleted` never flips back to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroCard {
    pub id: String,
    pub column_id: String,
    pub message: String,
    #[serde(default)]
    pub num_votes: u64,
    #[serde(default)]
    pub is_editable: bool,
    pub group_id: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub last_modified: i64,
}

/// Parsed form of a card id: the uuid base plus the chain index after the
/// last `-pk-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardId {
    base: String,
    pk: u32,
}

impl CardId {
    /// Builds a card id from a base and chain index.
    pub fn new(base: impl Into<String>, pk: u32) -> Self {
        Self {
            base: base.into(),
            pk,
        }
    }

    /// Builds the first id of a fresh chain.
    #[must_use]
    pub fn fresh() -> Self {
        Self::new(Uuid::new_v4().to_string(), 0)
    }

    /// Parses an id of the form `<base>-pk-<n>`.
    ///
    /// The base is everything before the **last** `-pk-`, so a base that
    /// itself contains the separator still round-trips.
    pub fn parse(id: &str) -> Result<Self, DataError> {
        let at = id
            .rfind(PK_SEPARATOR)
            .ok_or_else(|| DataError::MalformedCardId(id.to_string()))?;

        let (base, suffix) = id.split_at(at);
        let pk = suffix[PK_SEPARATOR.len()..]
            .parse::<u32>()
            .map_err(|_| DataError::MalformedCardId(id.to_string()))?;

        if base.is_empty() {
            return Err(DataError::MalformedCardId(id.to_string()));
        }

        Ok(Self {
            base: base.to_string(),
            pk,
        })
    }

    /// The uuid prefix shared by every member of the chain.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The chain index after `-pk-`.
    #[must_use]
    pub fn pk(&self) -> u32 {
        self.pk
    }

    /// The id a move to another group would create.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            base: self.base.clone(),
            pk: self.pk + 1,
        }
    }

    /// The chain member with the given index.
    #[must_use]
    pub fn sibling(&self, pk: u32) -> Self {
        Self {
            base: self.base.clone(),
            pk,
        }
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.base, PK_SEPARATOR, self.pk)
    }
}

impl FromStr for CardId {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
