//! Core data model for retroboard.
//!
//! This crate defines the board types shared by every other crate:
//! - [`State`] — the full snapshot of a room's board
//! - [`Column`], [`Group`], [`RetroCard`] — the board hierarchy
//! - [`Action`] — the advisory operation hint piggybacked on an update
//! - [`CardId`] — the `<uuid>-pk-<n>` identifier scheme and card chains
//! - [`validate`] — structural validation applied to every incoming board
//!
//! Boards travel as full snapshots, so these types carry no behavior beyond
//! identity and validation; reconciliation lives in `retroboard-merge`.

mod action;
mod board;
mod card;
mod room;
mod validate;

pub use action::{Action, UP_VOTE};
pub use board::{CardStyle, Column, Group, State, NUM_COLUMNS};
pub use card::{CardId, RetroCard, PK_SEPARATOR};
pub use room::{is_valid_room_id, Room};
pub use validate::validate;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors produced by decoding or validating board data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("got {got} columns, expected {expected}")]
    ColumnCount { got: usize, expected: usize },

    #[error("got group column id '{got}', expected '{expected}'")]
    GroupColumnMismatch { got: String, expected: String },

    #[error("got card group id '{got}', expected '{expected}'")]
    CardGroupMismatch { got: String, expected: String },

    #[error("got card column id '{got}', expected '{expected}'")]
    CardColumnMismatch { got: String, expected: String },

    #[error("got card id '{0}', expected it to contain '{PK_SEPARATOR}<n>'")]
    MalformedCardId(String),

    #[error("duplicate retro card id '{0}' exists")]
    DuplicateCardId(String),

    #[error("last modified is zero for card '{0}'")]
    ZeroLastModified(String),

    #[error("invalid action title '{0}'")]
    InvalidActionTitle(String),

    #[error("upVote action is missing its {0} card")]
    IncompleteAction(&'static str),

    #[error("invalid room '{0}' - it may contain letters, numbers, underscores and dashes")]
    InvalidRoomId(String),

    #[error("password cannot be empty")]
    EmptyPassword,
}
