//! The board hierarchy: state, columns and groups.
//!
//! A room has exactly one board. The board has a fixed set of columns whose
//! count and id order never change after the room's first update; groups and
//! cards underneath them are the mutable part.

use crate::{Action, RetroCard};
use serde::{Deserialize, Serialize};

/// Number of columns every board carries. Column structure is immutable.
pub const NUM_COLUMNS: usize = 3;

/// Full snapshot of a room's board at a moment in time.
///
/// This is the wire format in both directions: participants send whole
/// boards, and whole boards fan back out to every session in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub room_id: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub action: Option<Action>,
}

impl State {
    /// Iterates over every card on the board.
    pub fn cards(&self) -> impl Iterator<Item = &RetroCard> {
        self.columns
            .iter()
            .flat_map(|c| c.groups.iter())
            .flat_map(|g| g.retro_cards.iter())
    }

    /// Looks up a card anywhere on the board by id.
    #[must_use]
    pub fn find_card(&self, id: &str) -> Option<&RetroCard> {
        self.cards().find(|c| c.id == id)
    }
}

/// One of the three fixed columns of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    pub card_style: CardStyle,
    pub groups: Vec<Group>,
}

/// Presentation hints for the cards of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStyle {
    pub background_color: String,
}

/// A group of cards within a column.
///
/// Every column is seeded with a `default` group; further groups appear when
/// participants cluster cards. Once observed, a group is never removed from
/// the merged board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub column_id: String,
    #[serde(default)]
    pub is_editable: bool,
    pub title: String,
    pub retro_cards: Vec<RetroCard>,
}

impl Group {
    /// Looks up a card in this group by id.
    #[must_use]
    pub fn find_card(&self, id: &str) -> Option<&RetroCard> {
        self.retro_cards.iter().find(|c| c.id == id)
    }
}
