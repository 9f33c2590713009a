//! Advisory action hints carried on incoming boards.
//!
//! Boards are full snapshots, so most intent can be recovered by comparing
//! snapshots. Voting cannot: two participants upvoting concurrently both
//! submit "votes = n + 1", and one increment would be lost. The action hint
//! carries the before/after cards so the merge can detect and repair that.

use crate::RetroCard;
use serde::{Deserialize, Serialize};

/// The only action title currently defined.
pub const UP_VOTE: &str = "upVote";

/// An operation hint attached to an incoming board.
///
/// Advisory only — it steers reconciliation and is stripped from the merged
/// board before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub title: String,
    #[serde(default)]
    pub old_card: Option<RetroCard>,
    #[serde(default)]
    pub new_card: Option<RetroCard>,
}

impl Action {
    /// Builds an `upVote` action from the card before and after the vote.
    pub fn up_vote(old_card: RetroCard, new_card: RetroCard) -> Self {
        Self {
            title: UP_VOTE.to_string(),
            old_card: Some(old_card),
            new_card: Some(new_card),
        }
    }
}
