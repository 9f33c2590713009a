//! Board reconciliation for retroboard.
//!
//! Incoming updates are full snapshots taken by potentially stale observers,
//! so the authoritative board is produced by [`merge`], a pure function over
//! (stored, incoming) pairs. Its content rules form a monotone lattice:
//!
//! - groups and cards are a grow-only union
//! - `num_votes` merges by max and never decreases
//! - `is_deleted` is sticky — once true, always true
//! - all members of a card chain carry the chain's maximum vote count
//!
//! which makes the union step commutative and idempotent, so replayed or
//! reordered updates converge. The one intent snapshots cannot express —
//! a vote increment racing another writer — is repaired from the `upVote`
//! action hint before the action is stripped from the result.
//!
//! Board structure is the exception to "merge, don't reject": the column
//! count and column-id sequence of the stored board are immutable, and an
//! incoming board that disagrees is refused outright.

mod chain;

use chain::{apply_chain, chain_max};
use retroboard_data::{State, UP_VOTE};
use std::collections::{HashMap, HashSet};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Structural violations that make two boards unmergeable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("expected room id '{expected}', got '{got}'")]
    RoomMismatch { expected: String, got: String },

    #[error("expected {expected} columns, got {got}")]
    ColumnCount { expected: usize, got: usize },

    #[error("expected column id '{expected}', got '{got}'")]
    ColumnIdMismatch { expected: String, got: String },
}

/// Position of a card inside a board: (column, group, card).
type Loc = (usize, usize, usize);

/// Reconciles an incoming snapshot against the stored board.
///
/// Neither input is mutated. The result carries no action.
pub fn merge(old: &State, incoming: &State) -> Result<State> {
    check_structure(old, incoming)?;

    let mut merged = old.clone();

    // Union of groups and cards. Ids first seen in the incoming board are
    // recorded so their chains can be equalized afterwards.
    let new_ids = merge_columns(&mut merged, incoming);

    dedup_across_groups(&mut merged);

    // From here on votes are reconciled on a flat id -> votes table and
    // written back to the board in one pass at the end.
    let mut votes: HashMap<String, u64> = merged
        .cards()
        .map(|c| (c.id.clone(), c.num_votes))
        .collect();

    for id in &new_ids {
        if let Some(max) = chain_max(id, &votes) {
            apply_chain(id, &mut votes, max);
        }
    }

    apply_up_vote_guard(old, incoming, &mut votes);

    for column in &mut merged.columns {
        for group in &mut column.groups {
            for card in &mut group.retro_cards {
                if let Some(&v) = votes.get(&card.id) {
                    card.num_votes = v;
                }
            }
        }
    }

    merged.action = None;

    Ok(merged)
}

fn check_structure(old: &State, incoming: &State) -> Result<()> {
    if old.room_id != incoming.room_id {
        return Err(MergeError::RoomMismatch {
            expected: old.room_id.clone(),
            got: incoming.room_id.clone(),
        });
    }

    if old.columns.len() != incoming.columns.len() {
        return Err(MergeError::ColumnCount {
            expected: old.columns.len(),
            got: incoming.columns.len(),
        });
    }

    for (old_col, in_col) in old.columns.iter().zip(&incoming.columns) {
        if old_col.id != in_col.id {
            return Err(MergeError::ColumnIdMismatch {
                expected: old_col.id.clone(),
                got: in_col.id.clone(),
            });
        }
    }

    Ok(())
}

/// Folds the incoming board's groups and cards into `merged`.
///
/// Known cards are replaced by the incoming copy with monotone overrides
/// (max votes, sticky deletion). Unknown groups and cards are appended after
/// everything already known, preserving the stored relative order.
fn merge_columns(merged: &mut State, incoming: &State) -> HashSet<String> {
    let mut new_ids = HashSet::new();

    for (ci, in_col) in incoming.columns.iter().enumerate() {
        for in_group in &in_col.groups {
            let groups = &mut merged.columns[ci].groups;

            let Some(gi) = groups.iter().position(|g| g.id == in_group.id) else {
                new_ids.extend(in_group.retro_cards.iter().map(|c| c.id.clone()));
                groups.push(in_group.clone());
                continue;
            };

            let cards = &mut groups[gi].retro_cards;

            for in_card in &in_group.retro_cards {
                match cards.iter().position(|c| c.id == in_card.id) {
                    Some(i) => {
                        let prior_votes = cards[i].num_votes;
                        let prior_deleted = cards[i].is_deleted;

                        cards[i] = in_card.clone();

                        if prior_votes > cards[i].num_votes {
                            cards[i].num_votes = prior_votes;
                        }

                        if prior_deleted {
                            cards[i].is_deleted = true;
                        }
                    }
                    None => {
                        new_ids.insert(in_card.id.clone());
                        cards.push(in_card.clone());
                    }
                }
            }
        }
    }

    new_ids
}

/// Collapses every card id to a single copy across the groups of the board.
///
/// The same id living in two groups is a legitimate transient of a move
/// whose source and destination snapshots were observed separately. The
/// survivor is the deleted copy if any copy is deleted (deletion must never
/// be undone), then the most recently modified; its votes are raised to the
/// maximum across all copies.
fn dedup_across_groups(merged: &mut State) {
    let mut locs: HashMap<String, Vec<Loc>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (ci, column) in merged.columns.iter().enumerate() {
        for (gi, group) in column.groups.iter().enumerate() {
            for (ki, card) in group.retro_cards.iter().enumerate() {
                let entry = locs.entry(card.id.clone()).or_default();
                if entry.is_empty() {
                    order.push(card.id.clone());
                }
                entry.push((ci, gi, ki));
            }
        }
    }

    let mut remove: HashSet<Loc> = HashSet::new();

    for id in order {
        let copies = &locs[&id];
        if copies.len() < 2 {
            continue;
        }

        let card = |&(ci, gi, ki): &Loc| &merged.columns[ci].groups[gi].retro_cards[ki];

        let max_votes = copies.iter().map(|l| card(l).num_votes).max().unwrap_or(0);

        let survivor = *copies
            .iter()
            .max_by(|a, b| {
                let (a, b) = (card(a), card(b));
                (a.is_deleted, a.last_modified).cmp(&(b.is_deleted, b.last_modified))
            })
            .unwrap_or(&copies[0]);

        for &loc in copies {
            if loc != survivor {
                remove.insert(loc);
            }
        }

        let (ci, gi, ki) = survivor;
        merged.columns[ci].groups[gi].retro_cards[ki].num_votes = max_votes;
    }

    if remove.is_empty() {
        return;
    }

    for (ci, column) in merged.columns.iter_mut().enumerate() {
        for (gi, group) in column.groups.iter_mut().enumerate() {
            let mut ki = 0;
            group.retro_cards.retain(|_| {
                let keep = !remove.contains(&(ci, gi, ki));
                ki += 1;
                keep
            });
        }
    }
}

/// Repairs a vote increment the submitter raced to observe.
///
/// If the stored board already counted more votes on the acted-on card than
/// the submitter saw when voting, the submitter's increment was folded into
/// a stale total and would otherwise vanish into the max — so one extra vote
/// is added on top of the chain maximum. An action naming a card that is not
/// on the merged board is ignored.
fn apply_up_vote_guard(old: &State, incoming: &State, votes: &mut HashMap<String, u64>) {
    let Some(action) = &incoming.action else {
        return;
    };

    if action.title != UP_VOTE {
        return;
    }

    let (Some(action_old), Some(action_new)) = (&action.old_card, &action.new_card) else {
        return;
    };

    let Some(mut num_votes) = chain_max(&action_new.id, votes) else {
        return;
    };

    if let Some(prior) = old.find_card(&action_new.id) {
        if prior.num_votes > action_old.num_votes {
            num_votes += 1;
        }
    }

    apply_chain(&action_new.id, votes, num_votes);
}
