//! Structural validation of incoming boards.
//!
//! Every board read off a session passes through [`validate`] before it is
//! published or queued. Validation is purely structural — it checks the
//! shape of one snapshot, never its relationship to the stored board; that
//! is the merge's job.

use crate::{Action, CardId, DataError, RetroCard, State, NUM_COLUMNS, UP_VOTE};
use std::collections::HashSet;

/// Validates a board in place.
///
/// Rejects empty required fields, a column count other than
/// [`NUM_COLUMNS`], parent/child id disagreements, malformed card ids,
/// duplicate card ids within a group, a zero `last_modified`, and any
/// action other than a complete `upVote`. Editability is forced off on
/// every group and card regardless of what the participant sent.
pub fn validate(state: &mut State) -> Result<(), DataError> {
    if state.room_id.is_empty() {
        return Err(DataError::Empty("room id"));
    }

    if state.columns.len() != NUM_COLUMNS {
        return Err(DataError::ColumnCount {
            got: state.columns.len(),
            expected: NUM_COLUMNS,
        });
    }

    for column in &mut state.columns {
        if column.id.is_empty() {
            return Err(DataError::Empty("column id"));
        }

        if column.title.is_empty() {
            return Err(DataError::Empty("column title"));
        }

        if column.card_style.background_color.is_empty() {
            return Err(DataError::Empty("background color"));
        }

        if column.groups.is_empty() {
            return Err(DataError::Empty("column groups"));
        }

        for group in &mut column.groups {
            if group.id.is_empty() {
                return Err(DataError::Empty("group id"));
            }

            if group.title.is_empty() {
                return Err(DataError::Empty("group title"));
            }

            if group.column_id != column.id {
                return Err(DataError::GroupColumnMismatch {
                    got: group.column_id.clone(),
                    expected: column.id.clone(),
                });
            }

            group.is_editable = false;

            let mut seen = HashSet::new();

            for card in &mut group.retro_cards {
                validate_card(card)?;

                if card.group_id != group.id {
                    return Err(DataError::CardGroupMismatch {
                        got: card.group_id.clone(),
                        expected: group.id.clone(),
                    });
                }

                if card.column_id != group.column_id {
                    return Err(DataError::CardColumnMismatch {
                        got: card.column_id.clone(),
                        expected: group.column_id.clone(),
                    });
                }

                if !seen.insert(card.id.clone()) {
                    return Err(DataError::DuplicateCardId(card.id.clone()));
                }

                card.is_editable = false;
            }
        }
    }

    if let Some(action) = &mut state.action {
        validate_action(action)?;
    }

    Ok(())
}

/// Card-level checks shared by board cards and action cards.
fn validate_card(card: &RetroCard) -> Result<(), DataError> {
    // Also rejects a non-numeric suffix after the separator.
    CardId::parse(&card.id)?;

    if card.column_id.is_empty() {
        return Err(DataError::Empty("card column id"));
    }

    if card.message.is_empty() {
        return Err(DataError::Empty("card message"));
    }

    if card.group_id.is_empty() {
        return Err(DataError::Empty("card group id"));
    }

    if card.last_modified == 0 {
        return Err(DataError::ZeroLastModified(card.id.clone()));
    }

    Ok(())
}

fn validate_action(action: &mut Action) -> Result<(), DataError> {
    if action.title != UP_VOTE {
        return Err(DataError::InvalidActionTitle(action.title.clone()));
    }

    match (&mut action.old_card, &mut action.new_card) {
        (Some(old_card), Some(new_card)) => {
            validate_card(old_card)?;
            validate_card(new_card)?;
            old_card.is_editable = false;
            new_card.is_editable = false;
            Ok(())
        }
        (None, _) => Err(DataError::IncompleteAction("old")),
        (_, None) => Err(DataError::IncompleteAction("new")),
    }
}
