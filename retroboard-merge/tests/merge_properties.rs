//! Property-based tests for the merge lattice laws.
//!
//! Boards are generated over a shared pool of card chains and the three
//! fixed columns, the way the live system produces them: chain members are
//! complete and carry equal vote counts within one snapshot. The laws:
//!
//! - Idempotence: merge(b, b) == b
//! - Additivity: merged groups ⊇ old groups ∪ incoming groups (by id)
//! - Vote monotonicity: merged votes never drop below either input
//! - Delete monotonicity: a deleted card never comes back
//! - Chain equality: all chain members share one vote count
//! - Action stripping and structural preservation

use proptest::prelude::*;
use retroboard_merge::merge;
use retroboard_data::{CardStyle, Column, Group, RetroCard, State};
use std::collections::{HashMap, HashSet};

const COLUMN_IDS: [&str; 3] = ["0", "1", "3"];
const CHAIN_BASES: [&str; 4] = ["aaaa", "bbbb", "cccc", "dddd"];
const MAX_MEMBERS: usize = 3;

/// Shape shared by both boards of a scenario: which column each chain lives
/// in and how many members it has.
#[derive(Debug, Clone)]
struct ChainShape {
    base: &'static str,
    column: usize,
    members: usize,
}

/// One board's view of a chain. Member arrays are sized for the largest
/// possible chain; the shape's `members` decides how much of them is used.
#[derive(Debug, Clone)]
struct ChainView {
    present: bool,
    votes: u64,
    deleted: [bool; MAX_MEMBERS],
    last_modified: [i64; MAX_MEMBERS],
    /// Group slot (0 = default, 1/2 = extra groups) per member.
    groups: [usize; MAX_MEMBERS],
}

#[derive(Debug, Clone)]
struct BoardSpec {
    views: [ChainView; 4],
    /// Adds an empty extra group per column.
    empty_extras: [bool; 3],
}

fn group_id(column: usize, slot: usize) -> String {
    if slot == 0 {
        "default".to_string()
    } else {
        format!("{}-grp-{}", COLUMN_IDS[column], slot)
    }
}

fn ensure_group(columns: &mut [Column], column: usize, slot: usize) -> usize {
    let id = group_id(column, slot);
    let groups = &mut columns[column].groups;

    if let Some(i) = groups.iter().position(|g| g.id == id) {
        return i;
    }

    groups.push(Group {
        id,
        column_id: COLUMN_IDS[column].to_string(),
        is_editable: false,
        title: format!("group {slot}"),
        retro_cards: Vec::new(),
    });
    groups.len() - 1
}

fn build_board(shapes: &[ChainShape; 4], spec: &BoardSpec) -> State {
    let mut columns: Vec<Column> = COLUMN_IDS
        .iter()
        .map(|id| Column {
            id: (*id).to_string(),
            title: format!("column {id}"),
            card_style: CardStyle {
                background_color: "bg-primary".to_string(),
            },
            groups: vec![Group {
                id: "default".to_string(),
                column_id: (*id).to_string(),
                is_editable: false,
                title: "ungrouped cards".to_string(),
                retro_cards: Vec::new(),
            }],
        })
        .collect();

    for (shape, view) in shapes.iter().zip(&spec.views) {
        if !view.present {
            continue;
        }

        for member in 0..shape.members {
            let slot = view.groups[member];
            let gi = ensure_group(&mut columns, shape.column, slot);
            let group = &mut columns[shape.column].groups[gi];

            group.retro_cards.push(RetroCard {
                id: format!("{}-pk-{}", shape.base, member),
                column_id: COLUMN_IDS[shape.column].to_string(),
                message: format!("card {member} of {}", shape.base),
                num_votes: view.votes,
                is_editable: false,
                group_id: group.id.clone(),
                is_deleted: view.deleted[member],
                last_modified: view.last_modified[member],
            });
        }
    }

    for (column, add) in spec.empty_extras.iter().enumerate() {
        if *add {
            ensure_group(&mut columns, column, 2);
        }
    }

    State {
        room_id: "testroom".to_string(),
        columns,
        action: None,
    }
}

fn arb_shape(chain: usize) -> impl Strategy<Value = ChainShape> {
    (0usize..3, 1usize..=MAX_MEMBERS).prop_map(move |(column, members)| ChainShape {
        base: CHAIN_BASES[chain],
        column,
        members,
    })
}

fn arb_shapes() -> impl Strategy<Value = [ChainShape; 4]> {
    [arb_shape(0), arb_shape(1), arb_shape(2), arb_shape(3)]
}

fn arb_view() -> impl Strategy<Value = ChainView> {
    (
        any::<bool>(),
        0u64..10,
        any::<[bool; MAX_MEMBERS]>(),
        [1i64..1000, 1i64..1000, 1i64..1000],
        [0usize..3, 0usize..3, 0usize..3],
    )
        .prop_map(|(present, votes, deleted, last_modified, groups)| ChainView {
            present,
            votes,
            deleted,
            last_modified,
            groups,
        })
}

fn arb_spec() -> impl Strategy<Value = BoardSpec> {
    (
        [arb_view(), arb_view(), arb_view(), arb_view()],
        any::<[bool; 3]>(),
    )
        .prop_map(|(views, empty_extras)| BoardSpec {
            views,
            empty_extras,
        })
}

fn arb_board_pair() -> impl Strategy<Value = (State, State)> {
    (arb_shapes(), arb_spec(), arb_spec()).prop_map(|(shapes, old, incoming)| {
        (build_board(&shapes, &old), build_board(&shapes, &incoming))
    })
}

fn votes_by_id(state: &State) -> HashMap<String, u64> {
    state
        .cards()
        .map(|c| (c.id.clone(), c.num_votes))
        .collect()
}

fn group_ids(state: &State, column: usize) -> HashSet<String> {
    state.columns[column]
        .groups
        .iter()
        .map(|g| g.id.clone())
        .collect()
}

proptest! {
    #[test]
    fn merge_is_idempotent((board, _) in arb_board_pair()) {
        let merged = merge(&board, &board).unwrap();
        prop_assert_eq!(merged, board);
    }

    #[test]
    fn merge_preserves_structure((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();

        prop_assert_eq!(merged.columns.len(), old.columns.len());
        for (m, o) in merged.columns.iter().zip(&old.columns) {
            prop_assert_eq!(&m.id, &o.id);
        }
    }

    #[test]
    fn merge_is_additive_over_groups((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();

        for column in 0..COLUMN_IDS.len() {
            let got = group_ids(&merged, column);
            for expected in group_ids(&old, column).union(&group_ids(&incoming, column)) {
                prop_assert!(got.contains(expected), "group '{}' lost from column {}", expected, column);
            }
        }
    }

    #[test]
    fn votes_never_decrease((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();
        let got = votes_by_id(&merged);

        for (id, votes) in votes_by_id(&old).iter().chain(votes_by_id(&incoming).iter()) {
            let merged_votes = got.get(id).copied().unwrap_or(0);
            prop_assert!(
                merged_votes >= *votes,
                "votes for '{}' dropped from {} to {}", id, votes, merged_votes
            );
        }
    }

    #[test]
    fn deletion_is_monotone((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();

        for card in old.cards().chain(incoming.cards()) {
            if card.is_deleted {
                let survivor = merged.find_card(&card.id);
                prop_assert!(
                    survivor.is_some_and(|c| c.is_deleted),
                    "deleted card '{}' resurfaced", card.id
                );
            }
        }
    }

    #[test]
    fn chains_carry_equal_votes((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();

        let mut by_base: HashMap<&str, HashSet<u64>> = HashMap::new();
        for card in merged.cards() {
            for base in CHAIN_BASES {
                if card.id.starts_with(base) {
                    by_base.entry(base).or_default().insert(card.num_votes);
                }
            }
        }

        for (base, votes) in by_base {
            prop_assert!(votes.len() == 1, "chain '{}' has unequal votes {:?}", base, votes);
        }
    }

    #[test]
    fn no_duplicate_ids_survive((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();

        let mut seen = HashSet::new();
        for card in merged.cards() {
            prop_assert!(seen.insert(card.id.clone()), "duplicate id '{}' survived", card.id);
        }
    }

    #[test]
    fn the_action_is_always_stripped((old, incoming) in arb_board_pair()) {
        let merged = merge(&old, &incoming).unwrap();
        prop_assert!(merged.action.is_none());
    }
}
