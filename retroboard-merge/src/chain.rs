//! Card-chain traversal over a board's vote table.
//!
//! A chain is enumerated from `-pk-0` upward until the first absent index.
//! The id that seeds the traversal contributes its own votes even when a gap
//! in the chain makes it unreachable from index zero.

use retroboard_data::CardId;
use std::collections::HashMap;

/// The maximum vote count across the chain of `id`.
///
/// Returns `None` when `id` itself is not on the board.
pub(crate) fn chain_max(id: &str, votes: &HashMap<String, u64>) -> Option<u64> {
    let mut max = *votes.get(id)?;

    let Ok(card_id) = CardId::parse(id) else {
        return Some(max);
    };

    for pk in 0.. {
        let Some(&v) = votes.get(&card_id.sibling(pk).to_string()) else {
            break;
        };

        if v > max {
            max = v;
        }
    }

    Some(max)
}

/// Assigns `num_votes` to every chain member reachable from `-pk-0`.
pub(crate) fn apply_chain(id: &str, votes: &mut HashMap<String, u64>, num_votes: u64) {
    let Ok(card_id) = CardId::parse(id) else {
        return;
    };

    for pk in 0.. {
        let member = card_id.sibling(pk).to_string();

        if !votes.contains_key(&member) {
            break;
        }

        votes.insert(member, num_votes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries
            .iter()
            .map(|(id, v)| ((*id).to_string(), *v))
            .collect()
    }

    #[test]
    fn max_spans_the_whole_chain() {
        let votes = table(&[("u-pk-0", 1), ("u-pk-1", 4), ("u-pk-2", 2)]);
        assert_eq!(chain_max("u-pk-0", &votes), Some(4));
    }

    #[test]
    fn max_stops_at_the_first_gap() {
        let votes = table(&[("u-pk-0", 1), ("u-pk-2", 9)]);
        assert_eq!(chain_max("u-pk-0", &votes), Some(1));
    }

    #[test]
    fn seed_beyond_a_gap_still_counts_itself() {
        let votes = table(&[("u-pk-2", 9)]);
        assert_eq!(chain_max("u-pk-2", &votes), Some(9));
    }

    #[test]
    fn absent_seed_yields_none() {
        let votes = table(&[("u-pk-0", 1)]);
        assert_eq!(chain_max("v-pk-0", &votes), None);
    }

    #[test]
    fn apply_rewrites_every_reachable_member() {
        let mut votes = table(&[("u-pk-0", 1), ("u-pk-1", 4), ("w-pk-0", 7)]);
        apply_chain("u-pk-1", &mut votes, 4);

        assert_eq!(votes["u-pk-0"], 4);
        assert_eq!(votes["u-pk-1"], 4);
        assert_eq!(votes["w-pk-0"], 7);
    }
}
