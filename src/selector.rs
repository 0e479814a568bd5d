// src/selector.rs
//
// Pure lane arbitration. No I/O and no clock: the control loop feeds it one
// snapshot per cycle and acts on the result.

use crate::types::{CountSnapshot, LaneId, Selection};

/// Pick the lane to receive green for the next dwell, or all-red when every
/// lane is empty.
///
/// Tie policy: the primary lane wins every tie it participates in (main road
/// keeps flow under symmetric load); a tie between non-primary lanes goes to
/// the smallest identifier. The snapshot iterates in identifier order, so the
/// result is deterministic for a given input.
pub fn select(snapshot: &CountSnapshot, primary: LaneId) -> Selection {
    let max_count = snapshot.max_count();
    if max_count == 0 {
        return Selection::AllRed;
    }

    if snapshot.get(primary) == Some(max_count) {
        return Selection::Green(primary);
    }

    snapshot
        .iter()
        .find(|(_, count)| *count == max_count)
        .map(|(lane, _)| Selection::Green(lane))
        .unwrap_or(Selection::AllRed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot(counts: &[(u8, u32)]) -> CountSnapshot {
        let map: BTreeMap<LaneId, u32> = counts
            .iter()
            .map(|&(id, count)| (LaneId(id), count))
            .collect();
        CountSnapshot::new(map)
    }

    #[test]
    fn test_all_zero_counts_give_all_red() {
        let snap = snapshot(&[(1, 0), (2, 0), (3, 0), (4, 0)]);
        assert_eq!(select(&snap, LaneId(1)), Selection::AllRed);
    }

    #[test]
    fn test_unique_maximum_wins_regardless_of_primary() {
        let snap = snapshot(&[(1, 1), (2, 8), (3, 1), (4, 1)]);
        assert_eq!(select(&snap, LaneId(1)), Selection::Green(LaneId(2)));
        assert_eq!(select(&snap, LaneId(3)), Selection::Green(LaneId(2)));
    }

    #[test]
    fn test_primary_wins_tie_it_participates_in() {
        let snap = snapshot(&[(1, 3), (2, 3), (3, 1), (4, 0)]);
        assert_eq!(select(&snap, LaneId(1)), Selection::Green(LaneId(1)));
        // Same counts, primary on the other side of the tie.
        assert_eq!(select(&snap, LaneId(2)), Selection::Green(LaneId(2)));
    }

    #[test]
    fn test_non_primary_tie_goes_to_smallest_identifier() {
        let snap = snapshot(&[(1, 1), (2, 5), (3, 5), (4, 2)]);
        assert_eq!(select(&snap, LaneId(1)), Selection::Green(LaneId(2)));
    }

    #[test]
    fn test_selection_is_deterministic_across_repeated_calls() {
        let snap = snapshot(&[(1, 2), (2, 4), (3, 4), (4, 4)]);
        let first = select(&snap, LaneId(1));
        for _ in 0..100 {
            assert_eq!(select(&snap, LaneId(1)), first);
        }
        assert_eq!(first, Selection::Green(LaneId(2)));
    }

    #[test]
    fn test_primary_loses_when_below_maximum() {
        let snap = snapshot(&[(1, 2), (2, 3), (3, 0), (4, 0)]);
        assert_eq!(select(&snap, LaneId(1)), Selection::Green(LaneId(2)));
    }
}
