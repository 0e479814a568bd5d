// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one traffic approach under arbitration.
///
/// The numeric order over identifiers is also the tie-break order: when two
/// non-primary lanes tie on vehicle count, the smaller identifier wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(pub u8);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One configured lane. The set of lanes is fixed at startup and immutable
/// for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    pub name: String,
}

/// Per-lane vehicle counts gathered in one sampling pass.
///
/// Invariant: exactly one entry per configured lane. The control loop builds
/// a snapshot from its own lane set, so a missing lane cannot occur by
/// construction. Backed by a `BTreeMap` so iteration is in identifier order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSnapshot {
    counts: BTreeMap<LaneId, u32>,
}

impl CountSnapshot {
    pub fn new(counts: BTreeMap<LaneId, u32>) -> Self {
        Self { counts }
    }

    pub fn get(&self, lane: LaneId) -> Option<u32> {
        self.counts.get(&lane).copied()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Iterate in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (LaneId, u32)> + '_ {
        self.counts.iter().map(|(lane, count)| (*lane, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// The outcome of one arbitration pass: a single green lane, or all red.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Green(LaneId),
    AllRed,
}

impl Selection {
    /// Wire value of this selection: the decimal lane identifier, or -1 for
    /// all-red.
    pub fn command_id(&self) -> i32 {
        match self {
            Selection::Green(lane) => i32::from(lane.0),
            Selection::AllRed => -1,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Green(lane) => write!(f, "green for lane {}", lane),
            Selection::AllRed => write!(f, "all-red"),
        }
    }
}

/// Lifecycle state of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Sampling,
    SignalActive { lane: LaneId, remaining_secs: u64 },
    AllRed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_for_green_and_all_red() {
        assert_eq!(Selection::Green(LaneId(2)).command_id(), 2);
        assert_eq!(Selection::AllRed.command_id(), -1);
    }

    #[test]
    fn test_snapshot_max_count() {
        let mut counts = BTreeMap::new();
        counts.insert(LaneId(1), 3);
        counts.insert(LaneId(2), 7);
        counts.insert(LaneId(3), 0);
        let snapshot = CountSnapshot::new(counts);
        assert_eq!(snapshot.max_count(), 7);
        assert_eq!(snapshot.get(LaneId(3)), Some(0));
        assert_eq!(snapshot.get(LaneId(9)), None);
    }

    #[test]
    fn test_snapshot_iterates_in_identifier_order() {
        let mut counts = BTreeMap::new();
        counts.insert(LaneId(4), 1);
        counts.insert(LaneId(2), 1);
        counts.insert(LaneId(3), 1);
        counts.insert(LaneId(1), 1);
        let snapshot = CountSnapshot::new(counts);
        let ids: Vec<u8> = snapshot.iter().map(|(lane, _)| lane.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_snapshot_has_zero_max() {
        let snapshot = CountSnapshot::new(BTreeMap::new());
        assert_eq!(snapshot.max_count(), 0);
        assert!(snapshot.is_empty());
    }
}
