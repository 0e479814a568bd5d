// src/events.rs
//
// One JSON line per completed decision cycle. A downstream dashboard or a
// post-run analysis can replay what the controller saw and decided.

use crate::types::{CountSnapshot, Selection};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub counts: BTreeMap<u8, u32>,
    pub command: i32,
    pub green_secs: Option<u64>,
}

impl CycleRecord {
    pub fn new(
        cycle: u64,
        snapshot: &CountSnapshot,
        selection: Selection,
        green_secs: Option<u64>,
    ) -> Self {
        Self {
            cycle,
            counts: snapshot.iter().map(|(lane, count)| (lane.0, count)).collect(),
            command: selection.command_id(),
            green_secs,
        }
    }
}

pub struct EventLog {
    file: File,
}

impl EventLog {
    pub fn create(path: &str) -> Result<Self> {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&path)?;
        info!("💾 Cycle records will be written to: {}", path.display());
        Ok(Self { file })
    }

    pub fn append(&mut self, record: &CycleRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LaneId;

    #[test]
    fn test_cycle_record_serializes_wire_command() {
        let mut counts = BTreeMap::new();
        counts.insert(LaneId(1), 3);
        counts.insert(LaneId(2), 0);
        let snapshot = CountSnapshot::new(counts);

        let record = CycleRecord::new(7, &snapshot, Selection::Green(LaneId(1)), Some(6));
        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["cycle"], 7);
        assert_eq!(value["command"], 1);
        assert_eq!(value["green_secs"], 6);
        assert_eq!(value["counts"]["1"], 3);
        assert_eq!(value["counts"]["2"], 0);
    }

    #[test]
    fn test_all_red_record_has_no_green_secs() {
        let snapshot = CountSnapshot::new(BTreeMap::new());
        let record = CycleRecord::new(1, &snapshot, Selection::AllRed, None);
        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["command"], -1);
        assert!(value["green_secs"].is_null());
    }
}
