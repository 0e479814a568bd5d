// src/probe.rs

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::types::LaneId;
use std::collections::BTreeMap;
use tracing::info;

/// Source of per-lane vehicle counts. How a count is produced (detector,
/// loop sensor, recorded trace) is the implementation's concern; the control
/// loop only sees non-negative counts and transient failures.
pub trait DensityProbe {
    fn sample(&mut self, lane: LaneId) -> Result<u32, ProbeError>;
}

/// Replays recorded per-lane count traces from configuration.
///
/// Each sample advances the lane's trace by one entry; a trace that reaches
/// its end rewinds to the start, the same way a looped camera feed restarts.
/// A lane with no trace (or an empty one) reports `ProbeError::Unavailable`,
/// leaving the fallback policy to the caller.
pub struct ReplayProbe {
    traces: BTreeMap<LaneId, Trace>,
}

struct Trace {
    counts: Vec<u32>,
    cursor: usize,
}

impl ReplayProbe {
    pub fn from_config(config: &ProbeConfig) -> Self {
        let traces = config
            .traces
            .iter()
            .map(|(lane, counts)| {
                (
                    *lane,
                    Trace {
                        counts: counts.clone(),
                        cursor: 0,
                    },
                )
            })
            .collect();
        let probe = Self { traces };
        info!("✓ Replay probe ready ({} lane trace(s))", probe.traces.len());
        probe
    }
}

impl DensityProbe for ReplayProbe {
    fn sample(&mut self, lane: LaneId) -> Result<u32, ProbeError> {
        let trace = self
            .traces
            .get_mut(&lane)
            .ok_or(ProbeError::Unavailable(lane))?;
        if trace.counts.is_empty() {
            return Err(ProbeError::Unavailable(lane));
        }
        let count = trace.counts[trace.cursor];
        trace.cursor = (trace.cursor + 1) % trace.counts.len();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_with(traces: &[(u8, &[u32])]) -> ReplayProbe {
        let config = ProbeConfig {
            traces: traces
                .iter()
                .map(|&(id, counts)| (LaneId(id), counts.to_vec()))
                .collect(),
        };
        ReplayProbe::from_config(&config)
    }

    #[test]
    fn test_trace_advances_then_rewinds() {
        let mut probe = probe_with(&[(1, &[3, 1, 0])]);
        assert_eq!(probe.sample(LaneId(1)).unwrap(), 3);
        assert_eq!(probe.sample(LaneId(1)).unwrap(), 1);
        assert_eq!(probe.sample(LaneId(1)).unwrap(), 0);
        // Exhausted: rewind to the start, like a looped feed.
        assert_eq!(probe.sample(LaneId(1)).unwrap(), 3);
    }

    #[test]
    fn test_unknown_lane_is_unavailable() {
        let mut probe = probe_with(&[(1, &[2])]);
        assert!(matches!(
            probe.sample(LaneId(7)),
            Err(ProbeError::Unavailable(LaneId(7)))
        ));
    }

    #[test]
    fn test_empty_trace_is_unavailable() {
        let mut probe = probe_with(&[(2, &[])]);
        assert!(matches!(
            probe.sample(LaneId(2)),
            Err(ProbeError::Unavailable(LaneId(2)))
        ));
    }
}
