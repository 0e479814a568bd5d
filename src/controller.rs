// src/controller.rs
//
// The arbitration state machine. One decision and one actuation command per
// cycle; sampling keeps running during the dwell for display only. Every exit
// path, cancelled or not, forces a final all-red command before the
// collaborators are released.

use crate::actuator::SignalActuator;
use crate::config::Config;
use crate::dwell;
use crate::events::{CycleRecord, EventLog};
use crate::probe::DensityProbe;
use crate::selector;
use crate::types::{ControllerState, CountSnapshot, Lane, LaneId, Selection};
use anyhow::Result;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub green_bias_secs: u64,
    pub all_red_cooldown: Duration,
    pub poll_during_green: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            green_bias_secs: 0,
            all_red_cooldown: Duration::from_secs(1),
            poll_during_green: true,
        }
    }
}

impl LoopConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            green_bias_secs: config.timing.green_bias_secs,
            all_red_cooldown: Duration::from_secs(config.timing.all_red_cooldown_secs),
            poll_during_green: config.telemetry.poll_during_green,
        }
    }
}

pub struct ControlLoop<P: DensityProbe, A: SignalActuator> {
    lanes: Vec<Lane>,
    primary: LaneId,
    config: LoopConfig,
    probe: P,
    actuator: A,
    events: Option<EventLog>,
    last_counts: BTreeMap<LaneId, u32>,
    state: ControllerState,
    cycle: u64,
    shutdown: watch::Receiver<bool>,
}

impl<P: DensityProbe, A: SignalActuator> ControlLoop<P, A> {
    pub fn new(
        lanes: Vec<Lane>,
        primary: LaneId,
        config: LoopConfig,
        probe: P,
        actuator: A,
        events: Option<EventLog>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            lanes,
            primary,
            config,
            probe,
            actuator,
            events,
            last_counts: BTreeMap::new(),
            state: ControllerState::Sampling,
            cycle: 0,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "▶️  Control loop started ({} lanes, primary = lane {})",
            self.lanes.len(),
            self.primary
        );
        let result = self.drive().await;
        self.force_all_red();
        info!("⏹  Control loop stopped after {} cycle(s)", self.cycle);
        result
    }

    async fn drive(&mut self) -> Result<()> {
        loop {
            if self.cancelled() {
                return Ok(());
            }

            self.set_state(ControllerState::Sampling);
            self.cycle += 1;
            let snapshot = self.take_snapshot();
            info!(
                "📷 Cycle {} counts: {}",
                self.cycle,
                self.format_counts(&snapshot)
            );

            // A stop that arrived while probing must not produce one more
            // green command.
            if self.cancelled() {
                return Ok(());
            }

            match selector::select(&snapshot, self.primary) {
                Selection::AllRed => {
                    info!("🔴 Cycle {}: no traffic observed, holding all-red", self.cycle);
                    self.set_state(ControllerState::AllRed);
                    self.emit(Selection::AllRed);
                    self.record_cycle(&snapshot, Selection::AllRed, None);
                    if self.wait_or_cancel(self.config.all_red_cooldown).await {
                        return Ok(());
                    }
                }
                selection @ Selection::Green(lane) => {
                    let count = snapshot.get(lane).unwrap_or(0);
                    let green_secs = dwell::green_duration(count, self.config.green_bias_secs);
                    info!(
                        "🟢 Cycle {}: {} gets green for {}s ({} vehicle(s))",
                        self.cycle,
                        self.lane_name(lane),
                        green_secs,
                        count
                    );
                    self.emit(selection);
                    self.record_cycle(&snapshot, selection, Some(green_secs));
                    if self.hold_green(lane, green_secs).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Real-time dwell wait. The countdown is driven by elapsed wall-clock
    /// time, not loop iterations, so a slow telemetry poll cannot stretch the
    /// green. Exactly one actuation per cycle: nothing is emitted in here.
    async fn hold_green(&mut self, lane: LaneId, green_secs: u64) -> bool {
        let started = Instant::now();
        loop {
            let elapsed = started.elapsed().as_secs();
            if elapsed >= green_secs {
                break;
            }
            let remaining = green_secs - elapsed;
            self.set_state(ControllerState::SignalActive {
                lane,
                remaining_secs: remaining,
            });
            debug!("⏳ {}: {}s of green remaining", self.lane_name(lane), remaining);
            if self.config.poll_during_green {
                self.poll_for_display();
            }
            if self.wait_or_cancel(Duration::from_secs(1)).await {
                return true;
            }
        }
        false
    }

    /// Probe every configured lane once. A failed probe degrades to the
    /// lane's last-known count (zero if none yet) and never aborts the cycle.
    fn take_snapshot(&mut self) -> CountSnapshot {
        let mut counts = BTreeMap::new();
        for lane in &self.lanes {
            match self.probe.sample(lane.id) {
                Ok(count) => {
                    self.last_counts.insert(lane.id, count);
                    counts.insert(lane.id, count);
                }
                Err(e) => {
                    let fallback = self.last_counts.get(&lane.id).copied().unwrap_or(0);
                    warn!(
                        "⚠️  {}: probe failed ({}), using last known count {}",
                        lane.name, e, fallback
                    );
                    counts.insert(lane.id, fallback);
                }
            }
        }
        CountSnapshot::new(counts)
    }

    /// Display-only sampling during the dwell. Decisions are untouched.
    fn poll_for_display(&mut self) {
        for lane in &self.lanes {
            match self.probe.sample(lane.id) {
                Ok(count) => debug!("👁  {}: {} vehicle(s) in view", lane.name, count),
                Err(e) => debug!("👁  {}: no frame ({})", lane.name, e),
            }
        }
    }

    fn emit(&mut self, selection: Selection) {
        if let Err(e) = self.actuator.emit(selection) {
            // A stale signal is corrected next cycle; no mid-cycle retry.
            warn!(
                "⚠️  Actuator write failed ({}), command {} dropped until next cycle",
                e,
                selection.command_id()
            );
        }
    }

    fn force_all_red(&mut self) {
        info!("🔴 Shutdown: forcing all-red");
        self.set_state(ControllerState::AllRed);
        self.emit(Selection::AllRed);
    }

    async fn wait_or_cancel(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => false,
            changed = self.shutdown.changed() => match changed {
                Ok(()) => *self.shutdown.borrow(),
                // Sender gone means nobody can ask for shutdown later; stop.
                Err(_) => true,
            },
        }
    }

    fn cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn set_state(&mut self, next: ControllerState) {
        self.state = next;
        debug!("state → {:?}", self.state);
    }

    fn record_cycle(
        &mut self,
        snapshot: &CountSnapshot,
        selection: Selection,
        green_secs: Option<u64>,
    ) {
        if let Some(log) = self.events.as_mut() {
            let record = CycleRecord::new(self.cycle, snapshot, selection, green_secs);
            if let Err(e) = log.append(&record) {
                warn!("Failed to append cycle record: {}", e);
            }
        }
    }

    fn lane_name(&self, lane: LaneId) -> String {
        self.lanes
            .iter()
            .find(|l| l.id == lane)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| format!("lane {}", lane))
    }

    fn format_counts(&self, snapshot: &CountSnapshot) -> String {
        self.lanes
            .iter()
            .map(|lane| format!("{}={}", lane.name, snapshot.get(lane.id).unwrap_or(0)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
