//! Cooldown ledger - per-worker rest time after each assignment.
//!
//! Unknown worker ids are never an error: queries report no cooldown and
//! starts are ignored.

use std::time::Duration;

use crate::components::{Worker, WorkerId};

#[derive(Debug, Clone)]
struct CooldownEntry {
    worker: Worker,
    remaining: Duration,
}

/// Cooldown state for the current roster, in roster order
#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    entries: Vec<CooldownEntry>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster. Every worker starts ready.
    pub fn reset(&mut self, roster: &[Worker]) {
        self.entries = roster
            .iter()
            .map(|worker| CooldownEntry {
                worker: worker.clone(),
                remaining: Duration::ZERO,
            })
            .collect();
    }

    /// Advance every running cooldown by `dt`, clamping at zero.
    ///
    /// Returns the workers whose remaining time changed, with the new value.
    pub fn tick(&mut self, dt: Duration) -> Vec<(WorkerId, Duration)> {
        let mut changed = Vec::new();
        if dt.is_zero() {
            return changed;
        }

        for entry in &mut self.entries {
            if entry.remaining.is_zero() {
                continue;
            }
            entry.remaining = entry.remaining.saturating_sub(dt);
            changed.push((entry.worker.id.clone(), entry.remaining));
        }

        changed
    }

    /// Put a worker on full cooldown. Returns the new remaining time, or
    /// `None` when the worker is not on the roster.
    pub fn start(&mut self, worker_id: &WorkerId) -> Option<Duration> {
        match self.entry_mut(worker_id) {
            Some(entry) => {
                entry.remaining = entry.worker.cooldown_max;
                log::debug!(
                    "Worker {} cooldown started: {:.1}s",
                    worker_id,
                    entry.remaining.as_secs_f32()
                );
                Some(entry.remaining)
            }
            None => {
                log::debug!("Ignoring cooldown start for unknown worker {}", worker_id);
                None
            }
        }
    }

    /// Remaining cooldown, zero for unknown workers
    pub fn query(&self, worker_id: &WorkerId) -> Duration {
        self.entry(worker_id)
            .map(|e| e.remaining)
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_ready(&self, worker_id: &WorkerId) -> bool {
        self.query(worker_id).is_zero()
    }

    pub fn worker(&self, worker_id: &WorkerId) -> Option<&Worker> {
        self.entry(worker_id).map(|e| &e.worker)
    }

    /// Roster with current remaining cooldowns
    pub fn iter(&self) -> impl Iterator<Item = (&Worker, Duration)> {
        self.entries.iter().map(|e| (&e.worker, e.remaining))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, worker_id: &WorkerId) -> Option<&CooldownEntry> {
        self.entries.iter().find(|e| &e.worker.id == worker_id)
    }

    fn entry_mut(&mut self, worker_id: &WorkerId) -> Option<&mut CooldownEntry> {
        self.entries.iter_mut().find(|e| &e.worker.id == worker_id)
    }
}
