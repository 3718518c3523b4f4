//! Per-tick task queue.
//!
//! Replaces coroutine-style delayed effects with explicit records polled
//! once per tick: an effect-over-duration is `{remaining, delta}`, and a
//! signal chain deeper than the hop limit is continued next tick instead
//! of recursing further.

use trench_net::EntityId;

/// Maximum signal hops processed within one tick before deferral.
pub const MAX_SIGNAL_DEPTH: u8 = 10;

/// A signal whose remaining propagation was pushed to the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignal {
    /// Target item.
    pub target: EntityId,
    /// Connection name (e.g. `toggle`).
    pub connection: String,
    /// Signal value.
    pub value: String,
}

/// A condition change stretched over a duration.
#[derive(Debug, Clone, PartialEq)]
struct ConditionTask {
    item: EntityId,
    delta_per_sec: f32,
    remaining: f32,
}

/// Explicit per-tick scheduler for delayed work.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<ConditionTask>,
    deferred_signals: Vec<PendingSignal>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition-over-time task.
    pub fn add_condition_task(&mut self, item: EntityId, delta_per_sec: f32, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.tasks.push(ConditionTask {
            item,
            delta_per_sec,
            remaining: duration,
        });
    }

    /// Defers the continuation of an over-deep signal chain to the next
    /// tick.
    pub fn defer_signal(&mut self, signal: PendingSignal) {
        self.deferred_signals.push(signal);
    }

    /// Drains signals deferred during the previous tick.
    pub fn take_deferred_signals(&mut self) -> Vec<PendingSignal> {
        std::mem::take(&mut self.deferred_signals)
    }

    /// Number of live duration tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Advances all duration tasks by `dt` and returns the condition
    /// deltas to apply this tick, in task order.
    pub fn tick(&mut self, dt: f32) -> Vec<(EntityId, f32)> {
        let mut deltas = Vec::new();
        for task in &mut self.tasks {
            let step = dt.min(task.remaining);
            deltas.push((task.item, task.delta_per_sec * step));
            task.remaining -= step;
        }
        self.tasks.retain(|t| t.remaining > 0.0);
        deltas
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_applies_over_duration() {
        let mut scheduler = Scheduler::new();
        scheduler.add_condition_task(EntityId(1), -10.0, 2.0);

        let mut total = 0.0;
        for _ in 0..4 {
            for (item, delta) in scheduler.tick(1.0) {
                assert_eq!(item, EntityId(1));
                total += delta;
            }
        }
        // -10/sec over 2 s, then nothing.
        assert!((total + 20.0).abs() < 1e-4);
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_partial_final_step() {
        let mut scheduler = Scheduler::new();
        scheduler.add_condition_task(EntityId(2), 6.0, 0.5);

        let deltas = scheduler.tick(1.0);
        assert_eq!(deltas.len(), 1);
        // Only the remaining half second counts.
        assert!((deltas[0].1 - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_duration_ignored() {
        let mut scheduler = Scheduler::new();
        scheduler.add_condition_task(EntityId(1), 5.0, 0.0);
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_deferred_signals_drain_once() {
        let mut scheduler = Scheduler::new();
        scheduler.defer_signal(PendingSignal {
            target: EntityId(3),
            connection: "toggle".into(),
            value: "1".into(),
        });

        let drained = scheduler.take_deferred_signals();
        assert_eq!(drained.len(), 1);
        assert!(scheduler.take_deferred_signals().is_empty());
    }
}
