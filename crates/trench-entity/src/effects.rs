//! Status effects: typed condition changes fired by triggers.
//!
//! An effect either applies instantly or stretches over a duration, in
//! which case it becomes a per-tick task on the [`Scheduler`] instead of
//! a coroutine.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler

/// What fires an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Every tick while the item exists.
    Always,
    /// The item was used.
    OnUse,
    /// The owning component is running.
    OnActive,
    /// Condition crossed down to zero.
    OnBroken,
}

impl ActionType {
    /// All action types, in wire order.
    pub const ALL: [ActionType; 4] = [
        ActionType::Always,
        ActionType::OnUse,
        ActionType::OnActive,
        ActionType::OnBroken,
    ];

    /// Wire discriminant.
    pub fn discriminant(self) -> u8 {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0) as u8
    }

    /// Decodes a wire discriminant.
    pub fn from_discriminant(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

/// A condition delta fired by an action.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffect {
    /// The trigger.
    pub action: ActionType,
    /// Total condition change (per second when `duration` is set).
    pub condition_delta: f32,
    /// Stretch the effect over this many seconds instead of applying it
    /// at once.
    pub duration: Option<f32>,
}
