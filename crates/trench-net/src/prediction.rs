//! Client-side optimistic prediction with timer-based commit.
//!
//! When a local input plausibly changes low-stakes toggle state (a door
//! signal, a pump switch), the client flips to the predicted value
//! immediately for responsiveness and arms a reset window. If no
//! authoritative correction arrives before the window lapses, the
//! predicted value is kept as if confirmed; this is optimistic commit,
//! not rollback. An authoritative message always overwrites the
//! prediction unconditionally. Servers never predict.

// ---------------------------------------------------------------------------
// Authority
// ---------------------------------------------------------------------------

/// Which role this peer plays for a given entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The single source of truth; broadcasts confirmed state.
    Server,
    /// Applies confirmed state; may hold short-lived predictions.
    Client,
}

// ---------------------------------------------------------------------------
// PredictionState
// ---------------------------------------------------------------------------

/// Per-entity replicated value: either confirmed by the authority or
/// locally predicted with a remaining tick budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionState<T> {
    /// The last authoritative value.
    Confirmed(T),
    /// A locally predicted value awaiting confirmation.
    Predicted {
        /// The tentative value.
        value: T,
        /// Ticks until the prediction is kept as confirmed.
        remaining_ticks: u32,
    },
}

impl<T: Clone> PredictionState<T> {
    /// Creates a confirmed state.
    pub fn confirmed(value: T) -> Self {
        PredictionState::Confirmed(value)
    }

    /// The effective value right now (predicted if one is pending).
    pub fn value(&self) -> &T {
        match self {
            PredictionState::Confirmed(v) => v,
            PredictionState::Predicted { value, .. } => value,
        }
    }

    /// Returns `true` while a prediction is pending.
    pub fn is_predicted(&self) -> bool {
        matches!(self, PredictionState::Predicted { .. })
    }

    /// Applies a local input optimistically. Only meaningful on clients;
    /// a server calling this is a logic error, so the value is applied
    /// as confirmed instead.
    pub fn predict(&mut self, authority: Authority, value: T, window_ticks: u32) {
        match authority {
            Authority::Client => {
                *self = PredictionState::Predicted {
                    value,
                    remaining_ticks: window_ticks,
                };
            }
            Authority::Server => {
                *self = PredictionState::Confirmed(value);
            }
        }
    }

    /// Applies an authoritative value. Overwrites any pending prediction
    /// unconditionally and clears prediction state.
    pub fn confirm(&mut self, value: T) {
        *self = PredictionState::Confirmed(value);
    }

    /// Advances one tick. On expiry the pending prediction is committed
    /// as if confirmed. Returns `true` if a commit happened this tick.
    pub fn tick(&mut self) -> bool {
        if let PredictionState::Predicted {
            value,
            remaining_ticks,
        } = self
        {
            if *remaining_ticks <= 1 {
                *self = PredictionState::Confirmed(value.clone());
                return true;
            }
            *remaining_ticks -= 1;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_then_timeout_commits() {
        let mut state = PredictionState::confirmed(false);
        state.predict(Authority::Client, true, 3);
        assert!(state.is_predicted());
        assert!(*state.value());

        assert!(!state.tick());
        assert!(!state.tick());
        // Third tick: window lapses, value kept as confirmed.
        assert!(state.tick());
        assert!(!state.is_predicted());
        assert!(*state.value());
    }

    #[test]
    fn test_authoritative_overwrite_wins() {
        let mut state = PredictionState::confirmed(false);
        state.predict(Authority::Client, true, 60);

        // Server says the door stayed closed.
        state.confirm(false);
        assert!(!state.is_predicted());
        assert!(!*state.value());

        // Ticking afterwards changes nothing.
        assert!(!state.tick());
        assert!(!*state.value());
    }

    #[test]
    fn test_server_never_predicts() {
        let mut state = PredictionState::confirmed(false);
        state.predict(Authority::Server, true, 60);
        assert!(!state.is_predicted());
        assert!(*state.value());
    }

    #[test]
    fn test_confirm_matching_prediction_clears_state() {
        let mut state = PredictionState::confirmed(false);
        state.predict(Authority::Client, true, 60);

        // Server agrees with the prediction.
        state.confirm(true);
        assert!(!state.is_predicted());
        assert!(*state.value());
    }

    #[test]
    fn test_zero_window_commits_next_tick() {
        let mut state = PredictionState::confirmed(0u8);
        state.predict(Authority::Client, 7, 0);
        assert!(state.tick());
        assert_eq!(*state.value(), 7);
    }
}
