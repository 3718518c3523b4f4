//! Door component: an openable barrier with weld/stuck state.
//!
//! The open flag is the canonical example of predicted toggle state:
//! a client receiving a `toggle` signal flips the door immediately and
//! arms the reset window; the server's confirmed state always wins when
//! it arrives. The stuck amount is server-authoritative and travels as a
//! ranged 8-bit float.

use trench_net::{Authority, BitReader, BitWriter, PredictionState, ProtocolError};

use super::{Component, ComponentCtx, ServerSerializable};

/// How far the door state moves per second while animating.
const OPEN_SPEED: f32 = 2.0;

/// Stuck reduction applied whenever the door opens.
const OPEN_UNSTICK: f32 = 30.0;

/// An openable door or hatch.
#[derive(Debug)]
pub struct Door {
    state: PredictionState<bool>,
    /// Animation position in `[0, 1]`.
    open_amount: f32,
    /// Weld amount in `[0, 100]`; at 100 the door cannot move.
    stuck: f32,
}

impl Door {
    /// Creates a door in the given state.
    pub fn new(is_open: bool) -> Self {
        Self {
            state: PredictionState::confirmed(is_open),
            open_amount: if is_open { 1.0 } else { 0.0 },
            stuck: 0.0,
        }
    }

    /// The effective open flag (predicted if a prediction is pending).
    pub fn is_open(&self) -> bool {
        *self.state.value()
    }

    /// Whether a client-side prediction is pending.
    pub fn is_predicted(&self) -> bool {
        self.state.is_predicted()
    }

    /// Current animation position in `[0, 1]`.
    pub fn open_amount(&self) -> f32 {
        self.open_amount
    }

    /// Current weld amount.
    pub fn stuck(&self) -> f32 {
        self.stuck
    }

    /// Sets the weld amount. Open doors cannot be welded.
    pub fn set_stuck(&mut self, value: f32) {
        if self.is_open() {
            return;
        }
        self.stuck = value.clamp(0.0, 100.0);
    }

    /// Changes the open state.
    ///
    /// On a client, a local change (signal or interaction) is applied as
    /// a prediction with the reset window from `ctx`; a network-confirmed
    /// change overwrites unconditionally. On the server every change is
    /// authoritative and requests a rebroadcast.
    pub fn set_state(&mut self, open: bool, is_network: bool, ctx: &mut ComponentCtx) {
        if self.stuck >= 100.0 {
            return;
        }
        if self.is_open() == open {
            return;
        }

        match (ctx.authority, is_network) {
            (Authority::Client, false) => {
                ctx.play_sound("door_move");
                self.state.predict(Authority::Client, open, ctx.correction_window);
            }
            (Authority::Client, true) => {
                self.state.confirm(open);
            }
            (Authority::Server, _) => {
                ctx.play_sound("door_move");
                self.state.confirm(open);
                ctx.request_sync();
            }
        }

        // Forcing a welded door open loosens the weld.
        if open {
            self.stuck = (self.stuck - OPEN_UNSTICK).clamp(0.0, 100.0);
        }
    }
}

impl Component for Door {
    fn type_name(&self) -> &'static str {
        "door"
    }

    fn update(&mut self, dt: f32, _ctx: &mut ComponentCtx) {
        // Prediction reset is polled every tick, not scheduled.
        self.state.tick();

        if self.stuck < 100.0 {
            let direction = if self.is_open() { 1.0 } else { -1.0 };
            self.open_amount = (self.open_amount + direction * OPEN_SPEED * dt).clamp(0.0, 1.0);
        }
    }

    fn receive_signal(&mut self, connection: &str, value: &str, ctx: &mut ComponentCtx) {
        match connection {
            "toggle" => self.set_state(!self.is_open(), false, ctx),
            "set_state" => self.set_state(value != "0", false, ctx),
            _ => {}
        }
    }

    fn server_serializable(&self) -> Option<&dyn ServerSerializable> {
        Some(self)
    }

    fn server_serializable_mut(&mut self) -> Option<&mut dyn ServerSerializable> {
        Some(self)
    }
}

impl ServerSerializable for Door {
    fn server_write(&self, writer: &mut BitWriter) {
        writer.write_bool(*self.state.value());
        writer.write_ranged_f32(self.stuck, 0.0, 100.0, 8);
    }

    fn client_read(
        &mut self,
        reader: &mut BitReader,
        ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError> {
        let open = reader.read_bool()?;
        let stuck = reader.read_ranged_f32(0.0, 100.0, 8)?;

        self.set_state(open, true, ctx);
        // Confirm clears any prediction even when the value matches.
        self.state.confirm(open);
        self.stuck = stuck;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
