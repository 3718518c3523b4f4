//! Power container component: a rechargeable battery bank.
//!
//! The recharge speed is adjustable in 10% increments of its maximum, so
//! both directions pack it as a ranged integer in `[0, 10]`. The charge
//! itself is server-authoritative and travels one way as a ranged 8-bit
//! ratio; clients only display it.

use trench_net::{Authority, BitReader, BitWriter, PredictionState, ProtocolError};

use super::{ClientSerializable, Component, ComponentCtx, ServerSerializable};

/// Charge change ratio that triggers a broadcast.
const CHARGE_SYNC_THRESHOLD: f32 = 0.1;

/// A battery bank feeding the grid.
#[derive(Debug)]
pub struct PowerContainer {
    /// Total capacity in kWmin.
    capacity: f32,
    /// Current charge, clamped to `[0, capacity]`.
    charge: f32,
    /// Charge ratio at the last broadcast.
    last_sent_charge: f32,
    /// Replicated recharge speed.
    recharge_speed: PredictionState<f32>,
    /// Upper bound for the recharge speed.
    max_recharge_speed: f32,
    /// Maximum power output to the grid.
    max_output: f32,
    /// Current output, recomputed every tick.
    curr_output: f32,
}

impl PowerContainer {
    /// Creates an empty container.
    pub fn new(capacity: f32, max_recharge_speed: f32, max_output: f32) -> Self {
        Self {
            capacity: capacity.max(1.0),
            charge: 0.0,
            last_sent_charge: 0.0,
            recharge_speed: PredictionState::confirmed(0.0),
            max_recharge_speed: max_recharge_speed.max(1.0),
            max_output,
            curr_output: 0.0,
        }
    }

    /// Current charge.
    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Charge as a ratio of capacity.
    pub fn charge_ratio(&self) -> f32 {
        (self.charge / self.capacity).clamp(0.0, 1.0)
    }

    /// The effective recharge speed.
    pub fn recharge_speed(&self) -> f32 {
        *self.recharge_speed.value()
    }

    /// Current grid output.
    pub fn curr_output(&self) -> f32 {
        self.curr_output
    }

    /// Snaps a requested speed to 10% increments of the maximum.
    fn quantize_speed(&self, value: f32) -> f32 {
        let step = self.max_recharge_speed * 0.1;
        (value.clamp(0.0, self.max_recharge_speed) / step).round() * step
    }

    /// Sets the recharge speed: predicted on clients, authoritative and
    /// rebroadcast on the server.
    pub fn set_recharge_speed(&mut self, value: f32, ctx: &mut ComponentCtx) {
        let quantized = self.quantize_speed(value);
        if quantized == *self.recharge_speed.value() {
            return;
        }
        match ctx.authority {
            Authority::Client => {
                self.recharge_speed
                    .predict(Authority::Client, quantized, ctx.correction_window);
            }
            Authority::Server => {
                self.recharge_speed.confirm(quantized);
                ctx.request_sync();
            }
        }
    }

    /// Server-side charge mutation; broadcasts on significant change.
    pub fn set_charge(&mut self, value: f32, ctx: &mut ComponentCtx) {
        if ctx.authority == Authority::Client || !value.is_finite() {
            return;
        }
        self.charge = value.clamp(0.0, self.capacity);

        let ratio = self.charge_ratio();
        if (ratio - self.last_sent_charge).abs() > CHARGE_SYNC_THRESHOLD {
            ctx.request_sync();
            self.last_sent_charge = ratio;
        }
    }
}

impl Component for PowerContainer {
    fn type_name(&self) -> &'static str {
        "power_container"
    }

    fn update(&mut self, dt: f32, ctx: &mut ComponentCtx) {
        self.recharge_speed.tick();

        if ctx.authority == Authority::Server {
            // Grid voltage/load come from the external power service; the
            // container itself just integrates its recharge rate.
            let gained = self.recharge_speed() * dt / 60.0;
            if gained > 0.0 && self.charge < self.capacity {
                self.set_charge(self.charge + gained, ctx);
            }
        }

        self.curr_output = self.max_output * self.charge_ratio().sqrt();
    }

    fn server_serializable(&self) -> Option<&dyn ServerSerializable> {
        Some(self)
    }

    fn server_serializable_mut(&mut self) -> Option<&mut dyn ServerSerializable> {
        Some(self)
    }

    fn client_serializable(&self) -> Option<&dyn ClientSerializable> {
        Some(self)
    }

    fn client_serializable_mut(&mut self) -> Option<&mut dyn ClientSerializable> {
        Some(self)
    }
}

impl ServerSerializable for PowerContainer {
    fn server_write(&self, writer: &mut BitWriter) {
        let speed_steps =
            (*self.recharge_speed.value() / self.max_recharge_speed * 10.0).round() as i32;
        writer.write_ranged_int(speed_steps, 0, 10);
        writer.write_ranged_f32(self.charge_ratio(), 0.0, 1.0, 8);
    }

    fn client_read(
        &mut self,
        reader: &mut BitReader,
        _ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError> {
        let speed = reader.read_ranged_int(0, 10)? as f32 / 10.0 * self.max_recharge_speed;
        let ratio = reader.read_ranged_f32(0.0, 1.0, 8)?;

        self.recharge_speed.confirm(speed);
        self.charge = ratio * self.capacity;
        Ok(())
    }
}

impl ClientSerializable for PowerContainer {
    fn client_write(&self, writer: &mut BitWriter) {
        let speed_steps =
            (*self.recharge_speed.value() / self.max_recharge_speed * 10.0).round() as i32;
        writer.write_ranged_int(speed_steps, 0, 10);
    }

    fn server_read(
        &mut self,
        reader: &mut BitReader,
        ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError> {
        let speed = reader.read_ranged_int(0, 10)? as f32 / 10.0 * self.max_recharge_speed;
        self.recharge_speed.confirm(speed);
        ctx.request_sync();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
