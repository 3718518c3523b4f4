//! Pump component: bounded flow control with bidirectional sync.
//!
//! Flow is adjustable only in 10% steps, so the wire carries it as a
//! ranged integer in `[-10, 10]` (5 bits) rather than a float. The same
//! packing is used in both directions; changing it would break
//! interoperability between independently-built peers.

use trench_net::{Authority, BitReader, BitWriter, PredictionState, ProtocolError};

use super::{ClientSerializable, Component, ComponentCtx, ServerSerializable};

/// Replicated pump state: quantized flow plus the running flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpState {
    /// Flow percentage in `[-100, 100]`, quantized to 10% steps.
    pub flow_percentage: f32,
    /// Whether the pump is running.
    pub is_active: bool,
}

/// A water pump.
#[derive(Debug)]
pub struct Pump {
    state: PredictionState<PumpState>,
    /// Maximum throughput at 100% flow.
    max_flow: f32,
    /// Current throughput, recomputed every tick.
    curr_flow: f32,
    /// Optional auto-level target in `[0, 100]`.
    target_level: Option<f32>,
}

impl Pump {
    /// Creates an idle pump.
    pub fn new(max_flow: f32) -> Self {
        Self {
            state: PredictionState::confirmed(PumpState {
                flow_percentage: 0.0,
                is_active: false,
            }),
            max_flow,
            curr_flow: 0.0,
            target_level: None,
        }
    }

    /// The effective flow percentage.
    pub fn flow_percentage(&self) -> f32 {
        self.state.value().flow_percentage
    }

    /// The effective running flag.
    pub fn is_active(&self) -> bool {
        self.state.value().is_active
    }

    /// Current throughput.
    pub fn curr_flow(&self) -> f32 {
        if self.is_active() { self.curr_flow.abs() } else { 0.0 }
    }

    /// Quantizes a requested flow to the wire resolution.
    fn quantize_flow(value: f32) -> f32 {
        (value.clamp(-100.0, 100.0) / 10.0).round() * 10.0
    }

    /// Applies a local state change: predicted on clients, authoritative
    /// (and rebroadcast) on the server.
    pub fn set_state(&mut self, new_state: PumpState, ctx: &mut ComponentCtx) {
        let quantized = PumpState {
            flow_percentage: Self::quantize_flow(new_state.flow_percentage),
            ..new_state
        };
        if *self.state.value() == quantized {
            return;
        }
        match ctx.authority {
            Authority::Client => {
                self.state
                    .predict(Authority::Client, quantized, ctx.correction_window);
            }
            Authority::Server => {
                self.state.confirm(quantized);
                ctx.request_sync();
            }
        }
    }

    /// Adjusts flow by one wire step times `steps`.
    pub fn nudge_flow(&mut self, steps: i32, ctx: &mut ComponentCtx) {
        let current = *self.state.value();
        self.set_state(
            PumpState {
                flow_percentage: current.flow_percentage + steps as f32 * 10.0,
                ..current
            },
            ctx,
        );
    }
}

impl Component for Pump {
    fn type_name(&self) -> &'static str {
        "pump"
    }

    fn update(&mut self, _dt: f32, _ctx: &mut ComponentCtx) {
        self.state.tick();

        // Auto-level control overrides the manual flow setting. The hull
        // level itself comes from the external physics service; here the
        // target simply drives toward itself linearly.
        if let Some(target) = self.target_level {
            let current = *self.state.value();
            let flow = Self::quantize_flow((target - 50.0) * 2.0);
            if flow != current.flow_percentage {
                self.state.confirm(PumpState {
                    flow_percentage: flow,
                    ..current
                });
            }
        }

        self.curr_flow = self.flow_percentage() / 100.0 * self.max_flow;
    }

    fn receive_signal(&mut self, connection: &str, value: &str, ctx: &mut ComponentCtx) {
        let current = *self.state.value();
        match connection {
            "toggle" => self.set_state(
                PumpState {
                    is_active: !current.is_active,
                    ..current
                },
                ctx,
            ),
            "set_active" => self.set_state(
                PumpState {
                    is_active: value != "0",
                    ..current
                },
                ctx,
            ),
            "set_speed" => {
                if let Ok(speed) = value.parse::<f32>() {
                    self.set_state(
                        PumpState {
                            flow_percentage: speed,
                            ..current
                        },
                        ctx,
                    );
                }
            }
            "set_targetlevel" => {
                if let Ok(target) = value.parse::<f32>() {
                    self.target_level = Some(((target + 100.0) / 2.0).clamp(0.0, 100.0));
                }
            }
            _ => {}
        }
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

/// Writes the shared wire layout: 5-bit flow step plus the running flag.
fn write_state(state: &PumpState, writer: &mut BitWriter) {
    writer.write_ranged_int((state.flow_percentage / 10.0) as i32, -10, 10);
    writer.write_bool(state.is_active);
}

/// Reads the shared wire layout.
fn read_state(reader: &mut BitReader) -> Result<PumpState, ProtocolError> {
    let flow = reader.read_ranged_int(-10, 10)? as f32 * 10.0;
    let is_active = reader.read_bool()?;
    Ok(PumpState {
        flow_percentage: flow,
        is_active,
    })
}

impl ServerSerializable for Pump {
    fn server_write(&self, writer: &mut BitWriter) {
        write_state(self.state.value(), writer);
    }

    fn client_read(
        &mut self,
        reader: &mut BitReader,
        _ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError> {
        let state = read_state(reader)?;
        self.state.confirm(state);
        Ok(())
    }
}

impl ClientSerializable for Pump {
    fn client_write(&self, writer: &mut BitWriter) {
        write_state(self.state.value(), writer);
    }

    fn server_read(
        &mut self,
        reader: &mut BitReader,
        ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError> {
        let requested = read_state(reader)?;
        self.state.confirm(requested);
        // Accepted client input becomes confirmed state for everyone.
        ctx.request_sync();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn server_ctx() -> ComponentCtx {
        ComponentCtx::new(Authority::Server, 60)
    }

    fn client_ctx() -> ComponentCtx {
        ComponentCtx::new(Authority::Client, 60)
    }

    #[test]
    fn test_all_21_flow_steps_roundtrip() {
        for step in -10..=10 {
            let state = PumpState {
                flow_percentage: step as f32 * 10.0,
                is_active: step % 2 == 0,
            };
            let mut w = BitWriter::new();
            write_state(&state, &mut w);
            let bytes = w.into_bytes();
            // 5 bits + 1 bit fits one byte.
            assert_eq!(bytes.len(), 1);

            let decoded = read_state(&mut BitReader::new(&bytes)).unwrap();
            assert_eq!(decoded, state, "step {step} did not survive the wire");
        }
    }

    #[test]
    fn test_flow_quantized_to_steps() {
        let mut pump = Pump::new(80.0);
        let mut ctx = server_ctx();

        pump.receive_signal("set_speed", "34.9", &mut ctx);
        assert_eq!(pump.flow_percentage(), 30.0);

        pump.receive_signal("set_speed", "-97.0", &mut ctx);
        assert_eq!(pump.flow_percentage(), -100.0);

        pump.receive_signal("set_speed", "250.0", &mut ctx);
        assert_eq!(pump.flow_percentage(), 100.0);
    }

    #[test]
    fn test_toggle_signal() {
        let mut pump = Pump::new(80.0);
        let mut ctx = server_ctx();

        pump.receive_signal("toggle", "1", &mut ctx);
        assert!(pump.is_active());
        assert!(ctx.sync_requested());

        pump.receive_signal("toggle", "1", &mut ctx);
        assert!(!pump.is_active());
    }

    #[test]
    fn test_client_change_is_predicted() {
        let mut pump = Pump::new(80.0);
        let mut ctx = client_ctx();

        pump.nudge_flow(3, &mut ctx);
        assert_eq!(pump.flow_percentage(), 30.0);
        assert!(!ctx.sync_requested(), "client must not broadcast");
    }

    #[test]
    fn test_server_read_rebroadcasts() {
        // Client encodes its requested state.
        let mut client_pump = Pump::new(80.0);
        let mut cctx = client_ctx();
        client_pump.nudge_flow(-2, &mut cctx);
        client_pump.receive_signal("set_active", "1", &mut cctx);

        let mut w = BitWriter::new();
        client_pump.client_write(&mut w);
        let bytes = w.into_bytes();

        // Server applies and rebroadcasts.
        let mut server_pump = Pump::new(80.0);
        let mut sctx = server_ctx();
        server_pump
            .server_read(&mut BitReader::new(&bytes), &mut sctx)
            .unwrap();
        assert_eq!(server_pump.flow_percentage(), -20.0);
        assert!(server_pump.is_active());
        assert!(sctx.sync_requested());
    }

    #[test]
    fn test_target_level_drives_flow() {
        let mut pump = Pump::new(80.0);
        let mut ctx = server_ctx();

        // Signal range [-100, 100] maps to a level target in [0, 100].
        pump.receive_signal("set_targetlevel", "100", &mut ctx);
        pump.update(1.0 / 60.0, &mut ctx);
        assert_eq!(pump.flow_percentage(), 100.0);

        pump.receive_signal("set_targetlevel", "-100", &mut ctx);
        pump.update(1.0 / 60.0, &mut ctx);
        assert_eq!(pump.flow_percentage(), -100.0);
    }

    #[test]
    fn test_curr_flow_follows_state() {
        let mut pump = Pump::new(80.0);
        let mut ctx = server_ctx();

        pump.receive_signal("set_speed", "50", &mut ctx);
        pump.update(1.0 / 60.0, &mut ctx);
        // Inactive pump reports no throughput.
        assert_eq!(pump.curr_flow(), 0.0);

        pump.receive_signal("set_active", "1", &mut ctx);
        pump.update(1.0 / 60.0, &mut ctx);
        assert_eq!(pump.curr_flow(), 40.0);
    }
}
