//! Component behavior and serialization capabilities.
//!
//! Components are polymorphic behavior units owned by an item. Network
//! participation is capability-based: a component exposes itself for the
//! server→client direction via [`ServerSerializable`] and/or the
//! client→server direction via [`ClientSerializable`], and the aggregate
//! asks for the capability instead of downcasting. A component without
//! the requested capability makes the addressing event a protocol error.

pub mod door;
pub mod power;
pub mod pump;

use trench_net::{Authority, BitReader, BitWriter, ProtocolError};

// ---------------------------------------------------------------------------
// ComponentCtx
// ---------------------------------------------------------------------------

/// Per-call context handed to component behavior.
///
/// Carries the peer's authority role and the prediction window, and
/// collects the component's outward requests: a state-sync request that
/// the owning item turns into a component event, and fire-and-forget
/// sound cues drained by the host's audio service.
#[derive(Debug)]
pub struct ComponentCtx {
    /// This peer's role for the owning entity.
    pub authority: Authority,
    /// Prediction reset window in ticks.
    pub correction_window: u32,
    sync_requested: bool,
    sounds: Vec<String>,
}

impl ComponentCtx {
    /// Creates a context for one component call.
    pub fn new(authority: Authority, correction_window: u32) -> Self {
        Self {
            authority,
            correction_window,
            sync_requested: false,
            sounds: Vec::new(),
        }
    }

    /// Asks the owning item to broadcast this component's state.
    pub fn request_sync(&mut self) {
        self.sync_requested = true;
    }

    /// Whether a sync was requested during the call.
    pub fn sync_requested(&self) -> bool {
        self.sync_requested
    }

    /// Queues a positional sound cue for the external audio service.
    pub fn play_sound(&mut self, cue: &str) {
        self.sounds.push(cue.to_string());
    }

    /// Drains queued sound cues.
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }
}

// ---------------------------------------------------------------------------
// Serialization capabilities
// ---------------------------------------------------------------------------

/// Server→client state serialization.
pub trait ServerSerializable {
    /// Writes the authoritative state.
    fn server_write(&self, writer: &mut BitWriter);

    /// Applies a confirmed state on the client. Clears any pending
    /// prediction for the covered fields.
    fn client_read(
        &mut self,
        reader: &mut BitReader,
        ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError>;
}

/// Client→server input serialization.
pub trait ClientSerializable {
    /// Writes the client's requested state.
    fn client_write(&self, writer: &mut BitWriter);

    /// Validates and applies a client request on the server. Implementors
    /// call [`ComponentCtx::request_sync`] so the accepted state is
    /// rebroadcast to all clients.
    fn server_read(
        &mut self,
        reader: &mut BitReader,
        ctx: &mut ComponentCtx,
    ) -> Result<(), ProtocolError>;
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A behavior unit owned by an item.
pub trait Component {
    /// Stable component type name for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Per-tick simulation step.
    fn update(&mut self, dt: f32, ctx: &mut ComponentCtx);

    /// Handles a named signal (e.g. `toggle`, `set_state`).
    fn receive_signal(&mut self, connection: &str, value: &str, ctx: &mut ComponentCtx) {
        let _ = (connection, value, ctx);
    }

    /// Server→client capability, if exposed.
    fn server_serializable(&self) -> Option<&dyn ServerSerializable> {
        None
    }

    /// Mutable server→client capability, if exposed.
    fn server_serializable_mut(&mut self) -> Option<&mut dyn ServerSerializable> {
        None
    }

    /// Client→server capability, if exposed.
    fn client_serializable(&self) -> Option<&dyn ClientSerializable> {
        None
    }

    /// Mutable client→server capability, if exposed.
    fn client_serializable_mut(&mut self) -> Option<&mut dyn ClientSerializable> {
        None
    }
}
