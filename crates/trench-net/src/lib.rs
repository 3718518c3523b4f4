//! Network event and serialization layer.
//!
//! Entity state changes become queued [`NetEntityEvent`]s, deduplicated
//! before transmission and encoded with a bit-packed wire format. Clients
//! may optimistically predict low-stakes toggle state via
//! [`PredictionState`]; servers are the single source of truth and never
//! predict.

pub mod buffer;
pub mod error;
pub mod event;
pub mod prediction;
pub mod spawn;

pub use buffer::{BitReader, BitWriter, bits_for_range};
pub use error::ProtocolError;
pub use event::{EntityEventManager, EntityId, EventData, EventKind, NetEntityEvent};
pub use prediction::{Authority, PredictionState};
pub use spawn::{ItemSpawnData, SpawnOrRemove, SpawnOrigin};
