//! Protocol error types.
//!
//! A malformed incoming payload is a protocol violation: the offending
//! event is logged and dropped without applying partial state. None of
//! these errors may take down a session.

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Ran out of bits while reading a message.
    #[error("unexpected end of message at bit {bit}")]
    UnexpectedEof {
        /// Bit offset at which the read failed.
        bit: usize,
    },

    /// An event-type discriminant outside the valid enum range.
    #[error("unknown event discriminant {value} (max {max})")]
    InvalidDiscriminant {
        /// The received value.
        value: u32,
        /// Largest valid discriminant.
        max: u32,
    },

    /// A component index outside the entity's current component list.
    ///
    /// The wire format packs the index into a range sized to the current
    /// component count, so an out-of-range index means the peers disagree
    /// about the entity's composition.
    #[error("component index {index} out of range (entity has {count})")]
    ComponentIndexOutOfRange {
        /// The received index.
        index: usize,
        /// Number of components the entity actually has.
        count: usize,
    },

    /// A property index outside the editable-property list.
    #[error("property index {index} out of range ({count} editable properties)")]
    PropertyIndexOutOfRange {
        /// The received index.
        index: usize,
        /// Number of editable properties.
        count: usize,
    },

    /// The addressed component does not serialize in this direction.
    #[error("component {index} is not serializable in this direction")]
    ComponentNotSerializable {
        /// Index of the addressed component.
        index: usize,
    },

    /// The event kind is not valid for this entity in this direction.
    #[error("unsupported event payload: {what}")]
    Unsupported {
        /// Short description of the rejected payload.
        what: &'static str,
    },

    /// A string field did not decode as UTF-8.
    #[error("malformed string field")]
    MalformedString,

    /// The addressed entity does not exist on this peer.
    #[error("unknown entity id {0}")]
    UnknownEntity(u16),
}
