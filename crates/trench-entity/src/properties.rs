//! Typed property tables.
//!
//! Each item carries a name → typed-value table loaded from its prefab.
//! The wire format addresses editable properties by their index into the
//! editable subset, packed as a ranged integer; the value itself is
//! written according to the property's locally-known type, so both peers
//! must agree on the prefab definition. A type-mismatched write (damaged
//! or mismatched config) is a recoverable warning: the write is skipped
//! and the prior value retained.

use tracing::warn;
use trench_net::{BitReader, BitWriter, ProtocolError};

// ---------------------------------------------------------------------------
// PropertyValue
// ---------------------------------------------------------------------------

/// A runtime-typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i32),
    /// Floating-point value.
    Float(f32),
    /// Free-form text.
    Text(String),
}

impl PropertyValue {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
        }
    }

    /// Returns `true` if both values carry the same runtime type.
    pub fn same_type(&self, other: &PropertyValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// One named property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Current value.
    pub value: PropertyValue,
    /// Whether the property participates in the change-property wire path.
    pub editable: bool,
}

// ---------------------------------------------------------------------------
// PropertyTable
// ---------------------------------------------------------------------------

/// Ordered property table; order defines the editable wire indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    entries: Vec<Property>,
}

impl PropertyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from prefab-defined entries.
    pub fn from_entries(entries: Vec<Property>) -> Self {
        Self { entries }
    }

    /// All entries in order.
    pub fn entries(&self) -> &[Property] {
        &self.entries
    }

    /// Looks up a property value by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Sets a property by name, keeping the prior value on type mismatch.
    /// Returns `true` if the write was applied.
    pub fn try_set(&mut self, name: &str, value: PropertyValue) -> bool {
        let Some(property) = self.entries.iter_mut().find(|p| p.name == name) else {
            warn!(name, "write to unknown property skipped");
            return false;
        };
        if !property.value.same_type(&value) {
            warn!(
                name,
                expected = property.value.type_name(),
                got = value.type_name(),
                "property type mismatch; keeping prior value"
            );
            return false;
        }
        property.value = value;
        true
    }

    /// Indices (into the full table) of the editable properties, in wire
    /// order.
    pub fn editable_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, p)| p.editable)
            .map(|(i, _)| i)
            .collect()
    }

    /// Encodes a change of the editable property at `editable_index`.
    /// The index field is omitted when only one property is editable.
    pub fn write_change(
        &self,
        writer: &mut BitWriter,
        editable_index: usize,
    ) -> Result<(), ProtocolError> {
        let editable = self.editable_indices();
        if editable_index >= editable.len() {
            return Err(ProtocolError::PropertyIndexOutOfRange {
                index: editable_index,
                count: editable.len(),
            });
        }
        if editable.len() > 1 {
            writer.write_ranged_int(editable_index as i32, 0, editable.len() as i32 - 1);
        }

        match &self.entries[editable[editable_index]].value {
            PropertyValue::Bool(v) => writer.write_bool(*v),
            PropertyValue::Int(v) => writer.write_bits(*v as u32, 32),
            PropertyValue::Float(v) => writer.write_f32(*v),
            PropertyValue::Text(v) => writer.write_string(v),
        }
        Ok(())
    }

    /// Decodes and applies a property change. The value is read according
    /// to the property's locally-known type.
    pub fn read_change(&mut self, reader: &mut BitReader) -> Result<usize, ProtocolError> {
        let editable = self.editable_indices();
        if editable.is_empty() {
            return Err(ProtocolError::PropertyIndexOutOfRange { index: 0, count: 0 });
        }

        let editable_index = if editable.len() > 1 {
            let raw = reader.read_ranged_int(0, editable.len() as i32 - 1)? as usize;
            if raw >= editable.len() {
                return Err(ProtocolError::PropertyIndexOutOfRange {
                    index: raw,
                    count: editable.len(),
                });
            }
            raw
        } else {
            0
        };

        let entry = &mut self.entries[editable[editable_index]];
        entry.value = match entry.value {
            PropertyValue::Bool(_) => PropertyValue::Bool(reader.read_bool()?),
            PropertyValue::Int(_) => PropertyValue::Int(reader.read_bits(32)? as i32),
            PropertyValue::Float(_) => PropertyValue::Float(reader.read_f32()?),
            PropertyValue::Text(_) => PropertyValue::Text(reader.read_string()?),
        };
        Ok(editable_index)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
