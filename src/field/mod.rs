//! Field model: the typed units a packet layout is declared from.
//!
//! A [Field] is one named, fixed-position unit of encode/decode logic. The
//! concrete variants cover fixed-width integers ([NumericField]), fixed and
//! variable length strings ([FixedStringField], [VarStringField]), bit-packed
//! composites ([BitsField]) and conditionally present fields
//! ([ConditionalField]).

pub mod bits;
pub mod conditional;
pub mod numeric;
pub mod string;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ConfigError, ValidationError};
use crate::packet::PacketView;

pub use bits::{BitsField, BitsWidth, FieldPart};
pub use conditional::{Condition, ConditionalField};
pub use numeric::{IntFormat, NumericField};
pub use string::{FixedStringField, LengthHint, VarStringField};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("field name pattern"));

/// Checks a field or part name against identifier syntax.
pub(crate) fn validate_name(name: &str) -> Result<(), ConfigError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFieldName(name.to_string()))
    }
}

/// Dynamic value passed through attribute-style get/set.
///
/// `Int` carries every integer width (i128 covers the full u64 and i64
/// ranges), `Text` carries UTF-8 string values and `Bytes` raw byte strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(v as i128)
            }
        })*
    };
}

value_from_int!(u8, i8, u16, i16, u32, i32, u64, i64, i128);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// One line of a packet listing: name, type label and rendered values.
#[derive(Debug, Clone)]
pub(crate) struct FieldEntry {
    pub name: String,
    pub label: String,
    pub value: String,
    pub default: String,
}

/// A declared field of a packet layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Numeric(NumericField),
    FixedString(FixedStringField),
    VarString(VarStringField),
    Bits(BitsField),
    Conditional(ConditionalField),
}

impl Field {
    /// Byte width the field occupies on the wire when present.
    pub fn size(&self) -> usize {
        match self {
            Field::Numeric(f) => f.size(),
            Field::FixedString(f) => f.size(),
            Field::VarString(f) => f.size(),
            Field::Bits(f) => f.size(),
            Field::Conditional(f) => f.inner().size(),
        }
    }

    /// Whether the field value was successfully recovered from input bytes.
    pub fn value_was_computed(&self) -> bool {
        match self {
            Field::Numeric(f) => f.value_was_computed(),
            Field::FixedString(f) => f.value_was_computed(),
            Field::VarString(f) => f.value_was_computed(),
            Field::Bits(f) => f.value_was_computed(),
            Field::Conditional(f) => f.inner().value_was_computed(),
        }
    }

    /// Computed, or vacuously satisfied (a conditional field suppressed by
    /// its predicate contributes no bytes and counts as satisfied).
    pub(crate) fn is_satisfied(&self) -> bool {
        match self {
            Field::Conditional(f) => f.is_vacuous() || f.inner().value_was_computed(),
            other => other.value_was_computed(),
        }
    }

    /// Serializes the current value, consulting `view` for conditional
    /// presence.
    pub(crate) fn raw(&self, view: &PacketView<'_>) -> Vec<u8> {
        match self {
            Field::Numeric(f) => f.raw(),
            Field::FixedString(f) => f.raw(),
            Field::VarString(f) => f.raw(),
            Field::Bits(f) => f.raw(),
            Field::Conditional(f) => f.raw(view),
        }
    }

    /// Deserializes a prefix of `data`, returning the remainder. On
    /// insufficient data the field defers: input is returned unchanged, the
    /// computed flag stays false and the value is untouched.
    pub(crate) fn compute_value<'a>(
        &mut self,
        data: &'a [u8],
        view: &PacketView<'_>,
    ) -> Result<&'a [u8], ValidationError> {
        match self {
            Field::Numeric(f) => Ok(f.compute_value(data)),
            Field::FixedString(f) => f.compute_value(data),
            Field::VarString(f) => f.compute_value(data, view),
            Field::Bits(f) => Ok(f.compute_value(data)),
            Field::Conditional(f) => f.compute_value(data, view),
        }
    }

    /// Fills the field (every bit part individually) with a random value.
    pub(crate) fn randomize(&mut self) {
        match self {
            Field::Numeric(f) => f.randomize(),
            Field::FixedString(f) => f.randomize(),
            Field::VarString(f) => f.randomize(),
            Field::Bits(f) => f.randomize(),
            Field::Conditional(f) => f.inner_mut().randomize(),
        }
    }

    /// Names this field contributes to the packet namespace. Bit-composite
    /// fields surface one name per part.
    pub(crate) fn slots(&self) -> Vec<(String, Option<usize>)> {
        match self {
            Field::Numeric(f) => vec![(f.name().to_string(), None)],
            Field::FixedString(f) => vec![(f.name().to_string(), None)],
            Field::VarString(f) => vec![(f.name().to_string(), None)],
            Field::Bits(f) => f
                .parts()
                .iter()
                .enumerate()
                .map(|(i, part)| (part.name().to_string(), Some(i)))
                .collect(),
            Field::Conditional(f) => f.inner().slots(),
        }
    }

    /// Current value of the whole field or of one bit part.
    pub(crate) fn slot_value(&self, part: Option<usize>) -> Option<Value> {
        match (self, part) {
            (Field::Conditional(f), part) => f.inner().slot_value(part),
            (Field::Bits(f), Some(index)) => {
                f.parts().get(index).map(|p| Value::Int(p.value() as i128))
            }
            (Field::Bits(f), None) => Some(Value::Int(f.value() as i128)),
            (Field::Numeric(f), None) => Some(Value::Int(f.value())),
            (Field::FixedString(f), None) => Some(f.value()),
            (Field::VarString(f), None) => Some(f.value()),
            _ => None,
        }
    }

    /// Sets the whole field or one bit part.
    pub(crate) fn slot_set(
        &mut self,
        part: Option<usize>,
        value: Value,
    ) -> Result<(), ValidationError> {
        match (self, part) {
            (Field::Conditional(f), part) => f.inner_mut().slot_set(part, value),
            (Field::Bits(f), Some(index)) => f.set_part_by_index(index, value),
            (Field::Bits(f), None) => f.set_value(value),
            (Field::Numeric(f), None) => f.set_value(value),
            (Field::FixedString(f), None) => f.set_value(value),
            (Field::VarString(f), None) => f.set_value(value),
            (field, _) => Err(ValidationError::wrong_kind(
                &field.slots().first().map(|(n, _)| n.clone()).unwrap_or_default(),
                "addressed through one of its bit part names",
            )),
        }
    }

    /// Listing entries for `show()` and packet display, in declaration
    /// order. Empty when a conditional field is currently suppressed.
    pub(crate) fn entries(&self, view: &PacketView<'_>) -> Vec<FieldEntry> {
        match self {
            Field::Numeric(f) => vec![f.entry()],
            Field::FixedString(f) => vec![f.entry()],
            Field::VarString(f) => vec![f.entry()],
            Field::Bits(f) => f.entries(),
            Field::Conditional(f) => {
                if f.applies(view) {
                    f.inner().entries(view)
                } else {
                    Vec::new()
                }
            }
        }
    }
}

impl From<NumericField> for Field {
    fn from(f: NumericField) -> Self {
        Field::Numeric(f)
    }
}

impl From<FixedStringField> for Field {
    fn from(f: FixedStringField) -> Self {
        Field::FixedString(f)
    }
}

impl From<VarStringField> for Field {
    fn from(f: VarStringField) -> Self {
        Field::VarString(f)
    }
}

impl From<BitsField> for Field {
    fn from(f: BitsField) -> Self {
        Field::Bits(f)
    }
}

impl From<ConditionalField> for Field {
    fn from(f: ConditionalField) -> Self {
        Field::Conditional(f)
    }
}
