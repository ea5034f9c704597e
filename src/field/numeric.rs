//! Fixed-width integer fields encoded in network byte order.

use std::collections::HashMap;
use std::fmt;

use crate::errors::{ConfigError, ValidationError};
use crate::field::{validate_name, FieldEntry, Value};
use crate::random_values;

/// Wire format of a numeric field: width and signedness.
///
/// All formats serialize big endian, most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntFormat {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl IntFormat {
    /// Width in bytes on the wire.
    pub fn size(self) -> usize {
        match self {
            IntFormat::U8 | IntFormat::I8 => 1,
            IntFormat::U16 | IntFormat::I16 => 2,
            IntFormat::U32 | IntFormat::I32 => 4,
            IntFormat::U64 | IntFormat::I64 => 8,
        }
    }

    /// Inclusive value range admitted by the format.
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntFormat::U8 => (random_values::LEFT_BYTE, random_values::RIGHT_BYTE),
            IntFormat::I8 => (
                random_values::LEFT_SIGNED_BYTE,
                random_values::RIGHT_SIGNED_BYTE,
            ),
            IntFormat::U16 => (random_values::LEFT_SHORT, random_values::RIGHT_SHORT),
            IntFormat::I16 => (
                random_values::LEFT_SIGNED_SHORT,
                random_values::RIGHT_SIGNED_SHORT,
            ),
            IntFormat::U32 => (random_values::LEFT_INT, random_values::RIGHT_INT),
            IntFormat::I32 => (
                random_values::LEFT_SIGNED_INT,
                random_values::RIGHT_SIGNED_INT,
            ),
            IntFormat::U64 => (random_values::LEFT_LONG, random_values::RIGHT_LONG),
            IntFormat::I64 => (
                random_values::LEFT_SIGNED_LONG,
                random_values::RIGHT_SIGNED_LONG,
            ),
        }
    }

    fn stem(self) -> &'static str {
        match self {
            IntFormat::U8 => "Byte",
            IntFormat::I8 => "SignedByte",
            IntFormat::U16 => "Short",
            IntFormat::I16 => "SignedShort",
            IntFormat::U32 => "Int",
            IntFormat::I32 => "SignedInt",
            IntFormat::U64 => "Long",
            IntFormat::I64 => "SignedLong",
        }
    }

    /// Serializes `value` big endian. The caller guarantees the value is in
    /// bounds.
    fn pack(self, value: i128) -> Vec<u8> {
        match self {
            IntFormat::U8 => (value as u8).to_be_bytes().to_vec(),
            IntFormat::I8 => (value as i8).to_be_bytes().to_vec(),
            IntFormat::U16 => (value as u16).to_be_bytes().to_vec(),
            IntFormat::I16 => (value as i16).to_be_bytes().to_vec(),
            IntFormat::U32 => (value as u32).to_be_bytes().to_vec(),
            IntFormat::I32 => (value as i32).to_be_bytes().to_vec(),
            IntFormat::U64 => (value as u64).to_be_bytes().to_vec(),
            IntFormat::I64 => (value as i64).to_be_bytes().to_vec(),
        }
    }

    /// Deserializes a big endian value. The caller guarantees
    /// `data.len() >= self.size()`.
    fn unpack(self, data: &[u8]) -> i128 {
        match self {
            IntFormat::U8 => data[0] as i128,
            IntFormat::I8 => data[0] as i8 as i128,
            IntFormat::U16 => u16::from_be_bytes([data[0], data[1]]) as i128,
            IntFormat::I16 => i16::from_be_bytes([data[0], data[1]]) as i128,
            IntFormat::U32 => u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as i128,
            IntFormat::I32 => i32::from_be_bytes([data[0], data[1], data[2], data[3]]) as i128,
            IntFormat::U64 => u64::from_be_bytes([
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
            ]) as i128,
            IntFormat::I64 => i64::from_be_bytes([
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
            ]) as i128,
        }
    }

    fn random(self) -> i128 {
        match self {
            IntFormat::U8 => random_values::rand_byte(),
            IntFormat::I8 => random_values::rand_signed_byte(),
            IntFormat::U16 => random_values::rand_short(),
            IntFormat::I16 => random_values::rand_signed_short(),
            IntFormat::U32 => random_values::rand_int(),
            IntFormat::I32 => random_values::rand_signed_int(),
            IntFormat::U64 => random_values::rand_long(),
            IntFormat::I64 => random_values::rand_signed_long(),
        }
    }
}

/// A fixed-width integer field, optionally backed by an enumeration that
/// maps wire codes to symbolic names.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericField {
    name: String,
    format: IntFormat,
    default: i128,
    value: i128,
    enumeration: Option<HashMap<i128, String>>,
    hex: bool,
    computed: bool,
}

impl NumericField {
    /// Declares a numeric field. Fails when the name is not an identifier or
    /// the default does not fit the format.
    pub fn new(name: &str, default: i128, format: IntFormat) -> Result<Self, ConfigError> {
        validate_name(name)?;
        let (low, high) = format.bounds();
        if default < low || default > high {
            return Err(ConfigError::DefaultOutOfRange {
                field: name.to_string(),
                value: default,
                low,
                high,
            });
        }
        Ok(NumericField {
            name: name.to_string(),
            format,
            default,
            value: default,
            enumeration: None,
            hex: false,
            computed: false,
        })
    }

    /// Attaches an enumeration. Unknown wire codes are still accepted when
    /// decoding, only symbolic assignment is checked against the mapping.
    pub fn with_enumeration(
        mut self,
        enumeration: HashMap<i128, String>,
    ) -> Result<Self, ConfigError> {
        let (low, high) = self.format.bounds();
        for key in enumeration.keys() {
            if *key < low || *key > high {
                return Err(ConfigError::EnumKeyOutOfRange {
                    field: self.name.clone(),
                    key: *key,
                    low,
                    high,
                });
            }
        }
        self.enumeration = Some(enumeration);
        Ok(self)
    }

    /// Renders the value in hexadecimal in listings.
    pub fn with_hex(mut self) -> Self {
        self.hex = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.format.size()
    }

    pub fn format(&self) -> IntFormat {
        self.format
    }

    pub fn default(&self) -> i128 {
        self.default
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn hex(&self) -> bool {
        self.hex
    }

    pub fn enumeration(&self) -> Option<&HashMap<i128, String>> {
        self.enumeration.as_ref()
    }

    pub fn value_was_computed(&self) -> bool {
        self.computed
    }

    /// Sets the value from an integer or, when an enumeration is attached,
    /// from a symbolic name.
    pub fn set_value(&mut self, value: Value) -> Result<(), ValidationError> {
        match value {
            Value::Int(v) => {
                let (low, high) = self.format.bounds();
                if v < low || v > high {
                    return Err(ValidationError::out_of_range(&self.name, v, low, high));
                }
                self.value = v;
                Ok(())
            }
            Value::Text(name) => {
                let enumeration = self
                    .enumeration
                    .as_ref()
                    .ok_or_else(|| ValidationError::wrong_kind(&self.name, "an integer"))?;
                let code = enumeration
                    .iter()
                    .find(|(_, label)| label.as_str() == name)
                    .map(|(code, _)| *code);
                match code {
                    Some(code) => {
                        self.value = code;
                        Ok(())
                    }
                    None => Err(ValidationError::UnknownEnumName {
                        field: self.name.clone(),
                        name,
                    }),
                }
            }
            Value::Bytes(_) => Err(ValidationError::wrong_kind(&self.name, "an integer")),
        }
    }

    pub(crate) fn raw(&self) -> Vec<u8> {
        self.format.pack(self.value)
    }

    /// Consumes `size()` bytes when available, otherwise defers and returns
    /// the input unchanged.
    pub(crate) fn compute_value<'a>(&mut self, data: &'a [u8]) -> &'a [u8] {
        let size = self.size();
        if data.len() < size {
            return data;
        }
        self.value = self.format.unpack(data);
        self.computed = true;
        &data[size..]
    }

    pub fn random_value(&self) -> i128 {
        self.format.random()
    }

    pub(crate) fn randomize(&mut self) {
        self.value = self.random_value();
    }

    fn label(&self) -> String {
        let suffix = if self.enumeration.is_some() {
            "EnumField"
        } else {
            "Field"
        };
        format!("{}{}", self.format.stem(), suffix)
    }

    fn render(&self, value: i128) -> String {
        if self.hex {
            format!("{value:#x}")
        } else {
            value.to_string()
        }
    }

    pub(crate) fn entry(&self) -> FieldEntry {
        FieldEntry {
            name: self.name.clone(),
            label: self.label(),
            value: self.render(self.value),
            default: self.render(self.default),
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}: name={}, value={}, default={}>",
            self.label(),
            self.name,
            self.render(self.value),
            self.render(self.default)
        )
    }
}
