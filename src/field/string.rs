//! Fixed and variable length string fields, in text or raw-bytes flavor.

use std::fmt;

use crate::errors::{ConfigError, ValidationError};
use crate::field::{validate_name, FieldEntry, Value};
use crate::packet::PacketView;
use crate::random_values;

/// Resolves the byte length of a variable field from already decoded
/// siblings, e.g. a preceding length field. `None` means the length is not
/// driven by a sibling and the field consumes everything left.
pub type LengthHint = fn(&PacketView<'_>) -> Option<usize>;

/// A string field occupying a fixed number of bytes on the wire. Values
/// shorter than the declared length are null padded on encode.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStringField {
    name: String,
    length: usize,
    decode: bool,
    default: Vec<u8>,
    value: Vec<u8>,
    computed: bool,
}

impl FixedStringField {
    /// Declares a text field, decoded bytes must be valid UTF-8.
    pub fn text(name: &str, default: &str, length: usize) -> Result<Self, ConfigError> {
        Self::build(name, default.as_bytes().to_vec(), length, true)
    }

    /// Declares a raw bytes field, no decoding is attempted.
    pub fn bytes(name: &str, default: &[u8], length: usize) -> Result<Self, ConfigError> {
        Self::build(name, default.to_vec(), length, false)
    }

    fn build(name: &str, default: Vec<u8>, length: usize, decode: bool) -> Result<Self, ConfigError> {
        validate_name(name)?;
        if default.len() > length {
            return Err(ConfigError::DefaultTooLong {
                field: name.to_string(),
                length: default.len(),
                max: length,
            });
        }
        Ok(FixedStringField {
            name: name.to_string(),
            length,
            decode,
            value: default.clone(),
            default,
            computed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.length
    }

    pub fn decode(&self) -> bool {
        self.decode
    }

    pub fn value_was_computed(&self) -> bool {
        self.computed
    }

    fn wrap(&self, bytes: &[u8]) -> Value {
        if self.decode {
            // 不変条件: decode=true の値は代入時・解析時にUTF-8検証済み
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        } else {
            Value::Bytes(bytes.to_vec())
        }
    }

    pub fn value(&self) -> Value {
        self.wrap(&self.value)
    }

    pub fn default(&self) -> Value {
        self.wrap(&self.default)
    }

    pub fn set_value(&mut self, value: Value) -> Result<(), ValidationError> {
        let bytes = match (self.decode, value) {
            (true, Value::Text(text)) => text.into_bytes(),
            (false, Value::Bytes(bytes)) => bytes,
            (true, _) => return Err(ValidationError::wrong_kind(&self.name, "a string")),
            (false, _) => return Err(ValidationError::wrong_kind(&self.name, "a byte string")),
        };
        if bytes.len() > self.length {
            return Err(ValidationError::TooLong {
                field: self.name.clone(),
                length: bytes.len(),
                max: self.length,
            });
        }
        self.value = bytes;
        Ok(())
    }

    pub(crate) fn raw(&self) -> Vec<u8> {
        let mut out = self.value.clone();
        out.resize(self.length, 0);
        out
    }

    /// Consumes exactly `length` bytes when available, otherwise defers.
    pub(crate) fn compute_value<'a>(
        &mut self,
        data: &'a [u8],
    ) -> Result<&'a [u8], ValidationError> {
        if data.len() < self.length {
            return Ok(data);
        }
        let (taken, remaining) = data.split_at(self.length);
        if self.decode && std::str::from_utf8(taken).is_err() {
            return Err(ValidationError::InvalidUtf8 {
                field: self.name.clone(),
            });
        }
        self.value = taken.to_vec();
        self.computed = true;
        Ok(remaining)
    }

    pub(crate) fn randomize(&mut self) {
        self.value = if self.decode {
            random_values::rand_string(self.length).into_bytes()
        } else {
            random_values::rand_bytes(self.length)
        };
    }

    fn render(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    pub(crate) fn entry(&self) -> FieldEntry {
        FieldEntry {
            name: self.name.clone(),
            label: "FixedStringField".to_string(),
            value: self.render(&self.value),
            default: self.render(&self.default),
        }
    }
}

impl fmt::Display for FixedStringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<FixedStringField: name={}, value={}, default={}>",
            self.name,
            self.render(&self.value),
            self.render(&self.default)
        )
    }
}

/// A string field whose wire length is not fixed at declaration time. The
/// length is taken from a sibling field through a [LengthHint], or the field
/// consumes all remaining bytes.
#[derive(Debug, Clone)]
pub struct VarStringField {
    name: String,
    decode: bool,
    default: Vec<u8>,
    value: Vec<u8>,
    length_from: Option<LengthHint>,
    max_length: Option<usize>,
    computed: bool,
}

impl VarStringField {
    pub fn text(
        name: &str,
        default: &str,
        length_from: Option<LengthHint>,
    ) -> Result<Self, ConfigError> {
        Self::build(name, default.as_bytes().to_vec(), length_from, true)
    }

    pub fn bytes(
        name: &str,
        default: &[u8],
        length_from: Option<LengthHint>,
    ) -> Result<Self, ConfigError> {
        Self::build(name, default.to_vec(), length_from, false)
    }

    fn build(
        name: &str,
        default: Vec<u8>,
        length_from: Option<LengthHint>,
        decode: bool,
    ) -> Result<Self, ConfigError> {
        validate_name(name)?;
        Ok(VarStringField {
            name: name.to_string(),
            decode,
            value: default.clone(),
            default,
            length_from,
            max_length: None,
            computed: false,
        })
    }

    /// Caps the value length, enforced on assignment and on decode.
    pub fn with_max_length(mut self, max_length: usize) -> Result<Self, ConfigError> {
        if self.default.len() > max_length {
            return Err(ConfigError::DefaultTooLong {
                field: self.name.clone(),
                length: self.default.len(),
                max: max_length,
            });
        }
        self.max_length = Some(max_length);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current wire width, tracks the value length.
    pub fn size(&self) -> usize {
        self.value.len()
    }

    pub fn decode(&self) -> bool {
        self.decode
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn value_was_computed(&self) -> bool {
        self.computed
    }

    fn wrap(&self, bytes: &[u8]) -> Value {
        if self.decode {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        } else {
            Value::Bytes(bytes.to_vec())
        }
    }

    pub fn value(&self) -> Value {
        self.wrap(&self.value)
    }

    pub fn default(&self) -> Value {
        self.wrap(&self.default)
    }

    pub fn set_value(&mut self, value: Value) -> Result<(), ValidationError> {
        let bytes = match (self.decode, value) {
            (true, Value::Text(text)) => text.into_bytes(),
            (false, Value::Bytes(bytes)) => bytes,
            (true, _) => return Err(ValidationError::wrong_kind(&self.name, "a string")),
            (false, _) => return Err(ValidationError::wrong_kind(&self.name, "a byte string")),
        };
        if let Some(max) = self.max_length {
            if bytes.len() > max {
                return Err(ValidationError::TooLong {
                    field: self.name.clone(),
                    length: bytes.len(),
                    max,
                });
            }
        }
        self.value = bytes;
        Ok(())
    }

    pub(crate) fn raw(&self) -> Vec<u8> {
        self.value.clone()
    }

    /// Consumes the sibling-driven length when a hint is attached, all
    /// remaining bytes otherwise. Defers when the hint cannot resolve yet or
    /// the hinted length exceeds the available data. A resolved length above
    /// `max_length` is a validation error, the cap holds on decode exactly as
    /// it does on assignment.
    pub(crate) fn compute_value<'a>(
        &mut self,
        data: &'a [u8],
        view: &PacketView<'_>,
    ) -> Result<&'a [u8], ValidationError> {
        let wanted = match self.length_from {
            Some(hint) => match hint(view) {
                Some(length) => length,
                None => return Ok(data),
            },
            None => data.len(),
        };
        if data.len() < wanted {
            return Ok(data);
        }
        let (taken, remaining) = data.split_at(wanted);
        if let Some(max) = self.max_length {
            if taken.len() > max {
                return Err(ValidationError::TooLong {
                    field: self.name.clone(),
                    length: taken.len(),
                    max,
                });
            }
        }
        if self.decode && std::str::from_utf8(taken).is_err() {
            return Err(ValidationError::InvalidUtf8 {
                field: self.name.clone(),
            });
        }
        self.value = taken.to_vec();
        self.computed = true;
        Ok(remaining)
    }

    pub(crate) fn randomize(&mut self) {
        let length = self
            .max_length
            .unwrap_or(if self.default.is_empty() { 10 } else { self.default.len() });
        self.value = if self.decode {
            random_values::rand_string(length).into_bytes()
        } else {
            random_values::rand_bytes(length)
        };
    }

    fn render(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    pub(crate) fn entry(&self) -> FieldEntry {
        FieldEntry {
            name: self.name.clone(),
            label: "VarStringField".to_string(),
            value: self.render(&self.value),
            default: self.render(&self.default),
        }
    }
}

// length_from is a fn pointer, comparing it would compare code addresses.
impl PartialEq for VarStringField {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.decode == other.decode
            && self.default == other.default
            && self.value == other.value
            && self.max_length == other.max_length
            && self.computed == other.computed
    }
}

impl fmt::Display for VarStringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<VarStringField: name={}, value={}, default={}>",
            self.name,
            self.render(&self.value),
            self.render(&self.default)
        )
    }
}
