//! Bit-packed composite fields.
//!
//! A [BitsField] groups several named [FieldPart]s into one aggregate of 8,
//! 16, 32 or 64 bits. The first declared part occupies the most significant
//! bits of the aggregate.

use std::collections::HashMap;
use std::fmt;

use bitvec::prelude::*;

use crate::errors::{ConfigError, ValidationError};
use crate::field::{validate_name, FieldEntry, Value};
use crate::random_values;

fn bit_mask(bits: usize) -> u64 {
    u64::MAX >> (64 - bits)
}

/// One named slice of a bit-packed aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPart {
    name: String,
    bits: usize,
    default: u64,
    value: u64,
    enumeration: Option<HashMap<u64, String>>,
    hex: bool,
}

impl FieldPart {
    /// Declares a part that is `bits` bits wide.
    pub fn new(name: &str, default: u64, bits: usize) -> Result<Self, ConfigError> {
        validate_name(name)?;
        if bits == 0 || bits > 64 {
            return Err(ConfigError::PartTooWide {
                part: name.to_string(),
                bits,
                aggregate: 64,
            });
        }
        if default > bit_mask(bits) {
            return Err(ConfigError::PartDefaultOutOfRange {
                part: name.to_string(),
                value: default,
                bits,
            });
        }
        Ok(FieldPart {
            name: name.to_string(),
            bits,
            default,
            value: default,
            enumeration: None,
            hex: false,
        })
    }

    /// Attaches an enumeration mapping part values to symbolic names.
    pub fn with_enumeration(
        mut self,
        enumeration: HashMap<u64, String>,
    ) -> Result<Self, ConfigError> {
        for key in enumeration.keys() {
            if *key > bit_mask(self.bits) {
                return Err(ConfigError::EnumKeyOutOfRange {
                    field: self.name.clone(),
                    key: *key as i128,
                    low: 0,
                    high: bit_mask(self.bits) as i128,
                });
            }
        }
        self.enumeration = Some(enumeration);
        Ok(self)
    }

    /// Renders the part value in hexadecimal in listings.
    pub fn with_hex(mut self) -> Self {
        self.hex = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn default(&self) -> u64 {
        self.default
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn hex(&self) -> bool {
        self.hex
    }

    pub fn enumeration(&self) -> Option<&HashMap<u64, String>> {
        self.enumeration.as_ref()
    }

    /// Sets the part from an integer or, when an enumeration is attached,
    /// from a symbolic name.
    pub fn set_value(&mut self, value: Value) -> Result<(), ValidationError> {
        match value {
            Value::Int(v) => {
                let high = bit_mask(self.bits) as i128;
                if v < 0 || v > high {
                    return Err(ValidationError::out_of_range(&self.name, v, 0, high));
                }
                self.value = v as u64;
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

    fn render_plain(&self, value: u64) -> String {
        if self.hex {
            format!("{value:#x}")
        } else {
            value.to_string()
        }
    }

    /// Renders a value through the enumeration when the code has a name.
    fn render_symbol(&self, value: u64) -> String {
        if let Some(enumeration) = &self.enumeration {
            if let Some(label) = enumeration.get(&value) {
                return label.clone();
            }
        }
        self.render_plain(value)
    }
}

impl fmt::Display for FieldPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldPart(name={}, default={}, value={})",
            self.name,
            self.render_symbol(self.default),
            self.render_symbol(self.value)
        )
    }
}

/// Aggregate width of a [BitsField].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsWidth {
    Byte,
    Short,
    Int,
    Long,
}

impl BitsWidth {
    pub fn bits(self) -> usize {
        match self {
            BitsWidth::Byte => 8,
            BitsWidth::Short => 16,
            BitsWidth::Int => 32,
            BitsWidth::Long => 64,
        }
    }

    pub fn size(self) -> usize {
        self.bits() / 8
    }

    fn stem(self) -> &'static str {
        match self {
            BitsWidth::Byte => "Byte",
            BitsWidth::Short => "Short",
            BitsWidth::Int => "Int",
            BitsWidth::Long => "Long",
        }
    }
}

/// A field whose parts share one fixed-width aggregate, first part in the
/// most significant position.
#[derive(Debug, Clone, PartialEq)]
pub struct BitsField {
    parts: Vec<FieldPart>,
    width: BitsWidth,
    hex: bool,
    computed: bool,
}

impl BitsField {
    /// Declares a bit composite. The part widths must sum exactly to the
    /// aggregate width.
    pub fn new(parts: Vec<FieldPart>, width: BitsWidth) -> Result<Self, ConfigError> {
        if parts.is_empty() {
            return Err(ConfigError::EmptyParts);
        }
        for part in &parts {
            if part.bits() >= width.bits() && parts.len() > 1 || part.bits() > width.bits() {
                return Err(ConfigError::PartTooWide {
                    part: part.name().to_string(),
                    bits: part.bits(),
                    aggregate: width.bits(),
                });
            }
        }
        let total: usize = parts.iter().map(|part| part.bits()).sum();
        if total != width.bits() {
            return Err(ConfigError::BitWidthMismatch {
                given: total,
                expected: width.bits(),
            });
        }
        Ok(BitsField {
            parts,
            width,
            hex: false,
            computed: false,
        })
    }

    pub fn byte(parts: Vec<FieldPart>) -> Result<Self, ConfigError> {
        Self::new(parts, BitsWidth::Byte)
    }

    pub fn short(parts: Vec<FieldPart>) -> Result<Self, ConfigError> {
        Self::new(parts, BitsWidth::Short)
    }

    pub fn int(parts: Vec<FieldPart>) -> Result<Self, ConfigError> {
        Self::new(parts, BitsWidth::Int)
    }

    pub fn long(parts: Vec<FieldPart>) -> Result<Self, ConfigError> {
        Self::new(parts, BitsWidth::Long)
    }

    /// Renders every part in hexadecimal in listings.
    pub fn with_hex(mut self) -> Self {
        self.hex = true;
        self
    }

    pub fn parts(&self) -> &[FieldPart] {
        &self.parts
    }

    pub fn width(&self) -> BitsWidth {
        self.width
    }

    pub fn size(&self) -> usize {
        self.width.size()
    }

    pub fn hex(&self) -> bool {
        self.hex
    }

    pub fn value_was_computed(&self) -> bool {
        self.computed
    }

    /// Aggregate value with the first part in the most significant bits.
    pub fn value(&self) -> u64 {
        let mut aggregate = 0u64;
        for part in &self.parts {
            aggregate = (aggregate << part.bits()) | part.value();
        }
        aggregate
    }

    /// Sets every part at once from an aggregate integer.
    pub fn set_value(&mut self, value: Value) -> Result<(), ValidationError> {
        let name = self
            .parts
            .first()
            .map(|part| part.name().to_string())
            .unwrap_or_default();
        let v = match value {
            Value::Int(v) => v,
            _ => return Err(ValidationError::wrong_kind(&name, "an integer")),
        };
        let high = bit_mask(self.width.bits()) as i128;
        if v < 0 || v > high {
            return Err(ValidationError::out_of_range(&name, v, 0, high));
        }
        let mut aggregate = v as u64;
        for part in self.parts.iter_mut().rev() {
            part.value = aggregate & bit_mask(part.bits);
            aggregate >>= part.bits;
        }
        Ok(())
    }

    pub(crate) fn set_part_by_index(
        &mut self,
        index: usize,
        value: Value,
    ) -> Result<(), ValidationError> {
        match self.parts.get_mut(index) {
            Some(part) => part.set_value(value),
            None => Err(ValidationError::wrong_kind(
                "part",
                "an existing part index",
            )),
        }
    }

    pub(crate) fn raw(&self) -> Vec<u8> {
        let mut bits = bitvec![u8, Msb0; 0; self.width.bits()];
        let mut offset = 0;
        for part in &self.parts {
            bits[offset..offset + part.bits()].store_be::<u64>(part.value());
            offset += part.bits();
        }
        bits.into_vec()
    }

    /// Consumes `size()` bytes when available, otherwise defers.
    pub(crate) fn compute_value<'a>(&mut self, data: &'a [u8]) -> &'a [u8] {
        let size = self.size();
        if data.len() < size {
            return data;
        }
        let bits = BitSlice::<u8, Msb0>::from_slice(&data[..size]);
        let mut offset = 0;
        for part in &mut self.parts {
            part.value = bits[offset..offset + part.bits].load_be::<u64>();
            offset += part.bits;
        }
        self.computed = true;
        &data[size..]
    }

    pub(crate) fn randomize(&mut self) {
        for part in &mut self.parts {
            part.value = random_values::rand_bits(part.bits);
        }
    }

    fn label(&self) -> String {
        format!("{}BitsField", self.width.stem())
    }

    pub(crate) fn entries(&self) -> Vec<FieldEntry> {
        let label = self.label();
        self.parts
            .iter()
            .map(|part| {
                let render = |value: u64| {
                    if self.hex && !part.hex() {
                        format!("{value:#x}")
                    } else {
                        part.render_plain(value)
                    }
                };
                FieldEntry {
                    name: part.name().to_string(),
                    label: label.clone(),
                    value: render(part.value()),
                    default: render(part.default()),
                }
            })
            .collect()
    }
}

impl fmt::Display for BitsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.label(), parts)
    }
}
