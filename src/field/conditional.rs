//! Fields whose on-wire presence depends on earlier fields.

use std::fmt;

use crate::errors::ValidationError;
use crate::field::Field;
use crate::packet::PacketView;

/// Predicate deciding from the surrounding packet whether the wrapped field
/// is present on the wire.
pub type Condition = fn(&PacketView<'_>) -> bool;

/// Wraps a field that only appears when `condition` holds.
///
/// A suppressed field contributes no bytes on encode, consumes none on
/// decode and counts as vacuously satisfied for the packet completeness
/// flag.
#[derive(Debug, Clone)]
pub struct ConditionalField {
    inner: Box<Field>,
    condition: Condition,
    vacuous: bool,
}

impl ConditionalField {
    pub fn new(inner: Field, condition: Condition) -> Self {
        ConditionalField {
            inner: Box::new(inner),
            condition,
            vacuous: false,
        }
    }

    pub fn inner(&self) -> &Field {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Field {
        &mut self.inner
    }

    /// Whether the predicate currently selects the field.
    pub fn applies(&self, view: &PacketView<'_>) -> bool {
        (self.condition)(view)
    }

    /// Set once a decode pass suppressed the field.
    pub(crate) fn is_vacuous(&self) -> bool {
        self.vacuous
    }

    pub(crate) fn raw(&self, view: &PacketView<'_>) -> Vec<u8> {
        if self.applies(view) {
            self.inner.raw(view)
        } else {
            Vec::new()
        }
    }

    pub(crate) fn compute_value<'a>(
        &mut self,
        data: &'a [u8],
        view: &PacketView<'_>,
    ) -> Result<&'a [u8], ValidationError> {
        if self.applies(view) {
            self.vacuous = false;
            self.inner.compute_value(data, view)
        } else {
            self.vacuous = true;
            Ok(data)
        }
    }
}

// condition is a fn pointer, comparing it would compare code addresses.
impl PartialEq for ConditionalField {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner && self.vacuous == other.vacuous
    }
}

impl fmt::Display for ConditionalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.as_ref() {
            Field::Numeric(inner) => write!(f, "ConditionalField({inner})"),
            Field::FixedString(inner) => write!(f, "ConditionalField({inner})"),
            Field::VarString(inner) => write!(f, "ConditionalField({inner})"),
            Field::Bits(inner) => write!(f, "ConditionalField({inner})"),
            Field::Conditional(inner) => write!(f, "ConditionalField({inner})"),
        }
    }
}
