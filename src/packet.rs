//! Packet types and instances.
//!
//! A [PacketType] is an immutable blueprint: an ordered field list plus a
//! name index resolving every field and bit part name to its position. A
//! [Packet] is one mutable instance of a blueprint; instances never share
//! field state.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::errors::{ConfigError, LayoutResult, PacketError};
use crate::field::{Field, Value};
use crate::utils::network;

/// Attribute names a field may not take, they collide with packet
/// operations.
static RESERVED_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["raw", "bytes", "fields", "hexdump", "show", "clone"])
});

/// Position of a name in a blueprint: field index plus, for bit composite
/// fields, the part index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub field: usize,
    pub part: Option<usize>,
}

static EMPTY_INDEX: Lazy<HashMap<String, Slot>> = Lazy::new(HashMap::new);

/// Read access to the already decoded part of a packet, handed to
/// conditional predicates and variable length hints.
///
/// During decoding the view only exposes fields positioned before the one
/// being decoded, lookups on later fields return `None`.
#[derive(Clone, Copy)]
pub struct PacketView<'a> {
    fields: &'a [Field],
    index: &'a HashMap<String, Slot>,
}

impl<'a> PacketView<'a> {
    /// A view over no fields, every lookup returns `None`.
    pub fn empty() -> PacketView<'static> {
        PacketView {
            fields: &[],
            index: &EMPTY_INDEX,
        }
    }

    /// Current value of a field or bit part, `None` when the name is
    /// unknown or not visible yet.
    pub fn get(&self, name: &str) -> Option<Value> {
        let slot = self.index.get(name)?;
        self.fields.get(slot.field)?.slot_value(slot.part)
    }

    /// Integer shortcut for length hints and predicates.
    pub fn get_int(&self, name: &str) -> Option<i128> {
        self.get(name)?.as_int()
    }
}

#[derive(Debug)]
struct TypeInner {
    name: String,
    blueprint: Vec<Field>,
    index: HashMap<String, Slot>,
}

/// An immutable packet blueprint, cheap to clone and share.
#[derive(Debug, Clone)]
pub struct PacketType(Arc<TypeInner>);

impl PacketType {
    /// Declares a packet type from an ordered field list. Every field and
    /// bit part name must be unique across the whole packet and must not
    /// shadow a reserved attribute name.
    pub fn new(name: &str, fields: Vec<Field>) -> Result<Self, ConfigError> {
        crate::field::validate_name(name)?;
        if fields.is_empty() {
            return Err(ConfigError::EmptyFieldList);
        }
        let mut index = HashMap::new();
        for (position, field) in fields.iter().enumerate() {
            for (slot_name, part) in field.slots() {
                if RESERVED_NAMES.contains(slot_name.as_str()) {
                    return Err(ConfigError::ReservedFieldName(slot_name));
                }
                let slot = Slot {
                    field: position,
                    part,
                };
                if index.insert(slot_name.clone(), slot).is_some() {
                    return Err(ConfigError::DuplicateFieldName(slot_name));
                }
            }
        }
        Ok(PacketType(Arc::new(TypeInner {
            name: name.to_string(),
            blueprint: fields,
            index,
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Byte width of the fixed portion, variable fields counted at their
    /// default length.
    pub fn size(&self) -> usize {
        self.0.blueprint.iter().map(|field| field.size()).sum()
    }

    /// Builds an instance carrying the default values. Field state is deep
    /// copied, instances never alias the blueprint or each other.
    pub fn instance(&self) -> Packet {
        Packet {
            layout: self.clone(),
            fields: self.0.blueprint.clone(),
        }
    }

    /// Builds an instance and applies the given overrides.
    pub fn instance_with(&self, values: &[(&str, Value)]) -> LayoutResult<Packet> {
        let mut packet = self.instance();
        for (name, value) in values {
            packet.set(name, value.clone())?;
        }
        Ok(packet)
    }

    /// Decodes a packet from the front of `data`.
    ///
    /// Fields consume the buffer in declaration order. When a field finds
    /// fewer bytes than it needs it defers, keeps its default and decoding
    /// short-circuits, trailing fields also keep their defaults. Structural
    /// errors like invalid UTF-8 in a text field abort with an error.
    pub fn from_bytes(&self, data: &[u8]) -> LayoutResult<Packet> {
        let mut packet = self.instance();
        let mut cursor: &[u8] = data;
        for position in 0..packet.fields.len() {
            let (decoded, rest) = packet.fields.split_at_mut(position);
            let view = PacketView {
                fields: decoded,
                index: &self.0.index,
            };
            let field = &mut rest[0];
            cursor = field.compute_value(cursor, &view).map_err(PacketError::from)?;
            if !field.is_satisfied() {
                log::debug!(
                    "{}: ran out of bytes at field index {position}, \
                     remaining fields keep their defaults",
                    self.0.name
                );
                break;
            }
        }
        Ok(packet)
    }

    /// Builds an instance with every field filled at random, bit parts
    /// drawn independently.
    pub fn random_packet(&self) -> Packet {
        let mut packet = self.instance();
        for field in &mut packet.fields {
            field.randomize();
        }
        packet
    }
}

impl PartialEq for PacketType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One mutable packet instance.
#[derive(Debug, Clone)]
pub struct Packet {
    layout: PacketType,
    fields: Vec<Field>,
}

impl Packet {
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    pub fn layout(&self) -> &PacketType {
        &self.layout
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn view(&self) -> PacketView<'_> {
        PacketView {
            fields: &self.fields,
            index: &self.layout.0.index,
        }
    }

    /// Current value of a field or bit part.
    pub fn get(&self, name: &str) -> LayoutResult<Value> {
        self.view()
            .get(name)
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()).into())
    }

    /// Sets a field or bit part. Validation happens here, never at encode
    /// time.
    pub fn set(&mut self, name: &str, value: Value) -> LayoutResult<()> {
        let slot = *self
            .layout
            .0
            .index
            .get(name)
            .ok_or_else(|| PacketError::from(ConfigError::UnknownField(name.to_string())))?;
        self.fields[slot.field]
            .slot_set(slot.part, value)
            .map_err(PacketError::from)
    }

    /// Serializes the packet, field outputs concatenated in declaration
    /// order. Suppressed conditional fields contribute nothing.
    pub fn raw(&self) -> Vec<u8> {
        let view = self.view();
        let mut out = Vec::with_capacity(self.layout.size());
        for field in &self.fields {
            out.extend_from_slice(&field.raw(&view));
        }
        out
    }

    /// True when every field was recovered from input bytes or is a
    /// conditional field its predicate suppressed.
    pub fn all_fields_are_computed(&self) -> bool {
        self.fields.iter().all(|field| field.is_satisfied())
    }

    /// Multi-line listing of fields, names padded to the longest one:
    /// `version : ByteBitsField = 4 (4)`.
    pub fn show(&self) -> String {
        let view = self.view();
        let entries: Vec<_> = self
            .fields
            .iter()
            .flat_map(|field| field.entries(&view))
            .collect();
        let width = entries
            .iter()
            .map(|entry| entry.name.len())
            .max()
            .unwrap_or(0);
        let mut out = String::new();
        for entry in entries {
            out.push_str(&format!(
                "{:<width$} : {} = {} ({})\n",
                entry.name, entry.label, entry.value, entry.default
            ));
        }
        out
    }

    /// tcpdump style hex and ASCII dump of the serialized packet.
    pub fn hexdump(&self) -> String {
        network::hexdump(&self.raw())
    }

    /// Clones the packet and applies the given overrides, the receiver is
    /// untouched.
    pub fn evolve(&self, values: &[(&str, Value)]) -> LayoutResult<Packet> {
        let mut packet = self.clone();
        for (name, value) in values {
            packet.set(name, value.clone())?;
        }
        Ok(packet)
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.fields == other.fields
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view();
        let entries = self
            .fields
            .iter()
            .flat_map(|field| field.entries(&view))
            .map(|entry| format!("{}={}", entry.name, entry.value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "<{}: {}>", self.name(), entries)
    }
}

/// Splits `data` into consecutive layers, one per packet type, in order.
///
/// Each layer consumes as many bytes as its serialized form occupies.
/// Running out of bytes before every type was given data is an error
/// naming the first layer that received nothing.
pub fn extract_layers(data: &[u8], layers: &[&PacketType]) -> LayoutResult<Vec<Packet>> {
    if layers.is_empty() {
        return Err(ConfigError::NoPacketTypes.into());
    }
    let mut packets = Vec::with_capacity(layers.len());
    let mut cursor = data;
    for layer in layers {
        if cursor.is_empty() {
            return Err(PacketError::OutOfData {
                layer: layer.name().to_string(),
            });
        }
        let packet = layer.from_bytes(cursor)?;
        let consumed = packet.raw().len().min(cursor.len());
        cursor = &cursor[consumed..];
        log::trace!("extracted layer {} ({consumed} bytes)", layer.name());
        packets.push(packet);
    }
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use crate::field::{
        BitsField, ConditionalField, FieldPart, FixedStringField, IntFormat, NumericField,
        VarStringField,
    };

    fn disney() -> PacketType {
        let mut enumeration = HashMap::new();
        enumeration.insert(2, "cool".to_string());
        PacketType::new(
            "Disney",
            vec![
                NumericField::new("mickey", 2, IntFormat::U16).unwrap().into(),
                NumericField::new("minnie", 3, IntFormat::U8).unwrap().into(),
                NumericField::new("donald", 1, IntFormat::U32)
                    .unwrap()
                    .with_enumeration(enumeration)
                    .unwrap()
                    .into(),
            ],
        )
        .unwrap()
    }

    fn mini_ip() -> PacketType {
        let mut flags = HashMap::new();
        flags.insert(1u64, "MF".to_string());
        flags.insert(2u64, "DF".to_string());
        flags.insert(4u64, "evil".to_string());
        PacketType::new(
            "MiniIP",
            vec![
                BitsField::byte(vec![
                    FieldPart::new("version", 4, 4).unwrap(),
                    FieldPart::new("ihl", 5, 4).unwrap(),
                ])
                .unwrap()
                .into(),
                NumericField::new("length", 20, IntFormat::U16).unwrap().into(),
                BitsField::short(vec![
                    FieldPart::new("flags", 0b010, 3)
                        .unwrap()
                        .with_enumeration(flags)
                        .unwrap(),
                    FieldPart::new("offset", 0, 13).unwrap(),
                ])
                .unwrap()
                .with_hex()
                .into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_bad_layouts() {
        assert_eq!(
            Err(ConfigError::EmptyFieldList),
            PacketType::new("Empty", vec![]).map(|_| ())
        );

        let duplicated = PacketType::new(
            "Twice",
            vec![
                NumericField::new("apple", 0, IntFormat::U8).unwrap().into(),
                NumericField::new("apple", 0, IntFormat::U16).unwrap().into(),
            ],
        );
        assert_eq!(
            Err(ConfigError::DuplicateFieldName("apple".to_string())),
            duplicated.map(|_| ())
        );

        let reserved = PacketType::new(
            "Reserved",
            vec![NumericField::new("raw", 0, IntFormat::U8).unwrap().into()],
        );
        assert_eq!(
            Err(ConfigError::ReservedFieldName("raw".to_string())),
            reserved.map(|_| ())
        );
    }

    #[test]
    fn test_part_names_share_packet_namespace() {
        let clash = PacketType::new(
            "Clash",
            vec![
                NumericField::new("version", 0, IntFormat::U8).unwrap().into(),
                BitsField::byte(vec![
                    FieldPart::new("version", 4, 4).unwrap(),
                    FieldPart::new("ihl", 5, 4).unwrap(),
                ])
                .unwrap()
                .into(),
            ],
        );
        assert_eq!(
            Err(ConfigError::DuplicateFieldName("version".to_string())),
            clash.map(|_| ())
        );
    }

    #[test]
    fn test_get_and_set_by_name() {
        let mut packet = disney().instance();
        assert_eq!(Value::Int(2), packet.get("mickey").unwrap());

        packet.set("mickey", Value::Int(1)).unwrap();
        packet.set("donald", Value::from("cool")).unwrap();
        assert_eq!(Value::Int(1), packet.get("mickey").unwrap());
        assert_eq!(Value::Int(2), packet.get("donald").unwrap());

        let error = packet.get("pluto").unwrap_err();
        assert_eq!(
            "configuration error: there is no attribute with name pluto",
            error.to_string()
        );
    }

    #[test]
    fn test_set_propagates_validation_errors() {
        let mut packet = disney().instance();
        let error = packet.set("minnie", Value::Int(300)).unwrap_err();
        assert!(matches!(
            error,
            PacketError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(Value::Int(3), packet.get("minnie").unwrap());
    }

    #[test]
    fn test_bit_parts_are_packet_attributes() {
        let mut packet = mini_ip().instance();
        assert_eq!(Value::Int(4), packet.get("version").unwrap());
        packet.set("ihl", Value::Int(6)).unwrap();
        assert_eq!(Value::Int(6), packet.get("ihl").unwrap());
        packet.set("flags", Value::from("MF")).unwrap();
        assert_eq!(Value::Int(1), packet.get("flags").unwrap());
    }

    #[test]
    fn test_raw_concatenates_in_declaration_order() {
        let packet = disney()
            .instance_with(&[("mickey", Value::Int(1)), ("donald", Value::from("cool"))])
            .unwrap();
        assert_eq!(
            vec![0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x02],
            packet.raw()
        );
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let layout = disney();
        let packet = layout
            .from_bytes(&[0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x02])
            .unwrap();
        assert_eq!(Value::Int(1), packet.get("mickey").unwrap());
        assert_eq!(Value::Int(3), packet.get("minnie").unwrap());
        assert_eq!(Value::Int(2), packet.get("donald").unwrap());
        assert!(packet.all_fields_are_computed());
    }

    #[test]
    fn test_from_bytes_short_input_short_circuits() {
        let layout = disney();
        // mickey decodes, minnie decodes, donald is 4 bytes but only 2 left
        let packet = layout.from_bytes(&[0x00, 0x07, 0x09, 0xaa, 0xbb]).unwrap();
        assert_eq!(Value::Int(7), packet.get("mickey").unwrap());
        assert_eq!(Value::Int(9), packet.get("minnie").unwrap());
        assert_eq!(Value::Int(1), packet.get("donald").unwrap());
        assert!(!packet.all_fields_are_computed());
    }

    #[test]
    fn test_from_bytes_accepts_unknown_enum_codes() {
        let layout = disney();
        let packet = layout
            .from_bytes(&[0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x63])
            .unwrap();
        assert_eq!(Value::Int(0x63), packet.get("donald").unwrap());
        assert!(packet.all_fields_are_computed());
    }

    fn with_options() -> PacketType {
        PacketType::new(
            "WithOptions",
            vec![
                NumericField::new("has_options", 0, IntFormat::U8).unwrap().into(),
                ConditionalField::new(
                    NumericField::new("options", 0, IntFormat::U16).unwrap().into(),
                    |view| view.get_int("has_options") == Some(1),
                )
                .into(),
                NumericField::new("tail", 0xff, IntFormat::U8).unwrap().into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_conditional_field_suppressed_on_encode() {
        let layout = with_options();
        assert_eq!(vec![0x00, 0xff], layout.instance().raw());

        let packet = layout
            .instance_with(&[("has_options", Value::Int(1)), ("options", Value::Int(0x1234))])
            .unwrap();
        assert_eq!(vec![0x01, 0x12, 0x34, 0xff], packet.raw());
    }

    #[test]
    fn test_conditional_field_vacuously_satisfied() {
        let layout = with_options();
        let packet = layout.from_bytes(&[0x00, 0xab]).unwrap();
        assert_eq!(Value::Int(0xab), packet.get("tail").unwrap());
        assert_eq!(Value::Int(0), packet.get("options").unwrap());
        assert!(packet.all_fields_are_computed());
    }

    #[test]
    fn test_conditional_field_decoded_when_predicate_holds() {
        let layout = with_options();
        let packet = layout.from_bytes(&[0x01, 0x12, 0x34, 0xab]).unwrap();
        assert_eq!(Value::Int(0x1234), packet.get("options").unwrap());
        assert_eq!(Value::Int(0xab), packet.get("tail").unwrap());
        assert!(packet.all_fields_are_computed());
    }

    #[test]
    fn test_var_string_length_from_sibling() {
        let layout = PacketType::new(
            "Record",
            vec![
                NumericField::new("rdlength", 0, IntFormat::U16).unwrap().into(),
                VarStringField::bytes("rdata", b"", Some(|view| {
                    view.get_int("rdlength").map(|length| length as usize)
                }))
                .unwrap()
                .into(),
                NumericField::new("footer", 0, IntFormat::U8).unwrap().into(),
            ],
        )
        .unwrap();

        let packet = layout
            .from_bytes(&[0x00, 0x03, 0xaa, 0xbb, 0xcc, 0x07])
            .unwrap();
        assert_eq!(
            Value::Bytes(vec![0xaa, 0xbb, 0xcc]),
            packet.get("rdata").unwrap()
        );
        assert_eq!(Value::Int(7), packet.get("footer").unwrap());
        assert!(packet.all_fields_are_computed());
    }

    #[test]
    fn test_var_string_hint_on_later_sibling_defers() {
        // the length carrier sits after the variable field, so the hint
        // cannot resolve during decode and the field must not eat its bytes
        let layout = PacketType::new(
            "Backwards",
            vec![
                VarStringField::bytes("rdata", b"", Some(|view| {
                    view.get_int("rdlength").map(|length| length as usize)
                }))
                .unwrap()
                .into(),
                NumericField::new("rdlength", 0, IntFormat::U16).unwrap().into(),
            ],
        )
        .unwrap();

        let packet = layout.from_bytes(&[0xaa, 0xbb, 0x00, 0x02]).unwrap();
        assert_eq!(Value::Bytes(vec![]), packet.get("rdata").unwrap());
        assert_eq!(Value::Int(0), packet.get("rdlength").unwrap());
        assert!(!packet.all_fields_are_computed());
    }

    #[test]
    fn test_decode_rejects_hinted_length_above_cap() {
        let layout = PacketType::new(
            "Capped",
            vec![
                NumericField::new("rdlength", 0, IntFormat::U8).unwrap().into(),
                VarStringField::bytes("payload", b"", Some(|view| {
                    view.get_int("rdlength").map(|length| length as usize)
                }))
                .unwrap()
                .with_max_length(2)
                .unwrap()
                .into(),
            ],
        )
        .unwrap();

        let error = layout.from_bytes(&[0x04, 1, 2, 3, 4]).unwrap_err();
        assert!(matches!(
            error,
            PacketError::Validation(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let layout = disney();
        let mut first = layout.instance();
        let second = layout.instance();
        first.set("mickey", Value::Int(44)).unwrap();
        assert_eq!(Value::Int(2), second.get("mickey").unwrap());

        let clone = first.clone();
        first.set("mickey", Value::Int(55)).unwrap();
        assert_eq!(Value::Int(44), clone.get("mickey").unwrap());
    }

    #[test]
    fn test_evolve_leaves_receiver_untouched() {
        let original = disney().instance();
        let evolved = original.evolve(&[("minnie", Value::Int(9))]).unwrap();
        assert_eq!(Value::Int(3), original.get("minnie").unwrap());
        assert_eq!(Value::Int(9), evolved.get("minnie").unwrap());
        assert_ne!(original, evolved);
    }

    #[test]
    fn test_random_packet_respects_bounds() {
        let layout = mini_ip();
        for _ in 0..20 {
            let packet = layout.random_packet();
            let version = packet.get("version").unwrap().as_int().unwrap();
            assert!((0..=15).contains(&version));
            let offset = packet.get("offset").unwrap().as_int().unwrap();
            assert!((0..=8191).contains(&offset));
        }
    }

    #[test]
    fn test_show_pads_names() {
        let layout = mini_ip();
        let expected = "version : ByteBitsField = 4 (4)\n\
                        ihl     : ByteBitsField = 5 (5)\n\
                        length  : ShortField = 20 (20)\n\
                        flags   : ShortBitsField = 0x2 (0x2)\n\
                        offset  : ShortBitsField = 0x0 (0x0)\n";
        assert_eq!(expected, layout.instance().show());
    }

    #[test]
    fn test_display() {
        let packet = mini_ip().instance();
        assert_eq!(
            "<MiniIP: version=4, ihl=5, length=20, flags=0x2, offset=0x0>",
            packet.to_string()
        );
    }

    #[test]
    fn test_extract_layers() {
        let outer = mini_ip();
        let inner = disney();
        let mut data = outer.instance().raw();
        data.extend(
            disney()
                .instance_with(&[("mickey", Value::Int(1))])
                .unwrap()
                .raw(),
        );

        let layers = extract_layers(&data, &[&outer, &inner]).unwrap();
        assert_eq!(2, layers.len());
        assert_eq!("MiniIP", layers[0].name());
        assert_eq!(Value::Int(1), layers[1].get("mickey").unwrap());
    }

    #[test]
    fn test_extract_layers_out_of_data() {
        let outer = mini_ip();
        let inner = disney();
        let data = outer.instance().raw();

        let error = extract_layers(&data, &[&outer, &inner]).unwrap_err();
        assert_eq!(
            "ran out of data before decoding layer Disney",
            error.to_string()
        );
    }

    #[test]
    fn test_extract_layers_requires_types() {
        assert_eq!(
            Err(PacketError::Config(ConfigError::NoPacketTypes)),
            extract_layers(&[0x00], &[]).map(|_| ())
        );
    }

    #[test]
    fn test_fixed_string_round_trip_inside_packet() {
        let layout = PacketType::new(
            "Tagged",
            vec![
                FixedStringField::text("tag", "ping", 4).unwrap().into(),
                NumericField::new("seq", 0, IntFormat::U8).unwrap().into(),
            ],
        )
        .unwrap();
        let packet = layout.from_bytes(b"pong\x02trailing").unwrap();
        assert_eq!(Value::Text("pong".to_string()), packet.get("tag").unwrap());
        assert_eq!(Value::Int(2), packet.get("seq").unwrap());
    }
}
