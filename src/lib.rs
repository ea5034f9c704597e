//! Declarative byte layout engine.
//!
//! A packet layout is declared once as an ordered list of typed fields,
//! then turned into as many independent instances as needed. Instances
//! serialize to network byte order with [Packet::raw] and are recovered
//! from buffers with [PacketType::from_bytes].
//!
//! ```
//! use bytelayout::{IntFormat, NumericField, PacketType, Value};
//!
//! let layout = PacketType::new(
//!     "Ping",
//!     vec![
//!         NumericField::new("kind", 8, IntFormat::U8)?.into(),
//!         NumericField::new("sequence", 0, IntFormat::U16)?.into(),
//!     ],
//! )?;
//!
//! let mut packet = layout.instance();
//! packet.set("sequence", Value::Int(7))?;
//! assert_eq!(vec![0x08, 0x00, 0x07], packet.raw());
//!
//! let decoded = layout.from_bytes(&[0x09, 0x12, 0x34])?;
//! assert_eq!(Value::Int(0x1234), decoded.get("sequence")?);
//! # Ok::<(), bytelayout::PacketError>(())
//! ```

pub mod errors;
pub mod field;
pub mod packet;
pub mod random_values;
pub mod utils;

pub use errors::{ConfigError, LayoutResult, PacketError, ValidationError};
pub use field::{
    BitsField, BitsWidth, Condition, ConditionalField, Field, FieldPart, FixedStringField,
    IntFormat, LengthHint, NumericField, Value, VarStringField,
};
pub use packet::{extract_layers, Packet, PacketType, PacketView};

// 便利な再エクスポート
pub mod prelude {
    pub use crate::errors::{LayoutResult, PacketError};
    pub use crate::field::{
        BitsField, ConditionalField, FieldPart, FixedStringField, IntFormat, NumericField, Value,
        VarStringField,
    };
    pub use crate::packet::{extract_layers, Packet, PacketType, PacketView};
    pub use crate::utils::{checksum, hexdump};
}
