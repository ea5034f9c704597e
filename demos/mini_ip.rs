//! Walkthrough of the packet API on a reduced IP-style header.
//!
//! Run with `cargo run --example mini_ip`.

use std::collections::HashMap;

use bytelayout::prelude::*;

fn mini_ip() -> Result<PacketType, PacketError> {
    let mut flags = HashMap::new();
    flags.insert(1u64, "MF".to_string());
    flags.insert(2u64, "DF".to_string());
    flags.insert(4u64, "evil".to_string());

    let mut protocols = HashMap::new();
    protocols.insert(1, "ICMP".to_string());
    protocols.insert(6, "TCP".to_string());
    protocols.insert(17, "UDP".to_string());

    let layout = PacketType::new(
        "MiniIP",
        vec![
            BitsField::byte(vec![
                FieldPart::new("version", 4, 4)?,
                FieldPart::new("ihl", 5, 4)?,
            ])?
            .into(),
            NumericField::new("length", 20, IntFormat::U16)?.into(),
            NumericField::new("identification", 1, IntFormat::U16)?.into(),
            BitsField::short(vec![
                FieldPart::new("flags", 0b010, 3)?.with_enumeration(flags)?,
                FieldPart::new("offset", 0, 13)?,
            ])?
            .with_hex()
            .into(),
            NumericField::new("ttl", 64, IntFormat::U8)?.into(),
            NumericField::new("protocol", 17, IntFormat::U8)?
                .with_enumeration(protocols)?
                .into(),
        ],
    )?;
    Ok(layout)
}

fn payload() -> Result<PacketType, PacketError> {
    let layout = PacketType::new(
        "Payload",
        vec![
            NumericField::new("rdlength", 0, IntFormat::U16)?.into(),
            VarStringField::bytes("rdata", b"", Some(rdata_length))?.into(),
        ],
    )?;
    Ok(layout)
}

fn rdata_length(view: &PacketView<'_>) -> Option<usize> {
    view.get_int("rdlength").map(|length| length as usize)
}

fn main() -> LayoutResult<()> {
    env_logger::init();

    let layout = mini_ip()?;

    let mut packet = layout.instance();
    println!("defaults:\n{}", packet.show());

    packet.set("identification", Value::Int(0x1234))?;
    packet.set("protocol", Value::from("TCP"))?;
    packet.set("flags", Value::from("MF"))?;
    println!("after assignment: {packet}");

    let wire = packet.raw();
    println!("wire checksum: {:#06x}", checksum(&wire));
    println!("hexdump:\n{}\n", packet.hexdump());

    let decoded = layout.from_bytes(&wire)?;
    assert_eq!(decoded, packet);
    println!("decoded back: {decoded}");

    let inner = payload()?;
    let mut stacked = wire.clone();
    stacked.extend(
        inner
            .instance_with(&[
                ("rdlength", Value::Int(3)),
                ("rdata", Value::from(vec![0xaau8, 0xbb, 0xcc])),
            ])?
            .raw(),
    );
    for layer in extract_layers(&stacked, &[&layout, &inner])? {
        println!("layer {}: {layer}", layer.name());
    }

    let random = layout.random_packet();
    println!("random instance:\n{}", random.show());

    Ok(())
}
