use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use std::collections::HashMap;

use bytelayout::utils::checksum;
use bytelayout::{BitsField, FieldPart, IntFormat, NumericField, PacketType, Value};

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
            NumericField::new("identification", 1, IntFormat::U16).unwrap().into(),
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
            NumericField::new("ttl", 64, IntFormat::U8).unwrap().into(),
        ],
    )
    .unwrap()
}

fn benchmark_instance_creation(c: &mut Criterion) {
    let layout = mini_ip();
    c.bench_function("instance_creation", |b| {
        b.iter(|| black_box(layout.instance()));
    });
}

fn benchmark_serialization(c: &mut Criterion) {
    let packet = mini_ip()
        .instance_with(&[
            ("length", Value::Int(40)),
            ("identification", Value::Int(0x1234)),
        ])
        .unwrap();

    c.bench_function("serialization", |b| {
        b.iter(|| black_box(packet.raw()));
    });
}

fn benchmark_deserialization(c: &mut Criterion) {
    let layout = mini_ip();
    let data = layout.instance().raw();

    c.bench_function("deserialization", |b| {
        b.iter(|| black_box(layout.from_bytes(black_box(&data))));
    });
}

fn benchmark_checksum_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_calculation");

    let sizes = vec![16, 64, 256, 1024];

    for size in sizes {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();

        group.bench_with_input(BenchmarkId::new("checksum", size), &data, |b, data| {
            b.iter(|| black_box(checksum(black_box(data))));
        });
    }

    group.finish();
}

fn benchmark_bulk_serialization(c: &mut Criterion) {
    let layout = mini_ip();
    let mut group = c.benchmark_group("bulk_operations");

    let counts = vec![10, 50, 100];

    for count in counts {
        group.bench_with_input(
            BenchmarkId::new("bulk_serialization", count),
            &count,
            |b, &count| {
                b.iter(|| {
                    let mut buffers = Vec::with_capacity(count);
                    for i in 0..count {
                        let packet = layout
                            .instance_with(&[("identification", Value::Int(i as i128))])
                            .unwrap();
                        buffers.push(packet.raw());
                    }
                    black_box(buffers)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_instance_creation,
    benchmark_serialization,
    benchmark_deserialization,
    benchmark_checksum_calculation,
    benchmark_bulk_serialization
);

criterion_main!(benches);
