//! # Codec Benchmark
//!
//! Measures encode and decode cost of a typical entity update:
//! id, position, heading, orientation, two scalars.
//!
//! Target: a 64-entity snapshot encodes with zero allocations once the
//! pooled writer has warmed up.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use driftwire_codec::{BitReader, BitWriter, Quaternion, Vec3};

#[derive(Clone, Copy)]
struct EntityUpdate {
    id: u32,
    position: Vec3,
    heading: Vec3,
    orientation: Quaternion,
    throttle: f32,
    yaw: f32,
}

fn entities(count: u32) -> Vec<EntityUpdate> {
    (0..count)
        .map(|i| {
            let t = i as f32 * 0.37;
            EntityUpdate {
                id: i,
                position: Vec3::new(t * 10.0, -t, t * 3.0),
                heading: Vec3::new(t.cos(), 0.1, t.sin()),
                orientation: Quaternion::from_axis_angle(Vec3::Y, t),
                throttle: (t * 0.1).fract(),
                yaw: t * 7.0,
            }
        })
        .collect()
}

fn encode(writer: &mut BitWriter, updates: &[EntityUpdate]) {
    writer.reset();
    writer.put_uint(updates.len() as u32, 10);
    for e in updates {
        writer.put_uint(e.id, 20);
        writer.put_vector3(e.position);
        writer.put_normal(e.heading);
        writer.put_quaternion(e.orientation);
        writer.put_ranged_float(e.throttle, 0.0, 1.0, 8);
        writer.put_radians_quantized(e.yaw);
    }
}

fn decode(bytes: &[u8]) -> f32 {
    let mut reader = BitReader::new(bytes);
    let count = reader.get_uint(10).unwrap_or(0);
    let mut acc = 0.0;
    for _ in 0..count {
        acc += reader.get_uint(20).map_or(0.0, |id| id as f32);
        acc += reader.get_vector3().map_or(0.0, |v| v.x);
        acc += reader.get_normal().map_or(0.0, |v| v.y);
        acc += reader.get_quaternion().map_or(0.0, |q| q.w);
        acc += reader.get_ranged_float(0.0, 1.0, 8).unwrap_or(0.0);
        acc += reader.get_radians_quantized().unwrap_or(0.0);
    }
    acc
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_encode");

    for count in [1u32, 16, 64] {
        let updates = entities(count);
        let mut writer = BitWriter::new(0);
        encode(&mut writer, &updates);

        group.throughput(Throughput::Bytes(writer.byte_length() as u64));
        group.bench_with_input(BenchmarkId::new("pooled_writer", count), &updates, |b, updates| {
            b.iter(|| {
                encode(&mut writer, black_box(updates));
                black_box(writer.byte_length())
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_decode");

    for count in [1u32, 16, 64] {
        let mut writer = BitWriter::new(0);
        encode(&mut writer, &entities(count));
        let bytes = writer.into_bytes();

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("reader", count), &bytes, |b, bytes| {
            b.iter(|| black_box(decode(black_box(bytes))));
        });
    }

    group.finish();
}

fn bench_primitives(c: &mut Criterion) {
    let mut writer = BitWriter::new(1 << 16);

    c.bench_function("put_uint_13bit_x1000", |b| {
        b.iter(|| {
            writer.reset();
            for i in 0..1000u32 {
                writer.put_uint(black_box(i), 13);
            }
        });
    });

    c.bench_function("put_quaternion_x1000", |b| {
        let q = Quaternion::from_axis_angle(Vec3::new(0.6, 0.0, 0.8), 1.3);
        b.iter(|| {
            writer.reset();
            for _ in 0..1000 {
                writer.put_quaternion(black_box(q));
            }
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_primitives);
criterion_main!(benches);
