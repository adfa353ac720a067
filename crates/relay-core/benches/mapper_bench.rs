//! Criterion benchmarks for the per-event hot path on the receiver.
//!
//! Every inbound pointer frame is decoded and then mapped into target space,
//! so both must stay far below the ~8 ms budget of a 120 Hz pointer feed.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench mapper_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::{decode_frame, encode_event, CalibrationMapper, Extent, Point, PointerEvent};

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    let mappers = [
        ("identity_full_hd", CalibrationMapper::from_extent(Extent::new(1920, 1080))),
        ("offset_region", CalibrationMapper::new(Point::new(320, 180), Extent::new(1280, 720))),
        ("degenerate", CalibrationMapper::new(Point::new(100, 100), Extent::new(0, 0))),
    ];
    for (name, mapper) in mappers {
        group.bench_with_input(BenchmarkId::from_parameter(name), &mapper, |b, m| {
            b.iter(|| m.map(black_box(960), black_box(540), black_box(1080), black_box(2400)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    let frames = [
        ("move", encode_event(&PointerEvent::moved(960, 540)).unwrap_or_default()),
        ("click", encode_event(&PointerEvent::click(960, 540)).unwrap_or_default()),
        ("invalid_json", "{\"type\":\"move\",".to_string()),
        ("unknown_type", r#"{"type":"scroll","dy":3}"#.to_string()),
    ];
    for (name, text) in &frames {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, t| {
            b.iter(|| decode_frame(black_box(t)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_map, bench_decode);
criterion_main!(benches);
