//! Benchmarks for property update fan-out
//!
//! Run with: cargo bench --bench property_updates

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use gathered::core::{AnyProperty, BasicProperty, ByteCountFormatter, Property};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn bench_update_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/update_value");

    for listeners in [0, 1, 8, 64] {
        let property = BasicProperty::new("Used Memory", 0u64).with_formatter(ByteCountFormatter);
        let delivered = Arc::new(AtomicU64::new(0));
        let _subscriptions: Vec<_> = (0..listeners)
            .map(|_| {
                let delivered = Arc::clone(&delivered);
                property.add_update_listener(move |snapshot| {
                    delivered.fetch_add(snapshot.value & 1, Ordering::Relaxed);
                })
            })
            .collect();

        let mut value = 0u64;
        group.bench_with_input(BenchmarkId::new("listeners", listeners), &listeners, |b, _| {
            b.iter(|| {
                value += 1;
                property.update_value_now(black_box(value));
            })
        });
    }

    group.finish();
}

fn bench_erased_snapshot(c: &mut Criterion) {
    let property = Arc::new(BasicProperty::new("Used Memory", 8_589_934_592u64).with_formatter(ByteCountFormatter));
    let erased = AnyProperty::new(Arc::clone(&property));

    c.bench_function("property/typed_formatted_value", |b| {
        b.iter(|| black_box(property.formatted_value()))
    });
    c.bench_function("property/erased_snapshot", |b| {
        b.iter(|| black_box(erased.snapshot()))
    });
}

criterion_group!(benches, bench_update_fan_out, bench_erased_snapshot);
criterion_main!(benches);
