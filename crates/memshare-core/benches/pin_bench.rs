//! Pin/unpin churn benchmarks.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use memshare_core::{Credentials, RegionManager, PAGE_SIZE};

fn bench_full_cycle(c: &mut Criterion) {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(1024 * PAGE_SIZE).unwrap();

    c.bench_function("unpin_pin_full_region", |b| {
        b.iter(|| {
            region.unpin(0, 0).unwrap();
            black_box(region.pin(0, 0).unwrap());
        });
    });
}

fn bench_hole_punch(c: &mut Criterion) {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(1024 * PAGE_SIZE).unwrap();

    c.bench_function("hole_punch_and_remerge", |b| {
        b.iter(|| {
            region.unpin(0, 0).unwrap();
            region.pin(256 * PAGE_SIZE, 512 * PAGE_SIZE).unwrap();
            black_box(region.pin(0, 0).unwrap());
        });
    });
}

fn bench_scattered_intervals(c: &mut Criterion) {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(1024 * PAGE_SIZE).unwrap();

    c.bench_function("scattered_unpin_then_sweep", |b| {
        b.iter(|| {
            // 64 non-adjacent single-page intervals, then one sweeping pin.
            for page in (0..1024).step_by(16) {
                region.unpin(page * PAGE_SIZE, PAGE_SIZE).unwrap();
            }
            black_box(region.pin(0, 0).unwrap());
        });
    });
}

fn bench_purge_walk(c: &mut Criterion) {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(1024 * PAGE_SIZE).unwrap();
    let creds = Credentials::admin();

    c.bench_function("purge_all_64_intervals", |b| {
        b.iter(|| {
            for page in (0..1024).step_by(16) {
                region.unpin(page * PAGE_SIZE, PAGE_SIZE).unwrap();
            }
            black_box(manager.purge_all(&creds).unwrap());
            region.pin(0, 0).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_full_cycle,
    bench_hole_punch,
    bench_scattered_intervals,
    bench_purge_walk
);
criterion_main!(benches);
