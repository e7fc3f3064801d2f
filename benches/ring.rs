// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Benchmarks the semaphore-gated ring (component B) — the replacement for
// the mutex/condvar ring the original `bench_ipc` measured. Single-threaded
// store/block_load round trips at three message sizes (mirroring the size
// tiers in `alloc.rs`), plus a threaded producer/consumer throughput run
// standing in for `bench_ipc`'s 1-sender/1-receiver `ipc::channel` case.

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::registry::{ResourceRegistry, ShmManager};

const SMALL: usize = 48;
const MEDIUM: usize = 256;
const LARGE: usize = 4096;

const SIZES: &[(&str, usize)] = &[
    ("small_48", SMALL),
    ("medium_256", MEDIUM),
    ("large_4096", LARGE),
];

fn bench_store_block_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_store_block_load");

    for &(label, size) in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &size, |b, &sz| {
            let registry = ResourceRegistry::new();
            let shm = ShmManager::new();
            let resources = shm.alloc_channel_shared_memory(&registry, sz, 4).unwrap();
            let ring = resources.ring;
            let meta = MetaData::new(DType::UInt8, 1, &[sz as i64], &[1]);
            let payload = vec![0xABu8; sz];

            b.iter(|| {
                ring.store(&meta, black_box(&payload)).unwrap();
                black_box(ring.block_load().unwrap());
            });

            shm.delete_all_shared_memory();
            registry.drain();
        });
    }

    group.finish();
}

fn bench_spsc_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_spsc_threaded");
    const MESSAGES: usize = 2000;

    for &(label, size) in SIZES {
        group.throughput(Throughput::Bytes((size * MESSAGES) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &size, |b, &sz| {
            b.iter(|| {
                let registry = ResourceRegistry::new();
                let shm = ShmManager::new();
                let resources = shm.alloc_channel_shared_memory(&registry, sz, 64).unwrap();
                let ring = Arc::new(resources.ring);
                let meta = MetaData::new(DType::UInt8, 1, &[sz as i64], &[1]);
                let payload = vec![0xCDu8; sz];

                let producer_ring = Arc::clone(&ring);
                let producer = thread::spawn(move || {
                    for _ in 0..MESSAGES {
                        producer_ring.store(&meta, &payload).unwrap();
                    }
                });

                for _ in 0..MESSAGES {
                    black_box(ring.block_load().unwrap());
                }
                producer.join().unwrap();

                shm.delete_all_shared_memory();
                registry.drain();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_store_block_load, bench_spsc_threaded);
criterion_main!(benches);
