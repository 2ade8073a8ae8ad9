use core::hint::black_box;
use std::hash::BuildHasherDefault;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use cuckoo_bins::HashTable as CuckooHashTable;
use hashbrown::HashMap as HashbrownMap;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use siphasher::sip::SipHasher;

type SipState = BuildHasherDefault<SipHasher>;

const SIZES: [usize; 6] = [16, 128, 1024, 8192, 65536, 262144];

fn make_keys(count: usize) -> Vec<Vec<u8>> {
    let seed = OsRng.try_next_u64().unwrap_or_default();
    (0..count as u64)
        .map(|i| format!("key_{:016X}", i ^ seed.rotate_left(17)).into_bytes())
        .collect()
}

fn shuffled(keys: &[Vec<u8>]) -> Vec<&[u8]> {
    let mut keys: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
    keys.shuffle(&mut SmallRng::from_os_rng());
    keys
}

fn bench_insert_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES.iter() {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_bins/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut table = CuckooHashTable::with_power_and_hasher(1, SipState::default());
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64).ok());
                    }
                    black_box(table.len())
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut table = HashbrownMap::with_hasher(SipState::default());
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64));
                    }
                    black_box(table.len())
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_insert_preallocated(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_preallocated");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES.iter() {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        // Sized for a 50% load so most inserts never grow.
        let power = (size * 2).div_ceil(4).next_power_of_two().trailing_zeros() as u8;
        group.bench_function(format!("cuckoo_bins/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut table =
                        CuckooHashTable::with_power_and_hasher(power, SipState::default());
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64).ok());
                    }
                    black_box(table.len())
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || shuffled(&keys),
                |keys| {
                    let mut table =
                        HashbrownMap::with_capacity_and_hasher(size, SipState::default());
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64));
                    }
                    black_box(table.len())
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_find_hit_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_hit_miss");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES.iter() {
        let all_keys = make_keys(size * 2);
        let (present, absent) = all_keys.split_at(size);

        let mut cuckoo_table = CuckooHashTable::with_power_and_hasher(1, SipState::default());
        let mut hashbrown_table = HashbrownMap::with_hasher(SipState::default());
        for (i, key) in present.iter().enumerate() {
            if cuckoo_table.insert(key.as_slice(), i as u64).is_err() {
                break;
            }
            hashbrown_table.insert(key.as_slice(), i as u64);
        }

        let mut probes: Vec<&[u8]> = present
            .iter()
            .zip(absent.iter())
            .flat_map(|(hit, miss)| [hit.as_slice(), miss.as_slice()])
            .collect();
        probes.shuffle(&mut SmallRng::from_os_rng());

        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_function(format!("cuckoo_bins/{size}"), |b| {
            b.iter(|| {
                for key in probes.iter() {
                    black_box(cuckoo_table.get(key));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in probes.iter() {
                    black_box(hashbrown_table.get(key));
                }
            })
        });
    }
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES.iter() {
        let keys = make_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_bins/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut table = CuckooHashTable::with_power_and_hasher(1, SipState::default());
                    for (i, key) in keys.iter().enumerate() {
                        let _ = table.insert(key.as_slice(), i as u64);
                    }
                    (table, shuffled(&keys))
                },
                |(mut table, keys)| {
                    for key in keys {
                        black_box(table.remove(table.lookup(key)));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut table = HashbrownMap::with_hasher(SipState::default());
                    for (i, key) in keys.iter().enumerate() {
                        table.insert(key.as_slice(), i as u64);
                    }
                    (table, shuffled(&keys))
                },
                |(mut table, keys)| {
                    for key in keys {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });
    }
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES.iter() {
        let keys = make_keys(size);
        let mut cuckoo_table = CuckooHashTable::with_power_and_hasher(1, SipState::default());
        let mut hashbrown_table = HashbrownMap::with_hasher(SipState::default());
        for (i, key) in keys.iter().enumerate() {
            let _ = cuckoo_table.insert(key.as_slice(), i as u64);
            hashbrown_table.insert(key.as_slice(), i as u64);
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("cuckoo_bins/{size}"), |b| {
            b.iter(|| black_box(cuckoo_table.iter().map(|(_, _, v)| *v).sum::<u64>()))
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| black_box(hashbrown_table.values().copied().sum::<u64>()))
        });
    }
}

criterion_group!(
    benches,
    bench_insert_random,
    bench_insert_preallocated,
    bench_find_hit_miss,
    bench_remove,
    bench_iteration,
);

criterion_main!(benches);
