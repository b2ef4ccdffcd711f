mod common;

use common::{to_matrix, UtilityDatabase};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use haui::au::{mine, IncrementalMiner, MinerConfig, Threshold};

/// Full stream inserted one transaction at a time
fn bench_incremental_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_scaling");
    group.sample_size(10);

    let configs = vec![
        ("small_100tx", 100, 20, 5),
        ("medium_500tx", 500, 40, 8),
        ("large_1000tx", 1000, 60, 10),
    ];

    for (name, num_tx, num_items, avg_size) in configs {
        let transactions = UtilityDatabase::new(num_items, avg_size).generate(num_tx);
        let matrix = to_matrix(&transactions, num_items);

        group.bench_with_input(BenchmarkId::from_parameter(name), &matrix, |b, matrix| {
            b.iter(|| {
                let mut miner = IncrementalMiner::new(MinerConfig::relative(0.01)).unwrap();
                miner.insert_matrix(black_box(matrix.view())).unwrap()
            });
        });
    }

    group.finish();
}

/// Cost of one more transaction on top of a warm index, against re-mining
fn bench_single_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_insert");

    let mut transactions = UtilityDatabase::new(50, 8).generate(1001);
    let incoming = transactions.pop().unwrap();
    let config = MinerConfig::relative(0.01);

    group.bench_function("incremental", |b| {
        b.iter_batched(
            || {
                let mut miner = IncrementalMiner::new(config.clone()).unwrap();
                miner.insert_batch(&transactions).unwrap();
                miner
            },
            |mut miner| miner.insert(black_box(&incoming)).unwrap(),
            BatchSize::LargeInput,
        );
    });

    let mut all = transactions.clone();
    all.push(incoming.clone());
    group.bench_function("from_scratch", |b| {
        b.iter(|| mine(black_box(&all), config.threshold).unwrap());
    });

    group.finish();
}

/// Batch miner as the threshold tightens
fn bench_batch_min_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_min_ratio");

    let transactions = UtilityDatabase::new(50, 10).generate(1000);

    for &ratio in &[0.02, 0.01, 0.005, 0.002] {
        group.bench_with_input(BenchmarkId::from_parameter(ratio), &ratio, |b, &ratio| {
            b.iter(|| mine(black_box(&transactions), Threshold::Relative(ratio)).unwrap());
        });
    }

    group.finish();
}

/// Wider item profit spread prunes less
fn bench_quantity_spread(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantity_spread");
    group.sample_size(10);

    for &max_quantity in &[1, 5, 20] {
        let transactions = UtilityDatabase {
            max_quantity,
            ..UtilityDatabase::new(40, 8)
        }
        .generate(500);

        group.bench_with_input(
            BenchmarkId::from_parameter(max_quantity),
            &transactions,
            |b, transactions| {
                b.iter(|| {
                    let mut miner = IncrementalMiner::new(MinerConfig::relative(0.01)).unwrap();
                    miner.insert_batch(black_box(transactions)).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_incremental_scaling,
    bench_single_insert,
    bench_batch_min_ratio,
    bench_quantity_spread
);
criterion_main!(benches);
