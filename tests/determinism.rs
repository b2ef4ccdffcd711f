use std::collections::HashSet;

use haui::au::{IncrementalMiner, MinerConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_stream(seed: u64, transactions: usize) -> Vec<Vec<(usize, i64)>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..transactions)
        .map(|_| {
            let mut items: Vec<usize> = (0..12).filter(|_| rng.gen_bool(0.35)).collect();
            if items.is_empty() {
                items.push(rng.gen_range(0..12));
            }
            items
                .into_iter()
                .map(|item| (item, rng.gen_range(1..20)))
                .collect()
        })
        .collect()
}

#[test]
fn incremental_miner_is_deterministic() {
    let stream = random_stream(7, 60);

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let mut miner = IncrementalMiner::new(MinerConfig::new(12.0)).expect("valid threshold");
        let reports = miner.insert_batch(&stream).expect("stream is valid");

        let discovery: Vec<String> = reports
            .iter()
            .map(|report| format!("{:?}|{:?}|{:?}", report.added, report.updated, report.retracted))
            .collect();
        let results = format!("{:?}", miner.current_results());
        fingerprints.insert((discovery, results, miner.stats().tree_nodes));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
