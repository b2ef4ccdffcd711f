#![allow(dead_code)]

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Synthetic utility database in the usual quantity x unit-profit layout.
///
/// Each item has a fixed unit profit drawn once, skewed so that a few items
/// are worth far more than the rest. Item popularity is skewed towards low
/// ids, and each occurrence buys 1..=`max_quantity` units.
pub struct UtilityDatabase {
    pub num_items: usize,
    pub avg_transaction_size: usize,
    pub max_quantity: i64,
    pub seed: u64,
}

impl UtilityDatabase {
    pub fn new(num_items: usize, avg_transaction_size: usize) -> Self {
        Self {
            num_items,
            avg_transaction_size,
            max_quantity: 5,
            seed: 42,
        }
    }

    pub fn generate(&self, num_transactions: usize) -> Vec<Vec<(usize, i64)>> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let unit_profit: Vec<i64> = (0..self.num_items)
            .map(|_| {
                let skew: f64 = rng.gen::<f64>().powi(3);
                1 + (skew * 100.0) as i64
            })
            .collect();

        let size_range = (self.avg_transaction_size / 2).max(1)..=(self.avg_transaction_size * 3 / 2).max(1);
        (0..num_transactions)
            .map(|_| {
                let size = rng.gen_range(size_range.clone()).min(self.num_items);
                let mut items: Vec<usize> = Vec::with_capacity(size);
                while items.len() < size {
                    let popularity: f64 = rng.gen::<f64>().powi(2);
                    let item = (popularity * self.num_items as f64) as usize;
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }

                items
                    .into_iter()
                    .map(|item| (item, unit_profit[item] * rng.gen_range(1..=self.max_quantity)))
                    .collect()
            })
            .collect()
    }
}

/// Dense form for `insert_matrix`; absent items are zero.
pub fn to_matrix(transactions: &[Vec<(usize, i64)>], num_items: usize) -> Array2<i64> {
    let mut matrix = Array2::zeros((transactions.len(), num_items));
    for (row, transaction) in transactions.iter().enumerate() {
        for &(item, utility) in transaction {
            matrix[[row, item]] = utility;
        }
    }
    matrix
}
