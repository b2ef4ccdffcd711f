use std::collections::BTreeMap;

use crate::au::Item;

/// Flat storage for itemsets and their average utilities
#[derive(Debug, Clone, Default)]
pub struct ItemsetStorage {
    pub items: Vec<Item>,
    pub offsets: Vec<(usize, usize)>,
    pub averages: Vec<f64>,
}

/// Qualifying itemsets of one length
#[derive(Debug, Clone)]
pub struct UtilityLevel {
    pub storage: ItemsetStorage,
    pub itemset_size: usize,
}

impl ItemsetStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_itemset(&mut self, mut items: Vec<Item>, average: f64) {
        items.sort_unstable();
        items.dedup();
        let start = self.items.len();
        self.items.extend_from_slice(&items);
        self.offsets.push((start, items.len()));
        self.averages.push(average);
    }

    pub(crate) fn get_itemset(&self, idx: usize) -> &[Item] {
        let (start, len) = self.offsets[idx];
        &self.items[start..start + len]
    }

    pub(crate) fn len(&self) -> usize {
        self.offsets.len()
    }

    pub(crate) fn append(&mut self, other: ItemsetStorage) {
        let shift = self.items.len();
        self.items.extend(other.items);
        self.offsets
            .extend(other.offsets.into_iter().map(|(start, len)| (start + shift, len)));
        self.averages.extend(other.averages);
    }
}

impl UtilityLevel {
    pub fn new(itemset_size: usize) -> Self {
        Self { storage: ItemsetStorage::new(), itemset_size }
    }

    pub fn add_itemset(&mut self, items: Vec<Item>, average: f64) -> usize {
        debug_assert_eq!(items.len(), self.itemset_size);
        self.storage.add_itemset(items, average);
        self.storage.len() - 1
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    pub fn get_itemset(&self, idx: usize) -> &[Item] {
        self.storage.get_itemset(idx)
    }

    pub fn average_utility(&self, idx: usize) -> f64 {
        self.storage.averages[idx]
    }

    pub fn iter_itemsets(&self) -> impl Iterator<Item = (&[Item], f64)> {
        (0..self.storage.len()).map(move |idx| (self.get_itemset(idx), self.storage.averages[idx]))
    }
}

pub fn add_pattern_to_result(pattern: &[Item], average: f64, result: &mut Vec<UtilityLevel>) {
    let pattern_size = pattern.len();

    while result.len() < pattern_size {
        result.push(UtilityLevel::new(result.len() + 1));
    }

    if pattern_size > 0 {
        result[pattern_size - 1].add_itemset(pattern.to_vec(), average);
    }
}

/// Merge per-branch levels into one list indexed by itemset length - 1.
pub fn merge_levels(branches: Vec<Vec<UtilityLevel>>) -> Vec<UtilityLevel> {
    let mut merged: Vec<UtilityLevel> = Vec::new();
    for branch in branches {
        for level in branch {
            let size = level.itemset_size;
            while merged.len() < size {
                merged.push(UtilityLevel::new(merged.len() + 1));
            }
            merged[size - 1].storage.append(level.storage);
        }
    }
    merged
}

/// Group a result map by itemset length.
pub fn levels_from_results(results: &BTreeMap<Vec<Item>, f64>) -> Vec<UtilityLevel> {
    let mut levels = Vec::new();
    for (itemset, &average) in results {
        add_pattern_to_result(itemset, average, &mut levels);
    }
    levels
}

/// Flatten levels back into a result map.
pub fn results_from_levels(levels: &[UtilityLevel]) -> BTreeMap<Vec<Item>, f64> {
    levels
        .iter()
        .flat_map(|level| level.iter_itemsets())
        .map(|(items, average)| (items.to_vec(), average))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itemset_storage() {
        let mut storage = ItemsetStorage::new();

        storage.add_itemset(vec![7, 2, 5], 4.0);
        storage.add_itemset(vec![1, 3], 2.5);

        assert_eq!(storage.get_itemset(0), &[2, 5, 7]); // sorted!
        assert_eq!(storage.get_itemset(1), &[1, 3]);
        assert_eq!(storage.averages, vec![4.0, 2.5]);
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_levels_group_by_length() {
        let mut results = BTreeMap::new();
        results.insert(vec![1], 3.0);
        results.insert(vec![1, 2], 2.0);
        results.insert(vec![2], 4.0);

        let levels = levels_from_results(&results);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].len(), 2);
        assert_eq!(levels[1].len(), 1);
        assert_eq!(levels[1].get_itemset(0), &[1, 2]);
        assert_eq!(levels[1].average_utility(0), 2.0);

        assert_eq!(results_from_levels(&levels), results);
    }

    #[test]
    fn test_merge_levels() {
        let mut left = Vec::new();
        add_pattern_to_result(&[1], 5.0, &mut left);
        let mut right = Vec::new();
        add_pattern_to_result(&[2, 3], 3.0, &mut right);
        add_pattern_to_result(&[2], 6.0, &mut right);

        let merged = merge_levels(vec![left, right]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].len(), 2);
        assert_eq!(merged[1].get_itemset(0), &[2, 3]);
    }
}
