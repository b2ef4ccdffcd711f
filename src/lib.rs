//! Incremental mining of high average-utility itemsets.
//!
//! The [`au::IncrementalMiner`] keeps a prunable itemset-utility tree up to
//! date as transactions arrive and exposes the qualifying itemsets as a
//! snapshot after every insertion. [`au::mine`] runs the same search from
//! scratch over a complete database.

pub mod au;

pub use au::{
    mine, mine_map, IncrementalMiner, MinerConfig, MiningError, ResultSnapshot, Threshold,
    UpdateReport,
};

#[cfg(feature = "python")]
mod python {
    use numpy::ndarray::{Array1, Array2};
    use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
    use once_cell::sync::Lazy;
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::{pymodule, types::PyModule, Bound, PyResult, Python};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::au::{IncrementalMiner, MinerConfig, MiningError, UpdateReport, UtilityLevel};

    // Global storage for incremental miners
    static MINERS: Lazy<Mutex<HashMap<usize, IncrementalMiner>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));
    static NEXT_PID: Lazy<Mutex<usize>> = Lazy::new(|| Mutex::new(0));

    type PyLevel<'py> = (Bound<'py, PyArray2<usize>>, Bound<'py, PyArray1<f64>>);
    type PyEntries = Vec<(Vec<usize>, f64)>;

    fn mining_error(e: MiningError) -> pyo3::PyErr {
        PyValueError::new_err(e.to_string())
    }

    fn levels_to_arrays<'py>(py: Python<'py>, levels: Vec<UtilityLevel>) -> PyResult<Vec<PyLevel<'py>>> {
        let mut result = Vec::new();

        for level in levels {
            if level.is_empty() {
                continue;
            }

            let itemset_size = level.itemset_size;
            let num_itemsets = level.len();
            let mut data = vec![0usize; num_itemsets * itemset_size];
            let mut averages = Vec::with_capacity(num_itemsets);

            for (i, (itemset, average)) in level.iter_itemsets().enumerate() {
                for (j, &item) in itemset.iter().enumerate() {
                    data[i * itemset_size + j] = item;
                }
                averages.push(average);
            }

            let array = Array2::from_shape_vec((num_itemsets, itemset_size), data)
                .map_err(|_| PyValueError::new_err("Failed to create array"))?;

            result.push((array.into_pyarray(py), Array1::from(averages).into_pyarray(py)));
        }

        Ok(result)
    }

    fn report_entries(report: &UpdateReport) -> (PyEntries, PyEntries) {
        let added = report
            .added
            .iter()
            .map(|entry| (entry.itemset.clone(), entry.average_utility))
            .collect();
        let retracted = report
            .retracted
            .iter()
            .map(|entry| (entry.itemset.clone(), entry.average_utility))
            .collect();
        (added, retracted)
    }

    fn with_miner<T>(
        pid: usize,
        f: impl FnOnce(&mut IncrementalMiner) -> PyResult<T>,
    ) -> PyResult<T> {
        let mut miners = MINERS
            .lock()
            .map_err(|e| PyRuntimeError::new_err(format!("Lock error: {}", e)))?;

        let miner = miners
            .get_mut(&pid)
            .ok_or_else(|| PyValueError::new_err("Invalid miner ID"))?;

        f(miner)
    }

    #[pymodule]
    fn haui<'py>(m: &Bound<'py, PyModule>) -> PyResult<()> {
        #[pyfn(m)]
        #[pyo3(name = "mine")]
        fn mine_py<'py>(
            py: Python<'py>,
            transactions: PyReadonlyArray2<'py, i64>,
            min_average_utility: f64,
        ) -> PyResult<Vec<PyLevel<'py>>> {
            let rows: Vec<Vec<(usize, i64)>> = transactions
                .as_array()
                .rows()
                .into_iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|&(_, &utility)| utility != 0)
                        .map(|(item, &utility)| (item, utility))
                        .collect::<Vec<_>>()
                })
                .filter(|row| !row.is_empty())
                .collect();

            let levels = crate::au::mine(&rows, crate::au::Threshold::Absolute(min_average_utility))
                .map_err(mining_error)?;
            levels_to_arrays(py, levels)
        }

        #[pyfn(m)]
        #[pyo3(name = "create_incremental_miner")]
        fn create_incremental_miner_py(min_average_utility: f64, relative: bool) -> PyResult<usize> {
            let config = if relative {
                MinerConfig::relative(min_average_utility)
            } else {
                MinerConfig::new(min_average_utility)
            };
            let miner = IncrementalMiner::new(config).map_err(mining_error)?;

            let mut pid_lock = NEXT_PID
                .lock()
                .map_err(|e| PyRuntimeError::new_err(format!("Lock error: {}", e)))?;
            let pid = *pid_lock;
            *pid_lock += 1;
            drop(pid_lock);

            let mut miners = MINERS
                .lock()
                .map_err(|e| PyRuntimeError::new_err(format!("Lock error: {}", e)))?;
            miners.insert(pid, miner);

            Ok(pid)
        }

        #[pyfn(m)]
        #[pyo3(name = "insert_transaction")]
        fn insert_transaction_py(
            pid: usize,
            items: PyReadonlyArray1<i64>,
            utilities: PyReadonlyArray1<i64>,
        ) -> PyResult<(PyEntries, PyEntries)> {
            let items = items.as_array();
            let utilities = utilities.as_array();
            if items.len() != utilities.len() {
                return Err(PyValueError::new_err("items and utilities differ in length"));
            }

            let pairs = items
                .iter()
                .zip(utilities.iter())
                .map(|(&item, &utility)| {
                    usize::try_from(item)
                        .map(|item| (item, utility))
                        .map_err(|_| PyValueError::new_err(format!("Invalid item {}", item)))
                })
                .collect::<PyResult<Vec<_>>>()?;

            with_miner(pid, |miner| {
                let report = miner.insert(&pairs).map_err(mining_error)?;
                Ok(report_entries(&report))
            })
        }

        #[pyfn(m)]
        #[pyo3(name = "insert_matrix")]
        fn insert_matrix_py(pid: usize, transactions: PyReadonlyArray2<i64>) -> PyResult<usize> {
            let view = transactions.as_array();
            with_miner(pid, |miner| {
                let reports = miner.insert_matrix(view).map_err(mining_error)?;
                Ok(reports.len())
            })
        }

        #[pyfn(m)]
        #[pyo3(name = "current_results")]
        fn current_results_py<'py>(py: Python<'py>, pid: usize) -> PyResult<Vec<PyLevel<'py>>> {
            let levels = with_miner(pid, |miner| Ok(miner.result_levels()))?;
            levels_to_arrays(py, levels)
        }

        #[pyfn(m)]
        #[pyo3(name = "miner_stats")]
        fn miner_stats_py(pid: usize) -> PyResult<(usize, usize, usize, usize)> {
            with_miner(pid, |miner| {
                let stats = miner.stats();
                Ok((stats.transactions, stats.items, stats.tree_nodes, stats.results))
            })
        }

        #[pyfn(m)]
        #[pyo3(name = "cleanup")]
        fn cleanup_py(pid: usize) -> PyResult<()> {
            let mut miners = MINERS
                .lock()
                .map_err(|e| PyRuntimeError::new_err(format!("Lock error: {}", e)))?;

            miners
                .remove(&pid)
                .ok_or_else(|| PyValueError::new_err("Invalid miner ID"))?;

            Ok(())
        }

        Ok(())
    }
}
