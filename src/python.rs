use numpy::{PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::apriori::{explain, EncodedRows, SearchConfig};
use crate::error::ExplainError;

fn to_py_err(e: ExplainError) -> PyErr {
    match e {
        ExplainError::InvalidConfig(_)
        | ExplainError::InvalidInput(_)
        | ExplainError::EncodingOverflow { .. }
        | ExplainError::OrderOverflow { .. } => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

/// Returns `(items, support, outlier_support, ratio)` tuples, best first.
#[pyfunction]
#[pyo3(name = "explain", signature = (matrix, outliers, min_support=1, min_ratio=0.5, max_order=3))]
fn explain_py<'py>(
    py: Python<'py>,
    matrix: PyReadonlyArray2<'py, i32>,
    outliers: PyReadonlyArray1<'py, bool>,
    min_support: u64,
    min_ratio: f64,
    max_order: usize,
) -> PyResult<Vec<(Vec<u32>, u64, u64, f64)>> {
    let outlier_flags = outliers.as_array().to_vec();
    let rows = EncodedRows::from_matrix(matrix.as_array(), &outlier_flags).map_err(to_py_err)?;
    let mut config = SearchConfig::new(min_support, min_ratio).with_max_order(max_order);
    if max_order > 0 {
        // widest slots that still fit the requested order
        config = config.with_bits_per_slot((64 / max_order).min(32) as u32);
    }

    let summary = py.allow_threads(|| explain(&rows, config)).map_err(to_py_err)?;

    Ok(summary
        .explanations
        .into_iter()
        .map(|e| (e.items, e.support, e.outlier_support, e.ratio))
        .collect())
}

#[pymodule]
fn itemset_explain(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(explain_py, m)?)?;
    Ok(())
}
