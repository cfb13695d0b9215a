use ndarray::ArrayView2;
use tracing::warn;

use super::key::AttributeValueId;
use crate::error::{ExplainError, Result};

/// Every row's attribute value ids, sorted and deduplicated, in one flat
/// buffer, plus the outlier flag of each row.
#[derive(Debug, Clone, Default)]
pub struct EncodedRows {
    items: Vec<AttributeValueId>,
    offsets: Vec<(usize, usize)>,
    outliers: Vec<bool>,
    num_outliers: usize,
    max_id: Option<AttributeValueId>,
    malformed_cells: usize,
}

impl EncodedRows {
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = (R, bool)>,
        R: IntoIterator<Item = AttributeValueId>,
    {
        let mut builder = EncodedRowsBuilder::new();
        for (ids, is_outlier) in rows {
            builder.push_row(ids, is_outlier);
        }
        builder.finish()
    }

    /// One-hot matrix input: column `j` is attribute value id `j`.
    pub fn from_matrix(matrix: ArrayView2<i32>, outliers: &[bool]) -> Result<Self> {
        let mut builder = EncodedRowsBuilder::new();
        builder.push_matrix(matrix, outliers)?;
        Ok(builder.finish())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[inline]
    pub fn row(&self, idx: usize) -> &[AttributeValueId] {
        let (start, len) = self.offsets[idx];
        &self.items[start..start + len]
    }

    #[inline]
    pub fn is_outlier(&self, idx: usize) -> bool {
        self.outliers[idx]
    }

    pub fn num_outliers(&self) -> usize {
        self.num_outliers
    }

    pub fn num_inliers(&self) -> usize {
        self.len() - self.num_outliers
    }

    pub fn max_id(&self) -> Option<AttributeValueId> {
        self.max_id
    }

    /// Matrix cells skipped because they held a negative value.
    pub fn malformed_cells(&self) -> usize {
        self.malformed_cells
    }

    /// Number of distinct ids appearing in at least one row.
    pub fn distinct_ids(&self) -> usize {
        let Some(max_id) = self.max_id else {
            return 0;
        };
        let mut seen = vec![false; max_id as usize + 1];
        for &id in &self.items {
            seen[id as usize] = true;
        }
        seen.into_iter().filter(|&s| s).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[AttributeValueId], bool)> + '_ {
        (0..self.len()).map(move |idx| (self.row(idx), self.outliers[idx]))
    }
}

/// Accumulates rows, whole or in matrix chunks, into [`EncodedRows`].
#[derive(Debug, Default)]
pub struct EncodedRowsBuilder {
    rows: EncodedRows,
}

impl EncodedRowsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row<R>(&mut self, ids: R, is_outlier: bool)
    where
        R: IntoIterator<Item = AttributeValueId>,
    {
        let rows = &mut self.rows;
        let mut row: Vec<AttributeValueId> = ids.into_iter().collect();
        row.sort_unstable();
        row.dedup();
        let start = rows.items.len();
        if let Some(&last) = row.last() {
            rows.max_id = Some(rows.max_id.map_or(last, |m| m.max(last)));
        }
        rows.items.extend_from_slice(&row);
        rows.offsets.push((start, row.len()));
        rows.outliers.push(is_outlier);
        rows.num_outliers += usize::from(is_outlier);
    }

    /// Appends every row of a one-hot chunk. Positive cells mark presence;
    /// negative cells are malformed and skipped with a warning.
    pub fn push_matrix(&mut self, matrix: ArrayView2<i32>, outliers: &[bool]) -> Result<()> {
        let (num_rows, num_cols) = matrix.dim();
        if num_rows != outliers.len() {
            return Err(ExplainError::InvalidInput(format!(
                "matrix has {} rows but {} outlier flags were given",
                num_rows,
                outliers.len()
            )));
        }
        if AttributeValueId::try_from(num_cols).is_err() {
            return Err(ExplainError::InvalidInput(format!(
                "{} columns exceed the attribute value id range",
                num_cols
            )));
        }

        let mut malformed = 0usize;
        for (row, &is_outlier) in matrix.outer_iter().zip(outliers) {
            let ids: Vec<AttributeValueId> = row
                .iter()
                .enumerate()
                .filter_map(|(col, &cell)| {
                    if cell < 0 {
                        malformed += 1;
                        None
                    } else if cell > 0 {
                        Some(col as AttributeValueId)
                    } else {
                        None
                    }
                })
                .collect();
            self.push_row(ids, is_outlier);
        }

        if malformed > 0 {
            warn!(malformed_cells = malformed, "skipped negative cells in input matrix");
            self.rows.malformed_cells += malformed;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self) -> EncodedRows {
        self.rows
    }
}
