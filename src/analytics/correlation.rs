use super::primitives::pearson;
use crate::sales_table::SalesTable;
use serde::Serialize;

/// Square, symmetric matrix of pairwise Pearson correlations.
///
/// `values[i][j]` is the correlation between `columns[i]` and `columns[j]`.
/// Undefined entries (constant columns, fewer than two shared rows) are `NaN`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Correlation between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Pairwise correlation across all columns, using rows where both are present.
pub fn correlation_matrix(table: &SalesTable) -> CorrelationMatrix {
    if table.is_empty() {
        return CorrelationMatrix::default();
    }

    let columns = table.columns();
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        // Diagonal is 1 whenever the column has a defined variance
        let self_correlation = pearson(&columns[i].values, &columns[i].values);
        values[i][i] = if self_correlation.is_nan() { f64::NAN } else { 1.0 };
        for j in (i + 1)..n {
            let r = pearson(&columns[i].values, &columns[j].values);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}
