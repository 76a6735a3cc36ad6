use super::primitives::{mean, median, sample_std_dev, valid_values};
use crate::sales_table::SalesTable;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Descriptive statistics for one column, over non-missing values.
///
/// `std` is the sample standard deviation. Undefined values are `NaN`
/// (serialized as `null`); `sum` of a column with no values is `0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: usize,
}

impl ColumnSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let valid = valid_values(values);
        let (min, max) = if valid.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            valid
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };

        ColumnSummary {
            mean: mean(&valid),
            median: median(&valid),
            std: sample_std_dev(&valid),
            min,
            max,
            sum: valid.iter().sum(),
            count: valid.len(),
        }
    }

    /// Coefficient of variation `std / mean`, or `0` when the mean is not positive.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.std / self.mean
        } else {
            0.0
        }
    }
}

/// Per-column statistics in table column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnStatistics {
    entries: Vec<(String, ColumnSummary)>,
}

impl ColumnStatistics {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnSummary> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, summary)| summary)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &ColumnSummary)> {
        self.entries.iter().map(|(name, summary)| (name.as_str(), summary))
    }
}

impl FromIterator<(String, ColumnSummary)> for ColumnStatistics {
    fn from_iter<I: IntoIterator<Item = (String, ColumnSummary)>>(iter: I) -> Self {
        ColumnStatistics {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ColumnStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, summary) in &self.entries {
            map.serialize_entry(name, summary)?;
        }
        map.end()
    }
}

/// Summary statistics for every column. An empty table gives an empty result.
pub fn basic_statistics(table: &SalesTable) -> ColumnStatistics {
    if table.is_empty() {
        return ColumnStatistics::default();
    }

    table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), ColumnSummary::from_values(&column.values)))
        .collect()
}
