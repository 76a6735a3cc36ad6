use super::primitives::{mean, quantile, sample_std_dev};
use crate::sales_table::SalesTable;
use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

/// Rule used to flag anomalous values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnomalyMethod {
    /// `|value - mean| / std > threshold`
    ZScore,
    /// Outside `[Q1 - threshold*IQR, Q3 + threshold*IQR]`
    Iqr,
    /// Any other name; columns are skipped rather than rejected
    Unrecognized(String),
}

impl From<&str> for AnomalyMethod {
    fn from(name: &str) -> Self {
        match name {
            "zscore" => AnomalyMethod::ZScore,
            "iqr" => AnomalyMethod::Iqr,
            _ => AnomalyMethod::Unrecognized(name.to_string()),
        }
    }
}

impl std::fmt::Display for AnomalyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyMethod::ZScore => write!(f, "zscore"),
            AnomalyMethod::Iqr => write!(f, "iqr"),
            AnomalyMethod::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// A flagged observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub value: f64,
}

/// Flagged observations per column, in table column order. Within a column
/// anomalies follow row order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnomalyList {
    entries: Vec<(String, Vec<Anomaly>)>,
}

impl AnomalyList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of columns present in the result.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, column: &str) -> Option<&[Anomaly]> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, anomalies)| anomalies.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Anomaly])> {
        self.entries
            .iter()
            .map(|(name, anomalies)| (name.as_str(), anomalies.as_slice()))
    }

    /// Total flagged observations across all columns.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, anomalies)| anomalies.len()).sum()
    }
}

impl Serialize for AnomalyList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, anomalies) in &self.entries {
            map.serialize_entry(name, anomalies)?;
        }
        map.end()
    }
}

/// Flags anomalous values in every column.
///
/// Missing values are never flagged. With an unrecognized method every
/// column is left out of the result.
pub fn detect_anomalies(table: &SalesTable, threshold: f64, method: &AnomalyMethod) -> AnomalyList {
    if table.is_empty() {
        return AnomalyList::default();
    }
    if let AnomalyMethod::Unrecognized(name) = method {
        warn!("Unknown anomaly method '{}', no columns checked", name);
        return AnomalyList::default();
    }

    let mut entries = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let is_anomaly: Box<dyn Fn(f64) -> bool> = match method {
            AnomalyMethod::ZScore => {
                let mean = mean(&column.values);
                let std = sample_std_dev(&column.values);
                Box::new(move |value| ((value - mean) / std).abs() > threshold)
            }
            AnomalyMethod::Iqr => {
                let q1 = quantile(&column.values, 0.25);
                let q3 = quantile(&column.values, 0.75);
                let iqr = q3 - q1;
                let lower = q1 - threshold * iqr;
                let upper = q3 + threshold * iqr;
                Box::new(move |value| value < lower || value > upper)
            }
            AnomalyMethod::Unrecognized(_) => continue,
        };

        let anomalies = table
            .dates()
            .iter()
            .zip(&column.values)
            .filter(|(_, value)| !value.is_nan() && is_anomaly(**value))
            .map(|(date, value)| Anomaly {
                date: *date,
                value: *value,
            })
            .collect();
        entries.push((column.name.clone(), anomalies));
    }

    AnomalyList { entries }
}
