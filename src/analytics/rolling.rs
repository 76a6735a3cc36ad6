use super::primitives::strict_mean;
use super::windows::FixedWindow;
use super::AnalysisError;
use crate::sales_table::{Column, SalesTable};
use tracing::debug;

/// Appends a trailing simple moving average column `<col>_MA<window>`.
///
/// When `column` names an existing column only that one is extended;
/// otherwise (no name, or a name not in the table) every column is. The
/// first `window - 1` values of each new column are missing, as is any
/// window containing a missing value. Row count and existing columns are
/// unchanged.
///
/// # Errors
/// `AnalysisError::InvalidWindow` for a zero window.
pub fn moving_average(
    table: &SalesTable,
    window: usize,
    column: Option<&str>,
) -> Result<SalesTable, AnalysisError> {
    let strategy = FixedWindow::new(window).ok_or(AnalysisError::InvalidWindow)?;
    if table.is_empty() {
        return Ok(SalesTable::empty());
    }

    let selected: Vec<&Column> = match column.and_then(|name| table.column(name)) {
        Some(found) => vec![found],
        None => {
            if let Some(name) = column {
                debug!("Column '{}' not found, averaging every column", name);
            }
            table.columns().iter().collect()
        }
    };

    let mut result = table.clone();
    for source in selected {
        let name = format!("{}_MA{}", source.name, strategy.size());
        if result.has_column(&name) {
            continue;
        }
        let values = strategy.apply(&source.values, strict_mean);
        result.push_column(Column::new(name, values))?;
    }

    Ok(result)
}
