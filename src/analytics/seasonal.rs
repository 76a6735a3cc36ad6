use super::primitives::mean;
use super::windows::{CenteredWindow, WindowStrategy};
use super::AnalysisError;
use crate::sales_table::SalesTable;
use chrono::NaiveDate;
use serde::Serialize;

/// Additive decomposition `observed = trend + seasonal + residual`.
///
/// All series are aligned with `dates` (the rows where the column had a
/// value). Trend and residual are `NaN` where the centred window does not fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalDecomposition {
    pub column: String,
    pub period: usize,
    pub dates: Vec<NaiveDate>,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Classical additive seasonal decomposition of one column.
///
/// # Errors
/// - `UnknownColumn` if `column` is not in the table
/// - `InvalidPeriod` if `period < 2`
/// - `InsufficientData` with fewer than `2 * period` non-missing values
pub fn seasonal_decomposition(
    table: &SalesTable,
    column: &str,
    period: usize,
) -> Result<SeasonalDecomposition, AnalysisError> {
    let source = table
        .column(column)
        .ok_or_else(|| AnalysisError::UnknownColumn(column.to_string()))?;
    if period < 2 {
        return Err(AnalysisError::InvalidPeriod(period));
    }

    let (dates, observed): (Vec<NaiveDate>, Vec<f64>) = table
        .dates()
        .iter()
        .zip(&source.values)
        .filter(|(_, value)| !value.is_nan())
        .map(|(date, value)| (*date, *value))
        .unzip();

    let required = 2 * period;
    if observed.len() < required {
        return Err(AnalysisError::InsufficientData {
            required,
            available: observed.len(),
        });
    }

    let window = CenteredWindow::new(period);
    let trend = window.apply(&observed);
    let detrended: Vec<f64> = observed.iter().zip(&trend).map(|(x, t)| x - t).collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let phase_values: Vec<f64> = detrended.iter().skip(phase).step_by(period).copied().collect();
            mean(&phase_values)
        })
        .collect();
    let overall = mean(&phase_means);
    for value in phase_means.iter_mut() {
        *value -= overall;
    }

    let seasonal: Vec<f64> = (0..observed.len()).map(|i| phase_means[i % period]).collect();
    let residual = observed
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((x, t), s)| x - t - s)
        .collect();

    tracing::debug!(
        "Decomposed '{}' with period {} ({} edge points without trend)",
        column,
        period,
        window.burn_in()
    );

    Ok(SeasonalDecomposition {
        column: column.to_string(),
        period,
        dates,
        observed,
        trend,
        seasonal,
        residual,
    })
}
