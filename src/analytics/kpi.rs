use crate::sales_table::SalesTable;
use serde::Serialize;

/// Aggregate KPIs over the daily-total series.
///
/// For an empty table only the first three fields are filled (all zero) and
/// the optional ones are `None`; they are then left out of the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    pub total_sessions: i64,
    pub avg_daily_sessions: f64,
    pub max_daily_sessions: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_daily_sessions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
}

impl KpiSet {
    fn empty() -> Self {
        KpiSet {
            total_sessions: 0,
            avg_daily_sessions: 0.0,
            max_daily_sessions: 0,
            min_daily_sessions: None,
            days_count: None,
            growth_rate: None,
        }
    }
}

/// Computes KPIs over the row-wise sum of all columns.
///
/// Integer KPIs are truncated toward zero.
pub fn kpi_metrics(table: &SalesTable) -> KpiSet {
    if table.is_empty() {
        return KpiSet::empty();
    }

    let totals = table.daily_totals();
    let total: f64 = totals.iter().sum();
    let max = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = totals.iter().copied().fold(f64::INFINITY, f64::min);

    KpiSet {
        total_sessions: total as i64,
        avg_daily_sessions: total / totals.len() as f64,
        max_daily_sessions: max as i64,
        min_daily_sessions: Some(min as i64),
        days_count: Some(table.len()),
        growth_rate: Some(growth_rate(&totals)),
    }
}

/// Percentage change from the first to the last value.
///
/// `0.0` with fewer than two points or when the first value is zero.
pub fn growth_rate(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let first = series[0];
    let last = series[series.len() - 1];
    if first == 0.0 {
        return 0.0;
    }

    let rate = (last - first) / first * 100.0;
    if rate.is_nan() {
        0.0
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales_table::Column;
    use chrono::{Duration, NaiveDate};

    fn table(columns: Vec<Column>) -> SalesTable {
        let rows = columns[0].values.len();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..rows).map(|i| start + Duration::days(i as i64)).collect();
        SalesTable::new(dates, columns).unwrap()
    }

    #[test]
    fn test_growth_rate_edge_cases() {
        assert_eq!(growth_rate(&[]), 0.0);
        assert_eq!(growth_rate(&[42.0]), 0.0);
        assert_eq!(growth_rate(&[0.0, 50.0, 80.0]), 0.0);
        assert_eq!(growth_rate(&[100.0, 120.0, 150.0]), 50.0);
        assert_eq!(growth_rate(&[200.0, 100.0]), -50.0);
    }

    #[test]
    fn test_kpi_empty_table_fallback_shape() {
        let kpi = kpi_metrics(&SalesTable::empty());
        assert_eq!(kpi.total_sessions, 0);
        assert_eq!(kpi.avg_daily_sessions, 0.0);
        assert_eq!(kpi.max_daily_sessions, 0);
        let json = serde_json::to_string(&kpi).unwrap();
        assert_eq!(
            json,
            r#"{"total_sessions":0,"avg_daily_sessions":0.0,"max_daily_sessions":0}"#
        );
    }

    #[test]
    fn test_kpi_single_column() {
        let t = table(vec![Column::new("A", vec![100.0, 120.0, 110.0, 130.0, 140.0])]);
        let kpi = kpi_metrics(&t);
        assert_eq!(kpi.total_sessions, 600);
        assert_eq!(kpi.avg_daily_sessions, 120.0);
        assert_eq!(kpi.max_daily_sessions, 140);
        assert_eq!(kpi.min_daily_sessions, Some(100));
        assert_eq!(kpi.days_count, Some(5));
        assert_eq!(kpi.growth_rate, Some(40.0));
    }

    #[test]
    fn test_kpi_sums_across_columns() {
        let t = table(vec![
            Column::new("A", vec![10.0, f64::NAN, 30.0]),
            Column::new("B", vec![1.0, 2.0, 3.0]),
        ]);
        let kpi = kpi_metrics(&t);
        assert_eq!(kpi.total_sessions, 46);
        assert_eq!(kpi.max_daily_sessions, 33);
        assert_eq!(kpi.min_daily_sessions, Some(2));
        assert_eq!(kpi.growth_rate, Some(200.0));
    }
}
