use super::kpi::growth_rate;
use super::primitives::mean;
use super::statistics::ColumnStatistics;
use crate::sales_table::SalesTable;
use chrono::Datelike;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

const MONTH_NAMES: [&str; 13] = [
    "",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Growth rate (percent) above which the dynamic is reported as positive.
const GROWTH_THRESHOLD: f64 = 10.0;
/// Coefficient of variation above which a product is called volatile.
const VOLATILITY_THRESHOLD: f64 = 0.5;
/// Rows needed before a peak month is reported.
const SEASONAL_MIN_ROWS: usize = 12;

/// One analytical fact worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    InsufficientData,
    PositiveDynamic { growth: f64 },
    NegativeDynamic { growth: f64 },
    TopPerformer { product: String, total: f64 },
    HighVolatility { product: String, cv: f64 },
    /// Calendar month, 1-based
    PeakMonth { month: u32 },
}

impl std::fmt::Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insight::InsufficientData => write!(f, "Not enough data to generate insights"),
            Insight::PositiveDynamic { growth } => {
                write!(f, "Positive dynamic: sales grew by {:.1}%", growth)
            }
            Insight::NegativeDynamic { growth } => {
                write!(f, "Negative dynamic: sales fell by {:.1}%", growth.abs())
            }
            Insight::TopPerformer { product, total } => write!(
                f,
                "Top performer: {} with a total volume of {}",
                product,
                format_thousands(*total)
            ),
            Insight::HighVolatility { product, cv } => {
                write!(f, "{}: high sales volatility (CV = {:.2})", product, cv)
            }
            Insight::PeakMonth { month } => write!(
                f,
                "Peak sales month: {}",
                MONTH_NAMES.get(*month as usize).copied().unwrap_or("")
            ),
        }
    }
}

/// Rounds to a whole number and groups digits with commas.
fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

/// Structured insights in a fixed order: growth, top performer, volatile
/// products, peak month. Each step only fires when the data supports it.
pub fn insights(table: &SalesTable, stats: &ColumnStatistics) -> Vec<Insight> {
    if table.is_empty() || stats.is_empty() {
        return vec![Insight::InsufficientData];
    }

    let mut found = Vec::new();
    let totals = table.daily_totals();

    if totals.len() >= 2 {
        let growth = growth_rate(&totals);
        if growth > GROWTH_THRESHOLD {
            found.push(Insight::PositiveDynamic { growth });
        } else if growth < -GROWTH_THRESHOLD {
            found.push(Insight::NegativeDynamic { growth });
        }
    }

    // First column wins ties
    let top = stats
        .iter()
        .rev()
        .max_by_key(|(_, summary)| OrderedFloat(summary.sum));
    if let Some((product, summary)) = top {
        found.push(Insight::TopPerformer {
            product: product.to_string(),
            total: summary.sum,
        });
    }

    for (product, summary) in stats.iter() {
        let cv = summary.coefficient_of_variation();
        if cv > VOLATILITY_THRESHOLD {
            found.push(Insight::HighVolatility {
                product: product.to_string(),
                cv,
            });
        }
    }

    if table.len() >= SEASONAL_MIN_ROWS {
        let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for (date, total) in table.dates().iter().zip(&totals) {
            by_month.entry(date.month()).or_default().push(*total);
        }
        // Earliest month wins ties
        let peak = by_month
            .iter()
            .map(|(month, values)| (*month, mean(values)))
            .rev()
            .max_by_key(|(_, average)| OrderedFloat(*average));
        if let Some((month, _)) = peak {
            found.push(Insight::PeakMonth { month });
        }
    }

    found
}

/// Human-readable insight messages.
pub fn generate_insights(table: &SalesTable, stats: &ColumnStatistics) -> Vec<String> {
    insights(table, stats).iter().map(|insight| insight.to_string()).collect()
}
