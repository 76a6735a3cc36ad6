//! CSV export of a (possibly filtered) sales table.

use crate::sales_table::{SalesTable, DATE_COLUMN};
use chrono::NaiveDate;
use csv::WriterBuilder;

/// Header of the appended per-row total column.
pub const TOTAL_COLUMN: &str = "Общие продажи";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serializes `table` as UTF-8 CSV with a byte-order mark so spreadsheet
/// applications pick up the Cyrillic headers.
///
/// Columns are the date, every product column, then the row total. Missing
/// values are written as empty fields.
pub fn export_csv(table: &SalesTable) -> Result<Vec<u8>, csv::Error> {
    let mut output = UTF8_BOM.to_vec();
    {
        let mut writer = WriterBuilder::new().from_writer(&mut output);

        let mut header = Vec::with_capacity(table.columns().len() + 2);
        header.push(DATE_COLUMN);
        header.extend(table.column_names());
        header.push(TOTAL_COLUMN);
        writer.write_record(&header)?;

        let totals = table.daily_totals();
        for (row, date) in table.dates().iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(date.format("%Y-%m-%d").to_string());
            for column in table.columns() {
                record.push(format_value(column.values[row]));
            }
            record.push(format_value(totals[row]));
            writer.write_record(&record)?;
        }

        writer.flush()?;
    }

    tracing::debug!("Exported {} rows to CSV ({} bytes)", table.len(), output.len());
    Ok(output)
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Download name for an export made on `date`, e.g. `sales_data_20240131.csv`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("sales_data_{}.csv", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales_table::Column;

    fn sample() -> SalesTable {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        ];
        SalesTable::new(
            dates,
            vec![
                Column::new("Продукт_1", vec![100.0, f64::NAN]),
                Column::new("Продукт_2", vec![80.5, 90.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_export_layout() {
        let bytes = export_csv(&sample()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Дата,Продукт_1,Продукт_2,Общие продажи");
        assert_eq!(lines[1], "2024-01-01,100,80.5,180.5");
        assert_eq!(lines[2], "2024-01-02,,90,90");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_empty_table_has_header_only() {
        let bytes = export_csv(&SalesTable::empty()).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.trim_end(), "Дата,Общие продажи");
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(export_filename(date), "sales_data_20240131.csv");
    }
}
