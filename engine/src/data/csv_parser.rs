use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{Bar, BarSeries};
use shared::utils::lookback_cutoff;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::BarSource;
use crate::error::EngineError;

// Value parsing for the Yahoo download format (`Date,Open,High,Low,Close,Adj Close,Volume`).
pub mod quote_format {
    use anyhow::{anyhow, Result};
    use chrono::{DateTime, NaiveDate, Utc};

    /// Parses a price or volume cell. Yahoo writes `null` for sessions without
    /// a quote; that and an empty cell come back as `None`.
    pub fn parse_number(s: &str) -> Result<Option<f64>> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        trimmed
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|e| anyhow!("Failed to parse number '{}': {}", s, e))
    }

    /// Accepts `2024-06-03`, `03/06/2024` (day first) or an RFC 3339 timestamp.
    pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
        let trimmed = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
            .map_err(|e| anyhow!("Failed to parse date '{}': {}", s, e))?;
        date.and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| anyhow!("Failed to build midnight for date '{}'", s))
    }

}

/// Offline bar source reading one CSV file per run.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct CsvBarParser;

impl CsvBarParser {
    // CSV Header: Date,Open,High,Low,Close,Adj Close,Volume
    // Example Row: 2024-06-03,1420.00,1460.00,1415.00,1455.00,1455.00,1200000
    pub fn load_bars_from_csv(file_path: &Path, symbol: &str) -> Result<BarSeries, EngineError> {
        let file = File::open(file_path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result?;

            let date_str = Self::required(&record, &headers, "Date", line)?;
            let timestamp = quote_format::parse_date(date_str)
                .map_err(|e| EngineError::CsvDataFormatError(format!("Error parsing 'Date' at line {}: {}", line, e)))?;

            let open = Self::number(&record, &headers, "Open", line)?;
            let high = Self::number(&record, &headers, "High", line)?;
            let low = Self::number(&record, &headers, "Low", line)?;
            let close = Self::number(&record, &headers, "Close", line)?;
            let volume = Self::number(&record, &headers, "Volume", line)?;

            match (open, high, low, close) {
                (Some(open), Some(high), Some(low), Some(close)) => bars.push(Bar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    // a missing or non-numeric volume only affects the chart
                    volume: volume.filter(|v| v.is_finite()).unwrap_or(0.0),
                }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(symbol = %symbol, skipped, path = %file_path.display(), "Skipped CSV rows without prices");
        }
        Ok(BarSeries::new(symbol, bars))
    }

    fn required<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str, EngineError> {
        Self::get_field(record, headers, name)
            .ok_or_else(|| EngineError::CsvDataFormatError(format!("Missing '{}' field in CSV record at line {}", name, line)))
    }

    fn number(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<Option<f64>, EngineError> {
        let raw = Self::required(record, headers, name, line)?;
        quote_format::parse_number(raw)
            .map_err(|e| EngineError::CsvDataFormatError(format!("Error parsing '{}' at line {}: {}", name, line, e)))
    }

    // Looks a field up by header name, so column order does not matter.
    fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .and_then(|pos| record.get(pos))
    }
}

/// Keeps the bars within `lookback_days` calendar days of the newest bar.
fn trim_to_lookback(series: BarSeries, lookback_days: u32) -> BarSeries {
    let Some(latest) = series.bars().last().map(|b| b.timestamp) else {
        return series;
    };
    let cutoff: DateTime<Utc> = lookback_cutoff(latest, lookback_days);
    series.retain(|b| b.timestamp > cutoff)
}

#[async_trait]
impl BarSource for CsvFileSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<BarSeries, EngineError> {
        let series = CsvBarParser::load_bars_from_csv(&self.path, symbol)?;
        let total = series.len();
        let series = trim_to_lookback(series, lookback_days);
        tracing::info!(
            symbol = %symbol,
            path = %self.path.display(),
            bars = series.len(),
            total,
            lookback_days,
            "Loaded daily bars from CSV"
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_hms_opt(0, 0, 0).map(|n| n.and_utc())
    }

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_bars_from_csv_valid_data() {
        let csv_content = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-06-04,1450.50,1455.00,1390.00,1395.50,1395.50,980000
2024-06-03,1420.00,1460.00,1415.00,1455.00,1455.00,1200000
2024-06-05,null,null,null,null,null,null";
        let tmp_file = create_test_csv(csv_content);
        let series = CsvBarParser::load_bars_from_csv(tmp_file.path(), "INFY.NS").unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "INFY.NS");
        // sorted ascending regardless of file order
        assert_eq!(series.bars()[0].timestamp, midnight(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()).unwrap());
        assert_eq!(series.bars()[0].close, 1455.0);
        assert_eq!(series.bars()[1].open, 1450.5);
        assert_eq!(series.bars()[1].volume, 980_000.0);
    }

    #[test]
    fn test_columns_found_by_name() {
        let csv_content = "\
Volume,Close,Low,High,Open,Date
500,10.5,9.5,11.0,10.0,2024-01-02";
        let tmp_file = create_test_csv(csv_content);
        let series = CsvBarParser::load_bars_from_csv(tmp_file.path(), "X").unwrap();
        let bar = &series.bars()[0];
        assert_eq!((bar.open, bar.high, bar.low, bar.close, bar.volume), (10.0, 11.0, 9.5, 10.5, 500.0));
    }

    #[test]
    fn test_non_finite_volume_read_as_zero() {
        let csv_content = "\
Date,Open,High,Low,Close,Volume
2024-06-03,100,112,98,110,NaN
2024-06-04,110,112,98,100,inf";
        let tmp_file = create_test_csv(csv_content);
        let series = CsvBarParser::load_bars_from_csv(tmp_file.path(), "X").unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.bars().iter().all(|b| b.volume == 0.0 && b.validate().is_ok()));
    }

    #[test]
    fn test_load_bars_from_csv_header_only() {
        let tmp_file = create_test_csv("Date,Open,High,Low,Close,Adj Close,Volume");
        let series = CsvBarParser::load_bars_from_csv(tmp_file.path(), "X").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_load_bars_from_csv_missing_field() {
        let csv_content = "\
Date,Open,High,Low,Close
2024-06-03,1420.00,1460.00,1415.00,1455.00";
        let tmp_file = create_test_csv(csv_content);
        let result = CsvBarParser::load_bars_from_csv(tmp_file.path(), "X");
        assert!(result.unwrap_err().to_string().contains("Missing 'Volume' field"));
    }

    #[test]
    fn test_load_bars_from_csv_invalid_number() {
        let csv_content = "\
Date,Open,High,Low,Close,Volume
2024-06-03,invalid,1460.00,1415.00,1455.00,100";
        let tmp_file = create_test_csv(csv_content);
        let err = CsvBarParser::load_bars_from_csv(tmp_file.path(), "X").unwrap_err();
        assert!(matches!(err, EngineError::CsvDataFormatError(_)));
        assert!(err.to_string().contains("Error parsing 'Open' at line 2"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvBarParser::load_bars_from_csv(Path::new("does/not/exist.csv"), "X").unwrap_err();
        assert!(matches!(err, EngineError::IoError { .. }));
    }

    #[tokio::test]
    async fn test_source_trims_to_lookback() {
        let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
        for d in 1..=30 {
            content.push_str(&format!("2024-04-{:02},10,11,9,10.5,100\n", d));
        }
        let tmp_file = create_test_csv(content.trim_end());
        let source = CsvFileSource::new(tmp_file.path());

        let series = source.fetch_bars("X", 10).await.unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.bars()[0].timestamp, midnight(NaiveDate::from_ymd_opt(2024, 4, 21).unwrap()).unwrap());
        assert_eq!(source.name(), "csv");
    }
}
