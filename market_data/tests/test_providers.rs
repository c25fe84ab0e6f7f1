use chrono::NaiveDate;
use market_data::{CsvDataProvider, DateRange, MarketDataError, MarketDataProvider};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_sample_csv(dir: &TempDir) {
    let csv = "date,close\n\
               2023-01-02,100.0\n\
               2023-01-03,101.5\n\
               2023-01-04,99.8\n\
               2023-01-05,102.2\n";
    fs::write(dir.path().join("AAPL.csv"), csv).unwrap();
}

#[test]
fn loads_rows_within_range() {
    let dir = TempDir::new().unwrap();
    write_sample_csv(&dir);

    let provider = CsvDataProvider::new(dir.path());
    let range = DateRange::new(date(2023, 1, 3), date(2023, 1, 4)).unwrap();

    let series = provider.fetch_price_series("AAPL", &range).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.closes(), vec![101.5, 99.8]);
}

#[test]
fn lowercase_ticker_resolves_to_uppercase_file() {
    let dir = TempDir::new().unwrap();
    write_sample_csv(&dir);

    let provider = CsvDataProvider::new(dir.path());
    let range = DateRange::new(date(2023, 1, 1), date(2023, 1, 31)).unwrap();

    let series = provider.fetch_price_series("aapl", &range).unwrap();
    assert_eq!(series.len(), 4);
}

#[test]
fn unknown_ticker_is_unavailable() {
    let dir = TempDir::new().unwrap();
    write_sample_csv(&dir);

    let provider = CsvDataProvider::new(dir.path());
    let range = DateRange::new(date(2023, 1, 1), date(2023, 1, 31)).unwrap();

    let err = provider.fetch_price_series("TSLA", &range).unwrap_err();
    assert!(matches!(err, MarketDataError::DataUnavailable(_)));
}

#[test]
fn empty_range_is_unavailable() {
    let dir = TempDir::new().unwrap();
    write_sample_csv(&dir);

    let provider = CsvDataProvider::new(dir.path());
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();

    let err = provider.fetch_price_series("AAPL", &range).unwrap_err();
    assert!(matches!(err, MarketDataError::DataUnavailable(_)));
}

#[test]
fn malformed_csv_is_a_csv_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("BAD.csv"), "date,close\nnot-a-date,1.0\n").unwrap();

    let provider = CsvDataProvider::new(dir.path());
    let range = DateRange::new(date(2023, 1, 1), date(2023, 1, 31)).unwrap();

    let err = provider.fetch_price_series("BAD", &range).unwrap_err();
    assert!(matches!(err, MarketDataError::CsvError(_)));
}
