#![cfg(feature = "csv")]

use datadrive_common::DataValue;
use datadrive_io::{CsvAdapter, CsvReadOptions, CsvTrim, IoError, SpreadsheetReader};
use datadrive_testkit::write_fixture;

#[test]
fn csv_sheet_is_named_after_the_file() {
    let fixture = write_fixture("accounts.csv", "id,balance,active\n1001,12.50,TRUE\n1002,,false\n");
    let mut adapter = CsvAdapter::open_path(&fixture).unwrap();

    assert_eq!(adapter.sheet_names().unwrap(), vec!["accounts".to_string()]);
    assert!(!adapter.capabilities().multiple_sheets);

    let sheet = adapter.read_sheet("accounts").unwrap();
    assert_eq!(sheet.dimensions, Some((3, 3)));
    assert_eq!(sheet.value(1, 1), &DataValue::from("id"));
    assert_eq!(sheet.value(2, 1), &DataValue::Int(1001));
    assert_eq!(sheet.value(2, 2), &DataValue::Number(12.5));
    assert_eq!(sheet.value(2, 3), &DataValue::Boolean(true));
    assert_eq!(sheet.value(3, 2), &DataValue::Empty);
    assert!(sheet.get(3, 2).is_none());
}

#[test]
fn delimiter_and_trim_options() {
    let opts = CsvReadOptions {
        delimiter: b';',
        trim: CsvTrim::All,
        ..CsvReadOptions::default()
    };
    let mut adapter =
        CsvAdapter::open_bytes_with_options(b"name ; qty\n widget ; 3 \n".to_vec(), opts).unwrap();
    let sheet = adapter.read_sheet("Sheet1").unwrap();
    assert_eq!(sheet.value(1, 2), &DataValue::from("qty"));
    assert_eq!(sheet.value(2, 1), &DataValue::from("widget"));
    assert_eq!(sheet.value(2, 2), &DataValue::Int(3));
}

#[test]
fn ragged_rows_and_ranges() {
    let mut adapter = CsvAdapter::open_bytes(b"a,b,c\n1\n2,3\n".to_vec()).unwrap();
    assert_eq!(adapter.sheet_bounds("Sheet1"), Some((3, 3)));
    let range = adapter.read_range("Sheet1", (2, 1), (3, 2)).unwrap();
    let keys: Vec<_> = range.keys().copied().collect();
    assert_eq!(keys, vec![(2, 1), (3, 1), (3, 2)]);
}

#[test]
fn unknown_sheet_is_an_error() {
    let mut adapter = CsvAdapter::open_bytes(b"a\n".to_vec()).unwrap();
    assert!(matches!(
        adapter.read_sheet("Other"),
        Err(IoError::MissingSheet { sheet }) if sheet == "Other"
    ));
    assert!(adapter.sheet_bounds("Other").is_none());
}

#[test]
fn missing_file_reports_path() {
    let err = CsvAdapter::open_path("no/such/file.csv").err().unwrap();
    assert!(matches!(err, IoError::Io { path, .. } if path.ends_with("file.csv")));
}
