// Run with: `cargo test -p datadrive-io --features calamine --test calamine`

use chrono::NaiveDate;
use datadrive_common::DataValue;
use datadrive_io::{CalamineAdapter, IoError, SpreadsheetReader};
use datadrive_testkit::{Cell, build_workbook, fill_sheet, fill_sheet_at, row, sheet_mut};

#[test]
fn reads_typed_cells_with_one_based_positions() {
    let path = build_workbook(|book| {
        fill_sheet(
            book,
            "Sheet1",
            &[
                row!["id", "name", "active"],
                row![1, "Ada", true],
                row![2.5, Cell::Blank, false],
            ],
        );
    });

    let mut backend = CalamineAdapter::open_path(&path).expect("open via calamine");
    let sheet = backend.read_sheet("Sheet1").unwrap();
    assert_eq!(sheet.dimensions, Some((3, 3)));
    assert_eq!(sheet.value(1, 2), &DataValue::from("name"));
    assert_eq!(sheet.value(2, 1), &DataValue::Number(1.0));
    assert_eq!(sheet.value(2, 3), &DataValue::Boolean(true));
    assert_eq!(sheet.value(3, 1), &DataValue::Number(2.5));
    assert!(sheet.get(3, 2).is_none());
}

#[test]
fn offset_ranges_keep_absolute_coordinates() {
    let path = build_workbook(|book| {
        fill_sheet_at(book, "Orders", (3, 2), &[row!["sku", "qty"], row!["X1", 4]]);
    });

    let mut backend = CalamineAdapter::open_path(&path).unwrap();
    assert!(backend.has_sheet("Orders"));
    let sheet = backend.read_sheet("Orders").unwrap();
    assert_eq!(sheet.value(3, 2), &DataValue::from("sku"));
    assert_eq!(sheet.value(4, 3), &DataValue::Number(4.0));
    assert_eq!(backend.sheet_bounds("Orders"), Some((4, 3)));

    let range = backend.read_range("Orders", (4, 1), (4, 10)).unwrap();
    assert_eq!(range.len(), 2);
}

#[test]
fn excel_1900_date_serial_decodes_without_off_by_one() {
    // Excel 1900 date system serial for 2023-03-01 is 44986.
    let serial = 44986.0;

    let path = build_workbook(|book| {
        let sh = sheet_mut(book, "Sheet1");
        sh.get_cell_mut((8, 15)).set_value_number(serial);
        // A built-in date format makes calamine yield Data::DateTime.
        let _ = sh
            .get_style_mut("H15")
            .get_number_format_mut()
            .set_format_code(umya_spreadsheet::NumberingFormat::FORMAT_DATE_XLSX14);
    });

    let mut backend = CalamineAdapter::open_path(&path).unwrap();
    let sheet = backend.read_sheet("Sheet1").unwrap();
    match sheet.value(15, 8) {
        DataValue::Date(d) => assert_eq!(*d, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()),
        other => panic!("Expected date at Sheet1!H15, got {other:?}"),
    }
}

#[test]
fn missing_sheet_and_file() {
    let path = build_workbook(|_| {});
    let mut backend = CalamineAdapter::open_path(&path).unwrap();
    assert!(matches!(
        backend.read_sheet("Nope"),
        Err(IoError::MissingSheet { .. })
    ));
    assert!(matches!(
        CalamineAdapter::open_path("missing.xlsx"),
        Err(IoError::Io { .. })
    ));
}
