// Run with: `cargo test -p datadrive-provider --features calamine --test excel_provider`

use chrono::NaiveDate;
use datadrive_provider::{
    DataProvider, ExcelDataProvider, FileResource, ProviderConfig, ProviderError, TypeDescriptor,
    TypedBindingMap,
};
use datadrive_testkit::{Cell, build_workbook, fill_sheet, fill_sheet_at, row, sheet_mut};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Customer {
    id: String,
    name: String,
    vip: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Invoice {
    number: u32,
    amount: f64,
}

fn customers_book() -> datadrive_testkit::TempFixture {
    build_workbook(|book| {
        fill_sheet(
            book,
            "Customer",
            &[
                row!["id", "name", "vip"],
                row![101, "Ada", true],
                row![102, "Grace", false],
                row![Cell::Blank, Cell::Blank, Cell::Blank],
                row![103, "Hidden", false],
            ],
        );
        fill_sheet_at(
            book,
            "Billing",
            (3, 2),
            &[
                row!["number", "amount", "ignored"],
                row![1, 19.99, "x"],
                row![2, 5, "y"],
            ],
        );
    })
}

#[test]
fn sheet_named_after_type_is_the_default_table() {
    let book = customers_book();
    let resource =
        FileResource::from_path(book.path(), TypeDescriptor::of::<Customer>()).unwrap();
    let customers = ExcelDataProvider::new(resource)
        .all_data()
        .unwrap()
        .into_typed::<Customer>()
        .unwrap();
    assert_eq!(
        customers,
        vec![
            Customer { id: "101".into(), name: "Ada".into(), vip: true },
            Customer { id: "102".into(), name: "Grace".into(), vip: false },
        ]
    );
}

#[test]
fn rows_past_a_blank_row_when_configured() {
    let book = customers_book();
    let resource =
        FileResource::from_path(book.path(), TypeDescriptor::of::<Customer>()).unwrap();
    let config = ProviderConfig {
        stop_at_blank_row: false,
        ..Default::default()
    };
    let provider = ExcelDataProvider::with_config(resource, config);
    assert_eq!(provider.all_data().unwrap().len(), 3);
    assert_eq!(provider.single_row("103").unwrap().index(), 3);
}

#[test]
fn sheet_ranges_bind_to_types() {
    let book = customers_book();
    let bindings = TypedBindingMap::new()
        .bind::<Customer>("Customer!A1:C3")
        .and_then(|m| m.bind::<Invoice>("Billing!B3:C5"))
        .unwrap();
    let resource = FileResource::from_path_with_bindings(book.path(), bindings).unwrap();
    let set = ExcelDataProvider::new(resource).all_data().unwrap();

    assert_eq!(set.len(), 2);
    let first = &set.rows()[0];
    assert_eq!(first.key(), Some("101"));
    assert_eq!(
        first.by_selector::<Invoice>("Billing!B3:C5"),
        Some(&Invoice { number: 1, amount: 19.99 })
    );
}

#[test]
fn explicit_sheet_and_missing_sheet() {
    let book = customers_book();
    let resource = FileResource::from_path(book.path(), TypeDescriptor::of::<Invoice>()).unwrap();
    assert!(matches!(
        ExcelDataProvider::new(resource.clone()).all_data(),
        Err(ProviderError::Io(_))
    ));

    let config = ProviderConfig::default().with_sheet("Billing").with_header_row(3);
    let provider = ExcelDataProvider::with_config(resource, config);
    // Whole-sheet reads start at column A, which is blank on Billing.
    assert!(provider.all_data().unwrap().is_empty());
}

#[test]
fn invalid_sheet_locator_is_a_selector_error() {
    let book = customers_book();
    let bindings = TypedBindingMap::new().bind::<Invoice>("Billing!C5:B3").unwrap();
    let resource = FileResource::from_path_with_bindings(book.path(), bindings).unwrap();
    assert!(matches!(
        ExcelDataProvider::new(resource).all_data(),
        Err(ProviderError::InvalidSelector { .. })
    ));
}

#[test]
fn date_cells_decode_into_chrono_dates() {
    #[derive(Debug, Deserialize)]
    struct Holiday {
        name: String,
        day: NaiveDate,
    }

    let book = build_workbook(|book| {
        fill_sheet(book, "Holiday", &[row!["name", "day"], row!["Spring", 44986.0]]);
        let _ = sheet_mut(book, "Holiday")
            .get_style_mut("B2")
            .get_number_format_mut()
            .set_format_code(umya_spreadsheet::NumberingFormat::FORMAT_DATE_XLSX14);
    });
    let resource = FileResource::from_path(book.path(), TypeDescriptor::of::<Holiday>()).unwrap();
    let holidays = ExcelDataProvider::new(resource)
        .all_data()
        .unwrap()
        .into_typed::<Holiday>()
        .unwrap();
    assert_eq!(holidays[0].name, "Spring");
    assert_eq!(holidays[0].day, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
}
