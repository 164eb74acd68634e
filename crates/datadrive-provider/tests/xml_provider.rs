use datadrive_provider::{
    DataProvider, FileResource, IndexInclusionFilter, KeyFilter, ProviderConfig, ProviderError,
    TypeDescriptor, TypedBindingMap, XmlDataProvider,
};
use serde::Deserialize;

const FIXTURES: &str = "tests/fixtures";

#[derive(Debug, Deserialize, PartialEq)]
struct OrderRecord {
    #[serde(rename = "@id")]
    id: String,
    customer: String,
    total: f64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct OrderHeader {
    #[serde(rename = "@id")]
    id: String,
    customer: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct OrderItems {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    #[serde(rename = "@sku")]
    sku: String,
    #[serde(rename = "@qty")]
    qty: u32,
}

fn orders() -> XmlDataProvider {
    let resource =
        FileResource::new(FIXTURES, "orders.xml", TypeDescriptor::of::<OrderRecord>()).unwrap();
    XmlDataProvider::new(resource)
}

fn parts(bindings: TypedBindingMap) -> XmlDataProvider {
    let resource =
        FileResource::from_path_with_bindings(format!("{FIXTURES}/orders.xml"), bindings).unwrap();
    XmlDataProvider::new(resource)
}

#[test]
fn single_type_reads_every_order() {
    let orders = orders().all_data().unwrap().into_typed::<OrderRecord>().unwrap();
    assert_eq!(orders.len(), 3);
    assert_eq!(
        orders[0],
        OrderRecord {
            id: "A-1".into(),
            customer: "Acme".into(),
            total: 12.5,
        }
    );
    assert_eq!(orders[1].customer, "Globex & Co");
}

#[test]
fn first_order_and_its_items_bind_to_separate_types() {
    let bindings = TypedBindingMap::new()
        .bind::<OrderHeader>("//order[1]")
        .and_then(|m| m.bind::<OrderItems>("//order[1]/items"))
        .unwrap();
    let set = parts(bindings).all_data().unwrap();

    assert_eq!(set.len(), 1);
    let row = &set.rows()[0];
    assert_eq!(row.len(), 2);
    assert_eq!(row.key(), Some("A-1"));
    assert_eq!(
        row.by_selector::<OrderHeader>("//order[1]"),
        Some(&OrderHeader {
            id: "A-1".into(),
            customer: "Acme".into(),
        })
    );
    let items = row.by_selector::<OrderItems>("//order[1]/items").unwrap();
    assert_eq!(
        items.items,
        vec![
            Item { sku: "X-1".into(), qty: 2 },
            Item { sku: "X-2".into(), qty: 1 },
        ]
    );
}

#[test]
fn selector_matches_zip_by_position() {
    let bindings = TypedBindingMap::new()
        .bind::<OrderHeader>("/orders/order")
        .and_then(|m| m.bind::<OrderItems>("//items"))
        .unwrap();
    let set = parts(bindings).all_data().unwrap();
    assert_eq!(set.len(), 3);
    let third = &set.rows()[2];
    assert_eq!(third.get::<OrderHeader>(0).unwrap().id, "C-3");
    assert!(third.get::<OrderItems>(1).unwrap().items.is_empty());
}

#[test]
fn unequal_match_counts_are_rejected() {
    let bindings = TypedBindingMap::new()
        .bind::<OrderHeader>("//order")
        .and_then(|m| m.bind::<Item>("//order[1]/items/item"))
        .unwrap();
    match parts(bindings).all_data() {
        Err(ProviderError::MismatchedBindingCounts { counts }) => {
            assert_eq!(
                counts,
                vec![
                    ("//order".to_string(), 3),
                    ("//order[1]/items/item".to_string(), 2),
                ]
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn selector_without_matches_is_reported() {
    let bindings = TypedBindingMap::new()
        .bind::<OrderHeader>("//order")
        .and_then(|m| m.bind::<Item>("//refund"))
        .unwrap();
    assert!(matches!(
        parts(bindings).all_data(),
        Err(ProviderError::NoMatch { selector, .. }) if selector == "//refund"
    ));
}

#[test]
fn queries_by_index_key_and_filter() {
    let provider = orders();

    let set = provider.data_by_index("3, 1").unwrap();
    let ids: Vec<_> = set.iter().map(|r| r.key().unwrap()).collect();
    assert_eq!(ids, ["C-3", "A-1"]);

    let set = provider.data_by_keys(&["B-7"]).unwrap();
    assert_eq!(set.rows()[0].get::<OrderRecord>(0).unwrap().total, 3.0);

    let map = provider.data_as_map().unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map["C-3"].index(), 3);

    let filter = IndexInclusionFilter::new("2-3").unwrap();
    assert_eq!(provider.data_by_filter(&filter).unwrap().len(), 2);

    let filter = KeyFilter::by_field("customer", ["Initech"]);
    let set = provider.data_by_filter(&filter).unwrap();
    assert_eq!(set.rows()[0].key(), Some("C-3"));

    assert!(matches!(
        provider.data_by_index("4"),
        Err(ProviderError::IndexOutOfRange { index: 4, available: 3 })
    ));
}

#[test]
fn custom_record_selector_and_key_field() {
    let resource =
        FileResource::new(FIXTURES, "orders.xml", TypeDescriptor::of::<Item>()).unwrap();
    let config = ProviderConfig::default()
        .with_record_selector("//item")
        .with_key_field("sku");
    let provider = XmlDataProvider::with_config(resource, config);

    let row = provider.data_by_keys(&["Y-9"]).unwrap();
    assert_eq!(row.rows()[0].get::<Item>(0).unwrap().qty, 5);
}

#[test]
fn decode_failure_names_the_match() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict {
        #[serde(rename = "@id")]
        id: u32,
    }
    let resource =
        FileResource::new(FIXTURES, "orders.xml", TypeDescriptor::of::<Strict>()).unwrap();
    match XmlDataProvider::new(resource).all_data() {
        Err(ProviderError::Decode { location, .. }) => assert_eq!(location, "/*/* (match 1)"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn untyped_resource_and_missing_file() {
    let untyped = FileResource::builder(FIXTURES, "orders.xml").build().unwrap();
    assert!(matches!(
        XmlDataProvider::new(untyped).all_data(),
        Err(ProviderError::Untyped { .. })
    ));

    let missing =
        FileResource::new(FIXTURES, "absent.xml", TypeDescriptor::of::<OrderRecord>()).unwrap();
    assert!(matches!(
        XmlDataProvider::new(missing).all_data(),
        Err(ProviderError::Io(_))
    ));
}
