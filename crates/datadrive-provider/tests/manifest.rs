use std::path::Path;

use datadrive_provider::{
    DataProvider, DataSourceManifest, ManifestError, ManifestIssue, ResourceKind, TypeRegistry,
};
use serde::Deserialize;

const FIXTURES: &str = "tests/fixtures";

#[derive(Debug, Deserialize)]
struct OrderRecord {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct OrderHeader {
    customer: String,
}

#[derive(Debug, Deserialize)]
struct OrderItems {}

#[derive(Debug, Deserialize)]
struct Account {
    owner: String,
}

#[derive(Debug, Deserialize)]
struct Limit {
    daily: u32,
}

fn load_fixture(name: &str) -> DataSourceManifest {
    DataSourceManifest::load(Path::new(FIXTURES).join(name)).expect("fixture should deserialize")
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register_short::<OrderRecord>()
        .register_short::<OrderHeader>()
        .register_short::<OrderItems>()
        .register_short::<Account>()
        .register_short::<Limit>();
    registry
}

#[test]
fn sources_fixture_validates_and_resolves() {
    let manifest = load_fixture("sources.yaml");
    manifest.validate().expect("fixture should validate");

    let resolved = manifest
        .resolve(&registry(), Some(Path::new(FIXTURES)))
        .unwrap();
    assert_eq!(resolved.len(), 3);

    let orders = &resolved[0];
    assert_eq!(orders.resource.path(), Path::new(FIXTURES).join(".").join("orders.xml"));
    assert!(orders.resource.declared_type().unwrap().is::<OrderRecord>());
    assert_eq!(orders.config.key_field.as_deref(), Some("id"));

    let parts = &resolved[1];
    let ResourceKind::MultiType(bindings) = parts.resource.kind() else {
        panic!("order-parts binds selectors");
    };
    assert!(bindings.get("//order[1]").unwrap().is::<OrderHeader>());
    assert!(bindings.get("//order[1]/items").unwrap().is::<OrderItems>());
}

#[test]
fn resolved_sources_open_providers() {
    let manifest = load_fixture("sources.yaml");
    let resolved = manifest
        .resolve(&registry(), Some(Path::new(FIXTURES)))
        .unwrap();

    let orders = resolved[0].open().unwrap().data_as_map().unwrap();
    assert_eq!(orders["B-7"].get::<OrderRecord>(0).unwrap().id, "B-7");

    let parts = resolved[1].open().unwrap().all_data().unwrap();
    assert_eq!(
        parts.rows()[0].get::<OrderHeader>(0).unwrap().customer,
        "Acme"
    );

    let accounts = resolved[2].open().unwrap().data_by_index("2").unwrap();
    let row = &accounts.rows()[0];
    assert_eq!(row.by_selector::<Account>("/accounts").unwrap().owner, "Grace");
    assert_eq!(row.by_selector::<Limit>("/limits").unwrap().daily, 50);
}

#[test]
fn invalid_fixture_reports_every_issue() {
    let manifest = load_fixture("invalid_sources.yaml");
    let err = manifest.validate().expect_err("validation should fail");
    let paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "version",
            "sources[0].id",
            "sources[0]",
            "sources[1]",
            "sources[2].id",
            "sources[2].file",
            "sources[2]",
            "sources[2].config.header_row",
        ]
    );
    assert!(err.issues()[4].message.contains("duplicate source id `dup`"));

    assert!(matches!(
        manifest.resolve(&registry(), None),
        Err(ManifestError::Invalid(_))
    ));
}

#[test]
fn unregistered_type_names_the_source() {
    let manifest = load_fixture("sources.yaml");
    let mut partial = TypeRegistry::new();
    partial.register_short::<OrderRecord>();
    match manifest.resolve(&partial, None) {
        Err(ManifestError::UnknownType {
            source_id,
            type_name,
        }) => {
            assert_eq!(source_id, "order-parts");
            assert_eq!(type_name, "OrderHeader");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn yaml_round_trip_and_unknown_fields() {
    let manifest = load_fixture("sources.yaml");
    let yaml = manifest.to_yaml().unwrap();
    let reparsed: DataSourceManifest = yaml.parse().unwrap();
    assert_eq!(reparsed, manifest);
    assert_eq!(reparsed.source("accounts").unwrap().bindings.as_ref().unwrap().len(), 2);

    let unknown = "version: \"1.0.0\"\nsources:\n  - id: x\n    path: a.xml\n    typ: A\n";
    assert!(DataSourceManifest::from_yaml_str(unknown).is_err());
    assert!(DataSourceManifest::from_yaml_str("version: not-semver\n").is_err());
}

#[test]
fn issues_display_path_and_message() {
    let issue = ManifestIssue::new("sources[3].file", "file name must not be empty");
    assert_eq!(issue.to_string(), "sources[3].file: file name must not be empty");
}
