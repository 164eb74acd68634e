//! Data providers for data-driven tests.
//!
//! A provider takes a [`FileResource`], reads the file it names and turns its
//! content into a [`DataSet`]: one [`DataRow`] per test invocation, each row
//! holding one value per declared type. Single-typed resources yield one
//! value per record; resources with selector bindings yield one value per
//! selector, zipped by match position.
//!
//! ```no_run
//! use datadrive_provider::{DataProvider, XmlDataProvider};
//! use datadrive_resource::{FileResource, TypeDescriptor};
//!
//! #[derive(serde::Deserialize)]
//! struct Order {
//!     #[serde(rename = "@id")]
//!     id: String,
//! }
//!
//! let resource = FileResource::new("testdata", "orders.xml", TypeDescriptor::of::<Order>())?;
//! for row in XmlDataProvider::new(resource).all_data()? {
//!     let order: &Order = row.get(0).expect("one Order per row");
//!     println!("{}", order.id);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod dataset;
mod error;
mod factory;
mod filter;
mod index;
mod json;
mod manifest;
mod provider;
mod record;
mod registry;
mod spreadsheet;
mod validation;
mod xml;

pub use config::ProviderConfig;
pub use dataset::{DataRow, DataSet};
pub use error::ProviderError;
pub use factory::{DataFormat, DataProviderFactory};
pub use filter::{DataFilter, IndexInclusionFilter, KeyFilter};
pub use index::{IndexExpression, parse_index_expression};
pub use json::JsonDataProvider;
pub use manifest::{
    CURRENT_MANIFEST_VERSION, DataSourceManifest, ManifestError, ManifestVersion, ResolvedSource,
    SourceEntry,
};
pub use provider::{DataProvider, LoadedRecords, SelectorRecords};
pub use record::{DataRecord, RecordContent};
pub use registry::TypeRegistry;
#[cfg(feature = "calamine")]
pub use spreadsheet::ExcelDataProvider;
#[cfg(feature = "csv")]
pub use spreadsheet::CsvDataProvider;
pub use spreadsheet::{ConfiguredReader, SpreadsheetDataProvider};
pub use validation::{ManifestIssue, ValidationError};
pub use xml::XmlDataProvider;

pub use datadrive_resource::{
    BoundValue, FileResource, ResourceError, ResourceKind, Selector, TypeDescriptor,
    TypedBindingMap,
};
