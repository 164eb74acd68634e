//! Meta crate that re-exports the datadrive building blocks. The resource
//! model is always available; readers and providers sit behind the
//! `provider` feature (on by default) and their backend flags.

pub use datadrive_common as common;
pub use datadrive_resource as resource;

#[cfg(feature = "provider")]
pub use datadrive_io as io;

#[cfg(feature = "provider")]
pub use datadrive_provider as provider;

pub use datadrive_resource::{
    BoundValue, FileResource, FileResourceBuilder, ResourceError, ResourceKind, Selector,
    TypeDescriptor, TypedBindingMap,
};

#[cfg(feature = "provider")]
pub use datadrive_provider::{
    DataFilter, DataProvider, DataProviderFactory, DataRow, DataSet, DataSourceManifest,
    JsonDataProvider, ProviderConfig, ProviderError, TypeRegistry, XmlDataProvider,
};

#[cfg(feature = "calamine")]
pub use datadrive_provider::ExcelDataProvider;

#[cfg(feature = "csv")]
pub use datadrive_provider::CsvDataProvider;
