//! Readers for the structured files that feed data-driven tests.
//!
//! XML documents are parsed into a small arena tree queried with an XPath
//! subset ([`XPath`]). Spreadsheets are read through the [`SpreadsheetReader`]
//! trait, with calamine (xls/xlsx/xlsb/ods) and csv backends behind features.

pub mod backends;
pub mod error;
pub mod traits;
pub mod xml;

#[cfg(feature = "calamine")]
pub use backends::CalamineAdapter;
#[cfg(feature = "csv")]
pub use backends::{CsvAdapter, CsvReadOptions, CsvTrim, CsvTypeInference};
pub use error::IoError;
pub use traits::{BackendCaps, SheetData, SpreadsheetReader};
pub use xml::{Node, NodeId, XPath, XmlDocument};

pub use datadrive_common::DataValue;
