//! Instantiating typed values from matched content.
//!
//! A [`Fragment`] is the raw material a selector matched: the outer XML of an
//! element, a header-keyed spreadsheet row or a JSON value. Every fragment
//! decodes through serde, so a bound type only needs `Deserialize`.

use serde::de::DeserializeOwned;
use serde::de::value::{Error as ValueError, MapDeserializer};
use thiserror::Error;

use crate::DataValue;

/// Failure to instantiate a bound type from a fragment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("XML content does not match the bound type: {0}")]
    Xml(String),
    #[error("row does not match the bound type: {0}")]
    Fields(String),
    #[error("JSON content does not match the bound type: {0}")]
    Json(String),
}

/// Borrowed content matched by a selector.
#[derive(Debug, Clone, Copy)]
pub enum Fragment<'a> {
    /// Outer XML of a single element, including its own tags.
    Xml(&'a str),
    /// Header name → cell value pairs in column order.
    Fields(&'a [(String, DataValue)]),
    Json(&'a serde_json::Value),
}

impl Fragment<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Fragment::Xml(_) => "xml",
            Fragment::Fields(_) => "row",
            Fragment::Json(_) => "json",
        }
    }

    /// Deserialize the fragment as `T`.
    ///
    /// Empty cells are left out of a row so that `Option` fields come back as
    /// `None` and `#[serde(default)]` applies.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        match *self {
            Fragment::Xml(xml) => {
                quick_xml::de::from_str(xml).map_err(|e| DecodeError::Xml(e.to_string()))
            }
            Fragment::Fields(fields) => {
                let entries = fields
                    .iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(name, value)| (name.as_str(), value.clone()));
                T::deserialize(MapDeserializer::<_, ValueError>::new(entries))
                    .map_err(|e| DecodeError::Fields(e.to_string()))
            }
            Fragment::Json(value) => {
                T::deserialize(value).map_err(|e| DecodeError::Json(e.to_string()))
            }
        }
    }
}
