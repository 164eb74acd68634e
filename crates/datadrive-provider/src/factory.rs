use std::fmt;

use datadrive_resource::FileResource;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::json::JsonDataProvider;
use crate::provider::DataProvider;
use crate::xml::XmlDataProvider;

/// File formats a provider exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Xml,
    Excel,
    Csv,
    Json,
}

impl DataFormat {
    /// Format for a lowercase or mixed-case file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "xml" => Some(Self::Xml),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn of(resource: &FileResource) -> Option<Self> {
        resource.extension().as_deref().and_then(Self::from_extension)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xml => "xml",
            Self::Excel => "excel",
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

/// Picks a provider by file extension.
pub struct DataProviderFactory;

impl DataProviderFactory {
    pub fn open(
        resource: FileResource,
        config: ProviderConfig,
    ) -> Result<Box<dyn DataProvider>, ProviderError> {
        let unsupported = |resource: &FileResource| ProviderError::UnsupportedFormat {
            path: resource.to_string(),
            extension: resource.extension().unwrap_or_default(),
        };
        let format = DataFormat::of(&resource).ok_or_else(|| unsupported(&resource))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(resource = %resource, %format, "opening data provider");

        match format {
            DataFormat::Xml => Ok(Box::new(XmlDataProvider::with_config(resource, config))),
            DataFormat::Json => Ok(Box::new(JsonDataProvider::with_config(resource, config))),
            #[cfg(feature = "calamine")]
            DataFormat::Excel => Ok(Box::new(crate::spreadsheet::ExcelDataProvider::with_config(
                resource, config,
            ))),
            #[cfg(feature = "csv")]
            DataFormat::Csv => Ok(Box::new(crate::spreadsheet::CsvDataProvider::with_config(
                resource, config,
            ))),
            #[allow(unreachable_patterns)]
            _ => Err(unsupported(&resource)),
        }
    }
}
