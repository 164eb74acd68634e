use datadrive_common::DataValue;
use datadrive_io::IoError;
use datadrive_resource::FileResource;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::{DataProvider, LoadedRecords, SelectorRecords, Targets, targets};
use crate::record::{DataRecord, RecordContent, resolve_key};

/// Provider for JSON resources. Selectors are JSON pointers (RFC 6901); a
/// pointer that lands on an array yields one record per element.
#[derive(Debug, Clone)]
pub struct JsonDataProvider {
    resource: FileResource,
    config: ProviderConfig,
}

impl JsonDataProvider {
    pub fn new(resource: FileResource) -> Self {
        Self::with_config(resource, ProviderConfig::default())
    }

    pub fn with_config(resource: FileResource, config: ProviderConfig) -> Self {
        Self { resource, config }
    }

    fn read(&self) -> Result<Value, ProviderError> {
        let path = self.resource.path();
        let text = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Json {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn records(&self, root: &Value, pointer: &str) -> Result<Vec<DataRecord>, ProviderError> {
        if !(pointer.is_empty() || pointer.starts_with('/')) {
            return Err(ProviderError::InvalidSelector {
                selector: pointer.to_string(),
                message: "a JSON pointer is empty or starts with `/`".to_string(),
            });
        }
        let records = match root.pointer(pointer) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.record(item, format!("{pointer}/{i}")))
                .collect(),
            Some(value) => vec![self.record(value, pointer.to_string())],
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(pointer, matches = records.len(), "resolved JSON pointer");
        Ok(records)
    }

    fn record(&self, value: &Value, location: String) -> DataRecord {
        let fields = match value {
            Value::Object(members) => members
                .iter()
                .filter_map(|(name, member)| {
                    DataValue::from_json(member).map(|v| (name.clone(), v))
                })
                .collect(),
            _ => Vec::new(),
        };
        let location = if location.is_empty() {
            "/".to_string()
        } else {
            location
        };
        let record = DataRecord::new(location, fields, RecordContent::Json(value.clone()));
        let key = resolve_key(&record, self.config.key_field.as_deref(), || None);
        record.with_key(key)
    }
}

impl DataProvider for JsonDataProvider {
    fn resource(&self) -> &FileResource {
        &self.resource
    }

    fn load(&self) -> Result<LoadedRecords, ProviderError> {
        let targets = targets(&self.resource)?;
        let root = self.read()?;
        match targets {
            Targets::Single(target) => Ok(LoadedRecords::Single {
                target,
                records: self.records(&root, "")?,
            }),
            Targets::Multi(bindings) => bindings
                .into_iter()
                .map(|(selector, target)| {
                    Ok(SelectorRecords {
                        selector: selector.clone(),
                        target,
                        records: self.records(&root, selector.as_str())?,
                    })
                })
                .collect::<Result<Vec<_>, ProviderError>>()
                .map(LoadedRecords::Multi),
        }
    }
}
