use datadrive_common::DataValue;
use datadrive_io::{Node, XPath, XmlDocument};
use datadrive_resource::FileResource;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::{DataProvider, LoadedRecords, SelectorRecords, Targets, targets};
use crate::record::{DataRecord, RecordContent, resolve_key};

/// Provider for XML resources. Selectors are XPath expressions evaluated
/// against the document node.
#[derive(Debug, Clone)]
pub struct XmlDataProvider {
    resource: FileResource,
    config: ProviderConfig,
}

impl XmlDataProvider {
    pub fn new(resource: FileResource) -> Self {
        Self::with_config(resource, ProviderConfig::default())
    }

    pub fn with_config(resource: FileResource, config: ProviderConfig) -> Self {
        Self { resource, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn records(&self, doc: &XmlDocument, expression: &str) -> Result<Vec<DataRecord>, ProviderError> {
        let xpath = XPath::parse(expression)?;
        let nodes = doc.select(&xpath);
        #[cfg(feature = "tracing")]
        tracing::debug!(selector = expression, matches = nodes.len(), "evaluated XPath");
        Ok(nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| self.record(node, format!("{expression} (match {})", i + 1)))
            .collect())
    }

    fn record(&self, node: Node<'_>, location: String) -> DataRecord {
        let mut fields: Vec<(String, DataValue)> = node
            .attributes()
            .map(|(name, value)| (name.to_string(), DataValue::from(value)))
            .collect();
        fields.extend(
            node.children()
                .filter(|child| child.children().next().is_none())
                .map(|child| {
                    (
                        child.local_name().to_string(),
                        DataValue::from(child.text().trim()),
                    )
                }),
        );

        let record = DataRecord::new(location, fields, RecordContent::Xml(node.outer_xml().to_string()));
        let key = resolve_key(&record, self.config.key_field.as_deref(), || {
            match node.attributes().next() {
                Some((_, value)) => Some(value.trim().to_string()),
                None => node.children().next().map(|c| c.text().trim().to_string()),
            }
            .filter(|key| !key.is_empty())
        });
        record.with_key(key)
    }
}

impl DataProvider for XmlDataProvider {
    fn resource(&self) -> &FileResource {
        &self.resource
    }

    fn load(&self) -> Result<LoadedRecords, ProviderError> {
        let targets = targets(&self.resource)?;
        let doc = XmlDocument::open(self.resource.path())?;
        match targets {
            Targets::Single(target) => Ok(LoadedRecords::Single {
                target,
                records: self.records(&doc, self.config.record_selector())?,
            }),
            Targets::Multi(bindings) => bindings
                .into_iter()
                .map(|(selector, target)| {
                    Ok(SelectorRecords {
                        selector: selector.clone(),
                        target,
                        records: self.records(&doc, selector.as_str())?,
                    })
                })
                .collect::<Result<Vec<_>, ProviderError>>()
                .map(LoadedRecords::Multi),
        }
    }
}
