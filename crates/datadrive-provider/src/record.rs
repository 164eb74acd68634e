use datadrive_common::{DataValue, Fragment};
use datadrive_resource::{BoundValue, TypeDescriptor};

use crate::error::ProviderError;

/// Raw content of a record, kept after the source file is closed.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordContent {
    /// Outer XML of a matched element.
    Xml(String),
    /// A header-keyed spreadsheet row; the cells are the record's fields.
    Row,
    Json(serde_json::Value),
}

/// One matched unit of content (element, row or JSON value) before it is
/// decoded into a bound type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    location: String,
    key: Option<String>,
    fields: Vec<(String, DataValue)>,
    content: RecordContent,
}

impl DataRecord {
    pub fn new(
        location: impl Into<String>,
        fields: Vec<(String, DataValue)>,
        content: RecordContent,
    ) -> Self {
        Self {
            location: location.into(),
            key: None,
            fields,
            content,
        }
    }

    pub(crate) fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    /// Human-readable origin, e.g. `Orders!A3` or `//order (match 2)`.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Flat scalar view: attributes and leaf children for XML, cells for
    /// rows, scalar members for JSON objects.
    pub fn fields(&self) -> &[(String, DataValue)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&DataValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn content(&self) -> &RecordContent {
        &self.content
    }

    pub fn fragment(&self) -> Fragment<'_> {
        match &self.content {
            RecordContent::Xml(xml) => Fragment::Xml(xml),
            RecordContent::Row => Fragment::Fields(&self.fields),
            RecordContent::Json(value) => Fragment::Json(value),
        }
    }

    /// Instantiate `target` from this record.
    pub fn decode(&self, target: &TypeDescriptor) -> Result<BoundValue, ProviderError> {
        target
            .decode(self.fragment())
            .map_err(|err| ProviderError::Decode {
                type_name: target.name(),
                location: self.location.clone(),
                message: err.to_string(),
            })
    }
}

/// Key from the configured field, if any, else from `fallback`.
pub(crate) fn resolve_key(
    record: &DataRecord,
    key_field: Option<&str>,
    fallback: impl FnOnce() -> Option<String>,
) -> Option<String> {
    match key_field {
        Some(field) => record.field(field).and_then(DataValue::to_key),
        None => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Account {
        id: u32,
    }

    #[test]
    fn decode_failure_names_type_and_location() {
        let record = DataRecord::new(
            "Accounts!A2",
            vec![("id".into(), DataValue::from("not a number"))],
            RecordContent::Row,
        );
        let err = record
            .decode(&TypeDescriptor::of::<Account>())
            .unwrap_err();
        match err {
            ProviderError::Decode {
                type_name,
                location,
                ..
            } => {
                assert!(type_name.ends_with("Account"));
                assert_eq!(location, "Accounts!A2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn key_prefers_configured_field() {
        let record = DataRecord::new(
            "x",
            vec![
                ("id".into(), DataValue::Int(7)),
                ("code".into(), DataValue::from(" K-1 ")),
            ],
            RecordContent::Row,
        );
        assert_eq!(
            resolve_key(&record, Some("code"), || None).as_deref(),
            Some("K-1")
        );
        assert_eq!(
            resolve_key(&record, None, || Some("7".into())).as_deref(),
            Some("7")
        );
        assert_eq!(resolve_key(&record, Some("missing"), || Some("7".into())), None);
    }
}
