use std::collections::BTreeSet;

use datadrive_common::DataValue;

use crate::error::ProviderError;
use crate::index::{IndexExpression, parse_index_expression};
use crate::record::DataRecord;

/// Decides which records reach the test runner.
///
/// `index` is the 1-based position of the record in the file; for rows built
/// from several selectors the record is the one matched by the first
/// selector.
pub trait DataFilter {
    fn accept(&self, index: usize, record: &DataRecord) -> bool;
}

impl<F> DataFilter for F
where
    F: Fn(usize, &DataRecord) -> bool,
{
    fn accept(&self, index: usize, record: &DataRecord) -> bool {
        self(index, record)
    }
}

/// Accepts records whose position appears in an index expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInclusionFilter {
    indexes: IndexExpression,
}

impl IndexInclusionFilter {
    pub fn new(expression: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            indexes: parse_index_expression(expression)?,
        })
    }

    pub fn from_indexes(indexes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indexes: IndexExpression::from_indexes(indexes),
        }
    }
}

impl DataFilter for IndexInclusionFilter {
    fn accept(&self, index: usize, _record: &DataRecord) -> bool {
        self.indexes.contains(index)
    }
}

/// Accepts records whose key (or a named field) is one of a set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    field: Option<String>,
    values: BTreeSet<String>,
}

impl KeyFilter {
    /// Match on the record key.
    pub fn by_key<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Match on the text form of `field`.
    pub fn by_field<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: Some(field.into()),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl DataFilter for KeyFilter {
    fn accept(&self, _index: usize, record: &DataRecord) -> bool {
        let candidate = match &self.field {
            Some(field) => record.field(field).and_then(DataValue::to_key),
            None => record.key().map(str::to_string),
        };
        candidate.is_some_and(|value| self.values.contains(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordContent;

    fn record(key: &str, status: &str) -> DataRecord {
        DataRecord::new(
            "test",
            vec![("status".into(), DataValue::from(status))],
            RecordContent::Row,
        )
        .with_key(Some(key.into()))
    }

    #[test]
    fn index_filter_uses_positions() {
        let filter = IndexInclusionFilter::new("1, 3-4").unwrap();
        assert!(filter.accept(1, &record("a", "x")));
        assert!(!filter.accept(2, &record("a", "x")));
        assert!(filter.accept(4, &record("a", "x")));
        assert!(IndexInclusionFilter::new("0").is_err());

        let wide = IndexInclusionFilter::new(&format!("5-{}", usize::MAX)).unwrap();
        assert!(wide.accept(usize::MAX, &record("a", "x")));
        assert!(!wide.accept(4, &record("a", "x")));
    }

    #[test]
    fn key_filter_by_key_and_field() {
        let keys = KeyFilter::by_key(["a", "c"]);
        assert!(keys.accept(1, &record("a", "open")));
        assert!(!keys.accept(1, &record("b", "open")));

        let status = KeyFilter::by_field("status", ["open"]);
        assert!(status.accept(1, &record("b", "open")));
        assert!(!status.accept(1, &record("b", "closed")));
    }

    #[test]
    fn closures_are_filters() {
        let even = |index: usize, _: &DataRecord| index % 2 == 0;
        assert!(even.accept(2, &record("a", "x")));
        assert!(!even.accept(3, &record("a", "x")));
    }
}
