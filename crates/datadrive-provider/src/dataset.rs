use std::any::Any;

use datadrive_resource::{BoundValue, Selector};

use crate::error::ProviderError;

/// The argument tuple of one test invocation.
#[derive(Debug)]
pub struct DataRow {
    index: usize,
    key: Option<String>,
    values: Vec<BoundValue>,
    selectors: Vec<Selector>,
}

impl DataRow {
    pub(crate) fn new(
        index: usize,
        key: Option<String>,
        values: Vec<BoundValue>,
        selectors: Vec<Selector>,
    ) -> Self {
        Self {
            index,
            key,
            values,
            selectors,
        }
    }

    /// 1-based position of the row in the full data set.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<BoundValue> {
        self.values
    }

    /// Selectors that produced each argument; empty for single-typed rows.
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Argument `position` as `T`, or `None` when absent or of another type.
    pub fn get<T: Any>(&self, position: usize) -> Option<&T> {
        self.values.get(position)?.downcast_ref()
    }

    /// The argument bound to `selector`.
    pub fn by_selector<T: Any>(&self, selector: &str) -> Option<&T> {
        let position = self.selectors.iter().position(|s| s.as_str() == selector)?;
        self.get(position)
    }
}

/// Rows produced by a provider query, in file order unless the query asked
/// for a specific order.
#[derive(Debug, Default)]
pub struct DataSet {
    rows: Vec<DataRow>,
}

impl DataSet {
    pub(crate) fn new(rows: Vec<DataRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataRow> {
        self.rows.iter()
    }

    /// One argument list per test invocation, ready to hand to a runner.
    pub fn into_arguments(self) -> Vec<Vec<BoundValue>> {
        self.rows.into_iter().map(DataRow::into_values).collect()
    }

    /// Unwrap a single-typed data set into its values.
    pub fn into_typed<T: Any>(self) -> Result<Vec<T>, ProviderError> {
        let expected = std::any::type_name::<T>();
        self.rows
            .into_iter()
            .map(|row| {
                let index = row.index;
                let mut values = row.values.into_iter();
                let (Some(value), None) = (values.next(), values.next()) else {
                    return Err(ProviderError::UnexpectedType {
                        row: index,
                        expected,
                        found: "a multi-value row",
                    });
                };
                value
                    .downcast::<T>()
                    .map_err(|value| ProviderError::UnexpectedType {
                        row: index,
                        expected,
                        found: value.type_name(),
                    })
            })
            .collect()
    }
}

impl IntoIterator for DataSet {
    type Item = DataRow;
    type IntoIter = std::vec::IntoIter<DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataRow;
    type IntoIter = std::slice::Iter<'a, DataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
