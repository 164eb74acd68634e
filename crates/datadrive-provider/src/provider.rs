use std::collections::{BTreeMap, HashMap};

use datadrive_resource::{FileResource, ResourceKind, Selector, TypeDescriptor};

use crate::dataset::{DataRow, DataSet};
use crate::error::ProviderError;
use crate::filter::DataFilter;
use crate::index::parse_index_expression;
use crate::record::DataRecord;

/// Records matched by one selector of a multi-typed resource.
#[derive(Debug, Clone)]
pub struct SelectorRecords {
    pub selector: Selector,
    pub target: TypeDescriptor,
    pub records: Vec<DataRecord>,
}

/// Undecoded content of a resource, as read by a provider.
#[derive(Debug, Clone)]
pub enum LoadedRecords {
    Single {
        target: TypeDescriptor,
        records: Vec<DataRecord>,
    },
    /// One entry per binding, in selector order.
    Multi(Vec<SelectorRecords>),
}

/// Source of typed test data.
///
/// Implementors read their file in [`load`](Self::load); every query is
/// answered from a fresh load and nothing is cached between calls.
pub trait DataProvider {
    fn resource(&self) -> &FileResource;

    fn load(&self) -> Result<LoadedRecords, ProviderError>;

    /// Every row, in file order.
    fn all_data(&self) -> Result<DataSet, ProviderError> {
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        plan.decode_all(plan.rows.iter())
    }

    /// Rows selected by a 1-based index expression such as `"1, 3-5"`.
    fn data_by_index(&self, expression: &str) -> Result<DataSet, ProviderError> {
        let expression = parse_index_expression(expression)?;
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        let available = plan.rows.len();
        if let Some(index) = expression.first_beyond(available) {
            return Err(ProviderError::IndexOutOfRange { index, available });
        }
        plan.select(&expression.indexes())
    }

    /// Rows at the given 1-based positions, in the order requested.
    fn data_by_indexes(&self, indexes: &[usize]) -> Result<DataSet, ProviderError> {
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        plan.select(indexes)
    }

    /// Rows whose key matches, in the order of `keys`.
    fn data_by_keys(&self, keys: &[&str]) -> Result<DataSet, ProviderError> {
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        let mut by_key: HashMap<&str, &PlannedRow> = HashMap::new();
        for row in &plan.rows {
            if let Some(key) = row.key() {
                by_key.entry(key).or_insert(row);
            }
        }
        let mut selected = Vec::with_capacity(keys.len());
        for key in keys {
            let row = by_key.get(key).ok_or_else(|| ProviderError::KeyNotFound {
                key: key.to_string(),
            })?;
            selected.push(*row);
        }
        plan.decode_all(selected.into_iter())
    }

    /// Every keyed row by key. Rows without a key are left out; a repeated
    /// key keeps the last row carrying it.
    fn data_as_map(&self) -> Result<BTreeMap<String, DataRow>, ProviderError> {
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        let mut map = BTreeMap::new();
        for row in &plan.rows {
            match row.key() {
                Some(key) => {
                    map.insert(key.to_string(), row.decode(&plan)?);
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        location = row.primary().location(),
                        "skipping record without a key"
                    );
                }
            }
        }
        Ok(map)
    }

    /// Rows accepted by `filter`, in file order.
    fn data_by_filter(&self, filter: &dyn DataFilter) -> Result<DataSet, ProviderError> {
        let plan = RowPlan::build(self.resource(), self.load()?)?;
        plan.decode_all(
            plan.rows
                .iter()
                .filter(|row| filter.accept(row.index, row.primary())),
        )
    }
}

/// Undecoded rows: records grouped into argument tuples.
struct RowPlan {
    multi: bool,
    selectors: Vec<Selector>,
    rows: Vec<PlannedRow>,
}

struct PlannedRow {
    index: usize,
    parts: Vec<(TypeDescriptor, DataRecord)>,
}

impl PlannedRow {
    fn primary(&self) -> &DataRecord {
        &self.parts[0].1
    }

    fn key(&self) -> Option<&str> {
        self.parts.iter().find_map(|(_, record)| record.key())
    }

    fn decode(&self, plan: &RowPlan) -> Result<DataRow, ProviderError> {
        let values = self
            .parts
            .iter()
            .map(|(target, record)| record.decode(target))
            .collect::<Result<Vec<_>, _>>()?;
        let selectors = if plan.multi {
            plan.selectors.clone()
        } else {
            Vec::new()
        };
        Ok(DataRow::new(
            self.index,
            self.key().map(str::to_string),
            values,
            selectors,
        ))
    }
}

impl RowPlan {
    fn build(resource: &FileResource, loaded: LoadedRecords) -> Result<Self, ProviderError> {
        match loaded {
            LoadedRecords::Single { target, records } => Ok(Self {
                multi: false,
                selectors: Vec::new(),
                rows: records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| PlannedRow {
                        index: i + 1,
                        parts: vec![(target, record)],
                    })
                    .collect(),
            }),
            LoadedRecords::Multi(lists) => Self::zip(resource, lists),
        }
    }

    /// Row `i` takes the `i`-th match of every selector.
    fn zip(resource: &FileResource, lists: Vec<SelectorRecords>) -> Result<Self, ProviderError> {
        if lists.is_empty() {
            return Err(ProviderError::Untyped {
                path: resource.to_string(),
            });
        }
        if let Some(empty) = lists.iter().find(|l| l.records.is_empty()) {
            return Err(ProviderError::NoMatch {
                selector: empty.selector.to_string(),
                path: resource.to_string(),
            });
        }
        let len = lists[0].records.len();
        if lists.iter().any(|l| l.records.len() != len) {
            return Err(ProviderError::MismatchedBindingCounts {
                counts: lists
                    .iter()
                    .map(|l| (l.selector.to_string(), l.records.len()))
                    .collect(),
            });
        }

        let selectors: Vec<Selector> = lists.iter().map(|l| l.selector.clone()).collect();
        let mut columns: Vec<_> = lists
            .into_iter()
            .map(|l| (l.target, l.records.into_iter()))
            .collect();
        let rows = (1..=len)
            .map(|index| PlannedRow {
                index,
                parts: columns
                    .iter_mut()
                    .filter_map(|(target, records)| records.next().map(|r| (*target, r)))
                    .collect(),
            })
            .collect();

        Ok(Self {
            multi: true,
            selectors,
            rows,
        })
    }

    fn select(&self, indexes: &[usize]) -> Result<DataSet, ProviderError> {
        let available = self.rows.len();
        let mut selected = Vec::with_capacity(indexes.len());
        for &index in indexes {
            if index == 0 {
                return Err(ProviderError::InvalidIndex {
                    expression: index.to_string(),
                    message: "indexes start at 1".to_string(),
                });
            }
            let row = self
                .rows
                .get(index - 1)
                .ok_or(ProviderError::IndexOutOfRange { index, available })?;
            selected.push(row);
        }
        self.decode_all(selected.into_iter())
    }

    fn decode_all<'a>(
        &'a self,
        rows: impl Iterator<Item = &'a PlannedRow>,
    ) -> Result<DataSet, ProviderError> {
        let rows = rows
            .map(|row| row.decode(self))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DataSet::new(rows))
    }
}

/// Target of a single-typed resource, or its bindings in selector order.
pub(crate) enum Targets<'a> {
    Single(TypeDescriptor),
    Multi(Vec<(&'a Selector, TypeDescriptor)>),
}

pub(crate) fn targets(resource: &FileResource) -> Result<Targets<'_>, ProviderError> {
    match resource.kind() {
        ResourceKind::SingleType(target) => Ok(Targets::Single(*target)),
        ResourceKind::MultiType(bindings) => Ok(Targets::Multi(
            bindings.iter().map(|(s, t)| (s, *t)).collect(),
        )),
        ResourceKind::Untyped => Err(ProviderError::Untyped {
            path: resource.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::KeyFilter;
    use crate::record::RecordContent;
    use datadrive_common::DataValue;
    use datadrive_resource::TypedBindingMap;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Header {
        id: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Line {
        qty: u32,
    }

    /// In-memory provider over prepared records.
    struct Fixed {
        resource: FileResource,
        loaded: LoadedRecords,
    }

    impl DataProvider for Fixed {
        fn resource(&self) -> &FileResource {
            &self.resource
        }

        fn load(&self) -> Result<LoadedRecords, ProviderError> {
            Ok(self.loaded.clone())
        }
    }

    fn row(key: Option<&str>, field: &str, value: DataValue) -> DataRecord {
        DataRecord::new("mem", vec![(field.into(), value)], RecordContent::Row)
            .with_key(key.map(str::to_string))
    }

    fn headers() -> Fixed {
        let resource = FileResource::from_path("mem.csv", TypeDescriptor::of::<Header>()).unwrap();
        let records = ["a", "b", "c"]
            .into_iter()
            .map(|k| row(Some(k), "id", DataValue::from(k)))
            .chain(std::iter::once(row(None, "id", DataValue::from("z"))))
            .collect();
        Fixed {
            resource,
            loaded: LoadedRecords::Single {
                target: TypeDescriptor::of::<Header>(),
                records,
            },
        }
    }

    fn multi(header_count: usize, line_count: usize) -> Fixed {
        let bindings = TypedBindingMap::new()
            .bind::<Header>("h")
            .and_then(|m| m.bind::<Line>("l"))
            .unwrap();
        let resource = FileResource::from_path_with_bindings("mem.xml", bindings).unwrap();
        let headers = (0..header_count)
            .map(|i| row(Some(&format!("h{i}")), "id", DataValue::from(format!("h{i}"))))
            .collect();
        let lines = (0..line_count)
            .map(|i| row(None, "qty", DataValue::Int(i as i64)))
            .collect();
        Fixed {
            resource,
            loaded: LoadedRecords::Multi(vec![
                SelectorRecords {
                    selector: Selector::new("h").unwrap(),
                    target: TypeDescriptor::of::<Header>(),
                    records: headers,
                },
                SelectorRecords {
                    selector: Selector::new("l").unwrap(),
                    target: TypeDescriptor::of::<Line>(),
                    records: lines,
                },
            ]),
        }
    }

    fn ids(set: &DataSet) -> Vec<String> {
        set.iter()
            .map(|r| r.get::<Header>(0).unwrap().id.clone())
            .collect()
    }

    #[test]
    fn single_type_rows_have_one_argument() {
        let set = headers().all_data().unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.iter().all(|r| r.len() == 1 && r.selectors().is_empty()));
        assert_eq!(ids(&set), ["a", "b", "c", "z"]);
    }

    #[test]
    fn index_queries_keep_requested_order() {
        let provider = headers();
        assert_eq!(ids(&provider.data_by_index("3, 1").unwrap()), ["c", "a"]);
        assert_eq!(ids(&provider.data_by_index("2-3").unwrap()), ["b", "c"]);
        assert!(matches!(
            provider.data_by_index("5"),
            Err(ProviderError::IndexOutOfRange {
                index: 5,
                available: 4
            })
        ));
        assert!(matches!(
            provider.data_by_indexes(&[0]),
            Err(ProviderError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn wide_index_ranges_fail_fast() {
        let provider = headers();
        let started = std::time::Instant::now();
        assert!(matches!(
            provider.data_by_index(&format!("1-{}", usize::MAX)),
            Err(ProviderError::IndexOutOfRange {
                index: 5,
                available: 4
            })
        ));
        assert!(matches!(
            provider.data_by_index("2, 100000-200000"),
            Err(ProviderError::IndexOutOfRange {
                index: 100000,
                available: 4
            })
        ));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(ids(&provider.data_by_index("4, 1-4").unwrap()), ["z", "a", "b", "c"]);
    }

    #[test]
    fn key_queries() {
        let provider = headers();
        assert_eq!(ids(&provider.data_by_keys(&["c", "a"]).unwrap()), ["c", "a"]);
        assert!(matches!(
            provider.data_by_keys(&["a", "nope"]),
            Err(ProviderError::KeyNotFound { key }) if key == "nope"
        ));

        let map = provider.data_as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(map["b"].index(), 2);
    }

    #[test]
    fn filter_queries() {
        let provider = headers();
        let set = provider.data_by_filter(&KeyFilter::by_key(["b", "z"])).unwrap();
        assert_eq!(ids(&set), ["b"]);
        let set = provider
            .data_by_filter(&|index: usize, _: &DataRecord| index > 2)
            .unwrap();
        assert_eq!(ids(&set), ["c", "z"]);
    }

    #[test]
    fn multi_type_rows_zip_selector_matches() {
        let set = multi(2, 2).all_data().unwrap();
        assert_eq!(set.len(), 2);
        let second = &set.rows()[1];
        assert_eq!(second.len(), 2);
        assert_eq!(second.by_selector::<Header>("h").unwrap().id, "h1");
        assert_eq!(second.by_selector::<Line>("l"), Some(&Line { qty: 1 }));
        assert_eq!(second.key(), Some("h1"));
    }

    #[test]
    fn multi_type_count_mismatch_and_no_match() {
        match multi(2, 3).all_data() {
            Err(ProviderError::MismatchedBindingCounts { counts }) => {
                assert_eq!(counts, vec![("h".to_string(), 2), ("l".to_string(), 3)]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            multi(2, 0).all_data(),
            Err(ProviderError::NoMatch { selector, .. }) if selector == "l"
        ));
    }

    #[test]
    fn untyped_resources_are_rejected() {
        let resource = FileResource::path_builder("mem.xml").build().unwrap();
        assert!(matches!(
            targets(&resource),
            Err(ProviderError::Untyped { .. })
        ));
    }
}
