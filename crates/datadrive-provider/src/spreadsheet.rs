use std::marker::PhantomData;
use std::path::Path;

use datadrive_common::{CellAddress, DataValue, SheetRange};
use datadrive_io::{IoError, SheetData, SpreadsheetReader};
use datadrive_resource::{FileResource, TypeDescriptor};

use crate::config::ProviderConfig;
use crate::dataset::DataRow;
use crate::error::ProviderError;
use crate::provider::{DataProvider, LoadedRecords, SelectorRecords, Targets, targets};
use crate::record::{DataRecord, RecordContent, resolve_key};

/// A spreadsheet backend that can be opened with provider options.
pub trait ConfiguredReader: SpreadsheetReader + Sized {
    fn open_configured(path: &Path, config: &ProviderConfig) -> Result<Self, IoError>;
}

#[cfg(feature = "calamine")]
impl ConfiguredReader for datadrive_io::CalamineAdapter {
    fn open_configured(path: &Path, _config: &ProviderConfig) -> Result<Self, IoError> {
        Self::open_path(path)
    }
}

#[cfg(feature = "csv")]
impl ConfiguredReader for datadrive_io::CsvAdapter {
    fn open_configured(path: &Path, config: &ProviderConfig) -> Result<Self, IoError> {
        if !config.delimiter.is_ascii() {
            return Err(IoError::from_backend(
                "csv",
                format!("delimiter `{}` is not a single byte", config.delimiter),
            ));
        }
        let options = datadrive_io::CsvReadOptions {
            delimiter: config.delimiter as u8,
            trim: if config.trim {
                datadrive_io::CsvTrim::All
            } else {
                datadrive_io::CsvTrim::None
            },
            ..Default::default()
        };
        Self::open_path_with_options(path, options)
    }
}

/// Provider for header-keyed tables in spreadsheets.
///
/// Each data row under the header row becomes a record whose fields are the
/// header names. Selectors of multi-typed resources are sheet locators such
/// as `Orders` or `Orders!B2:E40`; a locator with an area takes its first row
/// as the header row.
pub struct SpreadsheetDataProvider<R> {
    resource: FileResource,
    config: ProviderConfig,
    _reader: PhantomData<fn() -> R>,
}

#[cfg(feature = "calamine")]
pub type ExcelDataProvider = SpreadsheetDataProvider<datadrive_io::CalamineAdapter>;

#[cfg(feature = "csv")]
pub type CsvDataProvider = SpreadsheetDataProvider<datadrive_io::CsvAdapter>;

impl<R: ConfiguredReader> SpreadsheetDataProvider<R> {
    pub fn new(resource: FileResource) -> Self {
        Self::with_config(resource, ProviderConfig::default())
    }

    pub fn with_config(resource: FileResource, config: ProviderConfig) -> Self {
        Self {
            resource,
            config,
            _reader: PhantomData,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The row keyed `key`.
    pub fn single_row(&self, key: &str) -> Result<DataRow, ProviderError> {
        self.data_by_keys(&[key])?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::KeyNotFound {
                key: key.to_string(),
            })
    }

    fn default_sheet(&self, reader: &R, target: &TypeDescriptor) -> Result<String, IoError> {
        if let Some(sheet) = &self.config.sheet {
            return Ok(sheet.clone());
        }
        if !reader.capabilities().multiple_sheets {
            if let Some(only) = reader.sheet_names()?.into_iter().next() {
                return Ok(only);
            }
        }
        Ok(target.short_name())
    }

    fn records(&self, reader: &mut R, range: &SheetRange) -> Result<Vec<DataRecord>, ProviderError> {
        let data = reader.read_sheet(&range.sheet)?;
        let Some(table) = self.table_bounds(&data, range) else {
            return Ok(Vec::new());
        };

        let headers: Vec<(u32, String)> = (table.first_col..=table.last_col)
            .map_while(|col| data.value(table.header_row, col).to_key().map(|h| (col, h)))
            .collect();
        let Some(&(last_header_col, _)) = headers.last() else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for row in table.header_row + 1..=table.last_row {
            if data.row_is_blank(row, table.first_col, last_header_col) {
                if self.config.stop_at_blank_row {
                    break;
                }
                continue;
            }
            let fields: Vec<(String, DataValue)> = headers
                .iter()
                .map(|(col, name)| (name.clone(), data.value(row, *col).clone()))
                .collect();
            let first = CellAddress::new(row, table.first_col);
            let location = SheetRange {
                sheet: range.sheet.clone(),
                area: Some((first, first)),
            }
            .to_string();
            let record = DataRecord::new(location, fields, RecordContent::Row);
            let key = resolve_key(&record, self.config.key_field.as_deref(), || {
                record.fields().first().and_then(|(_, v)| v.to_key())
            });
            records.push(record.with_key(key));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(range = %range, rows = records.len(), "read spreadsheet table");
        Ok(records)
    }

    fn table_bounds(&self, data: &SheetData, range: &SheetRange) -> Option<TableBounds> {
        match range.area {
            Some((start, end)) => Some(TableBounds {
                header_row: start.row,
                first_col: start.col,
                last_row: end.row,
                last_col: end.col,
            }),
            None => {
                let (last_row, last_col) = data.dimensions?;
                Some(TableBounds {
                    header_row: self.config.header_row,
                    first_col: 1,
                    last_row,
                    last_col,
                })
            }
        }
    }
}

struct TableBounds {
    header_row: u32,
    first_col: u32,
    last_row: u32,
    last_col: u32,
}

impl<R: ConfiguredReader> DataProvider for SpreadsheetDataProvider<R> {
    fn resource(&self) -> &FileResource {
        &self.resource
    }

    fn load(&self) -> Result<LoadedRecords, ProviderError> {
        let targets = targets(&self.resource)?;
        let mut reader = R::open_configured(self.resource.path(), &self.config)?;
        match targets {
            Targets::Single(target) => {
                let sheet = self.default_sheet(&reader, &target)?;
                let records = self.records(&mut reader, &SheetRange::whole_sheet(sheet))?;
                Ok(LoadedRecords::Single { target, records })
            }
            Targets::Multi(bindings) => {
                let mut lists = Vec::with_capacity(bindings.len());
                for (selector, target) in bindings {
                    let range = SheetRange::parse(selector.as_str()).map_err(|e| {
                        ProviderError::InvalidSelector {
                            selector: selector.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    lists.push(SelectorRecords {
                        selector: selector.clone(),
                        target,
                        records: self.records(&mut reader, &range)?,
                    });
                }
                Ok(LoadedRecords::Multi(lists))
            }
        }
    }
}
