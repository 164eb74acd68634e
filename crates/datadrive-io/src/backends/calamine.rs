#![cfg(feature = "calamine")]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use datadrive_common::DataValue;
use parking_lot::RwLock;

use crate::error::IoError;
use crate::traits::{BackendCaps, SheetData, SpreadsheetReader};

const BACKEND: &str = "calamine";

/// Workbook reader for xls, xlsx, xlsm, xlsb and ods files.
pub struct CalamineAdapter {
    workbook: RwLock<Sheets<BufReader<File>>>,
    path: PathBuf,
    sheet_names: Vec<String>,
}

impl CalamineAdapter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn convert_value(data: &Data) -> DataValue {
        match data {
            Data::Empty => DataValue::Empty,
            Data::String(s) => DataValue::Text(s.clone()),
            Data::Float(f) => DataValue::Number(*f),
            Data::Int(i) => DataValue::Int(*i),
            Data::Bool(b) => DataValue::Boolean(*b),
            Data::Error(e) => DataValue::Text(e.to_string()),
            Data::DateTime(dt) if dt.is_duration() => DataValue::Number(dt.as_f64()),
            Data::DateTime(dt) => DataValue::from_serial_number(dt.as_f64()),
            Data::DateTimeIso(s) => parse_iso(s),
            Data::DurationIso(s) => DataValue::Text(s.clone()),
        }
    }

    fn range_to_cells(range: &Range<Data>) -> BTreeMap<(u32, u32), DataValue> {
        let (start_row, start_col) = range.start().unwrap_or_default();

        range
            .used_cells()
            .filter_map(|(row, col, val)| {
                // Calamine is 0-based and relative to the range start
                let excel_row = row as u32 + start_row + 1;
                let excel_col = col as u32 + start_col + 1;
                let value = match val {
                    Data::Empty => return None,
                    Data::String(s) if s.is_empty() => return None,
                    _ => Self::convert_value(val),
                };
                Some(((excel_row, excel_col), value))
            })
            .collect()
    }

    fn require_sheet(&self, sheet: &str) -> Result<(), IoError> {
        if self.sheet_names.iter().any(|n| n == sheet) {
            Ok(())
        } else {
            Err(IoError::MissingSheet {
                sheet: sheet.to_string(),
            })
        }
    }
}

fn parse_iso(s: &str) -> DataValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        DataValue::DateTime(dt)
    } else if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        DataValue::Date(d)
    } else {
        DataValue::Text(s.to_string())
    }
}

impl SpreadsheetReader for CalamineAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            multiple_sheets: true,
        }
    }

    fn sheet_names(&self) -> Result<Vec<String>, IoError> {
        Ok(self.sheet_names.clone())
    }

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IoError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        }
        let workbook =
            open_workbook_auto(path).map_err(|e| IoError::from_backend(BACKEND, e))?;
        let sheet_names = workbook.sheet_names();
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), sheets = sheet_names.len(), "opened workbook");
        Ok(Self {
            workbook: RwLock::new(workbook),
            path: path.to_path_buf(),
            sheet_names,
        })
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError> {
        self.require_sheet(sheet)?;
        let range = self
            .workbook
            .write()
            .worksheet_range(sheet)
            .map_err(|e| IoError::from_backend(BACKEND, e))?;

        let cells = Self::range_to_cells(&range);
        let dimensions = range.end().map(|(r, c)| (r + 1, c + 1));
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet, cells = cells.len(), "read sheet");

        Ok(SheetData { cells, dimensions })
    }

    fn sheet_bounds(&self, sheet: &str) -> Option<(u32, u32)> {
        self.require_sheet(sheet).ok()?;
        let mut wb = self.workbook.write();
        wb.worksheet_range(sheet)
            .ok()
            .and_then(|r| r.end())
            .map(|(r, c)| (r + 1, c + 1))
    }
}
