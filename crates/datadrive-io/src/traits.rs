use std::collections::BTreeMap;
use std::path::Path;

use datadrive_common::DataValue;

use crate::error::IoError;

#[derive(Clone, Debug, Default)]
pub struct BackendCaps {
    /// More than one sheet per file. Single-sheet backends let callers omit
    /// the sheet name.
    pub multiple_sheets: bool,
}

static EMPTY: DataValue = DataValue::Empty;

/// Every non-empty cell of one sheet, keyed by 1-based `(row, col)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetData {
    pub cells: BTreeMap<(u32, u32), DataValue>,
    /// Last used `(row, col)`, or `None` for an empty sheet.
    pub dimensions: Option<(u32, u32)>,
}

impl SheetData {
    pub fn get(&self, row: u32, col: u32) -> Option<&DataValue> {
        self.cells.get(&(row, col))
    }

    /// Cell value, [`DataValue::Empty`] for blank cells.
    pub fn value(&self, row: u32, col: u32) -> &DataValue {
        self.get(row, col).unwrap_or(&EMPTY)
    }

    pub fn row_is_blank(&self, row: u32, first_col: u32, last_col: u32) -> bool {
        (first_col..=last_col).all(|col| self.value(row, col).is_empty())
    }
}

pub trait SpreadsheetReader: Send + Sync {
    /// Short backend name for errors and logs.
    fn backend_name(&self) -> &'static str;
    fn capabilities(&self) -> BackendCaps;
    fn sheet_names(&self) -> Result<Vec<String>, IoError>;

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError>
    where
        Self: Sized;

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError>;

    /// Cells inside the inclusive rectangle `start..=end`.
    fn read_range(
        &mut self,
        sheet: &str,
        start: (u32, u32),
        end: (u32, u32),
    ) -> Result<BTreeMap<(u32, u32), DataValue>, IoError> {
        // Default: whole-sheet read, then filter
        let data = self.read_sheet(sheet)?;
        Ok(data
            .cells
            .into_iter()
            .filter(|((r, c), _)| *r >= start.0 && *r <= end.0 && *c >= start.1 && *c <= end.1)
            .collect())
    }

    fn sheet_bounds(&self, sheet: &str) -> Option<(u32, u32)>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names()
            .map(|names| names.iter().any(|n| n == sheet))
            .unwrap_or(false)
    }
}
