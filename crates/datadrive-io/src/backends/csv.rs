use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use datadrive_common::DataValue;

use crate::error::IoError;
use crate::traits::{BackendCaps, SheetData, SpreadsheetReader};

const BACKEND: &str = "csv";
const DEFAULT_SHEET: &str = "Sheet1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTrim {
    #[default]
    None,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTypeInference {
    /// Do not infer: treat all non-empty fields as text.
    Off,
    /// Infer booleans + numbers when unambiguous.
    #[default]
    Basic,
    /// Like `Basic`, plus ISO date/date-time parsing.
    BasicWithDates,
}

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    pub trim: CsvTrim,
    pub type_inference: CsvTypeInference,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: CsvTrim::None,
            type_inference: CsvTypeInference::Basic,
        }
    }
}

/// CSV backend adapter.
///
/// A CSV file is a single-sheet workbook whose sheet is named after the file
/// stem (`Sheet1` when read from bytes). UTF-8 only. Every record, the first
/// included, is loaded as a data row; header handling belongs to the caller.
pub struct CsvAdapter {
    sheet_name: String,
    cells: BTreeMap<(u32, u32), DataValue>,
    max_row: u32,
    max_col: u32,
    read_options: CsvReadOptions,
}

impl CsvAdapter {
    fn empty(sheet_name: String, read_options: CsvReadOptions) -> Self {
        Self {
            sheet_name,
            cells: BTreeMap::new(),
            max_row: 0,
            max_col: 0,
            read_options,
        }
    }

    pub fn read_options(&self) -> &CsvReadOptions {
        &self.read_options
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn open_path_with_options<P: AsRef<Path>>(
        path: P,
        read_options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        let path = path.as_ref();
        let sheet_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SHEET)
            .to_string();
        let file = File::open(path).map_err(|e| IoError::io(path, e))?;
        let mut adapter = Self::empty(sheet_name, read_options);
        adapter.load(BufReader::new(file))?;
        Ok(adapter)
    }

    pub fn open_bytes_with_options(
        bytes: Vec<u8>,
        read_options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        let mut adapter = Self::empty(DEFAULT_SHEET.to_string(), read_options);
        adapter.load(std::io::Cursor::new(bytes))?;
        Ok(adapter)
    }

    pub fn open_bytes(bytes: Vec<u8>) -> Result<Self, IoError> {
        Self::open_bytes_with_options(bytes, CsvReadOptions::default())
    }

    fn load<R: Read>(&mut self, reader: R) -> Result<(), IoError> {
        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(self.read_options.delimiter)
            .has_headers(false)
            // Ragged rows are allowed; missing cells read as empty.
            .flexible(true);
        match self.read_options.trim {
            CsvTrim::None => rb.trim(csv::Trim::None),
            CsvTrim::All => rb.trim(csv::Trim::All),
        };

        let mut rdr = rb.from_reader(reader);
        let mut row: u32 = 0;
        for rec in rdr.records() {
            let rec = rec?;
            row += 1;
            self.max_row = row;
            self.max_col = self.max_col.max(rec.len() as u32);
            for (ci, field) in rec.iter().enumerate() {
                if let Some(v) = infer_field(field, self.read_options.type_inference) {
                    self.cells.insert((row, ci as u32 + 1), v);
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = self.max_row, cols = self.max_col, "loaded CSV");
        Ok(())
    }

    fn bounds(&self) -> Option<(u32, u32)> {
        if self.max_row == 0 || self.max_col == 0 {
            None
        } else {
            Some((self.max_row, self.max_col))
        }
    }
}

impl SpreadsheetReader for CsvAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            multiple_sheets: false,
        }
    }

    fn sheet_names(&self) -> Result<Vec<String>, IoError> {
        Ok(vec![self.sheet_name.clone()])
    }

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError>
    where
        Self: Sized,
    {
        Self::open_path_with_options(path, CsvReadOptions::default())
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError> {
        if sheet != self.sheet_name {
            return Err(IoError::MissingSheet {
                sheet: sheet.to_string(),
            });
        }
        Ok(SheetData {
            cells: self.cells.clone(),
            dimensions: self.bounds(),
        })
    }

    fn sheet_bounds(&self, sheet: &str) -> Option<(u32, u32)> {
        if sheet == self.sheet_name {
            self.bounds()
        } else {
            None
        }
    }
}

fn infer_field(field: &str, mode: CsvTypeInference) -> Option<DataValue> {
    if field.is_empty() {
        return None;
    }
    if mode == CsvTypeInference::Off {
        return Some(DataValue::Text(field.to_string()));
    }

    if let Some(b) = parse_bool(field) {
        return Some(DataValue::Boolean(b));
    }
    if let Some(i) = parse_unambiguous_i64(field) {
        return Some(DataValue::Int(i));
    }
    if let Some(n) = parse_unambiguous_f64(field) {
        return Some(DataValue::Number(n));
    }
    if mode == CsvTypeInference::BasicWithDates {
        if let Some(d) = parse_date(field) {
            return Some(DataValue::Date(d));
        }
        if let Some(dt) = parse_datetime(field) {
            return Some(DataValue::DateTime(dt));
        }
    }
    Some(DataValue::Text(field.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_unambiguous_i64(s: &str) -> Option<i64> {
    // Leading zeros mark identifiers ("007"), not numbers
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

fn parse_unambiguous_f64(s: &str) -> Option<f64> {
    if !(s.contains('.') || s.contains('e') || s.contains('E')) {
        return None;
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.") {
        return None;
    }
    let n: f64 = s.parse().ok()?;
    n.is_finite().then_some(n)
}

fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
