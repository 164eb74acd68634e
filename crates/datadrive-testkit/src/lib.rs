//! Fixture helpers for datadrive tests.
//!
//! Fixtures live in a private temporary directory that is removed when the
//! returned [`TempFixture`] is dropped, so keep it alive for the whole test.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// A file inside a temporary directory.
#[derive(Debug)]
pub struct TempFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl TempFixture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the fixture, for directory + file-name resources.
    pub fn dir(&self) -> &Path {
        self._dir.path()
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("fixture names are UTF-8")
    }
}

impl AsRef<Path> for TempFixture {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Deref for TempFixture {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

/// Write `contents` to `name` in a fresh temporary directory.
pub fn write_fixture(name: &str, contents: impl AsRef<[u8]>) -> TempFixture {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    TempFixture { _dir: dir, path }
}

/// Build an xlsx workbook with umya and save it as `fixture.xlsx`.
///
/// The closure receives a new workbook that already contains `Sheet1`.
pub fn build_workbook(f: impl FnOnce(&mut Spreadsheet)) -> TempFixture {
    build_named_workbook("fixture.xlsx", f)
}

pub fn build_named_workbook(name: &str, f: impl FnOnce(&mut Spreadsheet)) -> TempFixture {
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write xlsx");
    TempFixture { _dir: dir, path }
}

/// A cell value for [`fill_sheet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(&'static str),
    Number(f64),
    Bool(bool),
}

impl From<&'static str> for Cell {
    fn from(value: &'static str) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value.into())
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// Return the named sheet, creating it when missing.
pub fn sheet_mut<'a>(book: &'a mut Spreadsheet, name: &str) -> &'a mut Worksheet {
    if book.get_sheet_by_name(name).is_none() {
        book.new_sheet(name).expect("add sheet");
    }
    book.get_sheet_by_name_mut(name).expect("sheet exists")
}

/// Write `rows` into `sheet` starting at `A1`.
pub fn fill_sheet(book: &mut Spreadsheet, sheet: &str, rows: &[Vec<Cell>]) {
    fill_sheet_at(book, sheet, (1, 1), rows);
}

/// Write `rows` with the top-left value at 1-based `(row, col)`.
pub fn fill_sheet_at(book: &mut Spreadsheet, sheet: &str, origin: (u32, u32), rows: &[Vec<Cell>]) {
    let sh = sheet_mut(book, sheet);
    for (ri, row) in rows.iter().enumerate() {
        for (ci, cell) in row.iter().enumerate() {
            // umya addresses cells as (col, row)
            let at = (origin.1 + ci as u32, origin.0 + ri as u32);
            match cell {
                Cell::Blank => {}
                Cell::Text(s) => {
                    sh.get_cell_mut(at).set_value(*s);
                }
                Cell::Number(n) => {
                    sh.get_cell_mut(at).set_value_number(*n);
                }
                Cell::Bool(b) => {
                    sh.get_cell_mut(at).set_value_bool(*b);
                }
            }
        }
    }
}

/// `vec![Cell, ...]` from heterogeneous literals.
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$($crate::Cell::from($cell)),*]
    };
}
