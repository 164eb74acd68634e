//! A1-style addressing for spreadsheet selectors.
//!
//! All coordinates here are Excel 1-based: `A1` is row 1, column 1.

use std::fmt;

use thiserror::Error;

/// Errors raised while parsing sheet locators and A1 references.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum A1ParseError {
    #[error("empty sheet locator")]
    Empty,
    #[error("`{0}` is not a valid A1 cell reference")]
    InvalidReference(String),
    #[error("row and column indices must be 1-based (>= 1) in `{0}`")]
    ZeroIndex(String),
    #[error("unterminated quoted sheet name in `{0}`")]
    UnterminatedQuote(String),
    #[error("range `{0}` must be ordered so the start is above/left of the end")]
    RangeOrder(String),
}

/// Convert a 1-based column index into letters (`1` → `A`, `28` → `AB`).
pub fn col_to_letters(col: u32) -> String {
    let mut col = col.saturating_sub(1);
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(char::from(b'A' + rem));
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.iter().rev().collect()
}

/// Convert column letters into a 1-based index. Lowercase is accepted.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        let ch = ch.to_ascii_uppercase();
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?;
        col = col.checked_add((ch - b'A') as u32 + 1)?;
    }
    Some(col)
}

/// Absolute cell position, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse `B3`, `$B$3` or `b3`.
    pub fn parse(reference: &str) -> Result<Self, A1ParseError> {
        let cleaned: String = reference.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| A1ParseError::InvalidReference(reference.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);
        let col = letters_to_col(letters)
            .ok_or_else(|| A1ParseError::InvalidReference(reference.to_string()))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| A1ParseError::InvalidReference(reference.to_string()))?;
        if row == 0 {
            return Err(A1ParseError::ZeroIndex(reference.to_string()));
        }
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}

/// A sheet, optionally narrowed to an inclusive rectangular area.
///
/// Accepted forms: `Orders`, `Orders!A1:D20`, `Orders!B2` and quoted names
/// such as `'Q1 Orders'!A1:C5` (a doubled quote escapes a quote).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRange {
    pub sheet: String,
    pub area: Option<(CellAddress, CellAddress)>,
}

impl SheetRange {
    pub fn whole_sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            area: None,
        }
    }

    pub fn parse(locator: &str) -> Result<Self, A1ParseError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(A1ParseError::Empty);
        }

        let (sheet, rest) = if let Some(quoted) = locator.strip_prefix('\'') {
            let mut name = String::new();
            let mut chars = quoted.char_indices().peekable();
            let mut end = None;
            while let Some((idx, ch)) = chars.next() {
                if ch == '\'' {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        name.push('\'');
                        chars.next();
                    } else {
                        end = Some(idx + 1);
                        break;
                    }
                } else {
                    name.push(ch);
                }
            }
            let end = end.ok_or_else(|| A1ParseError::UnterminatedQuote(locator.to_string()))?;
            let rest = &quoted[end..];
            let rest = if rest.is_empty() {
                None
            } else {
                Some(
                    rest.strip_prefix('!')
                        .ok_or_else(|| A1ParseError::InvalidReference(locator.to_string()))?,
                )
            };
            (name, rest)
        } else {
            match locator.rfind('!') {
                Some(bang) => (
                    locator[..bang].to_string(),
                    Some(&locator[bang + 1..]),
                ),
                None => (locator.to_string(), None),
            }
        };

        if sheet.trim().is_empty() {
            return Err(A1ParseError::Empty);
        }

        let area = match rest {
            None => None,
            Some(range) => {
                let (start, end) = match range.split_once(':') {
                    Some((start, end)) => (CellAddress::parse(start)?, CellAddress::parse(end)?),
                    None => {
                        let cell = CellAddress::parse(range)?;
                        (cell, cell)
                    }
                };
                if start.row > end.row || start.col > end.col {
                    return Err(A1ParseError::RangeOrder(locator.to_string()));
                }
                Some((start, end))
            }
        };

        Ok(Self { sheet, area })
    }

    /// Whether a 1-based position lies inside the area (always true for a
    /// whole-sheet locator).
    pub fn contains(&self, row: u32, col: u32) -> bool {
        match self.area {
            None => true,
            Some((start, end)) => {
                row >= start.row && row <= end.row && col >= start.col && col <= end.col
            }
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let needs_quotes = self
            .sheet
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_'));
        if needs_quotes {
            write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        } else {
            write!(f, "{}", self.sheet)?;
        }
        if let Some((start, end)) = self.area {
            if start == end {
                write!(f, "!{start}")?;
            } else {
                write!(f, "!{start}:{end}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letter_roundtrip() {
        assert_eq!(col_to_letters(1), "A");
        assert_eq!(col_to_letters(26), "Z");
        assert_eq!(col_to_letters(28), "AB");
        assert_eq!(letters_to_col("AB"), Some(28));
        assert_eq!(letters_to_col("ab"), Some(28));
        assert_eq!(letters_to_col("A1"), None);
        assert_eq!(letters_to_col(""), None);
    }

    #[test]
    fn parses_cell_references() {
        assert_eq!(CellAddress::parse("$C$7").unwrap(), CellAddress::new(7, 3));
        assert_eq!(CellAddress::parse("aa10").unwrap(), CellAddress::new(10, 27));
        assert!(matches!(
            CellAddress::parse("B0"),
            Err(A1ParseError::ZeroIndex(_))
        ));
        assert!(CellAddress::parse("12").is_err());
    }

    #[test]
    fn parses_sheet_locators() {
        assert_eq!(
            SheetRange::parse("Orders").unwrap(),
            SheetRange::whole_sheet("Orders")
        );

        let ranged = SheetRange::parse("Orders!A1:C4").unwrap();
        assert_eq!(ranged.sheet, "Orders");
        assert_eq!(
            ranged.area,
            Some((CellAddress::new(1, 1), CellAddress::new(4, 3)))
        );
        assert!(ranged.contains(2, 2));
        assert!(!ranged.contains(5, 1));

        let quoted = SheetRange::parse("'Bob''s Orders'!B2").unwrap();
        assert_eq!(quoted.sheet, "Bob's Orders");
        assert_eq!(quoted.to_string(), "'Bob''s Orders'!B2");
    }

    #[test]
    fn rejects_malformed_locators() {
        assert_eq!(SheetRange::parse("  "), Err(A1ParseError::Empty));
        assert!(matches!(
            SheetRange::parse("'Orders!A1"),
            Err(A1ParseError::UnterminatedQuote(_))
        ));
        assert!(matches!(
            SheetRange::parse("Orders!C4:A1"),
            Err(A1ParseError::RangeOrder(_))
        ));
        assert!(SheetRange::parse("!A1").is_err());
    }
}
