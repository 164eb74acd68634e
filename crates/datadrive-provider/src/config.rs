use serde::{Deserialize, Serialize};

/// Per-resource reading options.
///
/// Every field has a default, so a manifest entry may omit `config` entirely
/// or set only the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Field whose value keys a record (attribute or child element for XML,
    /// header name for spreadsheets, member name for JSON).
    pub key_field: Option<String>,
    /// 1-based row holding column headers when a whole sheet is read.
    pub header_row: u32,
    /// End a table at its first blank row instead of skipping blank rows.
    pub stop_at_blank_row: bool,
    /// XPath selecting the records of a single-typed XML resource.
    pub record_selector: Option<String>,
    /// Sheet holding the records of a single-typed spreadsheet resource.
    pub sheet: Option<String>,
    /// CSV field delimiter.
    pub delimiter: char,
    /// Trim surrounding whitespace from CSV fields.
    pub trim: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            key_field: None,
            header_row: 1,
            stop_at_blank_row: true,
            record_selector: None,
            sheet: None,
            delimiter: ',',
            trim: false,
        }
    }
}

impl ProviderConfig {
    pub const DEFAULT_RECORD_SELECTOR: &'static str = "/*/*";

    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = Some(field.into());
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_record_selector(mut self, selector: impl Into<String>) -> Self {
        self.record_selector = Some(selector.into());
        self
    }

    pub fn with_header_row(mut self, row: u32) -> Self {
        self.header_row = row;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn record_selector(&self) -> &str {
        self.record_selector
            .as_deref()
            .unwrap_or(Self::DEFAULT_RECORD_SELECTOR)
    }
}
