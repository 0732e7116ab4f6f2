//! Streaming access to the uploaded workbook.
//!
//! The payload stays a byte buffer; only sheets the pipeline asks for are
//! decoded, and decoded rows are handed to a visitor one at a time. Memory
//! is bounded by one decoded sheet plus the aggregation state, never the
//! whole workbook as parsed objects.

use crate::error::EngineError;
use crate::model::CellValue;
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

/// Campaign export sheet carrying targeting, keyword, and placement rows.
pub const CAMPAIGNS_SHEET: &str = "Sponsored Products Campaigns";
/// Search-term report sheet feeding negative-term detection.
pub const SEARCH_TERMS_SHEET: &str = "SP Search Term Report";

pub struct WorkbookReader {
    workbook: Xlsx<Cursor<Vec<u8>>>,
    sheet_names: Vec<String>,
}

impl WorkbookReader {
    pub fn from_bytes(payload: Vec<u8>) -> Result<Self, EngineError> {
        if payload.is_empty() {
            return Err(EngineError::NoFile);
        }
        let workbook = Xlsx::new(Cursor::new(payload))
            .map_err(|e| EngineError::Workbook(e.to_string()))?;
        let sheet_names = workbook.sheet_names().to_vec();
        Ok(Self {
            workbook,
            sheet_names,
        })
    }

    /// Resolves a wanted title to the workbook's actual sheet name, matching
    /// on whitespace-trimmed equality. Unrecognized sheets are simply never
    /// resolved, not errors.
    pub fn resolve_sheet(&self, title: &str) -> Option<&str> {
        self.sheet_names
            .iter()
            .find(|name| name.trim() == title)
            .map(String::as_str)
    }

    pub fn has_sheet(&self, title: &str) -> bool {
        self.resolve_sheet(title).is_some()
    }

    /// Streams the named sheet's rows through `visit` in order, converting
    /// cells as they pass. Returns the number of rows visited (header row
    /// included). `MissingSheet` when the title does not resolve.
    pub fn stream_rows<F>(&mut self, title: &str, mut visit: F) -> Result<u64, EngineError>
    where
        F: FnMut(&[CellValue]),
    {
        let name = self
            .resolve_sheet(title)
            .ok_or_else(|| EngineError::missing_sheet(title))?
            .to_string();
        let range = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| EngineError::Workbook(e.to_string()))?;

        let mut visited = 0u64;
        let mut buffer: Vec<CellValue> = Vec::new();
        for row in range.rows() {
            buffer.clear();
            buffer.extend(row.iter().map(convert_cell));
            visit(&buffer);
            visited += 1;
        }
        Ok(visited)
    }
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Serial date numbers pass through as numbers; ISO strings as text.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // Cell-level errors carry no usable signal; downstream coercion
        // treats them like blanks.
        Data::Error(_) => CellValue::Empty,
    }
}
