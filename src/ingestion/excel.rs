#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType as _, Range, Reader, Sheets};
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FileType, ParsedData, Record, Value};

use super::normalize::{finish, positional_headers, unique_headers};
use super::unified::{ExcelOptions, SheetSelection};

/// Ingest one sheet of an Excel workbook (`.xlsx` or legacy `.xls`) held in memory.
///
/// Behavior:
/// - Picks the sheet named by [`ExcelOptions::sheet`] (first sheet by default)
/// - Detects the first non-empty row as the header row
/// - Skips fully blank rows after the header
/// - Every record carries every header; blank cells are [`Value::Null`]
pub fn parse_excel(bytes: &[u8], file_name: &str, options: &ExcelOptions) -> IngestionResult<ParsedData> {
    parse_excel_as(bytes, file_name, excel_file_type(file_name), options)
}

/// [`parse_excel`] with the file type already resolved (for example a forced format).
pub fn parse_excel_as(
    bytes: &[u8],
    file_name: &str,
    file_type: FileType,
    options: &ExcelOptions,
) -> IngestionResult<ParsedData> {
    let mut workbook = open(bytes, file_type)?;

    let range = select_sheet(&mut workbook, &options.sheet, file_type)?;
    let mut rows_iter = range.rows().skip_while(|row| is_blank_row(row));

    let first = rows_iter
        .next()
        .ok_or_else(|| IngestionError::parse(file_type, "No data found in the Excel file"))?;

    let (headers, leading): (Vec<String>, Option<&[Data]>) = if options.has_headers {
        (unique_headers(first.iter().map(cell_to_header_string)), None)
    } else {
        (positional_headers(range.width()), Some(first))
    };

    let rows: Vec<Record> = leading
        .into_iter()
        .chain(rows_iter)
        .filter(|row| !is_blank_row(row))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, h)| (h.clone(), row.get(idx).map(convert_cell).unwrap_or(Value::Null)))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return Err(IngestionError::parse(file_type, "No data found in the Excel file"));
    }

    Ok(finish(file_name, file_type, headers, rows))
}

/// Names of every sheet in the workbook, in workbook order.
pub fn sheet_names(bytes: &[u8]) -> IngestionResult<Vec<String>> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        IngestionError::parse(FileType::Xlsx, format!("Failed to read sheet names: {e}"))
    })?;
    Ok(workbook.sheet_names())
}

fn excel_file_type(file_name: &str) -> FileType {
    if super::unified::file_extension(file_name) == "xls" {
        FileType::Xls
    } else {
        FileType::Xlsx
    }
}

fn open(bytes: &[u8], file_type: FileType) -> IngestionResult<Sheets<Cursor<&[u8]>>> {
    open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestionError::parse(file_type, format!("Excel parsing failed: {e}")))
}

fn select_sheet(
    workbook: &mut Sheets<Cursor<&[u8]>>,
    selection: &SheetSelection,
    file_type: FileType,
) -> IngestionResult<Range<Data>> {
    let not_found = || IngestionError::parse(file_type, "Sheet not found in workbook");

    let name = match selection {
        SheetSelection::Name(name) => name.clone(),
        SheetSelection::Index(idx) => workbook
            .sheet_names()
            .get(*idx)
            .cloned()
            .ok_or_else(not_found)?,
    };
    if !workbook.sheet_names().contains(&name) {
        return Err(not_found());
    }

    debug!(sheet = %name, "reading worksheet");
    workbook
        .worksheet_range(&name)
        .map_err(|e| IngestionError::parse(file_type, format!("Excel parsing failed: {e}")))
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|c| match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => c
            .as_datetime()
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(c.to_string())),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(e.to_string()),
    }
}
