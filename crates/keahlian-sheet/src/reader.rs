//! Spreadsheet readers: CSV via `csv`, Excel/ODS via `calamine`.
//!
//! Both produce the same [`Sheet`]: a header row and the data rows beneath it
//! as plain trimmed strings.

use std::io::Cursor;

use calamine::{Data, Reader as _};

use crate::error::{Error, Result};

/// The raw cells of an uploaded file. `rows[i]` is data row `i + 1`; the
/// header row is row 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
  Csv,
  Workbook,
}

impl SheetFormat {
  /// Choose a reader from the file extension.
  pub fn from_filename(filename: &str) -> Result<Self> {
    let ext = filename
      .rsplit_once('.')
      .map(|(_, ext)| ext.to_ascii_lowercase())
      .unwrap_or_default();
    match ext.as_str() {
      "csv" | "txt" => Ok(Self::Csv),
      "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
      _ => Err(Error::UnsupportedFormat(filename.to_owned())),
    }
  }
}

/// Read the first sheet of `bytes`, choosing the format from `filename`.
pub fn read_sheet(bytes: &[u8], filename: &str) -> Result<Sheet> {
  match SheetFormat::from_filename(filename)? {
    SheetFormat::Csv => read_csv(bytes),
    SheetFormat::Workbook => read_workbook(bytes),
  }
}

fn read_csv(bytes: &[u8]) -> Result<Sheet> {
  // Exports from older spreadsheet tools are not always UTF-8.
  let decoded = String::from_utf8_lossy(bytes);
  let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
  let text = mark_blank_lines(text);

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(text.as_bytes());

  let mut records = reader.records();
  let headers: Vec<String> = match records.next() {
    Some(record) => record?.iter().map(str::to_owned).collect(),
    None => return Err(Error::Empty),
  };

  let rows = records
    .map(|record| record.map(|r| r.iter().map(str::to_owned).collect()))
    .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

  into_sheet(headers, rows)
}

/// `csv` drops empty lines, which would shift every later row up by one.
/// Give each empty line after the first record a single empty quoted field
/// so it survives as a blank row. Line breaks inside quoted cells are left
/// alone.
fn mark_blank_lines(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut chars = text.chars().peekable();
  let mut in_quotes = false;
  let mut at_line_start = true;
  let mut seen_content = false;

  while let Some(c) = chars.next() {
    let terminator = c == '\n' || c == '\r';
    if terminator && at_line_start && seen_content && !in_quotes {
      out.push_str("\"\"");
    }
    out.push(c);

    match c {
      '"' => {
        in_quotes = !in_quotes;
        at_line_start = false;
        seen_content = true;
      }
      // The `\n` of a `\r\n` pair ends the line.
      '\r' if chars.peek() == Some(&'\n') => at_line_start = false,
      '\r' | '\n' => at_line_start = !in_quotes,
      _ => {
        at_line_start = false;
        seen_content = true;
      }
    }
  }

  out
}

fn read_workbook(bytes: &[u8]) -> Result<Sheet> {
  let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
  let range = workbook.worksheet_range_at(0).ok_or(Error::Empty)??;

  let mut rows = range
    .rows()
    .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
  let headers = rows.next().ok_or(Error::Empty)?;

  into_sheet(headers, rows.collect())
}

fn into_sheet(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Sheet> {
  if headers.iter().all(|h| h.trim().is_empty()) {
    return Err(Error::Empty);
  }
  Ok(Sheet { headers, rows })
}

/// Render a workbook cell as text. Whole numbers lose their `.0` so IC and
/// phone numbers stored as numeric cells survive.
fn cell_text(cell: &Data) -> String {
  match cell {
    Data::Empty => String::new(),
    Data::String(s) => s.trim().to_owned(),
    Data::Int(i) => i.to_string(),
    Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
    other => other.to_string().trim().to_owned(),
  }
}
