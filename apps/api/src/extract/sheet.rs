use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};

use super::ExtractError;

/// Renders the first worksheet of an .xls/.xlsx workbook as a text table.
pub(super) fn first_sheet_table(content: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExtractError::EmptyWorkbook)??;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Ok(render_table(&rows))
}

/// First row is the header; every following row gets a zero-based index
/// column. Columns are right-aligned and separated by two spaces.
fn render_table(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    fn cell(row: &[String], col: usize) -> &str {
        row.get(col).map(String::as_str).unwrap_or("")
    }

    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .map(|row| cell(row, col).chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    let index_width = body.len().saturating_sub(1).to_string().len();

    let render_row = |index: &str, row: &[String]| {
        let mut line = format!("{index:<index_width$}");
        for (col, width) in widths.iter().enumerate() {
            line.push_str("  ");
            line.push_str(&format!("{:>width$}", cell(row, col), width = *width));
        }
        line
    };

    let mut lines = Vec::with_capacity(rows.len());
    lines.push(render_row("", header));
    for (i, row) in body.iter().enumerate() {
        lines.push(render_row(&i.to_string(), row));
    }
    lines.join("\n")
}
