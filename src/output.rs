use crate::error::Result;
use crate::reports::{FIRST_DATA_ROW, GROUP_ROW, LABEL_COL};
use crate::types::{TidyRow, WorksheetSummaryRow};
use crate::util::format_int;
use crate::worksheet::{Cell, ReportDocument, ReportWorksheet};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Excel's built-in `0%` number format.
const PERCENT_FORMAT_INDEX: u8 = 9;

struct XlsxFormats {
    percent: Format,
    group: Format,
}

impl XlsxFormats {
    fn new() -> Self {
        Self {
            percent: Format::new().set_num_format_index(PERCENT_FORMAT_INDEX),
            group: Format::new().set_bold().set_align(FormatAlign::Center),
        }
    }
}

fn fill_sheet(sheet: &mut Worksheet, ws: &ReportWorksheet, formats: &XlsxFormats) -> Result<()> {
    sheet.set_name(ws.name())?;
    sheet.set_column_width(LABEL_COL, 32)?;

    for merge in ws.merges() {
        let label = ws
            .get(merge.row, merge.first_col)
            .and_then(Cell::as_text)
            .unwrap_or_default();
        sheet.merge_range(
            merge.row,
            merge.first_col,
            merge.row,
            merge.last_col,
            label,
            &formats.group,
        )?;
    }

    for (row, col, cell) in ws.cells() {
        if ws.is_merged_origin(row, col) {
            continue;
        }
        match cell {
            Cell::Text(s) => {
                sheet.write_string(row, col, s)?;
            }
            Cell::Integer(n) => {
                sheet.write_number(row, col, *n as f64)?;
            }
            Cell::Percent(p) => {
                sheet.write_number_with_format(row, col, *p, &formats.percent)?;
            }
        }
    }
    Ok(())
}

fn to_workbook(doc: &ReportDocument) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    // Shared by every sheet of this render.
    let formats = XlsxFormats::new();
    for ws in &doc.worksheets {
        let sheet = workbook.add_worksheet();
        fill_sheet(sheet, ws, &formats)?;
    }
    Ok(workbook)
}

/// Render the document as XLSX bytes.
pub fn render_xlsx(doc: &ReportDocument) -> Result<Vec<u8>> {
    let mut workbook = to_workbook(doc)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx(path: impl AsRef<Path>, doc: &ReportDocument) -> Result<()> {
    let mut workbook = to_workbook(doc)?;
    workbook.save(path.as_ref())?;
    Ok(())
}

/// Flatten every data cell pair into long form, worksheet by worksheet.
pub fn tidy_rows(doc: &ReportDocument) -> Vec<TidyRow> {
    let mut rows = Vec::new();
    for ws in &doc.worksheets {
        let groups: Vec<_> = ws.merges().iter().filter(|m| m.row == GROUP_ROW).collect();
        for group in groups {
            let column = ws
                .get(GROUP_ROW, group.first_col)
                .and_then(Cell::as_text)
                .unwrap_or_default();
            let mut r = FIRST_DATA_ROW;
            while let Some(label) = ws.get(r, LABEL_COL).and_then(Cell::as_text) {
                rows.push(TidyRow {
                    worksheet: ws.name().to_string(),
                    row: label.to_string(),
                    column: column.to_string(),
                    count: ws
                        .get(r, group.first_col)
                        .and_then(Cell::as_integer)
                        .unwrap_or(0),
                    percent: ws
                        .get(r, group.first_col + 1)
                        .and_then(Cell::as_percent)
                        .unwrap_or(0.0),
                });
                r += 1;
            }
        }
    }
    rows
}

pub fn summarize(doc: &ReportDocument) -> Vec<WorksheetSummaryRow> {
    let tidy = tidy_rows(doc);
    doc.worksheets
        .iter()
        .map(|ws| {
            let mine = tidy.iter().filter(|t| t.worksheet == ws.name());
            let total: u64 = mine.clone().map(|t| t.count).sum();
            let columns = ws.merges().iter().filter(|m| m.row == GROUP_ROW).count();
            let rows = if columns == 0 { 0 } else { mine.count() / columns };
            WorksheetSummaryRow {
                worksheet: ws.name().to_string(),
                rows,
                columns,
                total_count: format_int(total),
            }
        })
        .collect()
}

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
