// Primitives for reading Excel (xlsx) files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::report::io_common::Row;
use crate::report::*;

pub fn read_excel_rows(path: &str, cfs: &FileSource) -> BReportResult<Vec<Row>> {
    let wrange = get_range(path, cfs)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(h) => h.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };
    debug!("read_excel_rows: header: {:?}", header);

    let mut res: Vec<Row> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = (idx + 2) as u64;
        let values: Vec<String> = row.iter().map(cell_text).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        res.push(Row::from_cells(lineno, &header, &values));
    }
    Ok(res)
}

/// The text of a cell. Whole numbers are written without decimals, so that
/// codes and counts stored as numbers read like their CSV counterparts.
fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        _ => {
            warn!("cell_text: ignoring cell {:?}", cell);
            "".to_string()
        }
    }
}

fn get_range(path: &str, cfs: &FileSource) -> BReportResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &cfs.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match &cfs.excel_worksheet_name {
        // A worksheet name was provided, use it.
        Some(worksheet_name) => workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet: worksheet_name.as_str(),
            })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells() {
        assert_eq!(cell_text(&DataType::Float(5.0)), "5");
        assert_eq!(cell_text(&DataType::Float(87.5)), "87.5");
        assert_eq!(cell_text(&DataType::Int(2022)), "2022");
        assert_eq!(cell_text(&DataType::String("05".to_string())), "05");
        assert_eq!(cell_text(&DataType::Empty), "");
    }
}
