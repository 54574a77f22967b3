// Primitives for reading CSV files.

use std::fs::File;

use crate::report::io_common::Row;
use crate::report::*;

pub fn read_csv_rows(path: &str, cfs: &FileSource) -> BReportResult<Vec<Row>> {
    let (header, records) = get_records(path, cfs)?;
    debug!("read_csv_rows: header: {:?}", header);

    let mut res: Vec<Row> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = (idx + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let values: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            debug!("read_csv_rows: {}: skipping empty line {}", path, lineno);
            continue;
        }
        res.push(Row::from_cells(lineno, &header, &values));
    }
    Ok(res)
}

fn get_records(
    path: &str,
    cfs: &FileSource,
) -> BReportResult<(Vec<String>, csv::StringRecordsIntoIter<File>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(cfs.delimiter_byte()?)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1u64 })?
        .iter()
        // Spreadsheet exports often start with a byte order mark.
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    Ok((header, rdr.into_records()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixture() {
        let cfs = FileSource {
            provider: "csv".to_string(),
            file_path: "departamentos.csv".to_string(),
            excel_worksheet_name: None,
            delimiter: Some(";".to_string()),
        };
        let rows = read_csv_rows("tests/data/departamentos.csv", &cfs).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].lineno, 2);
        assert_eq!(rows[0].text("codigo_departamento").as_deref(), Some("05"));
        assert_eq!(rows[0].text("nombre").as_deref(), Some("ANTIOQUIA"));
    }

    #[test]
    fn missing_file() {
        let cfs = FileSource {
            provider: "csv".to_string(),
            file_path: "nothing.csv".to_string(),
            excel_worksheet_name: None,
            delimiter: None,
        };
        let e = read_csv_rows("tests/data/nothing.csv", &cfs).unwrap_err();
        assert_eq!(e.to_string(), "Error opening file tests/data/nothing.csv");
    }
}
