// Primitives for reading JSON record files: an array of objects keyed by
// column name.

use crate::report::io_common::Row;
use crate::report::*;

pub fn read_json_rows(path: &str) -> BReportResult<Vec<Row>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    parse_json_rows(path, &js)
}

fn parse_json_rows(path: &str, js: &JSValue) -> BReportResult<Vec<Row>> {
    let arr = js
        .as_array()
        .context(JsonRecordsShapeSnafu { path })?;
    let mut res: Vec<Row> = Vec::new();
    for (idx, elt) in arr.iter().enumerate() {
        let obj = elt.as_object().context(JsonRecordsShapeSnafu { path })?;
        let mut row = Row {
            // Position in the array, from 1.
            lineno: (idx + 1) as u64,
            ..Default::default()
        };
        for (k, v) in obj.iter() {
            let text = match v {
                JSValue::Null => continue,
                JSValue::String(s) if s.trim().is_empty() => continue,
                JSValue::String(s) => s.clone(),
                JSValue::Number(n) => n.to_string(),
                JSValue::Bool(b) => b.to_string(),
                _ => {
                    return Err(Box::new(ReportCliError::BadCell {
                        path: path.to_string(),
                        lineno: row.lineno,
                        column: k.clone(),
                        content: v.to_string(),
                    }))
                }
            };
            row.cells.insert(k.clone(), text);
        }
        res.push(row);
    }
    debug!("parse_json_rows: {}: {} rows", path, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_to_rows() {
        let js = json!([
            {"codigo_departamento": 5, "variable": "Población", "total": 6000000.5, "anio": null},
            {"codigo_departamento": "08", "variable": " "}
        ]);
        let rows = parse_json_rows("dane.json", &js).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("codigo_departamento").as_deref(), Some("5"));
        assert_eq!(rows[0].text("total").as_deref(), Some("6000000.5"));
        assert_eq!(rows[0].text("anio"), None);
        assert_eq!(rows[1].text("variable"), None);
    }

    #[test]
    fn not_an_array() {
        let e = parse_json_rows("dane.json", &json!({"rows": []})).unwrap_err();
        assert_eq!(e.to_string(), "dane.json: expected an array of objects");
        assert!(parse_json_rows("dane.json", &json!([[1, 2]])).is_err());
    }
}
