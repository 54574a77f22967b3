// Rows as read by every provider, and their conversion to records.

use std::collections::HashMap;
use std::str::FromStr;

use crate::report::*;

/// One data row, keyed by column name. Blank cells are absent.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Row {
    /// 1-based, the header being line 1 for the tabular formats.
    pub lineno: u64,
    pub cells: HashMap<String, String>,
}

impl Row {
    pub fn from_cells(lineno: u64, header: &[String], values: &[String]) -> Row {
        let cells: HashMap<String, String> = header
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(h, v)| (h.trim().to_string(), v.clone()))
            .collect();
        Row { lineno, cells }
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.cells.get(column).cloned()
    }

    pub fn required(&self, path: &str, column: &str) -> BReportResult<String> {
        self.text(column).context(MissingColumnSnafu { path, column }).map_err(Box::new)
    }

    pub fn parse<T: FromStr>(&self, path: &str, column: &str) -> BReportResult<Option<T>> {
        match self.cells.get(column) {
            None => Ok(None),
            Some(s) => match s.trim().parse::<T>() {
                Ok(x) => Ok(Some(x)),
                Err(_) => Err(self.bad_cell(path, column, s)),
            },
        }
    }

    pub fn parse_required<T: FromStr>(&self, path: &str, column: &str) -> BReportResult<T> {
        self.parse(path, column)?
            .context(MissingColumnSnafu { path, column })
            .map_err(Box::new)
    }

    /// Numbers written with a decimal comma are accepted.
    pub fn float(&self, path: &str, column: &str) -> BReportResult<Option<f64>> {
        match self.cells.get(column) {
            None => Ok(None),
            Some(s) => match s.trim().replace(',', ".").parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Some(x)),
                _ => Err(self.bad_cell(path, column, s)),
            },
        }
    }

    /// Like `float`, but an unreadable value is logged and treated as missing.
    pub fn lenient_float(&self, path: &str, column: &str) -> Option<f64> {
        match self.float(path, column) {
            Ok(x) => x,
            Err(e) => {
                warn!("{}: value ignored", e);
                None
            }
        }
    }

    fn bad_cell(&self, path: &str, column: &str, content: &str) -> Box<ReportCliError> {
        Box::new(ReportCliError::BadCell {
            path: path.to_string(),
            lineno: self.lineno,
            column: column.to_string(),
            content: content.to_string(),
        })
    }
}

pub fn read_vote(path: &str, row: &Row) -> BReportResult<VoteRecord> {
    Ok(VoteRecord {
        id: row.parse(path, "id")?,
        year: row.parse_required(path, "anio_eleccion")?,
        election_body: row.text("corporacion"),
        circumscription: row.text("circunscripcion"),
        circ_rep: row.text("circ_rep"),
        department_code: row.required(path, "codigo_departamento")?,
        municipality_code: row.text("codigo_divipole").unwrap_or_default(),
        polling_place: row.text("nombre_puesto"),
        commune: row.text("comuna"),
        table: row.text("mesa"),
        votes: row.parse_required(path, "votos")?,
        party: row.text("partido"),
        candidate: row.text("nombre_candidato"),
        source: row.text("origen"),
        load_date: row.text("fecha_carga"),
    })
}

pub fn read_kpi(path: &str, feed: KpiFeed, row: &Row) -> BReportResult<KpiRecord> {
    let department_code = row.required(path, "codigo_departamento")?;
    let year = row.parse(path, "anio")?;
    let res = match feed {
        KpiFeed::Teridata => KpiRecord {
            department_code,
            municipality_code: row.text("codigo_divipole"),
            indicator: row.text("indicador"),
            dimension: row.text("dimension"),
            subcategory: row.text("subcategoria"),
            unit: row.text("unidad_medida"),
            numeric_value: row.lenient_float(path, "dato_numerico"),
            qualitative_value: row.text("dato_cualitativo"),
            year,
            month: row.parse(path, "mes")?,
        },
        KpiFeed::Dane => KpiRecord {
            department_code,
            indicator: row.text("variable"),
            numeric_value: row.lenient_float(path, "total"),
            year,
            ..Default::default()
        },
    };
    Ok(res)
}

pub fn read_department(path: &str, row: &Row) -> BReportResult<Department> {
    Ok(Department {
        code: row.required(path, "codigo_departamento")?,
        name: row.required(path, "nombre")?,
    })
}

pub fn read_municipality(path: &str, row: &Row) -> BReportResult<Municipality> {
    Ok(Municipality {
        department_code: row.required(path, "codigo_departamento")?,
        code: row.text("codigo_divipole").unwrap_or_default(),
        name: row.text("des_municipio"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> Row {
        let header: Vec<String> = cells.iter().map(|(h, _)| h.to_string()).collect();
        let values: Vec<String> = cells.iter().map(|(_, v)| v.to_string()).collect();
        Row::from_cells(2, &header, &values)
    }

    #[test]
    fn vote_row() {
        let r = row(&[
            ("anio_eleccion", "2022"),
            ("codigo_departamento", "05"),
            ("codigo_divipole", "05001"),
            ("votos", " 120 "),
            ("partido", "PARTIDO LIBERAL"),
            ("mesa", ""),
        ]);
        let v = read_vote("votes.csv", &r).unwrap();
        assert_eq!(v.year, 2022);
        assert_eq!(v.votes, 120);
        assert_eq!(v.table, None);
        assert_eq!(v.party.as_deref(), Some("PARTIDO LIBERAL"));
    }

    #[test]
    fn bad_votes() {
        let r = row(&[
            ("anio_eleccion", "2022"),
            ("codigo_departamento", "05"),
            ("votos", "many"),
        ]);
        let e = read_vote("votes.csv", &r).unwrap_err();
        assert_eq!(
            e.to_string(),
            "votes.csv, line 2: cannot read votos from \"many\""
        );
    }

    #[test]
    fn missing_department() {
        let r = row(&[("anio_eleccion", "2022"), ("votos", "1")]);
        let e = read_vote("votes.csv", &r).unwrap_err();
        assert_eq!(e.to_string(), "votes.csv: missing column codigo_departamento");
    }

    #[test]
    fn kpi_rows() {
        let r = row(&[
            ("codigo_departamento", "08"),
            ("indicador", "Cobertura"),
            ("dato_numerico", "87,5"),
            ("anio", "2023"),
        ]);
        let k = read_kpi("kpi.csv", KpiFeed::Teridata, &r).unwrap();
        assert_eq!(k.numeric_value, Some(87.5));
        assert_eq!(k.year, Some(2023));
        assert_eq!(k.dimension, None);

        let r = row(&[
            ("codigo_departamento", "08"),
            ("variable", "Población"),
            ("total", "n/d"),
        ]);
        let k = read_kpi("dane.csv", KpiFeed::Dane, &r).unwrap();
        assert_eq!(k.indicator.as_deref(), Some("Población"));
        assert_eq!(k.numeric_value, None);
    }
}
