// The option lists the dashboard filters are populated from, and the raw
// record listing.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::config::*;
use crate::scope::{Clause, ScopeFilter};
use crate::source::{DepartmentDirectory, MunicipalityDirectory, RecordSource};

fn distinct_trimmed<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let set: BTreeSet<String> = values
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    set.into_iter().collect()
}

/// Distinct election years, ascending.
pub fn years<S: RecordSource + ?Sized>(source: &S) -> Result<Vec<i32>, ReportError> {
    source
        .vote_years()
        .map_err(ReportError::aggregate(ReportKind::Catalog))
}

/// Distinct election bodies, trimmed and ascending.
pub fn corporations<S: RecordSource + ?Sized>(source: &S) -> Result<Vec<String>, ReportError> {
    let records = source
        .vote_records(&[])
        .map_err(ReportError::aggregate(ReportKind::Catalog))?;
    let res = distinct_trimmed(records.iter().map(|r| r.election_body.as_deref()));
    debug!("corporations: {:?}", res);
    Ok(res)
}

/// Distinct parties under a scope, trimmed and ascending.
///
/// The excluded party of the scope, if any, is ignored.
pub fn parties<S: RecordSource + ?Sized>(
    source: &S,
    scope: &ScopeFilter,
) -> Result<Vec<String>, ReportError> {
    let records = source
        .vote_records(&scope.party_clauses())
        .map_err(ReportError::aggregate(ReportKind::Catalog))?;
    let res = distinct_trimmed(records.iter().map(|r| r.party.as_deref()));
    debug!("parties: {} parties for {:?}", res.len(), scope);
    Ok(res)
}

pub fn departments<D: DepartmentDirectory + ?Sized>(
    directory: &D,
) -> Result<Vec<Department>, ReportError> {
    directory
        .list_all()
        .map_err(ReportError::aggregate(ReportKind::Catalog))
}

/// The municipalities of a department. A blank department code gives an
/// empty list without querying the directory.
pub fn municipalities<D: MunicipalityDirectory + ?Sized>(
    directory: &D,
    department_code: &str,
) -> Result<Vec<Municipality>, ReportError> {
    let code = department_code.trim();
    if code.is_empty() {
        return Ok(Vec::new());
    }
    directory
        .list_by_department(code)
        .map_err(ReportError::aggregate(ReportKind::Catalog))
}

/// Distinct years of an indicator feed, ascending.
pub fn kpi_years<S: RecordSource + ?Sized>(
    source: &S,
    feed: KpiFeed,
) -> Result<Vec<i32>, ReportError> {
    source
        .kpi_years(feed)
        .map_err(ReportError::aggregate(ReportKind::Catalog))
}

/// Clamps the requested page (from 1) and page size.
pub fn page_bounds(page: Option<usize>, limit: Option<usize>) -> (usize, usize) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

/// One page of raw vote records, most recent year first, then by department
/// code and decreasing votes.
pub fn records_page<S: RecordSource + ?Sized>(
    source: &S,
    page: Option<usize>,
    limit: Option<usize>,
) -> Result<RecordPage, ReportError> {
    let (page, limit) = page_bounds(page, limit);
    info!("records_page: page {} limit {}", page, limit);
    let no_filter: [Clause; 0] = [];
    let mut records = source
        .vote_records(&no_filter)
        .map_err(ReportError::aggregate(ReportKind::Records))?;
    records.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| a.department_code.cmp(&b.department_code))
            .then_with(|| b.votes.cmp(&a.votes))
    });
    let data: Vec<VoteRecord> = records
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();
    Ok(RecordPage { data, page, limit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Dataset;

    fn vote(year: i32, dept: &str, body: Option<&str>, party: Option<&str>, votes: u64) -> VoteRecord {
        VoteRecord {
            year,
            election_body: body.map(|s| s.to_string()),
            department_code: dept.to_string(),
            municipality_code: format!("{}001", dept),
            party: party.map(|s| s.to_string()),
            votes,
            ..Default::default()
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            votes: vec![
                vote(2018, "11", Some(" SENADO "), Some("B "), 3),
                vote(2022, "05", Some("CAMARA"), Some("A"), 7),
                vote(2022, "11", Some("SENADO"), Some(" "), 9),
                vote(2022, "05", None, Some("C"), 8),
                vote(2014, "05", Some(""), None, 1),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn distinct_values() {
        let ds = dataset();
        assert_eq!(years(&ds).unwrap(), vec![2014, 2018, 2022]);
        assert_eq!(corporations(&ds).unwrap(), vec!["CAMARA", "SENADO"]);
        assert_eq!(parties(&ds, &ScopeFilter::new()).unwrap(), vec!["A", "B", "C"]);
        let scope = ScopeFilter::new().year(Some(2022)).department(Some("5"));
        assert_eq!(parties(&ds, &scope).unwrap(), vec!["A", "C"]);
    }

    #[test]
    fn blank_department_has_no_municipality() {
        let ds = dataset();
        assert!(municipalities(&ds, "  ").unwrap().is_empty());
    }

    #[test]
    fn page_clamps() {
        assert_eq!(page_bounds(None, None), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 1));
        assert_eq!(page_bounds(Some(3), Some(10_000)), (3, MAX_PAGE_LIMIT));
    }

    #[test]
    fn pages_are_ordered() {
        let ds = dataset();
        let p1 = records_page(&ds, Some(1), Some(2)).unwrap();
        let v: Vec<(i32, &str, u64)> = p1
            .data
            .iter()
            .map(|r| (r.year, r.department_code.as_str(), r.votes))
            .collect();
        assert_eq!(v, vec![(2022, "05", 8), (2022, "05", 7)]);
        let p3 = records_page(&ds, Some(3), Some(2)).unwrap();
        assert_eq!(p3.data.len(), 1);
        assert_eq!(p3.data[0].year, 2014);
        assert!(records_page(&ds, Some(4), Some(2)).unwrap().data.is_empty());
    }
}
