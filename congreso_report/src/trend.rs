use std::collections::HashMap;

use log::{debug, info};

use crate::codes::DepartmentCodes;
use crate::config::*;
use crate::scope::{Clause, ScopeFilter};
use crate::source::{DepartmentDirectory, DepartmentNames, RecordSource};

/// Votes per year for up to three departments.
///
/// The year axis spans the whole dataset, whatever the departments. The
/// election body of `scope`, if any, restricts the summed rows.
pub fn build_trend<S>(
    source: &S,
    codes: &DepartmentCodes,
    scope: &ScopeFilter,
) -> Result<TrendReport, ReportError>
where
    S: RecordSource + DepartmentDirectory + ?Sized,
{
    if codes.is_empty() {
        debug!("build_trend: no department requested");
        return Ok(TrendReport::default());
    }
    info!("build_trend: departments {:?}", codes);
    let err = ReportError::aggregate;

    let years = source.vote_years().map_err(err(ReportKind::Trend))?;

    let matchers = codes.matchers();
    let mut clauses = vec![Clause::PartyPresent];
    if let Some(body) = &scope.election_body {
        clauses.push(Clause::ElectionBody(body.clone()));
    }
    clauses.push(Clause::AnyDepartment(matchers.clone()));
    let records = source
        .vote_records(&clauses)
        .map_err(err(ReportKind::Trend))?;
    let names = DepartmentNames::load(source).map_err(err(ReportKind::Trend))?;

    let series: Vec<TrendSeries> = codes
        .iter()
        .zip(matchers.iter())
        .map(|(code, m)| {
            let mut by_year: HashMap<i32, u64> = HashMap::new();
            for r in records.iter().filter(|r| m.matches(&r.department_code)) {
                *by_year.entry(r.year).or_insert(0) += r.votes;
            }
            TrendSeries {
                department: names.name_or_code(code),
                department_code: code.clone(),
                data: years
                    .iter()
                    .map(|y| by_year.get(y).cloned().unwrap_or(0))
                    .collect(),
            }
        })
        .collect();
    debug!("build_trend: {} years, {} series", years.len(), series.len());

    Ok(TrendReport { years, series })
}
