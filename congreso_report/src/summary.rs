use log::{debug, info};

use crate::codes::{normalize, DepartmentCodes};
use crate::config::*;
use crate::ranking::{rank_all, RankedRow};
use crate::scope::{Clause, ScopeFilter};
use crate::source::{DepartmentDirectory, DepartmentNames, RecordSource};

fn party_name(r: &VoteRecord) -> String {
    r.party.as_deref().unwrap_or("").trim().to_string()
}

fn empty_summary(year: i32) -> SummaryReport {
    SummaryReport {
        year,
        winning_by_dept: Vec::new(),
        top5_by_dept: Vec::new(),
        top5_parties: Vec::new(),
        department_names: Vec::new(),
    }
}

/// Winner and leading parties of up to three departments for one election
/// year.
///
/// Only the election body of `scope` is used; the year comes from `year` and
/// the departments from `codes`. A record counts for every requested
/// department it is equivalent to.
pub fn build_summary<S>(
    source: &S,
    year: i32,
    codes: &DepartmentCodes,
    scope: &ScopeFilter,
) -> Result<SummaryReport, ReportError>
where
    S: RecordSource + DepartmentDirectory + ?Sized,
{
    if codes.is_empty() {
        debug!("build_summary: no department requested");
        return Ok(empty_summary(year));
    }
    info!("build_summary: year {} departments {:?}", year, codes);
    let err = ReportError::aggregate;

    let matchers = codes.matchers();
    let mut clauses = vec![Clause::PartyPresent, Clause::Year(year)];
    if let Some(body) = &scope.election_body {
        clauses.push(Clause::ElectionBody(body.clone()));
    }
    clauses.push(Clause::AnyDepartment(matchers.clone()));
    let records = source
        .vote_records(&clauses)
        .map_err(err(ReportKind::Summary))?;

    let names = DepartmentNames::load(source).map_err(err(ReportKind::Summary))?;

    // Every requested code gets the records equivalent to it, so "05" and
    // "5" requested together both see the same rows.
    let mut winning_by_dept: Vec<DepartmentWinner> = Vec::new();
    let mut top5_by_dept: Vec<DepartmentTopParties> = Vec::new();
    for (code, m) in codes.iter().zip(matchers.iter()) {
        let dept_records: Vec<&VoteRecord> = records
            .iter()
            .filter(|r| m.matches(&r.department_code))
            .collect();
        let dept_rows: Vec<RankedRow<(), String>> =
            rank_all(dept_records, party_name, |r: &VoteRecord| r.votes);
        let dept_total: u64 = dept_rows.iter().map(|r| r.total).sum();
        debug!("build_summary: {}: {} ranked rows", code, dept_rows.len());

        if let Some(w) = dept_rows.iter().find(|r| r.rank == 1) {
            winning_by_dept.push(DepartmentWinner {
                department_code: code.clone(),
                department: names.name_or_code(code),
                party: w.key.clone(),
                total_votes: w.total,
            });
        }

        // Only rank 1 is kept here, unlike the cross-department list below.
        let parties: Vec<PartyShare> = dept_rows
            .iter()
            .filter(|r| r.rank <= 1)
            .map(|r| PartyShare {
                party: r.key.clone(),
                votes: r.total,
                pct: if dept_total > 0 {
                    100.0 * (r.total as f64) / (dept_total as f64)
                } else {
                    0.0
                },
            })
            .collect();
        top5_by_dept.push(DepartmentTopParties {
            department_code: code.clone(),
            parties,
        });
    }

    // Independent aggregate over the returned rows, each row counted once.
    let top5_parties: Vec<PartyTotal> = rank_all(&records, party_name, |r: &VoteRecord| r.votes)
        .into_iter()
        .take(SUMMARY_TOP_PARTIES)
        .map(|r| PartyTotal {
            party: r.key,
            total_votes: r.total,
        })
        .collect();

    let department_names: Vec<(String, String)> = codes
        .iter()
        .map(|c| (normalize(c), names.name_or_code(c)))
        .collect();

    Ok(SummaryReport {
        year,
        winning_by_dept,
        top5_by_dept,
        top5_parties,
        department_names,
    })
}
