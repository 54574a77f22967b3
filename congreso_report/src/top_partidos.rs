use log::{debug, info};

use crate::config::*;
use crate::ranking::{rank_all, top_n};
use crate::scope::{filter_records, Clause, ScopeFilter};
use crate::source::RecordSource;

fn party_name(r: &VoteRecord) -> String {
    r.party.as_deref().unwrap_or("").trim().to_string()
}

fn total_votes<'a>(records: impl IntoIterator<Item = &'a VoteRecord>) -> u64 {
    records.into_iter().map(|r| r.votes).sum()
}

/// Ranked party totals under a scope.
///
/// The exclusion of `scope.excluded_party` only removes that party from the
/// ranked rows: the scope total still counts its votes, and its own total is
/// reported next to the ranking.
pub fn build_top_partidos<S>(source: &S, scope: &ScopeFilter) -> Result<TopPartidosReport, ReportError>
where
    S: RecordSource + ?Sized,
{
    info!("build_top_partidos: scope {:?}", scope);
    let err = ReportError::aggregate;

    // Everything in scope, exclusion not applied.
    let in_scope = source
        .vote_records(&scope.party_clauses())
        .map_err(err(ReportKind::TopPartidos))?;
    let total_votes_scope = total_votes(&in_scope);

    let ranked_rows = match &scope.excluded_party {
        Some(p) => filter_records(&[Clause::ExcludeParty(p.clone())], &in_scope),
        None => in_scope.iter().collect(),
    };
    let ranked = rank_all(ranked_rows, |r: &VoteRecord| party_name(r), |r: &VoteRecord| r.votes);
    let data: Vec<RankedPartyRow> = top_n(&ranked, TOP_PARTIES_LIMIT as u32)
        .into_iter()
        .map(|r| RankedPartyRow {
            party: r.key,
            total_votes: r.total,
            rank: r.rank,
        })
        .collect();

    let total_votes_department = match (&scope.department_code, &scope.municipality_code) {
        (Some(_), Some(_)) => {
            let dept_scope = scope.without_municipality();
            let dept_records = source
                .vote_records(&dept_scope.party_clauses())
                .map_err(err(ReportKind::TopPartidos))?;
            Some(total_votes(&dept_records))
        }
        _ => None,
    };

    let excluded_party = scope.excluded_party.as_ref().map(|p| {
        let own = filter_records(&[Clause::Party(p.clone())], &in_scope);
        PartyTotal {
            party: p.clone(),
            total_votes: total_votes(own),
        }
    });

    debug!(
        "build_top_partidos: {} ranked parties, scope total {}, department total {:?}",
        data.len(),
        total_votes_scope,
        total_votes_department
    );
    Ok(TopPartidosReport {
        data,
        total_votes_scope,
        total_votes_department,
        excluded_party,
    })
}
