use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;
use crate::ranking::{rank, winners, RankedRow};
use crate::scope::Clause;
use crate::source::RecordSource;

fn party_name(r: &VoteRecord) -> String {
    r.party.as_deref().unwrap_or("").trim().to_string()
}

fn body_name(r: &VoteRecord) -> Option<String> {
    r.election_body
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn winner_name(party: &str) -> String {
    if party.is_empty() {
        NO_WINNER.to_string()
    } else {
        party.to_string()
    }
}

/// Partition totals, keyed like the ranked rows.
fn group_totals<G: Ord + Clone>(rows: &[RankedRow<G, String>]) -> BTreeMap<G, u64> {
    let mut res: BTreeMap<G, u64> = BTreeMap::new();
    for r in rows.iter() {
        *res.entry(r.group.clone()).or_insert(0) += r.total;
    }
    res
}

/// Total votes and winning party of every election year, most recent first.
///
/// Only rows with a party take part.
pub fn elections_summary<S>(source: &S) -> Result<Vec<ElectionSummary>, ReportError>
where
    S: RecordSource + ?Sized,
{
    info!("elections_summary");
    let records = source
        .vote_records(&[Clause::PartyPresent])
        .map_err(ReportError::aggregate(ReportKind::ElectionsSummary))?;
    let ranked = rank(
        &records,
        |r: &VoteRecord| Some(r.year),
        party_name,
        |r: &VoteRecord| r.votes,
    );
    let totals = group_totals(&ranked);
    let mut res: Vec<ElectionSummary> = winners(&ranked)
        .into_iter()
        .map(|w| ElectionSummary {
            year: w.group,
            total_votes: totals.get(&w.group).cloned().unwrap_or(0),
            winning_party: winner_name(&w.key),
            winning_votes: w.total,
        })
        .collect();
    res.sort_by(|a, b| b.year.cmp(&a.year));
    debug!("elections_summary: {} years", res.len());
    Ok(res)
}

/// Same as [`elections_summary`], one entry per election body inside every
/// year. Rows without an election body are left out.
///
/// Years are most recent first, election bodies in ascending order.
pub fn elections_by_corporation<S>(source: &S) -> Result<Vec<YearCorporations>, ReportError>
where
    S: RecordSource + ?Sized,
{
    info!("elections_by_corporation");
    let records = source
        .vote_records(&[Clause::PartyPresent])
        .map_err(ReportError::aggregate(ReportKind::ElectionsSummary))?;
    let ranked = rank(
        &records,
        |r: &VoteRecord| body_name(r).map(|b| (r.year, b)),
        party_name,
        |r: &VoteRecord| r.votes,
    );
    let totals = group_totals(&ranked);

    let mut by_year: BTreeMap<i32, Vec<CorporationSummary>> = BTreeMap::new();
    for w in winners(&ranked).into_iter() {
        let total_votes = totals.get(&w.group).cloned().unwrap_or(0);
        let (year, election_body) = w.group;
        by_year.entry(year).or_default().push(CorporationSummary {
            election_body,
            total_votes,
            winning_party: winner_name(&w.key),
            winning_votes: w.total,
        });
    }
    let res: Vec<YearCorporations> = by_year
        .into_iter()
        .rev()
        .map(|(year, mut corporations)| {
            corporations.sort_by(|a, b| a.election_body.cmp(&b.election_body));
            YearCorporations { year, corporations }
        })
        .collect();
    debug!("elections_by_corporation: {} years", res.len());
    Ok(res)
}
