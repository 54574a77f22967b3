use log::debug;

use crate::codes::CodeMatch;
use crate::config::{KpiRecord, VoteRecord};

/// The columns a clause may look at.
///
/// Implemented by every record type that can be scoped.
pub trait Scoped {
    fn year(&self) -> Option<i32>;
    fn election_body(&self) -> Option<&str>;
    fn department_code(&self) -> &str;
    fn municipality_code(&self) -> Option<&str>;
    fn party(&self) -> Option<&str>;
    fn indicator(&self) -> Option<&str>;
}

impl Scoped for VoteRecord {
    fn year(&self) -> Option<i32> {
        Some(self.year)
    }
    fn election_body(&self) -> Option<&str> {
        self.election_body.as_deref()
    }
    fn department_code(&self) -> &str {
        &self.department_code
    }
    fn municipality_code(&self) -> Option<&str> {
        Some(&self.municipality_code)
    }
    fn party(&self) -> Option<&str> {
        self.party.as_deref()
    }
    fn indicator(&self) -> Option<&str> {
        None
    }
}

impl Scoped for KpiRecord {
    fn year(&self) -> Option<i32> {
        self.year
    }
    fn election_body(&self) -> Option<&str> {
        None
    }
    fn department_code(&self) -> &str {
        &self.department_code
    }
    fn municipality_code(&self) -> Option<&str> {
        self.municipality_code.as_deref()
    }
    fn party(&self) -> Option<&str> {
        None
    }
    fn indicator(&self) -> Option<&str> {
        self.indicator.as_deref()
    }
}

/// A single typed predicate.
///
/// Party and indicator names are compared after trimming.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Clause {
    Year(i32),
    ElectionBody(String),
    Department(CodeMatch),
    /// Matches if any of the codes matches.
    AnyDepartment(Vec<CodeMatch>),
    Municipality(CodeMatch),
    /// Party is present and not blank.
    PartyPresent,
    Party(String),
    ExcludeParty(String),
    /// Indicator is present and not blank.
    IndicatorPresent,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl Clause {
    pub fn matches<R: Scoped>(&self, record: &R) -> bool {
        match self {
            Clause::Year(y) => record.year() == Some(*y),
            Clause::ElectionBody(body) => {
                non_blank(record.election_body()) == Some(body.as_str())
            }
            Clause::Department(m) => m.matches(record.department_code()),
            Clause::AnyDepartment(ms) => ms.iter().any(|m| m.matches(record.department_code())),
            Clause::Municipality(m) => record.municipality_code().map_or(false, |c| m.matches(c)),
            Clause::PartyPresent => non_blank(record.party()).is_some(),
            Clause::Party(p) => record.party().map(str::trim) == Some(p.as_str()),
            Clause::ExcludeParty(p) => record.party().map(str::trim).unwrap_or("") != p.as_str(),
            Clause::IndicatorPresent => non_blank(record.indicator()).is_some(),
        }
    }
}

/// AND composition of clauses. An empty list matches everything.
pub fn matches_all<R: Scoped>(clauses: &[Clause], record: &R) -> bool {
    clauses.iter().all(|c| c.matches(record))
}

/// Filters a collection with the AND composition of the clauses.
pub fn filter_records<'a, R: Scoped>(clauses: &[Clause], records: &'a [R]) -> Vec<&'a R> {
    records.iter().filter(|r| matches_all(clauses, *r)).collect()
}

fn clean(s: Option<&str>) -> Option<String> {
    non_blank(s).map(|s| s.to_string())
}

/// The constraints a dashboard applies to its vote queries.
///
/// Every field is optional. Blank strings count as absent.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ScopeFilter {
    pub year: Option<i32>,
    pub election_body: Option<String>,
    pub department_code: Option<String>,
    pub municipality_code: Option<String>,
    pub excluded_party: Option<String>,
}

impl ScopeFilter {
    pub fn new() -> ScopeFilter {
        ScopeFilter::default()
    }

    pub fn year(self, year: Option<i32>) -> ScopeFilter {
        ScopeFilter { year, ..self }
    }

    pub fn election_body(self, body: Option<&str>) -> ScopeFilter {
        ScopeFilter {
            election_body: clean(body),
            ..self
        }
    }

    pub fn department(self, code: Option<&str>) -> ScopeFilter {
        ScopeFilter {
            department_code: clean(code),
            ..self
        }
    }

    pub fn municipality(self, code: Option<&str>) -> ScopeFilter {
        ScopeFilter {
            municipality_code: clean(code),
            ..self
        }
    }

    pub fn exclude_party(self, party: Option<&str>) -> ScopeFilter {
        ScopeFilter {
            excluded_party: clean(party),
            ..self
        }
    }

    /// The same scope at department granularity.
    pub fn without_municipality(&self) -> ScopeFilter {
        ScopeFilter {
            municipality_code: None,
            ..self.clone()
        }
    }

    pub fn without_exclusion(&self) -> ScopeFilter {
        ScopeFilter {
            excluded_party: None,
            ..self.clone()
        }
    }

    /// Year, election body, department and municipality clauses.
    pub fn base_clauses(&self) -> Vec<Clause> {
        let mut res: Vec<Clause> = Vec::new();
        if let Some(y) = self.year {
            res.push(Clause::Year(y));
        }
        if let Some(body) = &self.election_body {
            res.push(Clause::ElectionBody(body.clone()));
        }
        if let Some(code) = &self.department_code {
            res.push(Clause::Department(CodeMatch::new(code)));
        }
        if let Some(code) = &self.municipality_code {
            res.push(Clause::Municipality(CodeMatch::new(code)));
        }
        res
    }

    /// The base clauses restricted to rows that carry a party. The
    /// exclusion is not applied.
    pub fn party_clauses(&self) -> Vec<Clause> {
        let mut res = vec![Clause::PartyPresent];
        res.extend(self.base_clauses());
        res
    }

    /// The party clauses with the exclusion applied, for ranked lists.
    pub fn ranked_clauses(&self) -> Vec<Clause> {
        let mut res = self.party_clauses();
        if let Some(p) = &self.excluded_party {
            res.push(Clause::ExcludeParty(p.clone()));
        }
        debug!("ranked_clauses: {:?}", res);
        res
    }
}
