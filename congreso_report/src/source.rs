// The collaborators the reports read from, and an in-memory implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::codes::{normalize, CodeMatch};
use crate::config::*;
use crate::scope::{matches_all, Clause};

/// Returns vote and indicator records filtered by a list of clauses.
///
/// Implementations decide how the clauses are executed (query generation,
/// scan, ...), but must return exactly the records for which
/// [`crate::scope::matches_all`] holds.
pub trait RecordSource {
    fn vote_records(&self, clauses: &[Clause]) -> Result<Vec<VoteRecord>, SourceError>;

    fn kpi_records(&self, feed: KpiFeed, clauses: &[Clause])
        -> Result<Vec<KpiRecord>, SourceError>;

    /// Number of vote records, without any filter. Expensive.
    fn count_vote_records(&self) -> Result<u64, SourceError>;

    /// Distinct election years of the whole dataset, ascending.
    fn vote_years(&self) -> Result<Vec<i32>, SourceError> {
        let years: BTreeSet<i32> = self.vote_records(&[])?.iter().map(|r| r.year).collect();
        Ok(years.into_iter().collect())
    }

    /// Distinct years of an indicator feed, ascending.
    fn kpi_years(&self, feed: KpiFeed) -> Result<Vec<i32>, SourceError> {
        let years: BTreeSet<i32> = self
            .kpi_records(feed, &[])?
            .iter()
            .filter_map(|r| r.year)
            .collect();
        Ok(years.into_iter().collect())
    }
}

pub trait DepartmentDirectory {
    fn list_all(&self) -> Result<Vec<Department>, SourceError>;
}

pub trait MunicipalityDirectory {
    fn list_by_department(&self, code: &str) -> Result<Vec<Municipality>, SourceError>;
}

/// A materialized set of records, entirely held in memory.
///
/// Built with [`crate::builder::DatasetBuilder`] or directly from vectors.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    pub votes: Vec<VoteRecord>,
    pub teridata: Vec<KpiRecord>,
    pub dane: Vec<KpiRecord>,
    pub departments: Vec<Department>,
    pub municipalities: Vec<Municipality>,
}

impl Dataset {
    pub fn kpis(&self, feed: KpiFeed) -> &[KpiRecord] {
        match feed {
            KpiFeed::Teridata => &self.teridata,
            KpiFeed::Dane => &self.dane,
        }
    }
}

impl RecordSource for Dataset {
    fn vote_records(&self, clauses: &[Clause]) -> Result<Vec<VoteRecord>, SourceError> {
        let res: Vec<VoteRecord> = self
            .votes
            .iter()
            .filter(|r| matches_all(clauses, *r))
            .cloned()
            .collect();
        debug!(
            "Dataset::vote_records: {} of {} records for {:?}",
            res.len(),
            self.votes.len(),
            clauses
        );
        Ok(res)
    }

    fn kpi_records(
        &self,
        feed: KpiFeed,
        clauses: &[Clause],
    ) -> Result<Vec<KpiRecord>, SourceError> {
        let all = self.kpis(feed);
        let res: Vec<KpiRecord> = all
            .iter()
            .filter(|r| matches_all(clauses, *r))
            .cloned()
            .collect();
        debug!(
            "Dataset::kpi_records: {}: {} of {} records for {:?}",
            feed,
            res.len(),
            all.len(),
            clauses
        );
        Ok(res)
    }

    fn count_vote_records(&self) -> Result<u64, SourceError> {
        Ok(self.votes.len() as u64)
    }

    fn vote_years(&self) -> Result<Vec<i32>, SourceError> {
        let years: BTreeSet<i32> = self.votes.iter().map(|r| r.year).collect();
        Ok(years.into_iter().collect())
    }
}

impl DepartmentDirectory for Dataset {
    /// One entry per code, ordered by code. For duplicated codes, the
    /// smallest name is kept.
    fn list_all(&self) -> Result<Vec<Department>, SourceError> {
        let mut by_code: BTreeMap<String, String> = BTreeMap::new();
        for d in self.departments.iter() {
            let e = by_code.entry(d.code.clone()).or_insert_with(|| d.name.clone());
            if d.name < *e {
                *e = d.name.clone();
            }
        }
        Ok(by_code
            .into_iter()
            .map(|(code, name)| Department { code, name })
            .collect())
    }
}

impl MunicipalityDirectory for Dataset {
    /// The municipalities of a department with a non-blank code, ordered by
    /// name then code.
    fn list_by_department(&self, code: &str) -> Result<Vec<Municipality>, SourceError> {
        let m = CodeMatch::new(code);
        let mut res: Vec<Municipality> = self
            .municipalities
            .iter()
            .filter(|mu| m.matches(&mu.department_code) && !mu.code.trim().is_empty())
            .map(|mu| Municipality {
                department_code: mu.department_code.clone(),
                code: mu.code.trim().to_string(),
                name: mu.name.as_ref().map(|n| n.trim().to_string()),
            })
            .collect();
        // Missing names sort last.
        res.sort_by(|a, b| {
            let ka = (a.name.is_none(), a.name.as_deref().unwrap_or(""), &a.code);
            let kb = (b.name.is_none(), b.name.as_deref().unwrap_or(""), &b.code);
            ka.cmp(&kb)
        });
        Ok(res)
    }
}

/// Display names of the departments, keyed by normalized code.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DepartmentNames(HashMap<String, String>);

impl DepartmentNames {
    pub fn load<D: DepartmentDirectory + ?Sized>(directory: &D) -> Result<DepartmentNames, SourceError> {
        Ok(DepartmentNames::from_departments(&directory.list_all()?))
    }

    /// The first name seen for a normalized code is kept.
    pub fn from_departments(departments: &[Department]) -> DepartmentNames {
        let mut res: HashMap<String, String> = HashMap::new();
        for d in departments.iter() {
            res.entry(normalize(&d.code)).or_insert_with(|| d.name.clone());
        }
        DepartmentNames(res)
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(&normalize(code)).map(|s| s.as_str())
    }

    /// The display name, or the code itself when the directory does not
    /// know it.
    pub fn name_or_code(&self, code: &str) -> String {
        self.get(code).unwrap_or(code).to_string()
    }
}
