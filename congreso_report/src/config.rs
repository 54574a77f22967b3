// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One row of the election results table.
///
/// Codes are kept exactly as they were loaded. They may be zero padded or
/// not; compare them with [`crate::CodeMatch`].
#[derive(PartialEq, Debug, Clone, Default)]
pub struct VoteRecord {
    pub id: Option<u64>,
    pub year: i32,
    /// The corporación: the kind of contest (Senado, Cámara, ...).
    pub election_body: Option<String>,
    pub circumscription: Option<String>,
    pub circ_rep: Option<String>,
    pub department_code: String,
    /// Stored as `codigo_divipole` in the source tables.
    pub municipality_code: String,
    pub polling_place: Option<String>,
    pub commune: Option<String>,
    pub table: Option<String>,
    pub votes: u64,
    pub party: Option<String>,
    pub candidate: Option<String>,
    pub source: Option<String>,
    pub load_date: Option<String>,
}

/// The two indicator feeds. They share the same record shape.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum KpiFeed {
    /// Management indicators (indicador, dimension, dato_numerico).
    Teridata,
    /// Census variables (variable, total). No dimension column.
    Dane,
}

impl Display for KpiFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KpiFeed::Teridata => write!(f, "teridata"),
            KpiFeed::Dane => write!(f, "dane"),
        }
    }
}

/// One measurement of an indicator for a department.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct KpiRecord {
    pub department_code: String,
    pub municipality_code: Option<String>,
    /// The indicator name (or the variable name for the census feed).
    pub indicator: Option<String>,
    pub dimension: Option<String>,
    pub subcategory: Option<String>,
    pub unit: Option<String>,
    /// Missing values do not take part in averages.
    pub numeric_value: Option<f64>,
    pub qualitative_value: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Department {
    pub code: String,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Municipality {
    pub department_code: String,
    pub code: String,
    pub name: Option<String>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedPartyRow {
    pub party: String,
    pub total_votes: u64,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyTotal {
    pub party: String,
    pub total_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TopPartidosReport {
    /// At most [`TOP_PARTIES_LIMIT`] rows, without the excluded party.
    pub data: Vec<RankedPartyRow>,
    /// All the votes in scope, the excluded party included.
    pub total_votes_scope: u64,
    /// Only when both a department and a municipality are in scope.
    pub total_votes_department: Option<u64>,
    pub excluded_party: Option<PartyTotal>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DepartmentWinner {
    /// The code as requested by the caller.
    pub department_code: String,
    pub department: String,
    pub party: String,
    pub total_votes: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PartyShare {
    pub party: String,
    pub votes: u64,
    /// Percentage of the department total, between 0 and 100.
    pub pct: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DepartmentTopParties {
    pub department_code: String,
    pub parties: Vec<PartyShare>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SummaryReport {
    pub year: i32,
    pub winning_by_dept: Vec<DepartmentWinner>,
    /// Despite the name, only the rank 1 party of each department. The
    /// dashboard consumes it under this name.
    pub top5_by_dept: Vec<DepartmentTopParties>,
    pub top5_parties: Vec<PartyTotal>,
    /// (normalized code, display name) of the requested departments.
    pub department_names: Vec<(String, String)>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TrendSeries {
    pub department: String,
    pub department_code: String,
    pub data: Vec<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TrendReport {
    pub years: Vec<i32>,
    pub series: Vec<TrendSeries>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IndicatorGroup {
    pub id: String,
    pub label: String,
    pub full_label: String,
    pub indicator_indices: Vec<usize>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct IndicatorSeries {
    pub department: String,
    pub department_code: String,
    pub data: Vec<f64>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct IndicatorReport {
    pub groups: Vec<IndicatorGroup>,
    pub labels: Vec<String>,
    pub series: Vec<IndicatorSeries>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionSummary {
    pub year: i32,
    pub total_votes: u64,
    pub winning_party: String,
    pub winning_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CorporationSummary {
    pub election_body: String,
    pub total_votes: u64,
    pub winning_party: String,
    pub winning_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct YearCorporations {
    pub year: i32,
    pub corporations: Vec<CorporationSummary>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RecordPage {
    pub data: Vec<VoteRecord>,
    pub page: usize,
    pub limit: usize,
}

// ********* Limits **********

/// Number of rows in the party ranking.
pub const TOP_PARTIES_LIMIT: usize = 7;
/// Number of parties in the cross-department list of the summary.
pub const SUMMARY_TOP_PARTIES: usize = 5;
/// Dimension assigned to indicators that never carry one.
pub const OTHER_DIMENSION: &str = "Otros";
/// Rendered in place of a missing winner name.
pub const NO_WINNER: &str = "—";
pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 2000;

// ********* Errors **********

/// Failure reported by a record source or a directory.
pub type SourceError = Box<dyn Error + Send + Sync>;

/// The report that was being computed when a failure happened.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReportKind {
    Summary,
    Trend,
    TopPartidos,
    Indicators(KpiFeed),
    ElectionsSummary,
    Catalog,
    Records,
    Count,
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Summary => write!(f, "summary"),
            ReportKind::Trend => write!(f, "trend"),
            ReportKind::TopPartidos => write!(f, "top-partidos"),
            ReportKind::Indicators(feed) => write!(f, "{}-indicators", feed),
            ReportKind::ElectionsSummary => write!(f, "elections-summary"),
            ReportKind::Catalog => write!(f, "catalog"),
            ReportKind::Records => write!(f, "records"),
            ReportKind::Count => write!(f, "count"),
        }
    }
}

/// Errors that prevent a report from being computed.
///
/// No partial report is ever returned alongside an error.
#[derive(Debug)]
pub enum ReportError {
    /// The record source or a directory failed.
    Aggregate {
        report: ReportKind,
        source: SourceError,
    },
}

impl ReportError {
    pub(crate) fn aggregate(report: ReportKind) -> impl FnOnce(SourceError) -> ReportError {
        move |source| ReportError::Aggregate { report, source }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReportError::Aggregate { source, .. } => Some(&**source),
        }
    }
}

impl Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Aggregate { report, source } => {
                write!(f, "Error computing the {} report: {}", report, source)
            }
        }
    }
}
