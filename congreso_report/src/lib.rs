/*!
Aggregation core for electoral results and departmental indicator dashboards.

Raw vote rows and indicator measurements are filtered by a scope, ranked,
and grouped into the shapes a dashboard renders directly: winners per
department, vote trends, party rankings and indicator charts.

See the [manual] for the list of reports and the input formats of the
command line tool.

```
use congreso_report::builder::DatasetBuilder;
use congreso_report::{DepartmentCodes, ReportService, ScopeFilter};

let mut builder = DatasetBuilder::new();
builder.add_vote_simple(2022, "05", "Partido A", 100);
builder.add_vote_simple(2022, "5", "Partido B", 150);
let service = ReportService::new(builder.build());

let summary = service.summary(2022, &DepartmentCodes::parse("05"), &ScopeFilter::new())?;
assert_eq!(summary.winning_by_dept[0].party, "Partido B");
# Ok::<(), congreso_report::ReportError>(())
```
*/

mod cache;
mod catalog;
mod codes;
mod config;
mod elections;
mod indicators;
mod ranking;
mod scope;
mod source;
mod summary;
mod top_partidos;
mod trend;

pub mod builder;
pub mod manual;

use log::info;

pub use crate::cache::{Clock, CountCache, ManualClock, SystemClock, DEFAULT_COUNT_TTL};
pub use crate::catalog::page_bounds;
pub use crate::codes::{equivalent, normalize, parse_year, CodeMatch, DepartmentCodes, MAX_DEPARTMENTS};
pub use crate::config::*;
pub use crate::indicators::{short_label, slug, SHORT_LABEL_MAX};
pub use crate::ranking::{rank, rank_all, top_n, winners, RankedRow};
pub use crate::scope::{filter_records, matches_all, Clause, ScopeFilter, Scoped};
pub use crate::source::{
    Dataset, DepartmentDirectory, DepartmentNames, MunicipalityDirectory, RecordSource,
};

/// Runs the reports over one source.
///
/// The service owns the cache of the record count; everything else is
/// recomputed from the source on every call.
pub struct ReportService<S> {
    source: S,
    count_cache: CountCache,
}

impl<S> ReportService<S>
where
    S: RecordSource + DepartmentDirectory + MunicipalityDirectory,
{
    pub fn new(source: S) -> ReportService<S> {
        ReportService::with_cache(source, CountCache::default())
    }

    pub fn with_cache(source: S, count_cache: CountCache) -> ReportService<S> {
        ReportService {
            source,
            count_cache,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn summary(
        &self,
        year: i32,
        codes: &DepartmentCodes,
        scope: &ScopeFilter,
    ) -> Result<SummaryReport, ReportError> {
        summary::build_summary(&self.source, year, codes, scope)
    }

    pub fn trend(
        &self,
        codes: &DepartmentCodes,
        scope: &ScopeFilter,
    ) -> Result<TrendReport, ReportError> {
        trend::build_trend(&self.source, codes, scope)
    }

    pub fn top_partidos(&self, scope: &ScopeFilter) -> Result<TopPartidosReport, ReportError> {
        top_partidos::build_top_partidos(&self.source, scope)
    }

    pub fn indicators(
        &self,
        feed: KpiFeed,
        codes: &DepartmentCodes,
        year: Option<i32>,
    ) -> Result<IndicatorReport, ReportError> {
        indicators::build_indicator_series(&self.source, feed, codes, year)
    }

    pub fn elections_summary(&self) -> Result<Vec<ElectionSummary>, ReportError> {
        elections::elections_summary(&self.source)
    }

    pub fn elections_by_corporation(&self) -> Result<Vec<YearCorporations>, ReportError> {
        elections::elections_by_corporation(&self.source)
    }

    pub fn years(&self) -> Result<Vec<i32>, ReportError> {
        catalog::years(&self.source)
    }

    pub fn corporations(&self) -> Result<Vec<String>, ReportError> {
        catalog::corporations(&self.source)
    }

    pub fn parties(&self, scope: &ScopeFilter) -> Result<Vec<String>, ReportError> {
        catalog::parties(&self.source, scope)
    }

    pub fn departments(&self) -> Result<Vec<Department>, ReportError> {
        catalog::departments(&self.source)
    }

    pub fn municipalities(&self, department_code: &str) -> Result<Vec<Municipality>, ReportError> {
        catalog::municipalities(&self.source, department_code)
    }

    pub fn kpi_years(&self, feed: KpiFeed) -> Result<Vec<i32>, ReportError> {
        catalog::kpi_years(&self.source, feed)
    }

    pub fn records_page(
        &self,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<RecordPage, ReportError> {
        catalog::records_page(&self.source, page, limit)
    }

    /// Number of vote records. Served from the cache while it is fresh.
    pub fn count(&self) -> Result<u64, ReportError> {
        let res = self
            .count_cache
            .get_or_refresh(|| self.source.count_vote_records())
            .map_err(ReportError::aggregate(ReportKind::Count))?;
        info!("count: {}", res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::builder::DatasetBuilder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn vote(year: i32, dept: &str, muni: &str, party: &str, votes: u64) -> VoteRecord {
        VoteRecord {
            year,
            election_body: Some("SENADO".to_string()),
            department_code: dept.to_string(),
            municipality_code: muni.to_string(),
            party: Some(party.to_string()),
            votes,
            ..Default::default()
        }
    }

    fn kpi(dept: &str, indicator: &str, dimension: Option<&str>, value: f64) -> KpiRecord {
        KpiRecord {
            department_code: dept.to_string(),
            indicator: Some(indicator.to_string()),
            dimension: dimension.map(|s| s.to_string()),
            numeric_value: Some(value),
            year: Some(2023),
            ..Default::default()
        }
    }

    fn service() -> ReportService<Dataset> {
        let mut b = DatasetBuilder::new().departments(&[
            ("05".to_string(), "Antioquia".to_string()),
            ("11".to_string(), "Bogotá D.C.".to_string()),
            ("76".to_string(), "Valle del Cauca".to_string()),
        ]);
        b.add_vote(vote(2018, "05", "05001", "PartyA", 40));
        b.add_vote(vote(2022, "05", "05001", "PartyA", 100));
        b.add_vote(vote(2022, "5", "05088", "PartyB", 150));
        b.add_vote(vote(2022, "11", "11001", "PartyC", 70));
        b.add_vote(vote(2022, "11", "11001", "PartyX", 30));
        b.add_vote(vote(2014, "76", "76001", "PartyA", 9));
        b.add_kpi(KpiFeed::Teridata, kpi("05", "Cobertura", Some("Educación"), 10.0));
        b.add_kpi(KpiFeed::Teridata, kpi("5", "Cobertura", None, 20.0));
        b.add_kpi(KpiFeed::Teridata, kpi("11", "Mortalidad", Some("Salud"), 4.0));
        b.add_kpi(KpiFeed::Teridata, kpi("11", "Recaudo", None, 1.5));
        b.add_kpi(KpiFeed::Dane, kpi("05", "Población", None, 6_000_000.0));
        ReportService::new(b.build())
    }

    #[test]
    fn summary_single_department() {
        init();
        let s = service();
        let res = s
            .summary(2022, &DepartmentCodes::parse("05"), &ScopeFilter::new())
            .unwrap();
        assert_eq!(
            res.winning_by_dept,
            vec![DepartmentWinner {
                department_code: "05".to_string(),
                department: "Antioquia".to_string(),
                party: "PartyB".to_string(),
                total_votes: 150,
            }]
        );
        assert_eq!(res.top5_by_dept.len(), 1);
        assert_eq!(
            res.top5_by_dept[0].parties,
            vec![PartyShare {
                party: "PartyB".to_string(),
                votes: 150,
                pct: 100.0 * 150.0 / 250.0,
            }]
        );
        let top: Vec<(&str, u64)> = res
            .top5_parties
            .iter()
            .map(|p| (p.party.as_str(), p.total_votes))
            .collect();
        assert_eq!(top, vec![("PartyB", 150), ("PartyA", 100)]);
        assert_eq!(res.department_names, vec![("5".to_string(), "Antioquia".to_string())]);
    }

    #[test]
    fn summary_share_of_department_total() {
        init();
        let mut b = DatasetBuilder::new();
        b.add_vote_simple(2022, "05", "PartyA", 100);
        b.add_vote_simple(2022, "05", "PartyB", 150);
        let s = ReportService::new(b.build());
        let res = s
            .summary(2022, &DepartmentCodes::parse("05"), &ScopeFilter::new())
            .unwrap();
        assert_eq!(res.winning_by_dept[0].party, "PartyB");
        assert_eq!(res.winning_by_dept[0].total_votes, 150);
        // Department unknown to the directory: the code is shown.
        assert_eq!(res.winning_by_dept[0].department, "05");
        let parties = &res.top5_by_dept[0].parties;
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].party, "PartyB");
        assert_eq!(parties[0].pct, 100.0 * 150.0 / 250.0);
    }

    #[test]
    fn summary_without_departments() {
        let res = service()
            .summary(2022, &DepartmentCodes::parse(" , "), &ScopeFilter::new())
            .unwrap();
        assert_eq!(res.year, 2022);
        assert!(res.winning_by_dept.is_empty());
        assert!(res.top5_by_dept.is_empty());
        assert!(res.top5_parties.is_empty());
    }

    #[test]
    fn department_cap() {
        let s = service();
        let codes = DepartmentCodes::parse("76,11,76,05,99,13");
        let res = s.trend(&codes, &ScopeFilter::new()).unwrap();
        let series: Vec<&str> = res.series.iter().map(|x| x.department_code.as_str()).collect();
        assert_eq!(series, vec!["76", "11", "05"]);
    }

    #[test]
    fn trend_zeros_and_year_span() {
        init();
        let s = service();
        let res = s.trend(&DepartmentCodes::parse("11"), &ScopeFilter::new()).unwrap();
        assert_eq!(res.years, vec![2014, 2018, 2022]);
        assert_eq!(res.series.len(), 1);
        assert_eq!(res.series[0].department, "Bogotá D.C.");
        assert_eq!(res.series[0].data, vec![0, 0, 100]);

        let res = s.trend(&DepartmentCodes::parse("005"), &ScopeFilter::new()).unwrap();
        assert_eq!(res.series[0].department_code, "005");
        assert_eq!(res.series[0].data, vec![0, 40, 250]);
    }

    #[test]
    fn trend_election_body() {
        let s = service();
        let scope = ScopeFilter::new().election_body(Some("CAMARA"));
        let res = s.trend(&DepartmentCodes::parse("05"), &scope).unwrap();
        assert_eq!(res.years, vec![2014, 2018, 2022]);
        assert_eq!(res.series[0].data, vec![0, 0, 0]);
    }

    #[test]
    fn top_partidos_exclusion() {
        init();
        let s = service();
        let scope = ScopeFilter::new().year(Some(2022)).exclude_party(Some("PartyX"));
        let res = s.top_partidos(&scope).unwrap();
        let names: Vec<&str> = res.data.iter().map(|r| r.party.as_str()).collect();
        assert_eq!(names, vec!["PartyB", "PartyA", "PartyC"]);
        assert_eq!(res.data[0].rank, 1);
        assert_eq!(res.total_votes_scope, 350);
        assert_eq!(res.total_votes_department, None);
        assert_eq!(
            res.excluded_party,
            Some(PartyTotal {
                party: "PartyX".to_string(),
                total_votes: 30,
            })
        );

        let plain = s.top_partidos(&ScopeFilter::new().year(Some(2022))).unwrap();
        assert_eq!(plain.total_votes_scope, res.total_votes_scope);
        assert_eq!(plain.data.len(), 4);
        assert_eq!(plain.excluded_party, None);
    }

    #[test]
    fn top_partidos_department_total() {
        let s = service();
        let scope = ScopeFilter::new()
            .year(Some(2022))
            .department(Some("05"))
            .municipality(Some("5001"));
        let res = s.top_partidos(&scope).unwrap();
        assert_eq!(res.total_votes_scope, 100);
        assert_eq!(res.total_votes_department, Some(250));
        assert_eq!(res.data.len(), 1);
    }

    #[test]
    fn top_partidos_limit() {
        let mut b = DatasetBuilder::new();
        for i in 0..10u64 {
            b.add_vote_simple(2022, "05", &format!("P{}", i), 10 + i);
        }
        let res = ReportService::new(b.build())
            .top_partidos(&ScopeFilter::new())
            .unwrap();
        assert_eq!(res.data.len(), TOP_PARTIES_LIMIT);
        assert_eq!(res.data[0].party, "P9");
        assert_eq!(res.data[6].rank, 7);
    }

    #[test]
    fn equivalent_codes_share_records() {
        init();
        let mut b = DatasetBuilder::new();
        b.add_vote_simple(2022, "05", "PartyA", 100);
        b.add_vote_simple(2022, "11", "PartyB", 40);
        b.add_vote_simple(2022, "05", "  ", 500);
        b.add_kpi_simple(KpiFeed::Teridata, "05", "Cobertura", 10.0);
        let s = ReportService::new(b.build());
        let codes = DepartmentCodes::parse("05,5,11");

        let trend = s.trend(&codes, &ScopeFilter::new()).unwrap();
        let data: Vec<Vec<u64>> = trend.series.iter().map(|x| x.data.clone()).collect();
        assert_eq!(data, vec![vec![100], vec![100], vec![40]]);

        let summary = s.summary(2022, &codes, &ScopeFilter::new()).unwrap();
        let winners: Vec<(&str, &str, u64)> = summary
            .winning_by_dept
            .iter()
            .map(|w| (w.department_code.as_str(), w.party.as_str(), w.total_votes))
            .collect();
        assert_eq!(
            winners,
            vec![("05", "PartyA", 100), ("5", "PartyA", 100), ("11", "PartyB", 40)]
        );
        assert_eq!(summary.top5_by_dept[1].parties.len(), 1);
        assert_eq!(summary.top5_by_dept[1].parties[0].pct, 100.0);
        // Each record is counted once across departments.
        let top: Vec<(&str, u64)> = summary
            .top5_parties
            .iter()
            .map(|p| (p.party.as_str(), p.total_votes))
            .collect();
        assert_eq!(top, vec![("PartyA", 100), ("PartyB", 40)]);

        let ind = s.indicators(KpiFeed::Teridata, &codes, None).unwrap();
        let data: Vec<Vec<f64>> = ind.series.iter().map(|x| x.data.clone()).collect();
        assert_eq!(data, vec![vec![10.0], vec![10.0], vec![0.0]]);
    }

    #[test]
    fn indicator_averaging() {
        init();
        let s = service();
        let res = s
            .indicators(KpiFeed::Teridata, &DepartmentCodes::parse("05,11"), None)
            .unwrap();
        assert_eq!(res.labels, vec!["Cobertura", "Mortalidad", "Recaudo"]);
        assert_eq!(res.series[0].department, "Antioquia");
        assert_eq!(res.series[0].data, vec![15.0, 0.0, 0.0]);
        assert_eq!(res.series[1].data, vec![0.0, 4.0, 1.5]);
        let groups: Vec<(&str, Vec<usize>)> = res
            .groups
            .iter()
            .map(|g| (g.label.as_str(), g.indicator_indices.clone()))
            .collect();
        assert_eq!(
            groups,
            vec![("Educación", vec![0]), ("Otros", vec![2]), ("Salud", vec![1])]
        );
        assert_eq!(res.groups[0].id, "educacin");
    }

    #[test]
    fn indicator_year_and_feed() {
        let s = service();
        let none = s
            .indicators(KpiFeed::Teridata, &DepartmentCodes::parse("05"), Some(2020))
            .unwrap();
        assert!(none.labels.is_empty());
        assert!(none.groups.is_empty());
        assert_eq!(none.series[0].data, Vec::<f64>::new());

        let dane = s
            .indicators(KpiFeed::Dane, &DepartmentCodes::parse("05"), Some(2023))
            .unwrap();
        assert_eq!(dane.labels, vec!["Población"]);
        assert_eq!(dane.groups[0].full_label, OTHER_DIMENSION);
    }

    #[test]
    fn idempotence() {
        let s = service();
        let codes = DepartmentCodes::parse("05,11");
        let scope = ScopeFilter::new().year(Some(2022));
        assert_eq!(s.summary(2022, &codes, &scope).unwrap(), s.summary(2022, &codes, &scope).unwrap());
        assert_eq!(s.trend(&codes, &scope).unwrap(), s.trend(&codes, &scope).unwrap());
        assert_eq!(s.top_partidos(&scope).unwrap(), s.top_partidos(&scope).unwrap());
        assert_eq!(
            s.indicators(KpiFeed::Teridata, &codes, None).unwrap(),
            s.indicators(KpiFeed::Teridata, &codes, None).unwrap()
        );
    }

    struct CountingSource {
        dataset: Dataset,
        calls: AtomicU64,
        fail: bool,
    }

    impl RecordSource for CountingSource {
        fn vote_records(&self, clauses: &[Clause]) -> Result<Vec<VoteRecord>, SourceError> {
            if self.fail {
                return Err("connection refused".into());
            }
            self.dataset.vote_records(clauses)
        }

        fn kpi_records(&self, feed: KpiFeed, clauses: &[Clause]) -> Result<Vec<KpiRecord>, SourceError> {
            self.dataset.kpi_records(feed, clauses)
        }

        fn count_vote_records(&self) -> Result<u64, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("connection refused".into());
            }
            self.dataset.count_vote_records()
        }
    }

    impl DepartmentDirectory for CountingSource {
        fn list_all(&self) -> Result<Vec<Department>, SourceError> {
            self.dataset.list_all()
        }
    }

    impl MunicipalityDirectory for CountingSource {
        fn list_by_department(&self, code: &str) -> Result<Vec<Municipality>, SourceError> {
            self.dataset.list_by_department(code)
        }
    }

    #[test]
    fn count_is_cached() {
        let clock = Arc::new(ManualClock::new());
        let src = CountingSource {
            dataset: service().source().clone(),
            calls: AtomicU64::new(0),
            fail: false,
        };
        let cache = CountCache::with_clock(Duration::from_secs(60), clock.clone());
        let s = ReportService::with_cache(src, cache);
        assert_eq!(s.count().unwrap(), 6);
        assert_eq!(s.count().unwrap(), 6);
        assert_eq!(s.source().calls.load(Ordering::SeqCst), 1);
        clock.advance(Duration::from_secs(61));
        assert_eq!(s.count().unwrap(), 6);
        assert_eq!(s.source().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn source_failure() {
        let src = CountingSource {
            dataset: Dataset::default(),
            calls: AtomicU64::new(0),
            fail: true,
        };
        let s = ReportService::new(src);
        let err = s.top_partidos(&ScopeFilter::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error computing the top-partidos report: connection refused"
        );
        let err = s.trend(&DepartmentCodes::parse("05"), &ScopeFilter::new()).unwrap_err();
        assert_eq!(err.to_string(), "Error computing the trend report: connection refused");
        match s.count() {
            Err(ReportError::Aggregate { report, .. }) => assert_eq!(report, ReportKind::Count),
            Ok(_) => panic!("count should fail"),
        }
    }
}
