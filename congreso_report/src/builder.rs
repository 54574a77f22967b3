pub use crate::config::*;
use crate::source::Dataset;

/// A builder for assembling an in-memory dataset.
///
/// The command line tool fills one from its input files; tests use it to
/// write small fixtures.
///
/// ```
/// use congreso_report::builder::DatasetBuilder;
/// use congreso_report::{KpiFeed, ReportService};
///
/// let mut builder = DatasetBuilder::new()
///     .departments(&[("05".to_string(), "Antioquia".to_string())]);
///
/// builder.add_vote_simple(2022, "05", "Partido A", 120);
/// builder.add_vote_simple(2022, "5", "Partido B", 80);
/// builder.add_kpi_simple(KpiFeed::Teridata, "05", "Cobertura", 87.5);
///
/// let service = ReportService::new(builder.build());
/// assert_eq!(service.years()?, vec![2022]);
/// # Ok::<(), congreso_report::ReportError>(())
/// ```
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    pub(crate) _dataset: Dataset,
}

impl DatasetBuilder {
    pub fn new() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Replaces the department directory with (code, name) pairs.
    pub fn departments(self, departments: &[(String, String)]) -> DatasetBuilder {
        let mut dataset = self._dataset;
        dataset.departments = departments
            .iter()
            .map(|(code, name)| Department {
                code: code.clone(),
                name: name.clone(),
            })
            .collect();
        DatasetBuilder { _dataset: dataset }
    }

    /// Adds a vote row with only the columns the reports need.
    pub fn add_vote_simple(&mut self, year: i32, department_code: &str, party: &str, votes: u64) {
        self.add_vote(VoteRecord {
            year,
            department_code: department_code.to_string(),
            party: Some(party.to_string()),
            votes,
            ..Default::default()
        })
    }

    pub fn add_vote(&mut self, vote: VoteRecord) {
        self._dataset.votes.push(vote);
    }

    /// Adds a numeric indicator measurement, without dimension or year.
    pub fn add_kpi_simple(&mut self, feed: KpiFeed, department_code: &str, indicator: &str, value: f64) {
        self.add_kpi(
            feed,
            KpiRecord {
                department_code: department_code.to_string(),
                indicator: Some(indicator.to_string()),
                numeric_value: Some(value),
                ..Default::default()
            },
        )
    }

    pub fn add_kpi(&mut self, feed: KpiFeed, kpi: KpiRecord) {
        match feed {
            KpiFeed::Teridata => self._dataset.teridata.push(kpi),
            KpiFeed::Dane => self._dataset.dane.push(kpi),
        }
    }

    pub fn add_department(&mut self, department: Department) {
        self._dataset.departments.push(department);
    }

    pub fn add_municipality(&mut self, municipality: Municipality) {
        self._dataset.municipalities.push(municipality);
    }

    pub fn build(self) -> Dataset {
        self._dataset
    }
}
