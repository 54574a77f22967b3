use clap::Parser;

/// Aggregates electoral results and departmental indicators into the JSON
/// reports of the congress dashboard.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file listing the input files (votes, indicators, departments, municipalities).
    /// For more information about the file format, read the documentation of the congreso_report::manual module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (default summary) The report to compute: summary, trend, top-partidos, teridata-indicators, dane-indicators,
    /// elections-summary, elections-by-corporation, years, corporations, parties, departments, municipalities,
    /// teridata-years, dane-years, records, count.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (integer) The election year. Values that do not start with digits are ignored.
    #[clap(short, long, value_parser)]
    pub year: Option<String>,

    /// The election body (corporación) to restrict the votes to, for example SENADO.
    #[clap(long, value_parser)]
    pub corporation: Option<String>,

    /// (list of comma-separated codes) The departments of the multi-department reports. At most 3 are used.
    #[clap(long, value_parser)]
    pub departments: Option<String>,

    /// The department code of the scope (top-partidos, parties) or of the municipality list.
    #[clap(long, value_parser)]
    pub department: Option<String>,

    /// The municipality code of the scope (top-partidos, parties).
    #[clap(long, value_parser)]
    pub municipality: Option<String>,

    /// A party to leave out of the top-partidos ranking. Its own total is reported separately.
    #[clap(long, value_parser)]
    pub exclude_party: Option<String>,

    /// (default 1) The page of the records report.
    #[clap(long, value_parser)]
    pub page: Option<usize>,

    /// (default 50, at most 2000) The number of rows per page of the records report.
    #[clap(long, value_parser)]
    pub limit: Option<usize>,

    /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected report in JSON format. If provided, congreso-report will
    /// check that the computed report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
