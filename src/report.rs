use log::{debug, info, warn};

use congreso_report::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::config_reader::*;
use crate::report::io_common::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_json;

#[derive(Debug, Snafu)]
pub enum ReportCliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("{path}: expected an array of objects"))]
    JsonRecordsShape { path: String },

    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("{path}: the workbook has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("{path}: missing worksheet {worksheet}"))]
    MissingWorksheet { path: String, worksheet: String },

    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("{path}: error reading line {lineno}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("The delimiter should be a single character, got {delimiter:?}"))]
    BadDelimiter { delimiter: String },

    #[snafu(display("{path}: missing column {column}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("{path}, line {lineno}: cannot read {column} from {content:?}"))]
    BadCell {
        path: String,
        lineno: u64,
        column: String,
        content: String,
    },
    #[snafu(display("Unknown provider {provider}"))]
    UnknownProvider { provider: String },

    #[snafu(display("Unknown report {name}"))]
    UnknownReport { name: String },
    #[snafu(display("The {report} report requires the --{argument} option"))]
    MissingArgument { report: String, argument: String },
    #[snafu(display("The configuration path has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Aggregation { source: ReportError },

    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the computed report and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportCliError>;
pub type BReportResult<T> = Result<T, Box<ReportCliError>>;

// ********* Loading **********

fn check_sources(config: &DatasetConfig) -> ReportResult<()> {
    if config.vote_sources.is_empty()
        && config.teridata_sources.is_empty()
        && config.dane_sources.is_empty()
    {
        whatever!("No vote or indicator file source detected");
    }
    Ok(())
}

fn read_rows(root_path: &Path, cfs: &FileSource) -> BReportResult<(String, Vec<Row>)> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let path = p.as_path().display().to_string();
    info!("Attempting to read file {:?} ({})", path, cfs.provider);
    let rows = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_rows(&path, cfs)?,
        "xlsx" | "excel" => io_excel::read_excel_rows(&path, cfs)?,
        "json" => io_json::read_json_rows(&path)?,
        x => {
            return Err(Box::new(ReportCliError::UnknownProvider {
                provider: x.to_string(),
            }))
        }
    };
    info!("read_rows: {}: {} rows", path, rows.len());
    Ok((path, rows))
}

/// Materializes every configured file into a dataset.
pub fn load_dataset(root_path: &Path, config: &DatasetConfig) -> BReportResult<Dataset> {
    check_sources(config)?;
    let mut builder = builder::DatasetBuilder::new();

    for cfs in config.vote_sources.iter() {
        let (path, rows) = read_rows(root_path, cfs)?;
        for row in rows.iter() {
            builder.add_vote(read_vote(&path, row)?);
        }
    }
    for (feed, sources) in [
        (KpiFeed::Teridata, &config.teridata_sources),
        (KpiFeed::Dane, &config.dane_sources),
    ] {
        for cfs in sources.iter() {
            let (path, rows) = read_rows(root_path, cfs)?;
            for row in rows.iter() {
                builder.add_kpi(feed, read_kpi(&path, feed, row)?);
            }
        }
    }
    for cfs in config.department_sources.iter() {
        let (path, rows) = read_rows(root_path, cfs)?;
        for row in rows.iter() {
            builder.add_department(read_department(&path, row)?);
        }
    }
    for cfs in config.municipality_sources.iter() {
        let (path, rows) = read_rows(root_path, cfs)?;
        for row in rows.iter() {
            builder.add_municipality(read_municipality(&path, row)?);
        }
    }

    let dataset = builder.build();
    info!(
        "load_dataset: {} votes, {} teridata, {} dane, {} departments, {} municipalities",
        dataset.votes.len(),
        dataset.teridata.len(),
        dataset.dane.len(),
        dataset.departments.len(),
        dataset.municipalities.len()
    );
    Ok(dataset)
}

// ********* Output shapes **********

fn party_total_to_json(p: &PartyTotal) -> JSValue {
    json!({"partyName": p.party, "totalVotes": p.total_votes})
}

fn summary_to_json(s: &SummaryReport) -> JSValue {
    let winning: Vec<JSValue> = s
        .winning_by_dept
        .iter()
        .map(|w| {
            json!({
                "codigo_departamento": w.department_code,
                "department": w.department,
                "partyName": w.party,
                "totalVotes": w.total_votes,
            })
        })
        .collect();
    let mut top_by_dept: JSMap<String, JSValue> = JSMap::new();
    for d in s.top5_by_dept.iter() {
        let parties: Vec<JSValue> = d
            .parties
            .iter()
            .map(|p| json!({"partyName": p.party, "votes": p.votes, "pct": p.pct}))
            .collect();
        top_by_dept.insert(d.department_code.clone(), json!(parties));
    }
    let mut names: JSMap<String, JSValue> = JSMap::new();
    for (code, name) in s.department_names.iter() {
        names.insert(code.clone(), json!(name));
    }
    let top: Vec<JSValue> = s.top5_parties.iter().map(party_total_to_json).collect();
    json!({
        "year": s.year,
        "winningByDept": winning,
        "top5ByDept": top_by_dept,
        "top5Parties": top,
        "departmentNames": names,
    })
}

fn trend_to_json(t: &TrendReport) -> JSValue {
    let series: Vec<JSValue> = t
        .series
        .iter()
        .map(|s| {
            json!({
                "department": s.department,
                "codigo_departamento": s.department_code,
                "data": s.data,
            })
        })
        .collect();
    json!({"years": t.years, "series": series})
}

fn top_partidos_to_json(t: &TopPartidosReport) -> JSValue {
    let data: Vec<JSValue> = t
        .data
        .iter()
        .map(|r| json!({"partido": r.party, "totalVotos": r.total_votes, "rank": r.rank}))
        .collect();
    let mut res: JSMap<String, JSValue> = JSMap::new();
    res.insert("data".to_string(), json!(data));
    res.insert("totalVotosAmbito".to_string(), json!(t.total_votes_scope));
    if let Some(total) = t.total_votes_department {
        res.insert("totalVotosDepartamento".to_string(), json!(total));
    }
    if let Some(p) = &t.excluded_party {
        res.insert(
            "excludedParty".to_string(),
            json!({"name": p.party, "totalVotos": p.total_votes}),
        );
    }
    JSValue::Object(res)
}

fn indicators_to_json(r: &IndicatorReport) -> JSValue {
    let groups: Vec<JSValue> = r
        .groups
        .iter()
        .map(|g| {
            json!({
                "id": g.id,
                "label": g.label,
                "fullLabel": g.full_label,
                "indicatorIndices": g.indicator_indices,
            })
        })
        .collect();
    let series: Vec<JSValue> = r
        .series
        .iter()
        .map(|s| {
            json!({
                "department": s.department,
                "codigo_departamento": s.department_code,
                "data": s.data,
            })
        })
        .collect();
    json!({"groups": groups, "labels": r.labels, "series": series})
}

fn elections_to_json(summaries: &[ElectionSummary]) -> JSValue {
    let l: Vec<JSValue> = summaries
        .iter()
        .map(|s| {
            json!({
                "year": s.year,
                "totalVotos": s.total_votes,
                "partidoGanador": s.winning_party,
                "votosPartidoGanador": s.winning_votes,
            })
        })
        .collect();
    json!({ "summaries": l })
}

fn elections_by_corporation_to_json(summaries: &[YearCorporations]) -> JSValue {
    let l: Vec<JSValue> = summaries
        .iter()
        .map(|y| {
            let corporations: Vec<JSValue> = y
                .corporations
                .iter()
                .map(|c| {
                    json!({
                        "corporacion": c.election_body,
                        "totalVotos": c.total_votes,
                        "partidoGanador": c.winning_party,
                        "votosPartidoGanador": c.winning_votes,
                    })
                })
                .collect();
            json!({"year": y.year, "corporations": corporations})
        })
        .collect();
    json!({ "summaries": l })
}

fn vote_to_json(v: &VoteRecord) -> JSValue {
    json!({
        "id": v.id,
        "anio_eleccion": v.year,
        "corporacion": v.election_body,
        "circunscripcion": v.circumscription,
        "circ_rep": v.circ_rep,
        "codigo_departamento": v.department_code,
        "codigo_divipola": v.municipality_code,
        "nombre_puesto": v.polling_place,
        "comuna": v.commune,
        "mesa": v.table,
        "votos": v.votes,
        "partido": v.party,
        "nombre_candidato": v.candidate,
        "origen": v.source,
        "fecha_carga": v.load_date,
    })
}

// ********* Reports **********

fn scope_from_args(args: &Args) -> ScopeFilter {
    ScopeFilter::new()
        .year(args.year.as_deref().and_then(parse_year))
        .election_body(args.corporation.as_deref())
        .department(args.department.as_deref())
        .municipality(args.municipality.as_deref())
        .exclude_party(args.exclude_party.as_deref())
}

fn codes_from_args(args: &Args) -> DepartmentCodes {
    DepartmentCodes::parse(args.departments.as_deref().unwrap_or(""))
}

/// The requested year, or the most recent election year of the dataset.
fn summary_year<S>(service: &ReportService<S>, args: &Args) -> BReportResult<i32>
where
    S: RecordSource + DepartmentDirectory + MunicipalityDirectory,
{
    if let Some(y) = args.year.as_deref().and_then(parse_year) {
        return Ok(y);
    }
    let years = service.years().context(AggregationSnafu {})?;
    let latest = years.last().cloned().context(MissingArgumentSnafu {
        report: "summary",
        argument: "year",
    })?;
    debug!("summary_year: no year given, using {}", latest);
    Ok(latest)
}

/// Computes one report and returns its dashboard JSON.
pub fn compute_report<S>(service: &ReportService<S>, name: &str, args: &Args) -> BReportResult<JSValue>
where
    S: RecordSource + DepartmentDirectory + MunicipalityDirectory,
{
    info!("compute_report: {}", name);
    let agg = AggregationSnafu {};
    let res = match name {
        "summary" => {
            let year = summary_year(service, args)?;
            let scope = ScopeFilter::new().election_body(args.corporation.as_deref());
            summary_to_json(&service.summary(year, &codes_from_args(args), &scope).context(agg)?)
        }
        "trend" => {
            let scope = ScopeFilter::new().election_body(args.corporation.as_deref());
            trend_to_json(&service.trend(&codes_from_args(args), &scope).context(agg)?)
        }
        "top-partidos" => {
            top_partidos_to_json(&service.top_partidos(&scope_from_args(args)).context(agg)?)
        }
        "teridata-indicators" | "dane-indicators" => {
            let feed = if name == "dane-indicators" {
                KpiFeed::Dane
            } else {
                KpiFeed::Teridata
            };
            let year = args.year.as_deref().and_then(parse_year);
            indicators_to_json(&service.indicators(feed, &codes_from_args(args), year).context(agg)?)
        }
        "elections-summary" => elections_to_json(&service.elections_summary().context(agg)?),
        "elections-by-corporation" => {
            elections_by_corporation_to_json(&service.elections_by_corporation().context(agg)?)
        }
        "years" => json!({"years": service.years().context(agg)?}),
        "teridata-years" => json!({"years": service.kpi_years(KpiFeed::Teridata).context(agg)?}),
        "dane-years" => json!({"years": service.kpi_years(KpiFeed::Dane).context(agg)?}),
        "corporations" => json!({"corporations": service.corporations().context(agg)?}),
        "parties" => {
            let scope = scope_from_args(args).without_exclusion();
            let parties: Vec<JSValue> = service
                .parties(&scope)
                .context(agg)?
                .iter()
                .map(|p| json!({ "partido": p }))
                .collect();
            json!({ "parties": parties })
        }
        "departments" => {
            let departments: Vec<JSValue> = service
                .departments()
                .context(agg)?
                .iter()
                .map(|d| json!({"codigo_departamento": d.code, "nombre": d.name}))
                .collect();
            json!({ "departments": departments })
        }
        "municipalities" => {
            let code = args.department.clone().unwrap_or_default();
            let municipalities: Vec<JSValue> = service
                .municipalities(&code)
                .context(agg)?
                .iter()
                .map(|m| json!({"codigo_divipola": m.code, "nombre": m.name}))
                .collect();
            json!({ "municipalities": municipalities })
        }
        "records" => {
            let page = service.records_page(args.page, args.limit).context(agg)?;
            let data: Vec<JSValue> = page.data.iter().map(vote_to_json).collect();
            json!({"data": data, "page": page.page, "limit": page.limit})
        }
        "count" => json!({"total": service.count().context(agg)?}),
        x => {
            return Err(Box::new(ReportCliError::UnknownReport {
                name: x.to_string(),
            }))
        }
    };
    Ok(res)
}

fn output_path(root_path: &Path, config: &DatasetConfig, report: &str, args: &Args) -> Option<String> {
    match args.out.as_deref() {
        Some("stdout") | Some("") => None,
        Some(p) => Some(p.to_string()),
        None => config.output_settings.output_directory.as_ref().map(|dir| {
            let file_name = format!("{}_{}.json", config.output_settings.report_name, report);
            root_path.join(dir).join(file_name).display().to_string()
        }),
    }
}

fn check_reference(reference_path: &str, pretty_js: &str) -> BReportResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_js_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        return Err(Box::new(ReportCliError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    Ok(())
}

pub fn run_report(args: &Args) -> BReportResult<()> {
    let config = read_config(&args.config)?;
    info!("config: {:?}", config);
    let root_path = Path::new(args.config.as_str())
        .parent()
        .context(MissingParentDirSnafu {})?;

    let dataset = load_dataset(root_path, &config)?;
    let service = ReportService::with_cache(dataset, CountCache::new(config.count_cache_ttl()));

    let report = args.report.clone().unwrap_or_else(|| "summary".to_string());
    let result_js = compute_report(&service, report.as_str(), args)?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match output_path(root_path, &config, &report, args) {
        Some(path) => {
            info!("Writing report to {}", path);
            fs::write(&path, &pretty_js).context(WritingOutputSnafu { path: path.clone() })?;
        }
        None => println!("{}", pretty_js),
    }

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }
    Ok(())
}

#[cfg(test)]
fn run_report_test(config_name: &str, args: Args) -> JSValue {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = option_env!("CONGRESO_TEST_DIR").unwrap_or("./tests/data");
    let config_path = format!("{}/{}", test_dir, config_name);
    let config = match read_config(&config_path) {
        Ok(c) => c,
        Err(e) => panic!("could not read {}: {}", config_path, e),
    };
    let root_path = Path::new(&config_path).parent().unwrap_or_else(|| Path::new("."));
    let dataset = match load_dataset(root_path, &config) {
        Ok(d) => d,
        Err(e) => panic!("could not load {}: {}", config_path, e),
    };
    let report = args.report.clone().unwrap_or_else(|| "summary".to_string());
    let service = ReportService::new(dataset);
    match compute_report(&service, &report, &args) {
        Ok(js) => js,
        Err(e) => panic!("report {} failed: {}", report, e),
    }
}

/// Runs a report over the fixtures and compares it with the expected output
/// stored next to them.
#[cfg(test)]
pub fn test_wrapper(report: &str, args: Args) {
    let test_dir = option_env!("CONGRESO_TEST_DIR").unwrap_or("./tests/data");
    let args = Args {
        report: Some(report.to_string()),
        ..args
    };
    let computed = run_report_test("dashboard_config.json", args);
    let pretty_js = serde_json::to_string_pretty(&computed).unwrap();
    let reference_path = format!("{}/{}_expected.json", test_dir, report);
    if let Err(e) = check_reference(&reference_path, &pretty_js) {
        panic!("{}:\n{}", e, pretty_js);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            config: "tests/data/dashboard_config.json".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn summary() {
        test_wrapper(
            "summary",
            Args {
                year: Some("2022".to_string()),
                departments: Some("05,08,05,11".to_string()),
                ..args()
            },
        );
    }

    #[test]
    fn trend() {
        test_wrapper(
            "trend",
            Args {
                departments: Some("5,11".to_string()),
                ..args()
            },
        );
    }

    #[test]
    fn top_partidos() {
        test_wrapper(
            "top-partidos",
            Args {
                year: Some("2022".to_string()),
                department: Some("05".to_string()),
                municipality: Some("05001".to_string()),
                exclude_party: Some("PARTIDO VERDE".to_string()),
                ..args()
            },
        );
    }

    #[test]
    fn teridata_indicators() {
        test_wrapper(
            "teridata-indicators",
            Args {
                departments: Some("05,08".to_string()),
                ..args()
            },
        );
    }

    #[test]
    fn elections_summary() {
        test_wrapper("elections-summary", args());
    }

    #[test]
    fn catalogs() {
        let js = run_report_test(
            "dashboard_config.json",
            Args {
                report: Some("corporations".to_string()),
                ..args()
            },
        );
        assert_eq!(js, json!({"corporations": ["CAMARA", "SENADO"]}));

        let js = run_report_test(
            "dashboard_config.json",
            Args {
                report: Some("municipalities".to_string()),
                department: Some("5".to_string()),
                ..args()
            },
        );
        assert_eq!(
            js,
            json!({"municipalities": [
                {"codigo_divipola": "05088", "nombre": "BELLO"},
                {"codigo_divipola": "05001", "nombre": "MEDELLIN"},
            ]})
        );

        let js = run_report_test(
            "dashboard_config.json",
            Args {
                report: Some("count".to_string()),
                ..args()
            },
        );
        assert_eq!(js, json!({"total": 8}));
    }

    #[test]
    fn records_page() {
        let js = run_report_test(
            "dashboard_config.json",
            Args {
                report: Some("records".to_string()),
                page: Some(0),
                limit: Some(2),
                ..args()
            },
        );
        assert_eq!(js["page"], json!(1));
        assert_eq!(js["limit"], json!(2));
        let data = js["data"].as_array().cloned().unwrap_or_default();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["anio_eleccion"], json!(2022));
        assert_eq!(data[0]["votos"], json!(1500));
    }

    #[test]
    #[should_panic(expected = "Unknown report")]
    fn unknown_report() {
        run_report_test(
            "dashboard_config.json",
            Args {
                report: Some("winners".to_string()),
                ..args()
            },
        );
    }
}
