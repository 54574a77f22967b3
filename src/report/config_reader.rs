use std::time::Duration;

use crate::report::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// csv, xlsx or json
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// CSV only. Defaults to a comma.
    pub delimiter: Option<String>,
}

impl FileSource {
    pub fn delimiter_byte(&self) -> BReportResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b','),
            Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
            Some(d) => Err(Box::new(ReportCliError::BadDelimiter {
                delimiter: d.to_string(),
            })),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "voteSources", default)]
    pub vote_sources: Vec<FileSource>,
    #[serde(rename = "teridataSources", default)]
    pub teridata_sources: Vec<FileSource>,
    #[serde(rename = "daneSources", default)]
    pub dane_sources: Vec<FileSource>,
    #[serde(rename = "departmentSources", default)]
    pub department_sources: Vec<FileSource>,
    #[serde(rename = "municipalitySources", default)]
    pub municipality_sources: Vec<FileSource>,
    #[serde(rename = "countCacheTtlSeconds")]
    pub count_cache_ttl_seconds: Option<u64>,
}

impl DatasetConfig {
    pub fn count_cache_ttl(&self) -> Duration {
        self.count_cache_ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_COUNT_TTL)
    }
}

pub fn read_config(path: &str) -> BReportResult<DatasetConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DatasetConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_reference(path: &str) -> BReportResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
