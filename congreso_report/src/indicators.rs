use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use log::{debug, info};

use crate::codes::DepartmentCodes;
use crate::config::*;
use crate::scope::Clause;
use crate::source::{DepartmentDirectory, DepartmentNames, RecordSource};

/// Maximum length of a group label.
pub const SHORT_LABEL_MAX: usize = 22;
const SHORT_LABEL_WORDS: usize = 3;

/// URL-safe identifier: lower case, whitespace runs become `-`, anything
/// else outside `[a-z0-9-]` is dropped.
pub fn slug(s: &str) -> String {
    let mut res = String::new();
    let mut in_space = false;
    for c in s.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                res.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            res.push(c);
        }
    }
    res
}

/// A label of at most `max_len` characters for the chart legend.
///
/// Short names are kept whole. Longer ones keep their first three words,
/// cut with an ellipsis if those are still too long.
pub fn short_label(s: &str, max_len: usize) -> String {
    let t = s.trim();
    if t.chars().count() <= max_len {
        return t.to_string();
    }
    let by_words = t
        .split_whitespace()
        .take(SHORT_LABEL_WORDS)
        .collect::<Vec<&str>>()
        .join(" ");
    if by_words.chars().count() > max_len {
        let mut cut: String = by_words.chars().take(max_len - 1).collect();
        cut.push('…');
        cut
    } else {
        by_words
    }
}

// Case-insensitive first, so that "agua" and "Empleo" sort the way a reader
// expects.
fn label_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn trimmed(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, x: Option<f64>) {
        if let Some(x) = x {
            self.sum += x;
            self.count += 1;
        }
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Indicator values of up to three departments, aligned on a common list of
/// labels and grouped by dimension.
///
/// Repeated measurements of the same (department, indicator) are averaged.
/// A record counts for every requested department it is equivalent to.
pub fn build_indicator_series<S>(
    source: &S,
    feed: KpiFeed,
    codes: &DepartmentCodes,
    year: Option<i32>,
) -> Result<IndicatorReport, ReportError>
where
    S: RecordSource + DepartmentDirectory + ?Sized,
{
    if codes.is_empty() {
        debug!("build_indicator_series: no department requested");
        return Ok(IndicatorReport::default());
    }
    info!(
        "build_indicator_series: feed {} departments {:?} year {:?}",
        feed, codes, year
    );
    let report = ReportKind::Indicators(feed);

    let matchers = codes.matchers();
    let mut clauses = vec![
        Clause::AnyDepartment(matchers.clone()),
        Clause::IndicatorPresent,
    ];
    if let Some(y) = year {
        clauses.push(Clause::Year(y));
    }
    let records = source
        .kpi_records(feed, &clauses)
        .map_err(ReportError::aggregate(report))?;
    let names = DepartmentNames::load(source).map_err(ReportError::aggregate(report))?;

    let mut cells: HashMap<(usize, String), Mean> = HashMap::new();
    let mut labels_set: BTreeSet<String> = BTreeSet::new();
    let mut dimensions: HashMap<String, String> = HashMap::new();
    for r in records.iter() {
        let indicator = match trimmed(r.indicator.as_deref()) {
            Some(i) => i.to_string(),
            None => continue,
        };
        if let Some(dim) = trimmed(r.dimension.as_deref()) {
            dimensions
                .entry(indicator.clone())
                .or_insert_with(|| dim.to_string());
        }
        labels_set.insert(indicator.clone());
        for (idx, m) in matchers.iter().enumerate() {
            if m.matches(&r.department_code) {
                cells
                    .entry((idx, indicator.clone()))
                    .or_default()
                    .add(r.numeric_value);
            }
        }
    }
    let labels: Vec<String> = labels_set.into_iter().collect();

    let series: Vec<IndicatorSeries> = codes
        .iter()
        .enumerate()
        .map(|(idx, code)| IndicatorSeries {
            department: names.name_or_code(code),
            department_code: code.clone(),
            data: labels
                .iter()
                .map(|l| {
                    cells
                        .get(&(idx, l.clone()))
                        .map(|m| m.value())
                        .unwrap_or(0.0)
                })
                .collect(),
        })
        .collect();

    // Dimension -> label indices, in label order.
    let mut by_dimension: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, label) in labels.iter().enumerate() {
        let dim = dimensions
            .get(label)
            .cloned()
            .unwrap_or_else(|| OTHER_DIMENSION.to_string());
        match by_dimension.iter_mut().find(|(d, _)| *d == dim) {
            Some((_, indices)) => indices.push(idx),
            None => by_dimension.push((dim, vec![idx])),
        }
    }
    let mut groups: Vec<IndicatorGroup> = by_dimension
        .into_iter()
        .filter(|(_, indices)| !indices.is_empty())
        .map(|(full_label, indicator_indices)| IndicatorGroup {
            id: slug(&full_label),
            label: short_label(&full_label, SHORT_LABEL_MAX),
            full_label,
            indicator_indices,
        })
        .collect();
    groups.sort_by(|a, b| label_order(&a.label, &b.label));
    debug!(
        "build_indicator_series: {} labels in {} groups",
        labels.len(),
        groups.len()
    );

    Ok(IndicatorReport {
        groups,
        labels,
        series,
    })
}
