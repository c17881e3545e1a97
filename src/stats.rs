//! Statistics pre-pass: turn sampled raw rows into per-column
//! [`FieldStatistic`]s for the detection context.
//!
//! This is the host-side collaborator of the detection service. One bounded
//! scan per request classifies every non-empty cell (type candidates, format
//! hints, numeric range), tracks cardinality for enum candidacy, and derives
//! name/range geo hints per column. Detectors only ever see the finished
//! snapshots.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use encoding_rs::Encoding;
use heck::ToSnakeCase;
use regex::Regex;
use uuid::Uuid;

use crate::{
    context::{EnumValue, FieldStatistic, GeoHints, NumericStats, ValueType},
    io_utils,
};

/// Default number of rows sampled per detection request (0 means full scan).
pub const DEFAULT_SAMPLE_ROWS: usize = 500;
/// Distinct raw values kept per column as detector samples.
const SAMPLE_VALUE_LIMIT: usize = 8;
/// Cardinality ceiling for a column to count as enum-like.
const ENUM_MAX_CARDINALITY: usize = 24;
/// An enum column must repeat its values at least this often on average.
const ENUM_MIN_REPEAT: usize = 2;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("hardcoded email pattern"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("hardcoded url pattern"));

const LATITUDE_NAME_TOKENS: &[&str] = &["lat", "latitude"];
const LONGITUDE_NAME_TOKENS: &[&str] = &["lng", "lon", "long", "longitude"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Sampled dataset plus its computed per-column statistics.
#[derive(Debug)]
pub struct DatasetSample {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub field_stats: BTreeMap<String, FieldStatistic>,
}

/// Read up to `sample_rows` rows from a CSV file and compute statistics.
pub fn sample_csv(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    sample_rows: usize,
) -> Result<DatasetSample> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        if sample_rows > 0 && row_idx >= sample_rows {
            break;
        }
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let mut decoded = io_utils::decode_record(&record, encoding)?;
        decoded.resize(headers.len(), String::new());
        rows.push(decoded);
    }

    let field_stats = compute_field_statistics(&headers, &rows);
    Ok(DatasetSample {
        headers,
        rows,
        field_stats,
    })
}

/// Compute one [`FieldStatistic`] per header over already parsed rows.
pub fn compute_field_statistics(
    headers: &[String],
    rows: &[Vec<String>],
) -> BTreeMap<String, FieldStatistic> {
    let mut accumulators: Vec<ColumnAccumulator> = headers
        .iter()
        .map(|header| ColumnAccumulator::new(header))
        .collect();

    for row in rows {
        for (idx, accumulator) in accumulators.iter_mut().enumerate() {
            let value = row.get(idx).map(String::as_str).unwrap_or_default();
            accumulator.record(value);
        }
    }

    accumulators
        .into_iter()
        .map(|accumulator| {
            let stat = accumulator.finalize(rows.len());
            (stat.path.clone(), stat)
        })
        .collect()
}

struct ColumnAccumulator {
    path: String,
    occurrences: usize,
    null_count: usize,
    value_counts: BTreeMap<String, usize>,
    sample_values: Vec<String>,
    type_distribution: BTreeMap<ValueType, usize>,
    email_count: usize,
    url_count: usize,
    date_count: usize,
    date_time_count: usize,
    numeric_count: usize,
    numeric_min: Option<f64>,
    numeric_max: Option<f64>,
    numeric_sum: f64,
    all_integers: bool,
}

impl ColumnAccumulator {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            occurrences: 0,
            null_count: 0,
            value_counts: BTreeMap::new(),
            sample_values: Vec::new(),
            type_distribution: BTreeMap::new(),
            email_count: 0,
            url_count: 0,
            date_count: 0,
            date_time_count: 0,
            numeric_count: 0,
            numeric_min: None,
            numeric_max: None,
            numeric_sum: 0.0,
            all_integers: true,
        }
    }

    fn record(&mut self, raw: &str) {
        let value = raw.trim();
        if value.is_empty() {
            self.null_count += 1;
            return;
        }
        self.occurrences += 1;

        if !self.value_counts.contains_key(value) && self.sample_values.len() < SAMPLE_VALUE_LIMIT {
            self.sample_values.push(value.to_string());
        }
        *self.value_counts.entry(value.to_string()).or_insert(0) += 1;

        let value_type = classify_value(value);
        *self.type_distribution.entry(value_type).or_insert(0) += 1;

        match value_type {
            ValueType::Integer => {
                if let Ok(number) = value.parse::<f64>() {
                    self.observe_numeric(number, true);
                }
            }
            ValueType::Float => {
                if let Ok(number) = value.parse::<f64>() {
                    self.observe_numeric(number, false);
                }
            }
            ValueType::Date => self.date_count += 1,
            ValueType::DateTime => self.date_time_count += 1,
            ValueType::String => {
                if EMAIL.is_match(value) {
                    self.email_count += 1;
                } else if URL.is_match(value) {
                    self.url_count += 1;
                }
            }
            ValueType::Boolean | ValueType::Guid => {}
        }
    }

    fn observe_numeric(&mut self, number: f64, is_integer: bool) {
        self.numeric_count += 1;
        if !is_integer {
            self.all_integers = false;
        }
        self.numeric_sum += number;
        self.numeric_min = Some(self.numeric_min.map_or(number, |m| m.min(number)));
        self.numeric_max = Some(self.numeric_max.map_or(number, |m| m.max(number)));
    }

    fn finalize(self, total_rows: usize) -> FieldStatistic {
        let now = Utc::now();
        let occurrence_percent = if total_rows == 0 {
            0.0
        } else {
            self.occurrences as f64 / total_rows as f64 * 100.0
        };

        let numeric_stats = match (self.numeric_min, self.numeric_max) {
            // Only meaningful when the column is numeric throughout.
            (Some(min), Some(max)) if self.numeric_count == self.occurrences => Some(NumericStats {
                min,
                max,
                avg: self.numeric_sum / self.numeric_count as f64,
                is_integer: self.all_integers,
            }),
            _ => None,
        };

        let unique_values = self.value_counts.len();
        let is_enum_candidate = unique_values >= 2
            && unique_values <= ENUM_MAX_CARDINALITY
            && self.occurrences >= unique_values * ENUM_MIN_REPEAT;
        let enum_values = if is_enum_candidate {
            self.value_counts
                .iter()
                .map(|(value, count)| EnumValue {
                    value: value.clone(),
                    count: *count,
                    percent: *count as f64 / self.occurrences as f64 * 100.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let geo_hints = derive_geo_hints(&self.path, numeric_stats.as_ref());
        let nesting_depth = self.path.matches('.').count();

        FieldStatistic {
            path: self.path,
            occurrences: self.occurrences,
            occurrence_percent,
            null_count: self.null_count,
            unique_values,
            sample_values: self.sample_values,
            type_distribution: self.type_distribution,
            email_count: self.email_count,
            url_count: self.url_count,
            date_time_count: self.date_time_count,
            date_count: self.date_count,
            numeric_count: self.numeric_count,
            numeric_stats,
            is_enum_candidate,
            enum_values,
            geo_hints,
            first_seen: now,
            last_seen: now,
            nesting_depth,
        }
    }
}

fn classify_value(value: &str) -> ValueType {
    if value.parse::<i64>().is_ok() {
        return ValueType::Integer;
    }
    if value.parse::<f64>().is_ok() {
        return ValueType::Float;
    }
    if matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "y" | "n"
    ) {
        return ValueType::Boolean;
    }
    if parses_as_datetime(value) {
        return ValueType::DateTime;
    }
    if parses_as_date(value) {
        return ValueType::Date;
    }
    if Uuid::parse_str(value).is_ok() {
        return ValueType::Guid;
    }
    ValueType::String
}

fn parses_as_date(value: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

fn parses_as_datetime(value: &str) -> bool {
    if chrono::DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

/// Name plus range evidence that a column holds a coordinate component.
fn derive_geo_hints(path: &str, numeric: Option<&NumericStats>) -> Option<GeoHints> {
    let normalized = path.to_snake_case();
    let matched_token = normalized
        .split('_')
        .find(|token| {
            LATITUDE_NAME_TOKENS.contains(token) || LONGITUDE_NAME_TOKENS.contains(token)
        })
        .map(str::to_string);
    let token = matched_token.as_deref()?;

    let is_latitude = LATITUDE_NAME_TOKENS.contains(&token);
    let bound = if is_latitude { 90.0 } else { 180.0 };
    let value_in_range = numeric.is_some_and(|stats| stats.min >= -bound && stats.max <= bound);

    Some(GeoHints {
        is_latitude,
        is_longitude: !is_latitude,
        field_name_pattern: matched_token,
        value_in_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn classifies_common_value_shapes() {
        assert_eq!(classify_value("42"), ValueType::Integer);
        assert_eq!(classify_value("4.2"), ValueType::Float);
        assert_eq!(classify_value("yes"), ValueType::Boolean);
        assert_eq!(classify_value("2024-05-01"), ValueType::Date);
        assert_eq!(classify_value("2024-05-01T08:30:00Z"), ValueType::DateTime);
        assert_eq!(
            classify_value("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            ValueType::Guid
        );
        assert_eq!(classify_value("Winterfest"), ValueType::String);
    }

    #[test]
    fn occurrence_and_uniqueness_are_tracked() {
        let headers = vec!["status".to_string()];
        let data = rows(&[&["open"], &["closed"], &["open"], &[""], &["open"]]);
        let stats = compute_field_statistics(&headers, &data);

        let status = &stats["status"];
        assert_eq!(status.occurrences, 4);
        assert_eq!(status.null_count, 1);
        assert_eq!(status.unique_values, 2);
        assert_eq!(status.occurrence_percent, 80.0);
        assert!(status.is_enum_candidate);
        let open = status
            .enum_values
            .iter()
            .find(|entry| entry.value == "open")
            .expect("open tracked");
        assert_eq!(open.count, 3);
    }

    #[test]
    fn numeric_stats_require_fully_numeric_column() {
        let headers = vec!["mixed".to_string(), "amount".to_string()];
        let data = rows(&[&["1", "10"], &["two", "12"], &["3", "11"]]);
        let stats = compute_field_statistics(&headers, &data);

        assert!(stats["mixed"].numeric_stats.is_none());
        let amount = stats["amount"].numeric_stats.as_ref().expect("numeric");
        assert_eq!(amount.min, 10.0);
        assert_eq!(amount.max, 12.0);
        assert!(amount.is_integer);
    }

    #[test]
    fn latitude_column_gets_geo_hints() {
        let headers = vec!["lat".to_string(), "name".to_string()];
        let data = rows(&[&["52.5", "a"], &["48.9", "b"]]);
        let stats = compute_field_statistics(&headers, &data);

        let hints = stats["lat"].geo_hints.as_ref().expect("geo hints");
        assert!(hints.is_latitude);
        assert!(!hints.is_longitude);
        assert!(hints.value_in_range);
        assert_eq!(hints.field_name_pattern.as_deref(), Some("lat"));
        assert!(stats["name"].geo_hints.is_none());
    }

    #[test]
    fn format_hints_count_emails_and_dates() {
        let headers = vec!["contact".to_string(), "when".to_string()];
        let data = rows(&[
            &["anna@example.org", "2024-01-01"],
            &["not-an-email", "2024-02-03"],
        ]);
        let stats = compute_field_statistics(&headers, &data);

        assert_eq!(stats["contact"].email_count, 1);
        assert_eq!(stats["when"].date_count, 2);
        assert_eq!(stats["when"].temporal_share(), 1.0);
    }
}
