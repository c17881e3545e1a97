//! Input model for a detection call: per-column statistics, sample rows,
//! headers, and the resolved configuration of the detector about to run.
//!
//! Everything here is a value carrier. Statistics are computed once per
//! request by the sampling pre-pass (see [`crate::stats`]) and are read-only
//! to the detectors; the context itself borrows its parts and is dropped when
//! the call returns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of an observed cell value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Guid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub is_integer: bool,
}

/// Name- and range-derived coordinate hints for a single column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeoHints {
    pub is_latitude: bool,
    pub is_longitude: bool,
    /// Which name token matched (e.g. `lat`, `longitude`), if any.
    pub field_name_pattern: Option<String>,
    /// True when every observed numeric value fits the coordinate range.
    pub value_in_range: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnumValue {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

/// Immutable per-column snapshot for one detection request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStatistic {
    pub path: String,
    pub occurrences: usize,
    pub occurrence_percent: f64,
    pub null_count: usize,
    pub unique_values: usize,
    /// Bounded sample of distinct raw values, in first-seen order.
    pub sample_values: Vec<String>,
    pub type_distribution: BTreeMap<ValueType, usize>,
    pub email_count: usize,
    pub url_count: usize,
    pub date_time_count: usize,
    pub date_count: usize,
    pub numeric_count: usize,
    pub numeric_stats: Option<NumericStats>,
    pub is_enum_candidate: bool,
    pub enum_values: Vec<EnumValue>,
    pub geo_hints: Option<GeoHints>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub nesting_depth: usize,
}

impl FieldStatistic {
    pub fn new(path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            path: path.into(),
            occurrences: 0,
            occurrence_percent: 0.0,
            null_count: 0,
            unique_values: 0,
            sample_values: Vec::new(),
            type_distribution: BTreeMap::new(),
            email_count: 0,
            url_count: 0,
            date_time_count: 0,
            date_count: 0,
            numeric_count: 0,
            numeric_stats: None,
            is_enum_candidate: false,
            enum_values: Vec::new(),
            geo_hints: None,
            first_seen: now,
            last_seen: now,
            nesting_depth: 0,
        }
    }

    /// Share of non-empty values that are distinct, in [0,1].
    pub fn unique_ratio(&self) -> f64 {
        if self.occurrences == 0 {
            0.0
        } else {
            self.unique_values as f64 / self.occurrences as f64
        }
    }

    /// Share of non-empty values classified as the given type, in [0,1].
    pub fn type_share(&self, value_type: ValueType) -> f64 {
        if self.occurrences == 0 {
            return 0.0;
        }
        let count = self
            .type_distribution
            .get(&value_type)
            .copied()
            .unwrap_or_default();
        count as f64 / self.occurrences as f64
    }

    /// Share of non-empty values that parsed as a date or datetime.
    pub fn temporal_share(&self) -> f64 {
        if self.occurrences == 0 {
            0.0
        } else {
            (self.date_count + self.date_time_count) as f64 / self.occurrences as f64
        }
    }
}

/// Persisted per-detector configuration, loaded by the host before a call.
///
/// `priority` is advisory metadata for the host when it decides registration
/// order; the service itself never reads it. `options` is an opaque bag
/// interpreted only by the specific detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorConfig {
    pub enabled: bool,
    pub priority: i64,
    pub options: serde_json::Value,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 100,
            options: serde_json::Value::Null,
        }
    }
}

/// Everything a detector sees for one call.
///
/// `headers` is the canonical iteration order for all positional reasoning;
/// `sample_data` rows are aligned to it.
#[derive(Debug, Clone)]
pub struct DetectionContext<'a> {
    pub field_stats: &'a BTreeMap<String, FieldStatistic>,
    pub sample_data: &'a [Vec<String>],
    pub headers: &'a [String],
    pub config: &'a DetectorConfig,
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        field_stats: &'a BTreeMap<String, FieldStatistic>,
        sample_data: &'a [Vec<String>],
        headers: &'a [String],
        config: &'a DetectorConfig,
    ) -> Self {
        Self {
            field_stats,
            sample_data,
            headers,
            config,
        }
    }

    pub fn stat(&self, header: &str) -> Option<&'a FieldStatistic> {
        self.field_stats.get(header)
    }
}
