//! Geo reconciliation: decide whether coordinates live in two separate
//! columns, one combined column, or not at all.
//!
//! Candidate columns come from the upstream geo hints plus numeric range
//! validity; the separate-pair form wins when exactly one strong latitude and
//! one strong longitude exist. Failing that, string columns are sniffed for
//! combined representations (delimited pair, GeoJSON shape, WKT point).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::{
    context::{DetectionContext, FieldStatistic},
    result::{CombinedCoordinate, CombinedFormat, FieldMapping, GeoFieldMapping},
};

/// Minimum per-axis confidence before a coordinate column is accepted.
pub const MIN_COORDINATE_CONFIDENCE: f64 = 0.5;
/// Share of samples that must match a combined shape to accept it.
const COMBINED_SAMPLE_SHARE: f64 = 0.6;
/// Penalty per surplus ambiguous candidate on either axis.
const AMBIGUITY_PENALTY: f64 = 0.05;

static WKT_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*POINT\s*\(\s*-?\d+(\.\d+)?\s+-?\d+(\.\d+)?\s*\)\s*$")
        .expect("hardcoded WKT pattern"));
static DELIMITED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*[,;]\s*(-?\d+(?:\.\d+)?)\s*$")
        .expect("hardcoded pair pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn bound(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

/// Outcome of coordinate reconciliation: the mapping without its
/// `location_field` attached yet, plus the columns it claimed.
#[derive(Debug, Default)]
pub struct GeoReconciliation {
    pub mapping: Option<GeoFieldMapping>,
    pub claimed: HashSet<String>,
}

pub fn reconcile(ctx: &DetectionContext) -> GeoReconciliation {
    let lat_candidates = axis_candidates(ctx, Axis::Latitude);
    let lng_candidates = axis_candidates(ctx, Axis::Longitude);

    if let (Some(lat), Some(lng)) = (lat_candidates.first(), lng_candidates.first())
        && lat.path != lng.path
    {
        let surplus = (lat_candidates.len() - 1) + (lng_candidates.len() - 1);
        let confidence = (lat.confidence.min(lng.confidence)
            - surplus as f64 * AMBIGUITY_PENALTY)
            .max(MIN_COORDINATE_CONFIDENCE);
        let mut claimed = HashSet::new();
        claimed.insert(lat.path.clone());
        claimed.insert(lng.path.clone());
        return GeoReconciliation {
            mapping: Some(GeoFieldMapping::Separate {
                latitude: FieldMapping::new(lat.path.clone(), confidence),
                longitude: FieldMapping::new(lng.path.clone(), confidence),
                location_field: None,
            }),
            claimed,
        };
    }

    if let Some((path, format)) = find_combined_column(ctx) {
        let mut claimed = HashSet::new();
        claimed.insert(path.clone());
        return GeoReconciliation {
            mapping: Some(GeoFieldMapping::Combined {
                combined: CombinedCoordinate { path, format },
                location_field: None,
            }),
            claimed,
        };
    }

    GeoReconciliation::default()
}

/// Attach the address-string fallback to an already reconciled coordinate
/// mapping. A dataset without coordinates carries no geo mapping at all; its
/// address column surfaces through the location-name field mapping instead.
pub fn attach_location_field(mapping: &mut GeoFieldMapping, location: FieldMapping) {
    match mapping {
        GeoFieldMapping::Separate { location_field, .. }
        | GeoFieldMapping::Combined { location_field, .. } => {
            *location_field = Some(location);
        }
    }
}

#[derive(Debug)]
struct AxisCandidate {
    path: String,
    confidence: f64,
}

/// Candidates for one axis, best first, header order on ties.
fn axis_candidates(ctx: &DetectionContext, axis: Axis) -> Vec<AxisCandidate> {
    let mut candidates = Vec::new();
    for header in ctx.headers {
        let Some(stat) = ctx.stat(header) else {
            continue;
        };
        if let Some(confidence) = axis_confidence(stat, axis)
            && confidence >= MIN_COORDINATE_CONFIDENCE
        {
            candidates.push(AxisCandidate {
                path: header.clone(),
                confidence,
            });
        }
    }
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

fn axis_confidence(stat: &FieldStatistic, axis: Axis) -> Option<f64> {
    let hints = stat.geo_hints.as_ref()?;
    let name_matches = match axis {
        Axis::Latitude => hints.is_latitude,
        Axis::Longitude => hints.is_longitude,
    };
    if !name_matches {
        return None;
    }
    let numeric = stat.numeric_stats.as_ref()?;
    let bound = axis.bound();
    if numeric.min < -bound || numeric.max > bound {
        return None;
    }

    let name_strength: f64 = match hints.field_name_pattern.as_deref() {
        Some("lat") | Some("latitude") | Some("lng") | Some("lon") | Some("longitude") => 0.6,
        Some(_) => 0.5,
        None => 0.3,
    };
    // Values that actually use the coordinate range are stronger evidence
    // than a column of small numbers that merely fits inside it.
    let span = (numeric.max - numeric.min).abs();
    let range_fit = if hints.value_in_range {
        if span > 0.0 { 0.4 } else { 0.3 }
    } else {
        0.0
    };
    Some((name_strength + range_fit).clamp(0.0, 1.0))
}

fn find_combined_column(ctx: &DetectionContext) -> Option<(String, CombinedFormat)> {
    for header in ctx.headers {
        let Some(stat) = ctx.stat(header) else {
            continue;
        };
        if stat.sample_values.is_empty() {
            continue;
        }
        if let Some(format) = dominant_combined_format(&stat.sample_values) {
            return Some((header.clone(), format));
        }
    }
    None
}

fn dominant_combined_format(samples: &[String]) -> Option<CombinedFormat> {
    let mut matched = 0usize;
    let mut format: Option<CombinedFormat> = None;
    for sample in samples {
        let Some(candidate) = classify_combined_sample(sample) else {
            continue;
        };
        matched += 1;
        // A column mixing shapes is not a coordinate column.
        match format {
            None => format = Some(candidate),
            Some(existing) if existing == candidate => {}
            Some(_) => return None,
        }
    }
    if matched as f64 >= samples.len() as f64 * COMBINED_SAMPLE_SHARE {
        format
    } else {
        None
    }
}

fn classify_combined_sample(sample: &str) -> Option<CombinedFormat> {
    let trimmed = sample.trim();
    if trimmed.is_empty() {
        return None;
    }
    if WKT_POINT.is_match(trimmed) {
        return Some(CombinedFormat::Wkt);
    }
    if trimmed.starts_with('{')
        && trimmed.contains("\"coordinates\"")
        && trimmed.contains("\"type\"")
    {
        return Some(CombinedFormat::GeoJson);
    }
    if let Some(captures) = DELIMITED_PAIR.captures(trimmed) {
        let first: f64 = captures[1].parse().ok()?;
        let second: f64 = captures[2].parse().ok()?;
        return pair_order(first, second);
    }
    None
}

/// Decide component order for a delimited pair from which side can only be a
/// latitude. Defaults to lat,lng when both fit.
fn pair_order(first: f64, second: f64) -> Option<CombinedFormat> {
    let first_lat = first.abs() <= 90.0;
    let second_lat = second.abs() <= 90.0;
    let first_lng = first.abs() <= 180.0;
    let second_lng = second.abs() <= 180.0;
    match (first_lat, second_lat) {
        (true, true) => Some(CombinedFormat::LatLng),
        (true, false) if second_lng => Some(CombinedFormat::LatLng),
        (false, true) if first_lng => Some(CombinedFormat::LngLat),
        _ => None,
    }
}
