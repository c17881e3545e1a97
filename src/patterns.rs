//! Structural pattern detection: unique-identifier columns and
//! low-cardinality categorical columns.

use itertools::Itertools;

use crate::{
    context::{DetectionContext, FieldStatistic, ValueType},
    result::PatternResult,
};

/// Uniqueness ratio at or above which a complete column counts as ID-like.
pub const ID_RATIO_CUTOFF: f64 = 0.99;

pub fn detect_patterns(ctx: &DetectionContext) -> PatternResult {
    PatternResult {
        id_fields: id_fields(ctx),
        enum_fields: enum_fields(ctx),
    }
}

/// Headers whose values are (almost) all distinct and never missing, ordered
/// by how close the uniqueness ratio is to 1.0; header order breaks ties.
fn id_fields(ctx: &DetectionContext) -> Vec<String> {
    let mut candidates: Vec<(f64, usize, String)> = Vec::new();
    for (position, header) in ctx.headers.iter().enumerate() {
        let Some(stat) = ctx.stat(header) else {
            continue;
        };
        if stat.occurrences == 0 || stat.null_count > 0 || !id_shaped(stat) {
            continue;
        }
        let ratio = stat.unique_ratio();
        if ratio >= ID_RATIO_CUTOFF {
            candidates.push(((1.0 - ratio).abs(), position, header.clone()));
        }
    }
    candidates
        .into_iter()
        .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, _, header)| header)
        .collect()
}

/// Identifiers come as integers, opaque strings, or GUIDs. A column of
/// distinct floats or dates is measurement data, not a key.
fn id_shaped(stat: &FieldStatistic) -> bool {
    let disqualifying = stat.type_share(ValueType::Float)
        + stat.type_share(ValueType::Date)
        + stat.type_share(ValueType::DateTime)
        + stat.type_share(ValueType::Boolean);
    disqualifying < 0.5
}

/// Headers flagged as enum candidates upstream, ascending cardinality;
/// header order breaks ties.
fn enum_fields(ctx: &DetectionContext) -> Vec<String> {
    ctx.headers
        .iter()
        .enumerate()
        .filter_map(|(position, header)| {
            let stat = ctx.stat(header)?;
            stat.is_enum_candidate
                .then(|| (stat.unique_values, position, header.clone()))
        })
        .sorted_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, _, header)| header)
        .collect()
}
