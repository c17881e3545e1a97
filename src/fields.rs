//! Semantic field-mapping inference: assign title, description, timestamp,
//! and location-name roles to columns with confidence scores.
//!
//! Each role blends a name-affinity score (header vs. a synonym vocabulary)
//! with a role-specific statistical-evidence score, half and half. The best
//! candidate per role wins only above the acceptance cutoff; otherwise the
//! role stays unmapped. Roles are evaluated in a fixed order and a claimed
//! column leaves the candidate pool, so no column serves two roles.

use std::collections::HashSet;

use heck::ToSnakeCase;

use crate::{
    context::{DetectionContext, FieldStatistic, ValueType},
    result::{FieldMapping, FieldMappingsResult},
};

/// Minimum combined confidence before a role mapping is emitted.
pub const MIN_ACCEPT_CONFIDENCE: f64 = 0.3;

const NAME_WEIGHT: f64 = 0.5;
const STATS_WEIGHT: f64 = 0.5;

/// Sample length beyond which a column reads as prose rather than a title.
const TITLE_LENGTH_CEILING: f64 = 120.0;
/// Average sample length at which description evidence saturates.
const DESCRIPTION_LENGTH_SCALE: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Timestamp,
    Title,
    Description,
    LocationName,
}

/// Evaluation order; earlier roles claim columns first.
const ROLE_ORDER: [Role; 4] = [
    Role::Timestamp,
    Role::Title,
    Role::Description,
    Role::LocationName,
];

const TIMESTAMP_VOCAB: &[&str] = &[
    "timestamp",
    "date",
    "time",
    "datetime",
    "created",
    "created_at",
    "updated",
    "updated_at",
    "occurred_at",
    "event_date",
    "event_time",
    "start_date",
    "published",
    "published_at",
    "modified",
];

const TITLE_VOCAB: &[&str] = &[
    "title",
    "name",
    "label",
    "headline",
    "subject",
    "event_name",
    "item",
    "caption",
];

const DESCRIPTION_VOCAB: &[&str] = &[
    "description",
    "summary",
    "abstract",
    "body",
    "text",
    "details",
    "notes",
    "comment",
    "content",
    "info",
];

const LOCATION_VOCAB: &[&str] = &[
    "location",
    "place",
    "address",
    "city",
    "venue",
    "site",
    "street",
    "town",
    "region",
    "country",
    "municipality",
];

/// Infer the four semantic role mappings. Columns in `claimed` (typically
/// coordinate columns identified by geo reconciliation) never participate.
pub fn infer_field_mappings(
    ctx: &DetectionContext,
    claimed: &HashSet<String>,
) -> FieldMappingsResult {
    let mut claimed = claimed.clone();
    let mut result = FieldMappingsResult::default();

    for role in ROLE_ORDER {
        let mapping = best_candidate(ctx, role, &claimed);
        if let Some(mapping) = mapping {
            claimed.insert(mapping.path.clone());
            match role {
                Role::Timestamp => result.timestamp = Some(mapping),
                Role::Title => result.title = Some(mapping),
                Role::Description => result.description = Some(mapping),
                Role::LocationName => result.location_name = Some(mapping),
            }
        }
    }

    result
}

fn best_candidate(
    ctx: &DetectionContext,
    role: Role,
    claimed: &HashSet<String>,
) -> Option<FieldMapping> {
    let mut best: Option<FieldMapping> = None;

    for header in ctx.headers {
        if claimed.contains(header) {
            continue;
        }
        let Some(stat) = ctx.stat(header) else {
            continue;
        };
        let name_score = name_affinity(header, vocabulary(role));
        let stats_score = statistical_evidence(role, stat, ctx);
        // A promising name with zero supporting evidence is not a mapping;
        // a date-named column of plain strings stays unmapped.
        if stats_score <= 0.0 {
            continue;
        }
        let confidence =
            (NAME_WEIGHT * name_score + STATS_WEIGHT * stats_score).clamp(0.0, 1.0);
        if confidence < MIN_ACCEPT_CONFIDENCE {
            continue;
        }
        // Strict comparison keeps the earliest header on ties.
        if best
            .as_ref()
            .is_none_or(|current| confidence > current.confidence)
        {
            best = Some(FieldMapping::new(header.clone(), confidence));
        }
    }

    best
}

fn vocabulary(role: Role) -> &'static [&'static str] {
    match role {
        Role::Timestamp => TIMESTAMP_VOCAB,
        Role::Title => TITLE_VOCAB,
        Role::Description => DESCRIPTION_VOCAB,
        Role::LocationName => LOCATION_VOCAB,
    }
}

/// Compare a header against a role vocabulary after normalizing casing and
/// separators. Exact match beats token match beats substring containment.
pub(crate) fn name_affinity(header: &str, vocab: &[&str]) -> f64 {
    let normalized = header.trim().to_snake_case();
    if normalized.is_empty() {
        return 0.0;
    }
    if vocab.contains(&normalized.as_str()) {
        return 1.0;
    }

    let tokens: Vec<&str> = normalized.split('_').filter(|t| !t.is_empty()).collect();
    if tokens.iter().any(|token| vocab.contains(token)) {
        return 0.85;
    }

    let mut best = 0.0f64;
    for word in vocab {
        let (shorter, longer) = if word.len() <= normalized.len() {
            (*word, normalized.as_str())
        } else {
            (normalized.as_str(), *word)
        };
        if shorter.len() >= 3 && longer.contains(shorter) {
            let ratio = shorter.len() as f64 / longer.len() as f64;
            best = best.max(0.55 * ratio.max(0.5));
        }
    }
    best
}

fn statistical_evidence(role: Role, stat: &FieldStatistic, ctx: &DetectionContext) -> f64 {
    match role {
        Role::Timestamp => timestamp_evidence(stat),
        Role::Title => title_evidence(stat),
        Role::Description => description_evidence(stat, ctx),
        Role::LocationName => location_evidence(stat),
    }
}

/// High date/datetime format-hint share relative to occurrences.
fn timestamp_evidence(stat: &FieldStatistic) -> f64 {
    let share = stat.temporal_share();
    if share < 0.5 {
        // A column that only occasionally parses as a date is not a
        // timestamp column.
        return 0.0;
    }
    (share * completeness(stat)).clamp(0.0, 1.0)
}

/// String-typed, complete, distinct-ish, short human text.
fn title_evidence(stat: &FieldStatistic) -> f64 {
    let string_share = stat.type_share(ValueType::String);
    if string_share < 0.5 || stat.is_enum_candidate {
        return 0.0;
    }
    let avg_len = average_sample_length(stat);
    if avg_len < 3.0 {
        return 0.0;
    }
    let length_factor = if avg_len <= TITLE_LENGTH_CEILING {
        1.0
    } else {
        (TITLE_LENGTH_CEILING / avg_len).max(0.2)
    };
    // Near-total uniqueness is typical for titles but only a weak signal on
    // its own; duplicates drag the score down gently.
    let uniqueness_factor = 0.6 + 0.4 * stat.unique_ratio();
    (string_share * completeness(stat) * length_factor * uniqueness_factor).clamp(0.0, 1.0)
}

/// Longer prose than the title candidates; duplicates are fine.
fn description_evidence(stat: &FieldStatistic, ctx: &DetectionContext) -> f64 {
    let string_share = stat.type_share(ValueType::String);
    if string_share < 0.5 {
        return 0.0;
    }
    let avg_len = average_sample_length(stat);
    if avg_len < 3.0 {
        return 0.0;
    }
    let longest_other = ctx
        .field_stats
        .values()
        .filter(|other| other.path != stat.path)
        .map(average_sample_length)
        .fold(0.0f64, f64::max);
    let relative_bonus = if avg_len >= longest_other { 0.15 } else { 0.0 };
    let length_factor = (avg_len / DESCRIPTION_LENGTH_SCALE).min(1.0);
    (string_share * length_factor + relative_bonus).clamp(0.0, 1.0)
}

/// Multi-token place-like text, not coordinates.
fn location_evidence(stat: &FieldStatistic) -> f64 {
    let string_share = stat.type_share(ValueType::String);
    if string_share < 0.5 {
        return 0.0;
    }
    if stat.sample_values.is_empty() {
        return 0.0;
    }
    let place_like = stat
        .sample_values
        .iter()
        .filter(|sample| looks_place_like(sample))
        .count() as f64
        / stat.sample_values.len() as f64;
    (string_share * place_like * completeness(stat)).clamp(0.0, 1.0)
}

fn completeness(stat: &FieldStatistic) -> f64 {
    (stat.occurrence_percent / 100.0).clamp(0.0, 1.0)
}

pub(crate) fn average_sample_length(stat: &FieldStatistic) -> f64 {
    if stat.sample_values.is_empty() {
        return 0.0;
    }
    let total: usize = stat.sample_values.iter().map(|s| s.chars().count()).sum();
    total as f64 / stat.sample_values.len() as f64
}

/// Short alphabetic phrases, possibly comma-separated ("Berlin, Germany"),
/// with at most a house-number's worth of digits.
fn looks_place_like(sample: &str) -> bool {
    let trimmed = sample.trim();
    if trimmed.is_empty() || trimmed.len() > 120 {
        return false;
    }
    let tokens: Vec<&str> = trimmed
        .split([' ', ','])
        .filter(|t| !t.trim().is_empty())
        .collect();
    // Place names are multi-token ("Berlin, Germany", "12 Harbour Road").
    if tokens.len() < 2 || tokens.len() > 8 {
        return false;
    }
    let alphabetic_tokens = tokens
        .iter()
        .filter(|token| token.chars().any(|ch| ch.is_alphabetic()))
        .count();
    alphabetic_tokens * 2 >= tokens.len()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::context::DetectorConfig;

    fn string_stat(path: &str, samples: &[&str], unique_ratio: f64) -> FieldStatistic {
        let mut stat = FieldStatistic::new(path);
        stat.occurrences = 100;
        stat.occurrence_percent = 100.0;
        stat.unique_values = (unique_ratio * 100.0).round() as usize;
        stat.sample_values = samples.iter().map(|s| s.to_string()).collect();
        stat.type_distribution.insert(ValueType::String, 100);
        stat
    }

    fn run_inference(stats: Vec<FieldStatistic>) -> FieldMappingsResult {
        let headers: Vec<String> = stats.iter().map(|s| s.path.clone()).collect();
        let map: BTreeMap<String, FieldStatistic> =
            stats.into_iter().map(|s| (s.path.clone(), s)).collect();
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&map, &[], &headers, &config);
        infer_field_mappings(&ctx, &HashSet::new())
    }

    #[test]
    fn exact_header_match_scores_full_affinity() {
        assert_eq!(name_affinity("Timestamp", TIMESTAMP_VOCAB), 1.0);
        assert_eq!(name_affinity("event-date", TIMESTAMP_VOCAB), 1.0);
        assert_eq!(name_affinity("eventDate", TIMESTAMP_VOCAB), 1.0);
    }

    #[test]
    fn token_match_scores_below_exact() {
        let score = name_affinity("record_title_text", TITLE_VOCAB);
        assert!((score - 0.85).abs() < f64::EPSILON);
        assert_eq!(name_affinity("quantity", TITLE_VOCAB), 0.0);
    }

    #[test]
    fn timestamp_needs_dominant_temporal_share() {
        let mut stat = FieldStatistic::new("maybe_date");
        stat.occurrences = 100;
        stat.occurrence_percent = 100.0;
        stat.date_count = 20;
        assert_eq!(timestamp_evidence(&stat), 0.0);
        stat.date_time_count = 75;
        assert!(timestamp_evidence(&stat) > 0.9);
    }

    #[test]
    fn roles_are_mutually_exclusive() {
        let mut date_stat = FieldStatistic::new("event_date");
        date_stat.occurrences = 50;
        date_stat.occurrence_percent = 100.0;
        date_stat.date_count = 50;
        date_stat
            .type_distribution
            .insert(ValueType::Date, 50);

        let title = string_stat("event_name", &["Winter gala", "Spring opening"], 0.95);
        let notes = string_stat(
            "notes",
            &["A long description of the event with plenty of additional context attached."],
            0.4,
        );

        let result = run_inference(vec![date_stat, title, notes]);
        let ts = result.timestamp.expect("timestamp mapped");
        assert_eq!(ts.path, "event_date");
        let title = result.title.expect("title mapped");
        assert_eq!(title.path, "event_name");
        let description = result.description.expect("description mapped");
        assert_eq!(description.path, "notes");
        // No column claimed twice.
        assert_ne!(title.path, description.path);
    }

    #[test]
    fn low_confidence_roles_stay_unmapped() {
        let mut numeric = FieldStatistic::new("amount");
        numeric.occurrences = 10;
        numeric.occurrence_percent = 100.0;
        numeric.type_distribution.insert(ValueType::Integer, 10);

        let result = run_inference(vec![numeric]);
        assert!(result.timestamp.is_none());
        assert!(result.title.is_none());
        assert!(result.description.is_none());
        assert!(result.location_name.is_none());
    }

    #[test]
    fn claimed_columns_never_participate() {
        let title = string_stat("title", &["One", "Two"], 1.0);
        let headers = vec!["title".to_string()];
        let map: BTreeMap<String, FieldStatistic> =
            [("title".to_string(), title)].into_iter().collect();
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&map, &[], &headers, &config);
        let claimed: HashSet<String> = ["title".to_string()].into_iter().collect();

        let result = infer_field_mappings(&ctx, &claimed);
        assert!(result.title.is_none());
    }

    #[test]
    fn location_prefers_place_like_samples() {
        let title = string_stat("title", &["Winter gala", "Spring opening"], 0.95);
        let place = string_stat(
            "venue_city",
            &["Berlin, Germany", "Lyon, France", "Porto, Portugal"],
            0.8,
        );
        let result = run_inference(vec![title, place]);
        let location = result.location_name.expect("location mapped");
        assert_eq!(location.path, "venue_city");
        assert!(location.confidence >= MIN_ACCEPT_CONFIDENCE);
    }
}
