//! Dominant-language classification over sampled text content.
//!
//! The text fed to the classifier is the concatenated samples of the resolved
//! title/description columns; when neither resolved, every string-typed
//! column contributes instead. Classification itself is whatlang's trigram
//! profile match, reported as an ISO 639-3 code with the crate-wide
//! reliability cutoff applied.

use crate::{
    context::{DetectionContext, ValueType},
    result::{FieldMappingsResult, LanguageResult},
};

/// Fewer characters than this and a trigram profile is mostly noise.
const MIN_TEXT_LENGTH: usize = 20;

pub fn detect_language(
    ctx: &DetectionContext,
    field_mappings: &FieldMappingsResult,
) -> LanguageResult {
    let text = collect_text(ctx, field_mappings);
    classify(&text)
}

pub(crate) fn classify(text: &str) -> LanguageResult {
    if text.trim().chars().count() < MIN_TEXT_LENGTH {
        return LanguageResult::unknown();
    }
    match whatlang::detect(text) {
        Some(info) => LanguageResult::new(
            info.lang().code(),
            info.lang().eng_name(),
            info.confidence(),
        ),
        None => LanguageResult::unknown(),
    }
}

fn collect_text(ctx: &DetectionContext, field_mappings: &FieldMappingsResult) -> String {
    let semantic_paths: Vec<&str> = [&field_mappings.title, &field_mappings.description]
        .iter()
        .filter_map(|mapping| mapping.as_ref().map(|m| m.path.as_str()))
        .collect();

    let mut chunks: Vec<&str> = Vec::new();
    if semantic_paths.is_empty() {
        for header in ctx.headers {
            let Some(stat) = ctx.stat(header) else {
                continue;
            };
            if stat.type_share(ValueType::String) >= 0.5 {
                chunks.extend(stat.sample_values.iter().map(String::as_str));
            }
        }
    } else {
        for path in semantic_paths {
            if let Some(stat) = ctx.field_stats.get(path) {
                chunks.extend(stat.sample_values.iter().map(String::as_str));
            }
        }
    }
    chunks.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_undetermined() {
        let result = classify("hi");
        assert_eq!(result.code, "und");
        assert!(!result.is_reliable);
    }

    #[test]
    fn english_prose_classifies_as_eng() {
        let result = classify(
            "The annual winter festival returns to the old town square with music, \
             food stalls, and a torchlight parade through the historic streets.",
        );
        assert_eq!(result.code, "eng");
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn german_prose_classifies_as_deu() {
        let result = classify(
            "Das jährliche Winterfest kehrt auf den alten Marktplatz zurück, mit Musik, \
             Ständen und einem Fackelumzug durch die historische Altstadt.",
        );
        assert_eq!(result.code, "deu");
    }
}
