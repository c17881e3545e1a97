//! The built-in universal fallback detector.
//!
//! Runs the full inference pipeline: geo reconciliation first (so coordinate
//! columns never compete for semantic roles), then semantic field mapping,
//! structural pattern detection, and language classification. It accepts any
//! dataset, which is what makes it a safe end of the fallback chain.

use anyhow::Result;
use log::debug;

use crate::{
    context::DetectionContext,
    fields, geo, language, patterns,
    result::{DetectionResult, FieldMapping},
    service::{DEFAULT_DETECTOR_NAME, SchemaDetector},
};

/// Dampening applied when the location-name mapping doubles as the geocoding
/// fallback on a coordinate mapping.
const LOCATION_FALLBACK_DAMPING: f64 = 0.8;

#[derive(Debug, Default)]
pub struct DefaultDetector;

impl DefaultDetector {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaDetector for DefaultDetector {
    fn name(&self) -> &str {
        DEFAULT_DETECTOR_NAME
    }

    fn label(&self) -> &str {
        "Default heuristic detector"
    }

    fn description(&self) -> Option<&str> {
        Some("Statistical field-mapping, geo, pattern, and language inference for arbitrary tabular datasets")
    }

    fn can_handle(&self, _ctx: &DetectionContext) -> bool {
        true
    }

    fn detect(&self, ctx: &DetectionContext) -> Result<DetectionResult> {
        if ctx.headers.is_empty() {
            debug!("Dataset has no headers; returning the empty result");
            return Ok(DetectionResult::empty());
        }

        let reconciled = geo::reconcile(ctx);
        let mut field_mappings = fields::infer_field_mappings(ctx, &reconciled.claimed);

        field_mappings.geo = reconciled.mapping;
        if let (Some(geo_mapping), Some(location)) =
            (field_mappings.geo.as_mut(), field_mappings.location_name.as_ref())
        {
            geo::attach_location_field(
                geo_mapping,
                FieldMapping::new(
                    location.path.clone(),
                    location.confidence * LOCATION_FALLBACK_DAMPING,
                ),
            );
        }

        let patterns = patterns::detect_patterns(ctx);
        let language = language::detect_language(ctx, &field_mappings);

        Ok(DetectionResult {
            language,
            field_mappings,
            patterns,
        })
    }
}
