use std::collections::BTreeMap;

use anyhow::anyhow;
use proptest::prelude::*;

use schema_detect::context::{DetectionContext, DetectorConfig, FieldStatistic};
use schema_detect::default_detector::DefaultDetector;
use schema_detect::result::{DetectionResult, FieldMapping, GeoFieldMapping};
use schema_detect::service::{SchemaDetectionService, SchemaDetector};
use schema_detect::stats::compute_field_statistics;

struct RejectingDetector;

impl SchemaDetector for RejectingDetector {
    fn name(&self) -> &str {
        "csv-v2"
    }

    fn label(&self) -> &str {
        "CSV v2"
    }

    fn can_handle(&self, _ctx: &DetectionContext) -> bool {
        false
    }

    fn detect(&self, _ctx: &DetectionContext) -> anyhow::Result<DetectionResult> {
        Err(anyhow!("csv-v2 must never run"))
    }
}

fn context_parts() -> (BTreeMap<String, FieldStatistic>, DetectorConfig) {
    (BTreeMap::new(), DetectorConfig::default())
}

#[test]
fn default_registry_never_fails_resolution() {
    let mut service = SchemaDetectionService::new();
    service.register(Box::new(RejectingDetector));
    service.register(Box::new(DefaultDetector::new()));
    let (stats, config) = context_parts();
    let ctx = DetectionContext::new(&stats, &[], &[], &config);

    // Null name, unknown name, and a rejecting guard all end at default.
    service.detect(None, &ctx).expect("null name");
    service.detect(Some("nope"), &ctx).expect("unknown name");
    service.detect(Some("csv-v2"), &ctx).expect("declined name");
}

#[test]
fn rejecting_detector_is_invisible_to_the_scan() {
    let mut service = SchemaDetectionService::new();
    service.register(Box::new(RejectingDetector));
    let (stats, config) = context_parts();
    let ctx = DetectionContext::new(&stats, &[], &[], &config);

    assert!(service.find_compatible_detector(&ctx).is_none());
    let result = service.detect(Some("csv-v2"), &ctx).expect("fallback");
    assert_eq!(result, DetectionResult::empty());
}

#[test]
fn late_default_registration_becomes_the_fallback() {
    let mut service = SchemaDetectionService::new();
    service.register(Box::new(RejectingDetector));
    let (stats, config) = context_parts();
    let ctx = DetectionContext::new(&stats, &[], &[], &config);
    assert_eq!(
        service.detect(None, &ctx).expect("no fallback yet"),
        DetectionResult::empty()
    );

    service.register(Box::new(DefaultDetector::new()));
    let resolved = service.resolve(None, &ctx).expect("fallback now exists");
    assert_eq!(resolved.name(), "default");
}

fn cell_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (0u32..10_000).prop_map(|n| n.to_string()),
        (-90.0f64..90.0).prop_map(|f| format!("{f:.4}")),
        "[a-z]{2,12}( [a-z]{2,12}){0,3}",
        (1u32..28).prop_map(|d| format!("2024-03-{d:02}")),
    ]
}

fn table_strategy() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    let headers = prop::sample::subsequence(
        vec![
            "id".to_string(),
            "name".to_string(),
            "lat".to_string(),
            "lng".to_string(),
            "status".to_string(),
            "notes".to_string(),
            "created_at".to_string(),
        ],
        1..=5,
    );
    headers.prop_flat_map(|headers| {
        let width = headers.len();
        let rows = prop::collection::vec(prop::collection::vec(cell_strategy(), width), 2..25);
        (Just(headers), rows)
    })
}

proptest! {
    #[test]
    fn detection_output_is_well_formed((headers, rows) in table_strategy()) {
        let stats = compute_field_statistics(&headers, &rows);
        let config = DetectorConfig::default();
        let ctx = DetectionContext::new(&stats, &rows, &headers, &config);
        let detector = DefaultDetector::new();
        let result = detector.detect(&ctx).expect("detect");

        // Pattern lists only ever name real columns.
        for path in result.patterns.id_fields.iter().chain(result.patterns.enum_fields.iter()) {
            prop_assert!(headers.contains(path));
        }

        // Mapped roles carry in-range confidence and real columns.
        let mappings: Vec<&Option<FieldMapping>> = vec![
            &result.field_mappings.title,
            &result.field_mappings.description,
            &result.field_mappings.timestamp,
            &result.field_mappings.location_name,
        ];
        for mapping in mappings.into_iter().flatten() {
            prop_assert!(headers.contains(&mapping.path));
            prop_assert!((0.0..=1.0).contains(&mapping.confidence));
            prop_assert!(mapping.confidence > 0.0);
        }

        // Geo variants are structurally sound.
        match &result.field_mappings.geo {
            Some(GeoFieldMapping::Separate { latitude, longitude, .. }) => {
                prop_assert!(headers.contains(&latitude.path));
                prop_assert!(headers.contains(&longitude.path));
                prop_assert_ne!(&latitude.path, &longitude.path);
            }
            Some(GeoFieldMapping::Combined { combined, .. }) => {
                prop_assert!(headers.contains(&combined.path));
            }
            None => {}
        }

        // Pure detector: identical context, identical result.
        let rerun = detector.detect(&ctx).expect("re-detect");
        prop_assert_eq!(result, rerun);
    }
}
