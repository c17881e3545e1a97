//! Output contract for a detection call: language guess, semantic field
//! mappings, reconciled geo mapping, and structural pattern lists.
//!
//! A [`DetectionResult`] is always produced whole; "nothing found" is the
//! canonical empty result from [`DetectionResult::empty`], never an error.

use serde::{Deserialize, Serialize};

/// Confidence cutoff below which a language guess is not to be trusted.
pub const LANGUAGE_RELIABILITY_CUTOFF: f64 = 0.5;

/// Assignment of a semantic role to a specific column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    pub path: String,
    /// Combined evidence in [0,1]; zero-confidence mappings are never emitted.
    pub confidence: f64,
}

impl FieldMapping {
    pub fn new(path: impl Into<String>, confidence: f64) -> Self {
        Self {
            path: path.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Shape of a single-column coordinate representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CombinedFormat {
    LatLng,
    LngLat,
    GeoJson,
    Wkt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombinedCoordinate {
    pub path: String,
    pub format: CombinedFormat,
}

/// How coordinates are represented in the dataset, if at all.
///
/// The variant carries the structure, so "separate implies both latitude and
/// longitude present" holds by construction. `location_field` is a geocoding
/// fallback that may accompany either variant; a dataset with an address
/// column but no coordinates gets no geo mapping at all and surfaces the
/// column through [`FieldMappingsResult::location_name`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeoFieldMapping {
    Separate {
        latitude: FieldMapping,
        longitude: FieldMapping,
        #[serde(skip_serializing_if = "Option::is_none")]
        location_field: Option<FieldMapping>,
    },
    Combined {
        combined: CombinedCoordinate,
        #[serde(skip_serializing_if = "Option::is_none")]
        location_field: Option<FieldMapping>,
    },
}

/// Dominant natural language of the sampled text content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageResult {
    /// ISO 639-3 code, `und` when undetermined.
    pub code: String,
    pub name: String,
    pub confidence: f64,
    pub is_reliable: bool,
}

impl LanguageResult {
    pub fn new(code: impl Into<String>, name: impl Into<String>, confidence: f64) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            code: code.into(),
            name: name.into(),
            confidence,
            is_reliable: confidence > LANGUAGE_RELIABILITY_CUTOFF,
        }
    }

    pub fn unknown() -> Self {
        Self {
            code: "und".to_string(),
            name: "Unknown".to_string(),
            confidence: 0.0,
            is_reliable: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FieldMappingsResult {
    pub title: Option<FieldMapping>,
    pub description: Option<FieldMapping>,
    pub timestamp: Option<FieldMapping>,
    pub location_name: Option<FieldMapping>,
    pub geo: Option<GeoFieldMapping>,
}

/// Structural column roles, independent of semantic meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PatternResult {
    /// Headers judged unique-identifier-like, best ratio first.
    pub id_fields: Vec<String>,
    /// Headers judged low-cardinality categorical, ascending cardinality.
    pub enum_fields: Vec<String>,
}

/// Complete, immutable output of one detection call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    pub language: LanguageResult,
    pub field_mappings: FieldMappingsResult,
    pub patterns: PatternResult,
}

impl DetectionResult {
    /// The well-formed "nothing detected" result: unknown language, all
    /// field mappings absent, empty pattern lists.
    pub fn empty() -> Self {
        Self {
            language: LanguageResult::unknown(),
            field_mappings: FieldMappingsResult::default(),
            patterns: PatternResult::default(),
        }
    }
}
