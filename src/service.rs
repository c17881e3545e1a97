//! Detector registry and the resolution/fallback protocol.
//!
//! The service owns an insertion-ordered set of named detectors and resolves
//! each request through a fixed chain: explicit name → compatibility scan →
//! unconditional `"default"` → empty result. Resolution misses degrade
//! silently; a detector's own runtime error propagates to the caller unmasked
//! and is never retried here.

use anyhow::Result;
use log::{debug, warn};

use crate::{
    context::DetectionContext,
    result::DetectionResult,
};

/// Reserved name of the universal fallback detector.
pub const DEFAULT_DETECTOR_NAME: &str = "default";

/// A named, independently pluggable detection strategy.
///
/// Implementations must be stateless over their input: the service treats
/// every call as independent and may interleave calls for different datasets.
/// `can_handle` is a guard; a guard that cannot decide should return `false`
/// rather than fail. `detect` errors are bug signals and reach the caller.
pub trait SchemaDetector: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Human-readable display name.
    fn label(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Whether this detector considers the dataset within its competence.
    fn can_handle(&self, ctx: &DetectionContext) -> bool;

    /// Produce the detection result for the dataset.
    fn detect(&self, ctx: &DetectionContext) -> Result<DetectionResult>;
}

/// Registry plus resolution logic. Holds no per-call state; the detector set
/// is the only thing mutated, and only through [`register`](Self::register).
#[derive(Default)]
pub struct SchemaDetectionService {
    detectors: Vec<Box<dyn SchemaDetector>>,
}

impl SchemaDetectionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by name, last write wins. Registering `"default"` makes the
    /// incoming detector the new fallback target for subsequent calls.
    pub fn register(&mut self, detector: Box<dyn SchemaDetector>) {
        let name = detector.name().to_string();
        if let Some(slot) = self
            .detectors
            .iter_mut()
            .find(|existing| existing.name() == name)
        {
            debug!("Replacing previously registered detector '{name}'");
            *slot = detector;
        } else {
            self.detectors.push(detector);
        }
    }

    pub fn get_detector(&self, name: &str) -> Option<&dyn SchemaDetector> {
        self.detectors
            .iter()
            .map(AsRef::as_ref)
            .find(|detector| detector.name() == name)
    }

    /// All registered detectors, in registration order.
    pub fn detectors(&self) -> impl Iterator<Item = &dyn SchemaDetector> {
        self.detectors.iter().map(AsRef::as_ref)
    }

    /// First registered detector whose guard accepts the context.
    ///
    /// First match wins; callers wanting priority semantics must register in
    /// priority order.
    pub fn find_compatible_detector(&self, ctx: &DetectionContext) -> Option<&dyn SchemaDetector> {
        self.detectors
            .iter()
            .map(AsRef::as_ref)
            .find(|detector| detector.can_handle(ctx))
    }

    /// Walk the fallback chain without running anything: explicit name (if
    /// registered and its guard accepts) → compatibility scan → `"default"`
    /// unconditionally. `None` only when the chain is exhausted.
    pub fn resolve(
        &self,
        detector_name: Option<&str>,
        ctx: &DetectionContext,
    ) -> Option<&dyn SchemaDetector> {
        if let Some(name) = detector_name {
            match self.get_detector(name) {
                Some(detector) if detector.can_handle(ctx) => {
                    debug!("Resolved explicitly requested detector '{name}'");
                    return Some(detector);
                }
                Some(_) => {
                    debug!("Detector '{name}' declined the dataset; scanning for a compatible one");
                }
                None => {
                    warn!("Requested detector '{name}' is not registered; falling back");
                }
            }
        }

        if let Some(detector) = self.find_compatible_detector(ctx) {
            debug!("Auto-selected detector '{}'", detector.name());
            return Some(detector);
        }

        // The default detector runs unconditionally, bypassing its guard, so
        // a registry containing one always yields a real result.
        self.get_detector(DEFAULT_DETECTOR_NAME)
    }

    /// Resolve and run a detector for the request.
    ///
    /// Never fails because no suitable detector exists: an unknown name, a
    /// rejecting guard, or an empty registry all degrade down the fallback
    /// chain, ending in [`DetectionResult::empty`]. Only a selected
    /// detector's own `detect` error surfaces, unchanged.
    pub fn detect(
        &self,
        detector_name: Option<&str>,
        ctx: &DetectionContext,
    ) -> Result<DetectionResult> {
        match self.resolve(detector_name, ctx) {
            Some(detector) => detector.detect(ctx),
            None => {
                debug!("No detector resolved; returning the empty result");
                Ok(DetectionResult::empty())
            }
        }
    }
}
