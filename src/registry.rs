//! Persisted detector-config records: one YAML document per store holding a
//! row per detector name, plus the idempotent seeding that runs at host
//! startup and the usage counters the host bumps after successful calls.
//!
//! The detection service never touches this module; the host loads a record's
//! config into the detection context before calling, and records usage after.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{context::DetectorConfig, service::DEFAULT_DETECTOR_NAME};

/// Seed priority for the universal fallback; higher value sorts last so the
/// host registers it at the end of the scan order.
pub const DEFAULT_DETECTOR_PRIORITY: i64 = 1000;
pub const STANDARD_DETECTOR_PRIORITY: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UsageStatistics {
    pub total_runs: u64,
    pub last_used: Option<DateTime<Utc>>,
}

/// One persisted row per detector name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorRecord {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub priority: i64,
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub statistics: UsageStatistics,
}

impl DetectorRecord {
    pub fn config(&self) -> DetectorConfig {
        DetectorConfig {
            enabled: self.enabled,
            priority: self.priority,
            options: self.options.clone(),
        }
    }
}

/// Identity of a registerable detector, as seen by the seeding pass.
#[derive(Debug, Clone)]
pub struct DetectorIdentity {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    path: PathBuf,
    records: Vec<DetectorRecord>,
}

impl DetectorRegistry {
    /// Load a registry store; a missing file is an empty registry, not an
    /// error, so first runs work without prior setup.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            });
        }
        let file =
            File::open(path).with_context(|| format!("Opening registry store {path:?}"))?;
        let records = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing registry store {path:?}"))?;
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn save(&self) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Creating registry store {:?}", self.path))?;
        serde_yaml::to_writer(file, &self.records).context("Writing registry store YAML")
    }

    pub fn records(&self) -> &[DetectorRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&DetectorRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// A detector without a persisted record counts as enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_none_or(|record| record.enabled)
    }

    /// Resolved config for a detection call; defaults when no record exists.
    pub fn config_for(&self, name: &str) -> DetectorConfig {
        self.get(name)
            .map(DetectorRecord::config)
            .unwrap_or_default()
    }

    /// Create a default record for every detector name not yet present.
    /// Returns the number of records created. Idempotent by construction.
    pub fn seed(&mut self, detectors: &[DetectorIdentity]) -> Result<usize> {
        let mut created = 0usize;
        for identity in detectors {
            if self.get(&identity.name).is_some() {
                continue;
            }
            let priority = if identity.name == DEFAULT_DETECTOR_NAME {
                DEFAULT_DETECTOR_PRIORITY
            } else {
                STANDARD_DETECTOR_PRIORITY
            };
            self.records.push(DetectorRecord {
                name: identity.name.clone(),
                label: identity.label.clone(),
                description: identity.description.clone(),
                enabled: true,
                priority,
                options: serde_json::Value::Null,
                statistics: UsageStatistics::default(),
            });
            created += 1;
        }
        if created > 0 {
            self.save()?;
        }
        Ok(created)
    }

    /// Seeding variant for host startup: a persistence failure is logged and
    /// swallowed so startup never aborts over a briefly unavailable store.
    pub fn seed_or_warn(&mut self, detectors: &[DetectorIdentity]) -> usize {
        match self.seed(detectors) {
            Ok(created) => created,
            Err(err) => {
                warn!("Seeding detector registry failed (continuing): {err:#}");
                0
            }
        }
    }

    /// Bump the usage counters after a successful detection call.
    pub fn record_usage(&mut self, name: &str) -> Result<()> {
        if let Some(record) = self.records.iter_mut().find(|record| record.name == name) {
            record.statistics.total_runs += 1;
            record.statistics.last_used = Some(Utc::now());
            self.save()?;
        }
        Ok(())
    }
}
