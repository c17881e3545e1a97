pub mod cli;
pub mod context;
pub mod default_detector;
pub mod fields;
pub mod geo;
pub mod io_utils;
pub mod language;
pub mod patterns;
pub mod registry;
pub mod result;
pub mod service;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, OutputFormat},
    context::DetectionContext,
    default_detector::DefaultDetector,
    registry::{DetectorIdentity, DetectorRegistry},
    result::{DetectionResult, FieldMapping, GeoFieldMapping},
    service::{SchemaDetectionService, SchemaDetector},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("schema_detect", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect(args) => handle_detect(&args),
        Commands::Detectors(args) => handle_detectors(&args),
        Commands::Seed(args) => handle_seed(&args),
    }
}

/// All detectors compiled into this binary, in scan order.
pub fn builtin_detectors() -> Vec<Box<dyn SchemaDetector>> {
    vec![Box::new(DefaultDetector::new())]
}

/// Service instance with every built-in detector registered, the form other
/// subsystems consume directly.
pub fn build_default_service() -> SchemaDetectionService {
    let mut service = SchemaDetectionService::new();
    for detector in builtin_detectors() {
        service.register(detector);
    }
    service
}

fn detector_identities() -> Vec<DetectorIdentity> {
    builtin_detectors()
        .iter()
        .map(|detector| DetectorIdentity {
            name: detector.name().to_string(),
            label: detector.label().to_string(),
            description: detector.description().map(str::to_string),
        })
        .collect()
}

fn handle_detect(args: &cli::DetectArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Sampling '{}' ({} row(s) max) for schema detection",
        args.input.display(),
        args.sample_rows
    );

    let sample = stats::sample_csv(&args.input, delimiter, encoding, args.sample_rows)
        .with_context(|| format!("Sampling {:?}", args.input))?;
    debug!(
        "Computed statistics for {} column(s) over {} sampled row(s)",
        sample.headers.len(),
        sample.rows.len()
    );

    let mut registry = match &args.registry {
        Some(path) => {
            let mut registry = DetectorRegistry::load(path)
                .with_context(|| format!("Loading registry from {path:?}"))?;
            registry.seed_or_warn(&detector_identities());
            Some(registry)
        }
        None => None,
    };

    // Disabled records are excluded from the auto-selection scan but stay
    // directly callable by explicit name.
    let explicit = args.detector.as_deref();
    let mut service = SchemaDetectionService::new();
    for detector in builtin_detectors() {
        let enabled = registry
            .as_ref()
            .is_none_or(|registry| registry.is_enabled(detector.name()));
        if enabled || explicit == Some(detector.name()) {
            service.register(detector);
        } else {
            debug!(
                "Skipping disabled detector '{}' for auto-selection",
                detector.name()
            );
        }
    }

    let config_name = explicit.unwrap_or(service::DEFAULT_DETECTOR_NAME);
    let config = registry
        .as_ref()
        .map(|registry| registry.config_for(config_name))
        .unwrap_or_default();
    let ctx = DetectionContext::new(&sample.field_stats, &sample.rows, &sample.headers, &config);

    let resolved_name = service
        .resolve(explicit, &ctx)
        .map(|detector| detector.name().to_string());
    let result = service
        .detect(explicit, &ctx)
        .with_context(|| format!("Running schema detection on {:?}", args.input))?;

    if let (Some(registry), Some(name)) = (registry.as_mut(), resolved_name.as_deref())
        && let Err(err) = registry.record_usage(name)
    {
        warn!("Recording detector usage failed (continuing): {err:#}");
    }

    match args.format {
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(&result).context("Serializing detection result")?;
            println!("{rendered}");
        }
        OutputFormat::Table => print_result_tables(&result),
    }
    info!(
        "Detection complete via detector '{}'",
        resolved_name.as_deref().unwrap_or("<none>")
    );
    Ok(())
}

fn handle_detectors(args: &cli::DetectorsArgs) -> Result<()> {
    let registry = match &args.registry {
        Some(path) => Some(
            DetectorRegistry::load(path)
                .with_context(|| format!("Loading registry from {path:?}"))?,
        ),
        None => None,
    };

    let headers = vec![
        "name".to_string(),
        "label".to_string(),
        "enabled".to_string(),
        "priority".to_string(),
        "total_runs".to_string(),
        "last_used".to_string(),
    ];
    let mut rows = Vec::new();
    for detector in builtin_detectors() {
        let record = registry
            .as_ref()
            .and_then(|registry| registry.get(detector.name()));
        rows.push(vec![
            detector.name().to_string(),
            detector.label().to_string(),
            record.map_or("true".to_string(), |r| r.enabled.to_string()),
            record.map_or("-".to_string(), |r| r.priority.to_string()),
            record.map_or("0".to_string(), |r| r.statistics.total_runs.to_string()),
            record
                .and_then(|r| r.statistics.last_used)
                .map_or("-".to_string(), |ts| {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }),
        ]);
    }
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_seed(args: &cli::SeedArgs) -> Result<()> {
    let mut registry = DetectorRegistry::load(&args.registry)
        .with_context(|| format!("Loading registry from {:?}", args.registry))?;
    let created = registry
        .seed(&detector_identities())
        .with_context(|| format!("Seeding registry at {:?}", args.registry))?;
    info!(
        "Seeded {created} detector record(s) into {:?}",
        args.registry
    );
    Ok(())
}

fn print_result_tables(result: &DetectionResult) {
    let mapping_headers = vec![
        "role".to_string(),
        "column".to_string(),
        "confidence".to_string(),
    ];
    let mut mapping_rows = Vec::new();
    let roles: [(&str, &Option<FieldMapping>); 4] = [
        ("title", &result.field_mappings.title),
        ("description", &result.field_mappings.description),
        ("timestamp", &result.field_mappings.timestamp),
        ("location_name", &result.field_mappings.location_name),
    ];
    for (role, mapping) in roles {
        let (column, confidence) = match mapping {
            Some(mapping) => (mapping.path.clone(), format!("{:.2}", mapping.confidence)),
            None => ("-".to_string(), "-".to_string()),
        };
        mapping_rows.push(vec![role.to_string(), column, confidence]);
    }
    match &result.field_mappings.geo {
        Some(GeoFieldMapping::Separate {
            latitude,
            longitude,
            ..
        }) => {
            mapping_rows.push(vec![
                "latitude".to_string(),
                latitude.path.clone(),
                format!("{:.2}", latitude.confidence),
            ]);
            mapping_rows.push(vec![
                "longitude".to_string(),
                longitude.path.clone(),
                format!("{:.2}", longitude.confidence),
            ]);
        }
        Some(GeoFieldMapping::Combined { combined, .. }) => {
            mapping_rows.push(vec![
                "coordinates".to_string(),
                combined.path.clone(),
                format!("{:?}", combined.format).to_lowercase(),
            ]);
        }
        None => {}
    }
    table::print_table(&mapping_headers, &mapping_rows);

    let pattern_headers = vec!["pattern".to_string(), "columns".to_string()];
    let pattern_rows = vec![
        vec![
            "id_fields".to_string(),
            join_or_dash(&result.patterns.id_fields),
        ],
        vec![
            "enum_fields".to_string(),
            join_or_dash(&result.patterns.enum_fields),
        ],
    ];
    table::print_table(&pattern_headers, &pattern_rows);

    println!(
        "language: {} ({}) confidence {:.2}{}",
        result.language.code,
        result.language.name,
        result.language.confidence,
        if result.language.is_reliable {
            ""
        } else {
            " (unreliable)"
        }
    );
}

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}
