#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Orchestrator for the urban risk index pipeline.
//!
//! Loads the three tables and six layers named by the configuration,
//! reprojects every layer into the configured metric CRS, runs the
//! aggregation, overlay, scoring and narrative stages, and writes:
//!
//! * a record dataset (one JSON object per region) for the map front end,
//! * the region geometries in their original CRS with the same attributes
//!   merged by region key,
//! * a diagnostics report with correlation and trend statistics.
//!
//! Every stage takes immutable inputs and returns a new per-region
//! fragment; [`compute`] merges the fragments by region key. Any load or
//! reprojection failure aborts the run before anything is written.

pub mod export;

use std::path::Path;
use std::sync::Arc;

use urban_risk_analytics::aggregate::{aggregate_flooding, aggregate_hdi, aggregate_waste};
use urban_risk_analytics::diagnostics::Diagnostics;
use urban_risk_analytics::master::{IndicatorFragments, assemble};
use urban_risk_analytics::narrative::annotate;
use urban_risk_analytics::score::score_regions;
use urban_risk_models::config::{ConfigError, PipelineConfig};
use urban_risk_models::{ExportRecord, RegionMetrics};
use urban_risk_source::progress::ProgressCallback;
use urban_risk_source::rules::{FloodRule, WasteRule};
use urban_risk_source::{ComplaintRecord, HdiRecord, OccurrenceRecord, SourceError, Table};
use urban_risk_spatial::overlay::{drainage_density, hazard_coverage_pct};
use urban_risk_spatial::region::regions_from_layer;
use urban_risk_spatial::{Crs, Layer, RegionIndex, SpatialError};

/// Default configuration, embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/fortaleza.toml");

/// Stages reported through [`ProgressCallback`] by [`run`].
pub const PIPELINE_STEPS: u64 = 7;

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A geometry layer failed to load or reproject.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// A table failed to load.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The configuration is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration is not valid TOML for [`PipelineConfig`].
    #[error("Failed to parse configuration '{name}': {source}")]
    ConfigParse {
        /// Configuration file name.
        name: String,
        /// Underlying TOML error.
        source: Box<toml::de::Error>,
    },

    /// The configured target CRS does not measure in metres.
    #[error("Target CRS EPSG:{epsg} is not a metric projection")]
    NonMetricTarget {
        /// Configured EPSG code.
        epsg: u32,
    },

    /// Reading the configuration or writing an output failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing an output failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Parses and validates a TOML configuration document.
///
/// # Errors
///
/// Returns [`PipelineError`] if the document does not parse, fails
/// validation, or names an unsupported or non-metric target CRS.
pub fn parse_config(name: &str, text: &str) -> Result<PipelineConfig, PipelineError> {
    let config: PipelineConfig =
        toml::from_str(text).map_err(|source| PipelineError::ConfigParse {
            name: name.to_string(),
            source: Box::new(source),
        })?;

    config.validate()?;
    target_crs(&config)?;

    Ok(config)
}

/// Returns the embedded default configuration.
///
/// # Errors
///
/// Returns [`PipelineError`] if the embedded document is invalid.
pub fn default_config() -> Result<PipelineConfig, PipelineError> {
    parse_config("fortaleza.toml", DEFAULT_CONFIG)
}

/// Reads a configuration file.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be read or is invalid.
pub fn load_config(path: &Path) -> Result<PipelineConfig, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&path.display().to_string(), &text)?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolves the configured metric CRS.
fn target_crs(config: &PipelineConfig) -> Result<Crs, PipelineError> {
    let epsg = config.crs.target_epsg;
    let crs = Crs::from_epsg(epsg)?;
    if !crs.is_metric() {
        return Err(PipelineError::NonMetricTarget { epsg });
    }
    Ok(crs)
}

/// Every source the pipeline reads, already parsed.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Service demand log.
    pub complaints: Vec<ComplaintRecord>,
    /// Occurrence log.
    pub occurrences: Vec<OccurrenceRecord>,
    /// HDI per neighborhood.
    pub hdi: Vec<HdiRecord>,
    /// Region boundaries, in their display CRS.
    pub regions: Layer,
    /// Neighborhood boundaries.
    pub neighborhoods: Layer,
    /// Geological risk polygons, if any.
    pub geological_risk: Option<Layer>,
    /// Flood-prone polygons, if any.
    pub flood_prone: Option<Layer>,
    /// Drainage channel lines.
    pub channels: Layer,
    /// Ditch and drain lines.
    pub ditches: Layer,
}

impl Inputs {
    /// Loads every input named by `config` from `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on the first file that is missing or
    /// malformed.
    pub fn load(config: &PipelineConfig, data_dir: &Path) -> Result<Self, PipelineError> {
        let files = &config.inputs;
        let table = |name: &str| Table::load(&data_dir.join(name));
        let layer = |name: &str| Layer::load(&data_dir.join(name));
        let optional_layer = |name: Option<&str>| name.map(layer).transpose();

        let complaints =
            ComplaintRecord::from_table(&table(&files.complaints)?, &config.waste.columns)?;
        let occurrences =
            OccurrenceRecord::from_table(&table(&files.occurrences)?, &config.flooding.columns)?;
        let hdi = HdiRecord::from_table(&table(&files.hdi)?, &config.hdi.columns)?;

        log::info!(
            "Loaded {} complaints, {} occurrence rows, {} HDI rows",
            complaints.len(),
            occurrences.len(),
            hdi.len()
        );

        Ok(Self {
            complaints,
            occurrences,
            hdi,
            regions: layer(&files.regions)?,
            neighborhoods: layer(&files.neighborhoods)?,
            geological_risk: optional_layer(files.geological_risk.as_deref())?,
            flood_prone: optional_layer(files.flood_prone.as_deref())?,
            channels: layer(&files.channels)?,
            ditches: layer(&files.ditches)?,
        })
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct Output {
    /// The annotated master table, in region key order.
    pub metrics: Vec<RegionMetrics>,
    /// Front end records, in region key order.
    pub records: Vec<ExportRecord>,
    /// Region geometries in their display CRS with record attributes.
    pub geometry: Layer,
    /// Correlation and trend statistics.
    pub diagnostics: Diagnostics,
}

/// Reprojects an optional hazard layer and collects its polygons. An
/// absent layer yields no polygons.
fn hazard_polygons(
    layer: Option<&Layer>,
    target: Crs,
) -> Result<geo::MultiPolygon<f64>, SpatialError> {
    layer.map_or_else(
        || Ok(geo::MultiPolygon::new(Vec::new())),
        |layer| layer.reproject(target)?.polygons(),
    )
}

/// Runs every computation stage on loaded inputs. Performs no I/O.
///
/// # Errors
///
/// Returns [`PipelineError`] if a layer cannot be reprojected or does not
/// hold the geometry type its role requires.
pub fn compute(
    config: &PipelineConfig,
    inputs: &Inputs,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Output, PipelineError> {
    let target = target_crs(config)?;

    // Geometry normalization
    progress.set_message("Normalizing geometry".to_string());
    let regions = regions_from_layer(
        &inputs.regions.reproject(target)?,
        &config.regions.key_property,
    )?;
    let neighborhoods = inputs.neighborhoods.reproject(target)?;
    let geo_risk = hazard_polygons(inputs.geological_risk.as_ref(), target)?;
    let flood_prone = hazard_polygons(inputs.flood_prone.as_ref(), target)?;
    let channels = inputs.channels.reproject(target)?.lines()?;
    let ditches = inputs.ditches.reproject(target)?.lines()?;
    progress.inc(1);

    // Attribute aggregation
    progress.set_message("Aggregating attributes".to_string());
    let neighborhood_regions = RegionIndex::build(&regions)
        .assign_centroids(&neighborhoods, &config.hdi.neighborhood_name_property)?;
    let waste = aggregate_waste(&inputs.complaints, &WasteRule::new(&config.waste));
    let flooding = aggregate_flooding(&inputs.occurrences, &FloodRule::new(&config.flooding));
    let hdi = aggregate_hdi(&inputs.hdi, &neighborhood_regions);
    progress.inc(1);

    // Hazard overlay and drainage
    progress.set_message("Overlaying hazards".to_string());
    let fragments = IndicatorFragments {
        waste,
        flooding,
        hdi,
        geo_risk_pct: hazard_coverage_pct(&regions, &geo_risk),
        flood_risk_pct: hazard_coverage_pct(&regions, &flood_prone),
        drainage_density: drainage_density(&regions, &[&channels, &ditches]),
    };
    progress.inc(1);

    // Composite index and narratives
    progress.set_message("Scoring regions".to_string());
    let metrics = annotate(
        score_regions(assemble(&regions, &fragments)),
        &config.narrative,
    );
    progress.inc(1);

    // Export shaping
    progress.set_message("Shaping outputs".to_string());
    let records = export::to_records(&metrics, &config.tiers);
    let geometry =
        export::attach_to_geometry(&inputs.regions, &config.regions.key_property, &records)?;
    let diagnostics = Diagnostics::compute(&metrics);
    progress.inc(1);

    Ok(Output {
        metrics,
        records,
        geometry,
        diagnostics,
    })
}

/// Writes `contents` to `dir/name`.
fn write_file(dir: &Path, name: &str, contents: &str) -> Result<(), PipelineError> {
    let path = dir.join(name);
    std::fs::write(&path, contents).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Writes the three output files into `output_dir`, creating it if
/// needed.
///
/// # Errors
///
/// Returns [`PipelineError`] if serialization or a write fails.
pub fn write_outputs(
    config: &PipelineConfig,
    output: &Output,
    output_dir: &Path,
) -> Result<(), PipelineError> {
    std::fs::create_dir_all(output_dir).map_err(|source| PipelineError::Io {
        path: output_dir.display().to_string(),
        source,
    })?;

    // Serialize everything first so a serialization failure leaves no
    // partial output behind.
    let records = serde_json::to_string_pretty(&output.records)?;
    let geometry = serde_json::to_string(&output.geometry.to_feature_collection())?;
    let diagnostics = serde_json::to_string_pretty(&output.diagnostics)?;

    let files = &config.outputs;
    write_file(output_dir, &files.records, &records)?;
    write_file(output_dir, &files.geometry, &geometry)?;
    write_file(output_dir, &files.diagnostics, &diagnostics)?;

    Ok(())
}

/// Runs the whole pipeline once: load, compute, write.
///
/// # Errors
///
/// Returns [`PipelineError`] from the first failing stage; nothing is
/// written unless every computation stage succeeded.
pub fn run(
    config: &PipelineConfig,
    data_dir: &Path,
    output_dir: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Output, PipelineError> {
    progress.set_total(PIPELINE_STEPS);

    progress.set_message("Loading inputs".to_string());
    let inputs = Inputs::load(config, data_dir)?;
    progress.inc(1);

    let output = compute(config, &inputs, progress)?;

    progress.set_message("Writing outputs".to_string());
    write_outputs(config, &output, output_dir)?;
    progress.inc(1);

    progress.finish(format!("Scored {} regions", output.metrics.len()));
    Ok(output)
}
