//! Pipeline configuration schema.
//!
//! Every dataset-specific literal the pipeline depends on (city name,
//! keyword sets, label rewrite rules, column names, file names, output
//! labels) lives here so it can be changed without touching the
//! computation. The default configuration is a TOML document embedded by
//! the orchestrator.

use serde::{Deserialize, Serialize};

use crate::RiskTier;

/// Errors raised by [`PipelineConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A rule table that must have entries is empty.
    #[error("Configuration list '{field}' must not be empty")]
    EmptyList {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// A required string is empty.
    #[error("Configuration value '{field}' must not be empty")]
    EmptyValue {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// Two tiers share the same output label.
    #[error("Tier labels must be distinct, '{label}' is used twice")]
    DuplicateTierLabel {
        /// The repeated label.
        label: String,
    },
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Coordinate reference system settings.
    pub crs: CrsConfig,
    /// Region layer settings.
    pub regions: RegionConfig,
    /// Waste complaint aggregation rules.
    pub waste: WasteConfig,
    /// Flood occurrence aggregation rules.
    pub flooding: FloodingConfig,
    /// HDI join settings.
    pub hdi: HdiConfig,
    /// Localized tier labels.
    pub tiers: TierLabels,
    /// Narrative text templates.
    pub narrative: NarrativeTemplates,
    /// Input file names, relative to the data directory.
    pub inputs: InputFiles,
    /// Output file names, relative to the output directory.
    pub outputs: OutputFiles,
}

impl PipelineConfig {
    /// Checks the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a rule table is empty, a required name
    /// is blank, or tier labels collide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty_list(&self.waste.keywords, "waste.keywords")?;
        non_empty_list(&self.flooding.types, "flooding.types")?;
        non_empty_value(&self.waste.city, "waste.city")?;
        non_empty_value(&self.waste.zone_marker, "waste.zone_marker")?;
        non_empty_value(&self.regions.key_property, "regions.key_property")?;
        non_empty_value(
            &self.hdi.neighborhood_name_property,
            "hdi.neighborhood_name_property",
        )?;

        for rewrite in &self.flooding.label_rewrites {
            non_empty_value(&rewrite.from, "flooding.label_rewrites.from")?;
        }

        let labels = [&self.tiers.low, &self.tiers.medium, &self.tiers.high];
        for (i, label) in labels.iter().enumerate() {
            non_empty_value(label, "tiers")?;
            if labels[..i].contains(label) {
                return Err(ConfigError::DuplicateTierLabel {
                    label: (*label).clone(),
                });
            }
        }

        Ok(())
    }
}

fn non_empty_list(list: &[String], field: &'static str) -> Result<(), ConfigError> {
    if list.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::EmptyList { field });
    }
    Ok(())
}

fn non_empty_value(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue { field });
    }
    Ok(())
}

/// Coordinate reference system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsConfig {
    /// EPSG code of the metric CRS used for area and length.
    pub target_epsg: u32,
}

/// Region boundary layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Feature property holding the region key.
    pub key_property: String,
}

/// Rules for selecting and counting waste-related complaints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteConfig {
    /// City the complaints are restricted to (case-insensitive).
    pub city: String,
    /// Substring a zone label must contain to count as a region label.
    pub zone_marker: String,
    /// Keywords marking a demand type as waste-related (case-insensitive).
    pub keywords: Vec<String>,
    /// Column names in the demand log.
    pub columns: ComplaintColumns,
}

/// Column names of the demand log. Matched after trimming and
/// upper-casing the header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintColumns {
    /// City column.
    pub city: String,
    /// Zone column (carries the region label).
    pub zone: String,
    /// Demand type column.
    pub demand_type: String,
}

/// Rules for selecting and counting flood occurrences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodingConfig {
    /// Occurrence types counted as flooding (exact match).
    pub types: Vec<String>,
    /// Region label of the citywide aggregate row, which is excluded.
    pub sentinel: String,
    /// Prefix rewrites that bring region labels to the region key form.
    #[serde(default)]
    pub label_rewrites: Vec<LabelRewrite>,
    /// Column names in the occurrence log.
    pub columns: OccurrenceColumns,
}

/// Replaces a leading `from` with `to` in a region label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRewrite {
    /// Prefix to match.
    pub from: String,
    /// Replacement prefix.
    pub to: String,
}

/// Column names of the occurrence log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceColumns {
    /// Region label column.
    pub region: String,
    /// Occurrence type column.
    pub kind: String,
    /// Occurrence count column.
    pub count: String,
}

/// HDI table and neighborhood layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdiConfig {
    /// Column names in the HDI table.
    pub columns: HdiColumns,
    /// Neighborhood layer property holding the neighborhood name.
    pub neighborhood_name_property: String,
}

/// Column names of the HDI table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdiColumns {
    /// Neighborhood name column.
    pub name: String,
    /// HDI value column (decimal-comma text).
    pub value: String,
}

/// Output labels for each [`RiskTier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierLabels {
    /// Label for [`RiskTier::Low`].
    pub low: String,
    /// Label for [`RiskTier::Medium`].
    pub medium: String,
    /// Label for [`RiskTier::High`].
    pub high: String,
}

impl TierLabels {
    /// Returns the configured label for `tier`.
    #[must_use]
    pub fn label(&self, tier: RiskTier) -> &str {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
        }
    }
}

/// Narrative text templates.
///
/// The two high-tier templates may contain a `{pct}` placeholder, which
/// is replaced with the cited percentage formatted to one decimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTemplates {
    /// High tier, geological risk coverage above the critical threshold.
    pub critical_geology: String,
    /// High tier, geological risk coverage at or below the threshold.
    pub operational_waste: String,
    /// Medium tier.
    pub preventive: String,
    /// Low tier.
    pub monitoring: String,
}

/// Input file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFiles {
    /// Service demand log (CSV).
    pub complaints: String,
    /// Occurrence log (CSV).
    pub occurrences: String,
    /// HDI table (CSV).
    pub hdi: String,
    /// Region boundaries (`GeoJSON` polygons).
    pub regions: String,
    /// Neighborhood boundaries (`GeoJSON` polygons).
    pub neighborhoods: String,
    /// Geological risk polygons. Absent means no geological hazard data.
    pub geological_risk: Option<String>,
    /// Flood-prone polygons. Absent means no flood hazard data.
    pub flood_prone: Option<String>,
    /// Drainage channel lines.
    pub channels: String,
    /// Ditch and drain lines.
    pub ditches: String,
}

/// Output file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFiles {
    /// Record dataset (JSON array).
    pub records: String,
    /// Region geometries with attributes (`GeoJSON`).
    pub geometry: String,
    /// Correlation and trend diagnostics (JSON).
    pub diagnostics: String,
}
