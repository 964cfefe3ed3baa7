#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Region risk metric types and pipeline configuration.
//!
//! This crate defines the per-region tables that flow between the
//! pipeline stages (raw indicators, normalized indicators, scored
//! regions), the three-tier risk classification, and the record shape
//! consumed by the map front end. It has no geometry or I/O dependencies.

pub mod config;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Three equal-frequency risk classes derived from the composite score.
///
/// Variant order is significant: tiers compare and sort from the lowest
/// to the highest risk.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    /// Lowest third of composite scores.
    Low,
    /// Middle third of composite scores.
    Medium,
    /// Highest third of composite scores.
    High,
}

impl RiskTier {
    /// Number of tiers in the classification.
    pub const COUNT: usize = 3;

    /// Returns all variants, lowest risk first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }

    /// Returns the tier for a zero-based index into [`RiskTier::all`].
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }
}

/// Raw per-region indicators, one row of the master table before
/// normalization.
///
/// Every field is filled: missing joins become `0`, except `mean_hdi`
/// which falls back to the citywide mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionIndicators {
    /// Region key, unique across the run.
    pub region_id: String,
    /// Region area in square kilometres (metric CRS).
    pub area_km2: f64,
    /// Waste-related service complaints attributed to the region.
    pub waste_count: u64,
    /// Share of the citywide waste complaint total, in percent.
    pub waste_pct_of_city: f64,
    /// Waste complaints per square kilometre.
    pub waste_density: f64,
    /// Flood-related occurrences attributed to the region.
    pub flood_count: u64,
    /// Share of the citywide flood occurrence total, in percent.
    pub flood_pct_of_city: f64,
    /// Mean human development index of the region's neighborhoods.
    pub mean_hdi: f64,
    /// Percentage of the region area covered by geological risk polygons.
    pub pct_area_geo_risk: f64,
    /// Percentage of the region area covered by flood-prone polygons.
    pub pct_area_flood_risk: f64,
    /// Kilometres of drainage network per square kilometre.
    pub drainage_density: f64,
}

/// The five indicator columns after min-max scaling, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedIndicators {
    /// Scaled `waste_density`.
    pub waste_density: f64,
    /// Scaled `mean_hdi`.
    pub mean_hdi: f64,
    /// Scaled `pct_area_geo_risk`.
    pub geo_risk: f64,
    /// Scaled `pct_area_flood_risk`.
    pub flood_risk: f64,
    /// Scaled `drainage_density`.
    pub drainage_density: f64,
}

/// A region after composite scoring and tier classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRegion {
    /// Raw indicators the score was computed from.
    pub indicators: RegionIndicators,
    /// Min-max scaled indicators.
    pub normalized: NormalizedIndicators,
    /// Weighted composite score in `[0, 1]`.
    pub risk_score: f64,
    /// Quantile tier of `risk_score`.
    pub risk_tier: RiskTier,
}

/// A fully annotated region: the final row of the master table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    /// Scored region.
    #[serde(flatten)]
    pub scored: ScoredRegion,
    /// Human-readable risk explanation.
    pub narrative_text: String,
}

impl RegionMetrics {
    /// Returns the region key.
    #[must_use]
    pub fn region_id(&self) -> &str {
        &self.scored.indicators.region_id
    }

    /// Returns the raw indicators.
    #[must_use]
    pub const fn indicators(&self) -> &RegionIndicators {
        &self.scored.indicators
    }
}

/// One region in the record dataset consumed by the map front end.
///
/// Field names are part of the front end contract and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Region key.
    pub regiao: String,
    /// Waste complaint count.
    pub lixo: u64,
    /// Flood occurrence count.
    pub alagamento: u64,
    /// Mean HDI, rounded to 3 decimals.
    pub idh: f64,
    /// Geological risk coverage percentage, rounded to 2 decimals.
    pub risco_geo: f64,
    /// Drainage network density, rounded to 2 decimals.
    pub densidade_drenagem: f64,
    /// Localized tier label.
    pub cluster: String,
    /// Narrative text.
    pub predict: String,
}

impl ExportRecord {
    /// Property names written for every exported region, in output order.
    pub const FIELDS: &'static [&'static str] = &[
        "regiao",
        "lixo",
        "alagamento",
        "idh",
        "risco_geo",
        "densidade_drenagem",
        "cluster",
        "predict",
    ];
}
