//! Correlation and trend statistics over the master table.
//!
//! These are the numbers behind the exploratory charts (correlation
//! heatmap, waste density against flood count) without any rendering.
//!
//! Correlation matrix keys are the snake_case indicator field names
//! (`waste_count`, `flood_count`, `mean_hdi`, `pct_area_geo_risk`,
//! `drainage_density`), not localized display labels. Consumers that
//! chart the matrix map them to labels such as `Lixo` or `Alagamentos`
//! themselves.

use std::collections::BTreeMap;

use serde::Serialize;
use urban_risk_models::{RegionMetrics, RiskTier};

/// Indicator columns included in the correlation matrix, with the
/// accessor for each.
const CORRELATED: &[(&str, fn(&RegionMetrics) -> f64)] = &[
    ("waste_count", |m| count(m.indicators().waste_count)),
    ("flood_count", |m| count(m.indicators().flood_count)),
    ("mean_hdi", |m| m.indicators().mean_hdi),
    ("pct_area_geo_risk", |m| m.indicators().pct_area_geo_risk),
    ("drainage_density", |m| m.indicators().drainage_density),
];

#[allow(clippy::cast_precision_loss)]
const fn count(value: u64) -> f64 {
    value as f64
}

/// An ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    /// Slope.
    pub slope: f64,
    /// Intercept.
    pub intercept: f64,
}

/// Summary statistics written next to the record dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Number of regions analysed.
    pub region_count: usize,
    /// Pearson correlation between every pair of indicators; `None` where
    /// a column is constant.
    pub correlation: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    /// Flood count fitted against waste density.
    pub waste_flood_trend: Option<LinearFit>,
    /// Regions per tier.
    pub tier_counts: BTreeMap<RiskTier, usize>,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation coefficient of two equally long columns.
///
/// Returns `None` for fewer than two pairs or when either column has no
/// variance.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let (mx, my) = (mean(xs), mean(ys));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Least-squares fit of `ys` on `xs`.
///
/// Returns `None` for fewer than two points or when `xs` is constant.
#[must_use]
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let (mx, my) = (mean(xs), mean(ys));
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
    }

    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

impl Diagnostics {
    /// Computes the diagnostics for the annotated master table.
    #[must_use]
    pub fn compute(metrics: &[RegionMetrics]) -> Self {
        let columns: Vec<(&str, Vec<f64>)> = CORRELATED
            .iter()
            .map(|(name, get)| (*name, metrics.iter().map(get).collect()))
            .collect();

        let correlation = columns
            .iter()
            .map(|(a, xs)| {
                let row = columns
                    .iter()
                    .map(|(b, ys)| ((*b).to_string(), pearson(xs, ys)))
                    .collect();
                ((*a).to_string(), row)
            })
            .collect();

        let densities: Vec<f64> = metrics.iter().map(|m| m.indicators().waste_density).collect();
        let floods: Vec<f64> = metrics
            .iter()
            .map(|m| count(m.indicators().flood_count))
            .collect();
        let waste_flood_trend = linear_fit(&densities, &floods);

        let mut tier_counts: BTreeMap<RiskTier, usize> =
            RiskTier::all().iter().map(|t| (*t, 0)).collect();
        for m in metrics {
            *tier_counts.entry(m.scored.risk_tier).or_default() += 1;
        }

        if let Some(fit) = waste_flood_trend {
            log::info!(
                "Flood count vs waste density: slope {:.4}, intercept {:.4}",
                fit.slope,
                fit.intercept
            );
        }

        Self {
            region_count: metrics.len(),
            correlation,
            waste_flood_trend,
            tier_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urban_risk_models::{NormalizedIndicators, RegionIndicators, ScoredRegion};

    fn metrics(id: &str, waste_density: f64, flood_count: u64, tier: RiskTier) -> RegionMetrics {
        RegionMetrics {
            scored: ScoredRegion {
                indicators: RegionIndicators {
                    region_id: id.to_string(),
                    area_km2: 1.0,
                    waste_count: flood_count * 2,
                    waste_pct_of_city: 0.0,
                    waste_density,
                    flood_count,
                    flood_pct_of_city: 0.0,
                    mean_hdi: 0.5,
                    pct_area_geo_risk: 0.0,
                    pct_area_flood_risk: 0.0,
                    drainage_density: 0.0,
                },
                normalized: NormalizedIndicators::default(),
                risk_score: 0.0,
                risk_tier: tier,
            },
            narrative_text: String::new(),
        }
    }

    #[test]
    fn pearson_detects_linear_relation() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_for_constant_column() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn fits_line() {
        let fit = linear_fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert_eq!(linear_fit(&[2.0, 2.0], &[1.0, 3.0]), None);
    }

    #[test]
    fn computes_report() {
        let table = vec![
            metrics("SER I", 1.0, 2, RiskTier::Low),
            metrics("SER II", 2.0, 4, RiskTier::Medium),
            metrics("SER III", 3.0, 6, RiskTier::High),
            metrics("SER IV", 4.0, 8, RiskTier::High),
        ];
        let diagnostics = Diagnostics::compute(&table);

        assert_eq!(diagnostics.region_count, 4);
        assert_eq!(diagnostics.tier_counts[&RiskTier::High], 2);
        assert_eq!(diagnostics.tier_counts[&RiskTier::Low], 1);

        let waste_flood = diagnostics.correlation["waste_count"]["flood_count"].unwrap();
        assert!((waste_flood - 1.0).abs() < 1e-12);
        assert_eq!(diagnostics.correlation["mean_hdi"]["flood_count"], None);

        let fit = diagnostics.waste_flood_trend.unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["tier_counts"]["HIGH"], 2);
        assert!(json["correlation"]["mean_hdi"]["mean_hdi"].is_null());
    }
}
