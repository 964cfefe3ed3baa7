//! Composite index: normalization, weighted score, tier classification.

use urban_risk_models::{NormalizedIndicators, RegionIndicators, RiskTier, ScoredRegion};

/// Weight of the geological risk coverage.
pub const GEO_RISK_WEIGHT: f64 = 0.30;
/// Weight of the flood-prone coverage.
pub const FLOOD_RISK_WEIGHT: f64 = 0.30;
/// Weight of the waste complaint density.
pub const WASTE_DENSITY_WEIGHT: f64 = 0.15;
/// Weight of the inverted HDI.
pub const HDI_WEIGHT: f64 = 0.10;
/// Weight of the inverted drainage density.
pub const DRAINAGE_WEIGHT: f64 = 0.15;

/// Scales `values` to `[0, 1]` by `(v - min) / (max - min)`.
///
/// A constant column (including a single value) carries no ranking
/// information and maps to `0.0` everywhere.
#[must_use]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| (v - min) / range).collect()
}

/// Weighted sum of the normalized indicators. HDI and drainage density
/// are mitigating factors and enter inverted.
#[must_use]
pub fn composite_score(n: &NormalizedIndicators) -> f64 {
    let score = GEO_RISK_WEIGHT * n.geo_risk
        + FLOOD_RISK_WEIGHT * n.flood_risk
        + WASTE_DENSITY_WEIGHT * n.waste_density
        + HDI_WEIGHT * (1.0 - n.mean_hdi)
        + DRAINAGE_WEIGHT * (1.0 - n.drainage_density);

    // rounding can leave the sum a hair outside [0, 1]
    score.clamp(0.0, 1.0)
}

/// Assigns equal-frequency tiers to `(region_id, score)` pairs.
///
/// Regions are ranked by ascending score, ties broken by ascending region
/// id; the region at rank `r` of `n` gets tier `r * 3 / n`. Tier sizes
/// therefore differ by at most one, and every tier is non-empty once
/// `n >= 3`. The result is in input order.
#[must_use]
pub fn classify_tiers(scores: &[(&str, f64)]) -> Vec<RiskTier> {
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .1
            .total_cmp(&scores[b].1)
            .then_with(|| scores[a].0.cmp(scores[b].0))
    });

    let mut tiers = vec![RiskTier::Low; n];
    for (rank, &index) in order.iter().enumerate() {
        tiers[index] = RiskTier::from_index(rank * RiskTier::COUNT / n).unwrap_or(RiskTier::High);
    }
    tiers
}

/// Normalizes, scores and classifies the master table. Output order
/// follows input order.
#[must_use]
pub fn score_regions(indicators: Vec<RegionIndicators>) -> Vec<ScoredRegion> {
    let column = |f: fn(&RegionIndicators) -> f64| -> Vec<f64> {
        min_max_normalize(&indicators.iter().map(f).collect::<Vec<_>>())
    };

    let waste = column(|r| r.waste_density);
    let hdi = column(|r| r.mean_hdi);
    let geo = column(|r| r.pct_area_geo_risk);
    let flood = column(|r| r.pct_area_flood_risk);
    let drainage = column(|r| r.drainage_density);

    let normalized: Vec<NormalizedIndicators> = (0..indicators.len())
        .map(|i| NormalizedIndicators {
            waste_density: waste[i],
            mean_hdi: hdi[i],
            geo_risk: geo[i],
            flood_risk: flood[i],
            drainage_density: drainage[i],
        })
        .collect();

    let scores: Vec<f64> = normalized.iter().map(composite_score).collect();
    let tiers = classify_tiers(
        &indicators
            .iter()
            .zip(&scores)
            .map(|(r, &s)| (r.region_id.as_str(), s))
            .collect::<Vec<_>>(),
    );

    let scored: Vec<ScoredRegion> = indicators
        .into_iter()
        .zip(normalized)
        .zip(scores.into_iter().zip(tiers))
        .map(|((indicators, normalized), (risk_score, risk_tier))| ScoredRegion {
            indicators,
            normalized,
            risk_score,
            risk_tier,
        })
        .collect();

    if let Some(top) = scored
        .iter()
        .max_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
    {
        log::info!(
            "Scored {} regions; highest risk {} ({:.3}, {})",
            scored.len(),
            top.indicators.region_id,
            top.risk_score,
            top.risk_tier
        );
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicators(id: &str) -> RegionIndicators {
        RegionIndicators {
            region_id: id.to_string(),
            area_km2: 1.0,
            waste_count: 0,
            waste_pct_of_city: 0.0,
            waste_density: 0.0,
            flood_count: 0,
            flood_pct_of_city: 0.0,
            mean_hdi: 0.5,
            pct_area_geo_risk: 0.0,
            pct_area_flood_risk: 0.0,
            drainage_density: 0.0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let sum = GEO_RISK_WEIGHT + FLOOD_RISK_WEIGHT + WASTE_DENSITY_WEIGHT + HDI_WEIGHT + DRAINAGE_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalizes_to_unit_interval() {
        let normalized = min_max_normalize(&[2.0, 4.0, 6.0]);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn constant_column_normalizes_to_zero() {
        assert_eq!(min_max_normalize(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_normalize(&[7.0]), vec![0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn score_extremes() {
        let worst = NormalizedIndicators {
            waste_density: 1.0,
            mean_hdi: 0.0,
            geo_risk: 1.0,
            flood_risk: 1.0,
            drainage_density: 0.0,
        };
        let best = NormalizedIndicators {
            waste_density: 0.0,
            mean_hdi: 1.0,
            geo_risk: 0.0,
            flood_risk: 0.0,
            drainage_density: 1.0,
        };
        assert!((composite_score(&worst) - 1.0).abs() < 1e-12);
        assert!(composite_score(&best).abs() < 1e-12);
    }

    #[test]
    fn inverted_terms_raise_score_when_low() {
        // all-zero normalized inputs still score the two inverted weights
        let score = composite_score(&NormalizedIndicators::default());
        assert!((score - (HDI_WEIGHT + DRAINAGE_WEIGHT)).abs() < 1e-12);
    }

    #[test]
    fn tiers_are_balanced() {
        for n in 3..=13 {
            let ids: Vec<String> = (0..n).map(|i| format!("R{i:02}")).collect();
            #[allow(clippy::cast_precision_loss)]
            let scores: Vec<(&str, f64)> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), ((i * 7) % n) as f64))
                .collect();
            let tiers = classify_tiers(&scores);

            let counts: Vec<usize> = RiskTier::all()
                .iter()
                .map(|t| tiers.iter().filter(|x| *x == t).count())
                .collect();
            let max = counts.iter().max().copied().unwrap_or(0);
            let min = counts.iter().min().copied().unwrap_or(0);
            assert!(min > 0, "n={n}: empty tier in {counts:?}");
            assert!(max - min <= 1, "n={n}: unbalanced tiers {counts:?}");
        }
    }

    #[test]
    fn ties_break_by_region_id() {
        let scores = [("C", 0.5), ("A", 0.5), ("B", 0.5)];
        assert_eq!(
            classify_tiers(&scores),
            vec![RiskTier::High, RiskTier::Low, RiskTier::Medium]
        );
    }

    #[test]
    fn small_region_counts() {
        assert!(classify_tiers(&[]).is_empty());
        assert_eq!(classify_tiers(&[("A", 0.9)]), vec![RiskTier::Low]);
        assert_eq!(
            classify_tiers(&[("A", 0.9), ("B", 0.1)]),
            vec![RiskTier::Medium, RiskTier::Low]
        );
    }

    #[test]
    fn higher_hazard_ranks_higher() {
        let mut low = indicators("SER I");
        low.pct_area_geo_risk = 0.0;
        let mut mid = indicators("SER II");
        mid.pct_area_geo_risk = 10.0;
        let mut high = indicators("SER III");
        high.pct_area_geo_risk = 40.0;
        high.pct_area_flood_risk = 5.0;

        let scored = score_regions(vec![low, mid, high]);
        assert_eq!(scored[0].risk_tier, RiskTier::Low);
        assert_eq!(scored[1].risk_tier, RiskTier::Medium);
        assert_eq!(scored[2].risk_tier, RiskTier::High);
        assert!(scored.iter().all(|s| (0.0..=1.0).contains(&s.risk_score)));
        assert!((scored[2].normalized.geo_risk - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identical_drainage_contributes_full_inverted_weight() {
        let mut a = indicators("SER I");
        a.drainage_density = 2.5;
        a.pct_area_geo_risk = 20.0;
        let mut b = indicators("SER II");
        b.drainage_density = 2.5;

        let scored = score_regions(vec![a, b]);
        for region in &scored {
            assert!(region.normalized.drainage_density.abs() < f64::EPSILON);
        }
        // geo 1.0 * 0.30 + hdi (1 - 0) * 0.10 + drainage (1 - 0) * 0.15
        assert!((scored[0].risk_score - 0.55).abs() < 1e-12);
        assert!((scored[1].risk_score - 0.25).abs() < 1e-12);
    }
}
