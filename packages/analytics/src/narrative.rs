//! Rule-based risk narratives.

use urban_risk_models::config::NarrativeTemplates;
use urban_risk_models::{RegionMetrics, RiskTier, ScoredRegion};

/// Geological risk coverage (percent) above which a high-tier region gets
/// the geological instability alert instead of the operational one.
pub const CRITICAL_GEO_RISK_PCT: f64 = 10.0;

/// Placeholder replaced with the cited percentage.
const PCT_PLACEHOLDER: &str = "{pct}";

fn render(template: &str, pct: f64) -> String {
    template.replace(PCT_PLACEHOLDER, &format!("{pct:.1}"))
}

/// Picks the narrative for a region from its tier and raw indicators.
///
/// Every tier maps to exactly one template; only the high tier looks at
/// the indicator values.
#[must_use]
pub fn narrative(
    tier: RiskTier,
    geo_risk_pct: f64,
    waste_pct_of_city: f64,
    templates: &NarrativeTemplates,
) -> String {
    match tier {
        RiskTier::High if geo_risk_pct > CRITICAL_GEO_RISK_PCT => {
            render(&templates.critical_geology, geo_risk_pct)
        }
        RiskTier::High => render(&templates.operational_waste, waste_pct_of_city),
        RiskTier::Medium => templates.preventive.clone(),
        RiskTier::Low => templates.monitoring.clone(),
    }
}

/// Attaches a narrative to every scored region.
#[must_use]
pub fn annotate(scored: Vec<ScoredRegion>, templates: &NarrativeTemplates) -> Vec<RegionMetrics> {
    scored
        .into_iter()
        .map(|scored| {
            let narrative_text = narrative(
                scored.risk_tier,
                scored.indicators.pct_area_geo_risk,
                scored.indicators.waste_pct_of_city,
                templates,
            );
            RegionMetrics {
                scored,
                narrative_text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> NarrativeTemplates {
        NarrativeTemplates {
            critical_geology: "geology {pct}%".to_string(),
            operational_waste: "waste {pct}%".to_string(),
            preventive: "preventive".to_string(),
            monitoring: "monitoring".to_string(),
        }
    }

    #[test]
    fn high_tier_above_threshold_cites_geology() {
        assert_eq!(
            narrative(RiskTier::High, 15.0, 3.0, &templates()),
            "geology 15.0%"
        );
        assert_eq!(
            narrative(RiskTier::High, 12.345, 3.0, &templates()),
            "geology 12.3%"
        );
    }

    #[test]
    fn high_tier_at_threshold_cites_waste_share() {
        assert_eq!(
            narrative(RiskTier::High, CRITICAL_GEO_RISK_PCT, 22.46, &templates()),
            "waste 22.5%"
        );
        assert_eq!(narrative(RiskTier::High, 0.0, 0.0, &templates()), "waste 0.0%");
    }

    #[test]
    fn lower_tiers_ignore_values() {
        for geo in [0.0, 10.0, 50.0] {
            assert_eq!(narrative(RiskTier::Medium, geo, 40.0, &templates()), "preventive");
            assert_eq!(narrative(RiskTier::Low, geo, 40.0, &templates()), "monitoring");
        }
    }

    #[test]
    fn template_without_placeholder_is_kept() {
        let mut t = templates();
        t.critical_geology = "fixed".to_string();
        assert_eq!(narrative(RiskTier::High, 80.0, 0.0, &t), "fixed");
    }
}
