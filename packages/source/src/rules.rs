//! Rule tables for selecting and canonicalizing tabular records.
//!
//! Keyword containment decides which demand types are waste-related, and
//! prefix rewrites bring occurrence-log region labels to the region key
//! convention. Both are built from configuration; nothing here knows a
//! particular dataset's vocabulary.

use urban_risk_models::config::{FloodingConfig, LabelRewrite, WasteConfig};

use crate::{ComplaintRecord, OccurrenceRecord};

/// Returns true if `haystack` contains any of `needles`.
fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Case-insensitive keyword containment.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    keywords: Vec<String>,
}

impl KeywordRule {
    /// Builds a rule from keywords; blank entries are ignored.
    #[must_use]
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether `text` contains any keyword, ignoring case.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        contains_any(&text.to_uppercase(), &self.keywords)
    }
}

/// Selection rule for waste-related complaints in the target city.
#[derive(Debug, Clone)]
pub struct WasteRule {
    city: String,
    zone_marker: String,
    keywords: KeywordRule,
}

impl WasteRule {
    /// Builds the rule from configuration.
    #[must_use]
    pub fn new(config: &WasteConfig) -> Self {
        Self {
            city: config.city.trim().to_uppercase(),
            zone_marker: config.zone_marker.trim().to_string(),
            keywords: KeywordRule::new(&config.keywords),
        }
    }

    /// Whether the complaint belongs to the target city and carries a
    /// regional zone label.
    #[must_use]
    pub fn in_scope(&self, record: &ComplaintRecord) -> bool {
        record.city.trim().to_uppercase() == self.city && record.zone.contains(&self.zone_marker)
    }

    /// Whether the complaint is in scope and waste-related.
    #[must_use]
    pub fn is_waste(&self, record: &ComplaintRecord) -> bool {
        self.in_scope(record) && self.keywords.matches(&record.demand_type)
    }
}

/// Ordered prefix rewrites plus the label of the citywide aggregate row.
#[derive(Debug, Clone)]
pub struct LabelRules {
    rewrites: Vec<LabelRewrite>,
    sentinel: String,
}

impl LabelRules {
    /// Builds the rules; the first matching rewrite wins.
    #[must_use]
    pub fn new(rewrites: &[LabelRewrite], sentinel: &str) -> Self {
        Self {
            rewrites: rewrites.to_vec(),
            sentinel: sentinel.trim().to_string(),
        }
    }

    /// Canonicalizes a region label. Returns `None` for blank labels and
    /// for the aggregate sentinel.
    #[must_use]
    pub fn canonicalize(&self, label: &str) -> Option<String> {
        let label = label.trim();
        let canonical = self
            .rewrites
            .iter()
            .find_map(|rule| {
                label
                    .strip_prefix(rule.from.as_str())
                    .map(|rest| format!("{}{rest}", rule.to))
            })
            .unwrap_or_else(|| label.to_string());

        if canonical.is_empty() || canonical == self.sentinel {
            None
        } else {
            Some(canonical)
        }
    }
}

/// Selection rule for flood occurrences.
#[derive(Debug, Clone)]
pub struct FloodRule {
    types: Vec<String>,
    labels: LabelRules,
}

impl FloodRule {
    /// Builds the rule from configuration.
    #[must_use]
    pub fn new(config: &FloodingConfig) -> Self {
        Self {
            types: config.types.iter().map(|t| t.trim().to_string()).collect(),
            labels: LabelRules::new(&config.label_rewrites, &config.sentinel),
        }
    }

    /// Returns the canonical region label if the occurrence is a flood
    /// type and not the aggregate row.
    #[must_use]
    pub fn region_of(&self, record: &OccurrenceRecord) -> Option<String> {
        if !self.types.iter().any(|t| t == record.kind.trim()) {
            return None;
        }
        self.labels.canonicalize(&record.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urban_risk_models::config::OccurrenceColumns;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn waste_config() -> WasteConfig {
        WasteConfig {
            city: "Fortaleza".to_string(),
            zone_marker: "SER".to_string(),
            keywords: strings(&["COLETA", "ENTULHO", "PODA", "LIXO", "VOLUMOSO"]),
            columns: urban_risk_models::config::ComplaintColumns {
                city: "CIDADE".to_string(),
                zone: "ZONA".to_string(),
                demand_type: "TIPO DA DEMANDA".to_string(),
            },
        }
    }

    fn complaint(city: &str, zone: &str, demand_type: &str) -> ComplaintRecord {
        ComplaintRecord {
            city: city.to_string(),
            zone: zone.to_string(),
            demand_type: demand_type.to_string(),
        }
    }

    fn flood_rule() -> FloodRule {
        FloodRule::new(&FloodingConfig {
            types: strings(&["Inundação", "Alagamento"]),
            sentinel: "TODAS".to_string(),
            label_rewrites: vec![LabelRewrite {
                from: "SR ".to_string(),
                to: "SER ".to_string(),
            }],
            columns: OccurrenceColumns {
                region: "Regional".to_string(),
                kind: "Tipologia de Ocorrência".to_string(),
                count: "Ocorrências".to_string(),
            },
        })
    }

    fn occurrence(region: &str, kind: &str) -> OccurrenceRecord {
        OccurrenceRecord {
            region: region.to_string(),
            kind: kind.to_string(),
            count: 1,
        }
    }

    #[test]
    fn keywords_match_ignoring_case() {
        let rule = KeywordRule::new(&strings(&["lixo", " poda ", ""]));
        assert!(rule.matches("Coleta de LIXO domiciliar"));
        assert!(rule.matches("poda de árvore"));
        assert!(!rule.matches("Iluminação pública"));
    }

    #[test]
    fn waste_rule_filters_city_and_zone() {
        let rule = WasteRule::new(&waste_config());
        assert!(rule.is_waste(&complaint(" fortaleza ", "SER III", "Remoção de entulho")));
        assert!(!rule.is_waste(&complaint("Caucaia", "SER III", "Remoção de entulho")));
        assert!(!rule.is_waste(&complaint("Fortaleza", "Centro", "Remoção de entulho")));
        assert!(!rule.is_waste(&complaint("Fortaleza", "SER III", "Buraco na via")));
        assert!(rule.in_scope(&complaint("Fortaleza", "SER III", "Buraco na via")));
    }

    #[test]
    fn rewrites_label_prefix() {
        let rule = flood_rule();
        assert_eq!(
            rule.region_of(&occurrence("SR IV", "Alagamento")).as_deref(),
            Some("SER IV")
        );
        assert_eq!(
            rule.region_of(&occurrence("SER IV", "Inundação")).as_deref(),
            Some("SER IV")
        );
        // only a leading match is rewritten
        assert_eq!(
            rule.region_of(&occurrence("USR 1", "Alagamento")).as_deref(),
            Some("USR 1")
        );
    }

    #[test]
    fn drops_sentinel_and_other_types() {
        let rule = flood_rule();
        assert!(rule.region_of(&occurrence("TODAS", "Alagamento")).is_none());
        assert!(rule.region_of(&occurrence("SR I", "Deslizamento")).is_none());
        assert!(rule.region_of(&occurrence("  ", "Alagamento")).is_none());
    }
}
