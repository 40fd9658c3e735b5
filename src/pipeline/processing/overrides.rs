//! Named regional override rules for known data deserts.
//!
//! A finite, declarative list applied after the generic fills. Each rule
//! resolves its source values from a read-only view of the panel before
//! writing anything.

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::group_means::mean;
use crate::observability::metrics;
use crate::pipeline::panel::Panel;
use crate::registry::countries::{MELANESIA, MICRONESIA, POLYNESIA};
use crate::registry::indicators::{ATTITUDES_TOWARDS_VIOLENCE, FINANCIAL_INCLUSION};
use crate::registry::ReferenceData;
use crate::types::{Cell, SourceTag};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OverrideSource {
    /// Broadcast a designated neighbour's first present value to every year
    ProxyCountry(String),
    /// Equally weighted mean of the per-year subregion means
    SubstituteSubregions(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideRule {
    pub name: String,
    pub indicator: String,
    pub target_subregions: Vec<String>,
    pub source: OverrideSource,
    pub tag: SourceTag,
}

pub fn builtin_rules() -> Vec<OverrideRule> {
    vec![
        OverrideRule {
            name: "pacific_attitudes_timor_proxy".to_string(),
            indicator: ATTITUDES_TOWARDS_VIOLENCE.to_string(),
            target_subregions: vec![MELANESIA.to_string(), MICRONESIA.to_string(), POLYNESIA.to_string()],
            source: OverrideSource::ProxyCountry("TLS".to_string()),
            tag: SourceTag::OverrideNeighborProxy,
        },
        OverrideRule {
            name: "polynesia_financial_inclusion_substitute".to_string(),
            indicator: FINANCIAL_INCLUSION.to_string(),
            target_subregions: vec![POLYNESIA.to_string()],
            source: OverrideSource::SubstituteSubregions(vec![MELANESIA.to_string(), MICRONESIA.to_string()]),
            tag: SourceTag::OverrideRegionalSubstitute,
        },
    ]
}

/// Per-year source values for a rule, read before any write
fn resolve_source(panel: &Panel, reference: &ReferenceData, rule: &OverrideRule, indicator: usize) -> Vec<Option<f64>> {
    let layout = panel.layout();
    let years = layout.year_count();

    match &rule.source {
        OverrideSource::ProxyCountry(iso) => match layout.country_index(iso) {
            Some(c) => {
                let value = (0..years).find_map(|y| panel.value(c, y, indicator));
                if value.is_none() {
                    warn!("{}: proxy country {} has no value for {}", rule.name, iso, rule.indicator);
                }
                vec![value; years]
            }
            None => {
                warn!("{}: proxy country {} is not in the panel", rule.name, iso);
                vec![None; years]
            }
        },
        OverrideSource::SubstituteSubregions(subregions) => {
            let members: Vec<Vec<usize>> = subregions
                .iter()
                .map(|sub| {
                    layout
                        .countries()
                        .iter()
                        .enumerate()
                        .filter(|(_, iso)| !reference.is_excluded(iso) && reference.subregion(iso) == Some(sub.as_str()))
                        .map(|(c, _)| c)
                        .collect()
                })
                .collect();
            (0..years)
                .map(|y| {
                    let group_means = members
                        .iter()
                        .filter_map(|countries| mean(countries.iter().filter_map(|&c| panel.value(c, y, indicator))));
                    mean(group_means)
                })
                .collect()
        }
    }
}

/// Apply one rule. Targets included countries in the target subregions
/// with no `ORIGINAL` value for the indicator. Returns cells written.
pub fn apply_rule(panel: &mut Panel, reference: &ReferenceData, rule: &OverrideRule) -> usize {
    let layout = panel.layout().clone();
    let Some(i) = layout.indicator_index(&rule.indicator) else {
        warn!("{}: indicator '{}' is not in the panel", rule.name, rule.indicator);
        return 0;
    };

    let source = resolve_source(panel, reference, rule, i);
    let targets: Vec<usize> = layout
        .countries()
        .iter()
        .enumerate()
        .filter(|(_, iso)| {
            !reference.is_excluded(iso)
                && reference
                    .subregion(iso)
                    .is_some_and(|sub| rule.target_subregions.iter().any(|t| t == sub))
        })
        .filter(|(c, _)| panel.series(*c, i).iter().all(|cell| cell.tag != SourceTag::Original))
        .map(|(c, _)| c)
        .collect();

    let mut written = 0usize;
    for c in targets {
        for (y, value) in source.iter().enumerate() {
            if let Some(v) = value {
                panel.set_cell(c, y, i, Cell::filled(*v, rule.tag));
                written += 1;
            }
        }
        debug!("{}: overrode {} / {}", rule.name, layout.countries()[c], rule.indicator);
    }

    metrics::overrides::cells_written(&rule.name, written);
    written
}

/// Apply rules in table order. Returns `(rule name, cells written)` per rule.
#[instrument(skip_all, fields(rules = rules.len()))]
pub fn apply_all(panel: &mut Panel, reference: &ReferenceData, rules: &[OverrideRule]) -> Vec<(String, usize)> {
    let started = Instant::now();
    let counts: Vec<(String, usize)> = rules
        .iter()
        .map(|rule| {
            let n = apply_rule(panel, reference, rule);
            info!("Override rule {} wrote {} cells", rule.name, n);
            (rule.name.clone(), n)
        })
        .collect();
    metrics::stage_duration("overrides", started.elapsed().as_secs_f64());
    counts
}
