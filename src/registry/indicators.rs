//! Build-time indicator configuration: the indicator table, the panel's
//! year range and the exclusion set.

use crate::types::{Dimension, FillStrategy, IndicatorDefinition};

pub const FIRST_YEAR: i32 = 1995;
pub const LAST_YEAR: i32 = 2024;

/// Territories carried through the run but left out of the scored composite
pub const EXCLUDED_ISO: &[&str] = &["TKL", "WLF", "MNP", "ASM", "PYF"];

pub const EDUCATION: &str = "Education";
pub const EMPLOYMENT: &str = "Employment";
pub const PARLIAMENTARY_REPRESENTATION: &str = "Parliamentary Representation";
pub const LEGAL_PROTECTION_INDEX: &str = "Legal Protection Index";
pub const SON_BIAS: &str = "Son Bias";
pub const MATERNAL_MORTALITY: &str = "Maternal Mortality";
pub const ATTITUDES_TOWARDS_VIOLENCE: &str = "Attitudes Towards Violence";
pub const CHILD_MARRIAGE: &str = "Child Marriage";
pub const POVERTY: &str = "Poverty";
pub const ACCESS_WATER_SANITATION: &str = "Access Water Sanitation";
pub const ACCESS_ELECTRICITY: &str = "Access Electricity";
pub const FINANCIAL_INCLUSION: &str = "Financial Inclusion";
pub const CELL_PHONE_USE: &str = "Cell Phone Use";

/// name, dimension, invert, fill
const INDICATOR_TABLE: &[(&str, Dimension, bool, FillStrategy)] = &[
    (EDUCATION, Dimension::Equity, false, FillStrategy::RegionAvg),
    (EMPLOYMENT, Dimension::Equity, false, FillStrategy::RegionAvg),
    (PARLIAMENTARY_REPRESENTATION, Dimension::Equity, false, FillStrategy::IncomeAvg),
    (LEGAL_PROTECTION_INDEX, Dimension::Equity, false, FillStrategy::IncomeAvg),
    (SON_BIAS, Dimension::Equity, true, FillStrategy::RegionAvg),
    (MATERNAL_MORTALITY, Dimension::Protection, true, FillStrategy::RegionAvg),
    (ATTITUDES_TOWARDS_VIOLENCE, Dimension::Protection, true, FillStrategy::RegionAvg),
    (CHILD_MARRIAGE, Dimension::Protection, true, FillStrategy::RegionAvg),
    (POVERTY, Dimension::Resilience, true, FillStrategy::IncomeAvg),
    (ACCESS_WATER_SANITATION, Dimension::Resilience, false, FillStrategy::IncomeAvg),
    (ACCESS_ELECTRICITY, Dimension::Resilience, false, FillStrategy::IncomeAvg),
    (FINANCIAL_INCLUSION, Dimension::Resilience, false, FillStrategy::IncomeAvg),
    (CELL_PHONE_USE, Dimension::Resilience, false, FillStrategy::IncomeAvg),
];

pub fn builtin_indicators() -> Vec<IndicatorDefinition> {
    INDICATOR_TABLE
        .iter()
        .map(|(name, dimension, invert, fill)| IndicatorDefinition::new(name, *dimension, *invert, *fill))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_dimension_has_indicators() {
        let defs = builtin_indicators();
        assert_eq!(defs.len(), 13);
        for dim in Dimension::ALL {
            assert!(defs.iter().any(|d| d.dimension == dim), "{} has no indicators", dim);
        }
    }

    #[test]
    fn indicator_names_are_unique() {
        let defs = builtin_indicators();
        let names: HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }
}
