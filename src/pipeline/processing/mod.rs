// Pipeline processing: gap filling, regional overrides and scoring

pub mod cross_sectional;
pub mod group_means;
pub mod overrides;
pub mod scoring;
pub mod temporal_fill;

pub use cross_sectional::FillReport;
pub use group_means::{GroupKind, GroupMeanTable};
pub use overrides::{builtin_rules, OverrideRule, OverrideSource};
pub use scoring::{ScoreRow, ScoreTable};
