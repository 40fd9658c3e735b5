pub mod countries;
pub mod indicators;
pub mod reference;
pub mod source_loader;

pub use reference::{LookupMiss, LookupTable, ReferenceData, ReferenceDataBuilder};
pub use source_loader::{build_adapters, load_sources, SourceFormat, SourceSpec};
