pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod observability;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use error::{Result, WsiError};
pub use pipeline::{Pipeline, PipelineResult};
