//! Shared types and domain logic for the Climate Forecast Service
//!
//! This crate contains everything that does not need a running server or a
//! database: the variable catalog, timestamp-keyed series tables, the
//! observation transform pipeline, the trained-model artifact, the forecast
//! assembly logic, the upstream CSV wire format, and the land-mask grid
//! sampler.

pub mod forecasting;
pub mod model;
pub mod models;
pub mod sampling;
pub mod series;
pub mod transform;
pub mod types;
pub mod wire;

pub use forecasting::*;
pub use model::*;
pub use models::*;
pub use sampling::*;
pub use series::*;
pub use types::*;
