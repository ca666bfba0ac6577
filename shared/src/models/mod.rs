//! Domain models for observations and forecasts

pub mod forecast;
pub mod observation;
pub mod variable;

pub use forecast::*;
pub use observation::*;
pub use variable::*;
