//! Business logic services

pub mod collect;
pub mod forecast;
pub mod timezone;
