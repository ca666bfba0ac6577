//! External service integrations

pub mod giovanni;
