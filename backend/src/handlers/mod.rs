//! HTTP request handlers

pub mod collect;

pub use collect::collect;
