//! Error handling module
//!
//! Defines the closed set of failures a fetch can end with

pub mod types;

pub use types::*;
