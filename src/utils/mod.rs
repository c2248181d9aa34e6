//! Utility helpers for paths and filesystem moves

pub mod fs;
pub mod path;
