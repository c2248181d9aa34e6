//! Staged sparse fetch of one repository path

pub mod fetcher;
pub mod relocate;
pub mod staging;

pub use fetcher::{FetchOutcome, FetchedKind, SparseFetcher};
pub use relocate::{RelocationReport, relocate};
pub use staging::StagingArea;
