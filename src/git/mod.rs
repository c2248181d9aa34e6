//! Git operations module
//!
//! The version-control port, its `git` subprocess adapter, remote URL
//! handling and the optional existence probe

pub mod command;
pub mod port;
pub mod probe;
pub mod remote_url;

pub use command::*;
pub use port::*;
pub use probe::*;
pub use remote_url::*;
