//! tl-core: stable foundation for Trajectory Lab.
//!
//! Contains:
//! - ids (profile identifiers parsed from directory names)
//! - layout (on-disk naming conventions for profile artifacts)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod layout;

pub use error::{TlError, TlResult};
pub use ids::ProfileId;
pub use layout::*;
