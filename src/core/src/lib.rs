//! # Pathgate Core
//!
//! Path hierarchy comparison, identity paths, and digest selection shared
//! by the pathgate authorization and session crates.

pub mod digest;
pub mod error;
pub mod path;

// Re-export commonly used types
pub use digest::HashAlgorithm;
pub use error::{CoreError, Result};
pub use path::{is_parent_path, IdentityPath};
