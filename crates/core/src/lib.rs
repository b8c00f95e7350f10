//! Domain primitives shared by every meshgen crate.
//!
//! Holds the common error types, identifier aliases, and the local
//! subprocess runner used by the reconstruction-script endpoint.

pub mod error;
pub mod scripting;
pub mod types;
