//! Local subprocess execution for the reconstruction script.
//!
//! The script is an opaque collaborator: it receives arguments, writes
//! its artifacts to disk, and reports success through its exit code.

pub mod executor;
pub mod subprocess;
