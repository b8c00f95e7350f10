//! Image-to-model generation pipeline.
//!
//! Sequences the remote generation service calls, waits for the
//! conversion task, streams the artifact to disk, and hands it to the
//! mesh store. One [`orchestrator::PipelineOrchestrator`] is built at
//! startup and shared by every request.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod stage;
