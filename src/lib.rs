//! benchlink — client pipelines for a TestBench-style test management server
//!
//! The workspace crates each cover one concern:
//!
//! - `benchlink-client`: typed HTTP client and wire types
//! - `benchlink-poller`: adaptive-interval job polling
//! - `benchlink-artifact`: report archive persistence and cleanup
//! - `benchlink-tree`: linked project/theme display trees
//! - `benchlink-runner`: external generator tool invocation
//! - `benchlink-config`: configuration model and discovery
//!
//! This crate wires them into the generation, read and import pipelines and
//! the CLI on top.

pub mod cli;
pub mod logging;
mod orchestrator;

pub use orchestrator::{
    GenerationOrchestrator, GenerationRequest, LastGenerationParameters, PipelineOutcome,
    SubjectSelector,
};
