//! Graph build domain
//!
//! The extractor contract, endpoint resolution and the orchestrator that
//! runs a build under the single-builder guarantee.

mod extraction;
mod orchestrator;
mod resolve;

pub use extraction::{
    DEFAULT_RELATION, EdgeSpec, ExtractionClient, ExtractionRequest, ExtractionResponse, NodeSpec,
};
pub use orchestrator::{
    BuildOrchestrator, BuildOutcome, BuildReport, BuildSettings, DEFAULT_SUMMARY,
    MIN_CONTENT_CHARS, NOT_ENOUGH_CONTENT_SUMMARY,
};
pub use resolve::{Resolution, resolve};
