//! Native client for the ETL pipeline API
//!
//! [`HttpApiClient`] speaks HTTP through `reqwest`. The three controllers
//! ([`FileUploadController`], [`AnalysisController`], [`PipelineController`])
//! wrap it with loading/error bookkeeping; their actions never return errors,
//! they store a classified message and return `None` instead.
//!
//! Copyright (c) 2025 Michael A Wright

pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod pipelines;
pub mod state;
pub mod upload;

#[cfg(test)]
mod testing;

pub use analysis::{
    poll_until_complete, AnalysisController, AnalysisPhase, AnalysisState, PollOutcome,
};
pub use client::{HttpApiClient, PipelineApi};
pub use config::ApiConfig;
pub use error::{classify, ApiError};
pub use pipelines::PipelineController;
pub use state::OperationState;
pub use upload::{FileUploadController, SelectedFile, UploadOutcome};
