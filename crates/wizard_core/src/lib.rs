//! Core of the ETL pipeline wizard
//!
//! This crate holds everything that does not touch the network or a timer:
//! the wizard state machine, validators, the poll-decision engine, analysis
//! result normalization, the target-system table and the HTTP wire schemas.
//! It compiles for both native and WASM targets.

pub mod analysis;
pub mod error;
pub mod poll;
pub mod targets;
pub mod types;
pub mod validators;
pub mod wire;
pub mod wizard;

pub use analysis::{normalize, AnalysisResults, RawAnalysisResult, Stage, StageStatus};
pub use error::{AppError, ErrorKind};
pub use poll::{PollDecision, PollPolicy, PollTracker};
pub use targets::{TargetConfig, TargetSystem};
pub use types::*;
pub use validators::{FileInfo, FileRules, PipelineDraft, ValidationResult};
pub use wizard::{StepCheck, WizardAction, WizardError, WizardMachine, WizardState};
