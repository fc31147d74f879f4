//! Effectful side of the scene pipeline: image handling, service adapters and
//! the stage orchestrator.

pub mod adapters;
pub mod asset;
pub mod config;
pub mod guard;
pub mod orchestrator;

pub use asset::ImageAsset;
pub use config::EngineConfig;
pub use guard::{GuardConfig, GuardReport, OversizePolicy};
pub use orchestrator::{BackgroundOutcome, Pipeline, PipelineRun, ViewOutcome};
