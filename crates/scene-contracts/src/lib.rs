//! Pure data and deterministic logic for the lifestyle scene pipeline.

pub mod banks;
pub mod category;
pub mod error;
pub mod events;
pub mod prompts;
pub mod runs;
pub mod selection;

pub use category::ProductCategory;
pub use error::{PipelineError, PipelineResult, RegistryError};
pub use selection::{SceneSelection, ViewStage};
