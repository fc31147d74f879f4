pub mod receipts;
pub mod summary;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

pub use receipts::{build_stage_receipt, write_receipt, StageRequest, RECEIPT_SCHEMA_VERSION};
pub use summary::{load_summary, write_summary, FailureRecord, RunArtifacts, RunSummary};

/// Position of a run in the pipeline state machine.
///
/// `Idle → RemovingBackground → GeneratingPrimaryView → GeneratingSecondaryView
/// → Complete`; any working state may fall to `Failed`. `Complete` may enter
/// `RegeneratingSecondaryView`, which returns to `Complete` or `Failed`. A run
/// that failed producing its secondary view may also regenerate; see
/// [`RunStage::can_regenerate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStage {
    Idle,
    RemovingBackground,
    GeneratingPrimaryView,
    GeneratingSecondaryView,
    Complete,
    Failed,
    RegeneratingSecondaryView,
}

impl RunStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RemovingBackground => "removing-background",
            Self::GeneratingPrimaryView => "generating-primary-view",
            Self::GeneratingSecondaryView => "generating-secondary-view",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::RegeneratingSecondaryView => "regenerating-secondary-view",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Stage entered when the current one succeeds.
    pub fn on_success(self) -> Option<RunStage> {
        match self {
            Self::Idle => Some(Self::RemovingBackground),
            Self::RemovingBackground => Some(Self::GeneratingPrimaryView),
            Self::GeneratingPrimaryView => Some(Self::GeneratingSecondaryView),
            Self::GeneratingSecondaryView | Self::RegeneratingSecondaryView => {
                Some(Self::Complete)
            }
            Self::Complete | Self::Failed => None,
        }
    }

    pub fn can_transition_to(self, next: RunStage) -> bool {
        match next {
            Self::Failed => !self.is_terminal(),
            Self::RegeneratingSecondaryView => self == Self::Complete,
            other => self.on_success() == Some(other),
        }
    }

    /// Whether a run resting here may regenerate its secondary view.
    /// `failed_at` is the stage that was running when the run failed; only
    /// a secondary failure leaves a primary to continue from.
    pub fn can_regenerate(self, failed_at: Option<RunStage>) -> bool {
        match self {
            Self::Complete => true,
            Self::Failed => matches!(
                failed_at,
                Some(Self::GeneratingSecondaryView | Self::RegeneratingSecondaryView)
            ),
            _ => false,
        }
    }

    /// Validated transition; the error names both states.
    pub fn transition(self, next: RunStage) -> PipelineResult<RunStage> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PipelineError::validation(format!(
                "run cannot move from {self} to {next}"
            )))
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
