use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RunStage;
use crate::category::ProductCategory;
use crate::error::PipelineError;
use crate::events::now_utc_iso;
use crate::selection::SceneSelection;

/// Paths of the artifacts a run wrote, relative to the run directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl From<&PipelineError> for FailureRecord {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            upstream_status: err.upstream_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub category: ProductCategory,
    pub stage: RunStage,
    pub started_at: String,
    pub finished_at: String,
    #[serde(default)]
    pub artifacts: RunArtifacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_selection: Option<SceneSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_selection: Option<SceneSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
    /// Stage that was running when the run failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<RunStage>,
    #[serde(default)]
    pub regenerations: u32,
}

/// Writes `summary` pretty-printed with a `ts` stamp; `extra` keys are merged last.
pub fn write_summary(
    path: &Path,
    summary: &RunSummary,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(summary)? {
        Value::Object(map) => map,
        _ => anyhow::bail!("run summary did not serialize to an object"),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create summary dir {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)
        .with_context(|| format!("write summary {}", path.display()))?;
    Ok(())
}

pub fn load_summary(path: &Path) -> anyhow::Result<RunSummary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read summary {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse summary {}", path.display()))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{load_summary, write_summary, FailureRecord, RunArtifacts, RunSummary};
    use crate::category::ProductCategory;
    use crate::error::PipelineError;
    use crate::prompts::PromptEngine;
    use crate::runs::RunStage;
    use crate::selection::{SeededSelector, ViewStage};

    fn sample() -> anyhow::Result<RunSummary> {
        let engine = PromptEngine::builtin()?;
        let primary = engine.select(
            ProductCategory::Shelf,
            ViewStage::Primary,
            &mut SeededSelector::new(1),
        )?;
        Ok(RunSummary {
            run_id: "run-123".to_string(),
            category: ProductCategory::Shelf,
            stage: RunStage::Complete,
            started_at: "2026-02-19T00:00:00+00:00".to_string(),
            finished_at: "2026-02-19T00:10:00+00:00".to_string(),
            artifacts: RunArtifacts {
                raw: Some("raw.png".to_string()),
                transparent: Some("transparent.png".to_string()),
                primary: Some("primary.png".to_string()),
                secondary: Some("secondary.png".to_string()),
            },
            primary_selection: Some(primary),
            secondary_selection: None,
            failure: None,
            failed_stage: None,
            regenerations: 0,
        })
    }

    #[test]
    fn write_summary_generates_expected_payload() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("summary.json");
        let mut extra = Map::new();
        extra.insert("dryrun".to_string(), Value::Bool(true));
        write_summary(&path, &sample()?, Some(&extra))?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed["run_id"], json!("run-123"));
        assert_eq!(parsed["stage"], json!("complete"));
        assert_eq!(parsed["artifacts"]["primary"], json!("primary.png"));
        assert_eq!(parsed["dryrun"], json!(true));
        assert!(parsed.get("failure").is_none());
        assert!(parsed.get("ts").and_then(Value::as_str).is_some());
        Ok(())
    }

    #[test]
    fn summary_loads_back_with_selection() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("summary.json");
        let mut summary = sample()?;
        summary.stage = RunStage::Failed;
        summary.failure = Some(FailureRecord::from(&PipelineError::upstream(
            "gemini", 503, "overloaded",
        )));
        summary.failed_stage = Some(RunStage::GeneratingSecondaryView);
        write_summary(&path, &summary, None)?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed["failed_stage"], json!("generating-secondary-view"));

        let loaded = load_summary(&path)?;
        assert_eq!(loaded, summary);
        assert!(loaded.stage.can_regenerate(loaded.failed_stage));
        assert_eq!(
            loaded.failure.and_then(|failure| failure.upstream_status),
            Some(503)
        );
        Ok(())
    }
}
