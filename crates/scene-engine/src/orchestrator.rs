use std::sync::Arc;

use scene_contracts::category::ProductCategory;
use scene_contracts::error::{PipelineError, PipelineResult};
use scene_contracts::events::{now_utc_iso, EventPayload, EventWriter, RunEvent};
use scene_contracts::prompts::{self, Assembly, PromptDocument, PromptEngine};
use scene_contracts::runs::{FailureRecord, RunArtifacts, RunStage, RunSummary, StageRequest};
use scene_contracts::selection::{SceneSelection, Selector, ViewStage};
use serde_json::{json, Map, Value};

use crate::adapters::{
    BackgroundRemover, DirectoryReferences, DryrunBackgroundRemover, DryrunViewGenerator,
    GeminiViewGenerator, JasperBackgroundRemover, ReferenceImage, ReferenceSupplier,
    ViewGenerator, ViewRequest,
};
use crate::asset::ImageAsset;
use crate::config::EngineConfig;
use crate::guard::{self, GuardConfig, GuardReport};

/// Transparent cutout produced by the first stage.
#[derive(Debug, Clone)]
pub struct BackgroundOutcome {
    pub asset: ImageAsset,
    pub guard: GuardReport,
    pub provider_request: Map<String, Value>,
    pub provider_response: Map<String, Value>,
}

/// A generated view together with the choices and prompt behind it.
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    pub asset: ImageAsset,
    pub selection: SceneSelection,
    pub prompt: PromptDocument,
    pub reference_count: usize,
    pub provider_request: Map<String, Value>,
    pub provider_response: Map<String, Value>,
}

impl ViewOutcome {
    /// Rebuilds an outcome from a stored artifact and its selection. The
    /// prompt is re-rendered, which reproduces the original text.
    pub fn restored(asset: ImageAsset, selection: SceneSelection) -> PipelineResult<Self> {
        let prompt = prompts::render(&selection)?;
        Ok(Self {
            asset,
            selection,
            prompt,
            reference_count: 0,
            provider_request: Map::new(),
            provider_response: Map::new(),
        })
    }

    pub fn stage_request(&self) -> StageRequest {
        StageRequest {
            category: self.selection.category,
            stage: self.selection.stage,
            selection: self.selection.clone(),
            prompt_fingerprint: self.prompt.fingerprint(),
            prompt_chars: self.prompt.len(),
            reference_count: self.reference_count,
        }
    }
}

enum StageArtifact {
    Background(BackgroundOutcome),
    Primary(ViewOutcome),
    Secondary(ViewOutcome),
}

impl StageArtifact {
    fn event_payload(&self) -> EventPayload {
        let mut payload = EventPayload::new();
        match self {
            Self::Background(outcome) => {
                payload.insert("mime".to_string(), json!(outcome.asset.mime()));
                payload.insert("bytes".to_string(), json!(outcome.asset.len()));
                payload.insert(
                    "guard".to_string(),
                    serde_json::to_value(&outcome.guard).unwrap_or(Value::Null),
                );
            }
            Self::Primary(outcome) | Self::Secondary(outcome) => {
                payload.insert("mime".to_string(), json!(outcome.asset.mime()));
                payload.insert("bytes".to_string(), json!(outcome.asset.len()));
                payload.insert(
                    "prompt_fingerprint".to_string(),
                    json!(outcome.prompt.fingerprint()),
                );
                payload.insert("reference_count".to_string(), json!(outcome.reference_count));
                payload.insert(
                    "selection".to_string(),
                    serde_json::to_value(&outcome.selection).unwrap_or(Value::Null),
                );
            }
        }
        payload
    }
}

/// One invocation of the pipeline. Owned by a single caller; not shared.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: String,
    category: ProductCategory,
    stage: RunStage,
    started_at: String,
    finished_at: Option<String>,
    raw: Option<ImageAsset>,
    background: Option<BackgroundOutcome>,
    transparent: Option<ImageAsset>,
    primary: Option<ViewOutcome>,
    secondary: Option<ViewOutcome>,
    failure: Option<PipelineError>,
    failed_stage: Option<RunStage>,
    regenerations: u32,
    events: Option<EventWriter>,
}

impl PipelineRun {
    pub fn new(category: ProductCategory, raw: ImageAsset) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            stage: RunStage::Idle,
            started_at: now_utc_iso(),
            finished_at: None,
            raw: Some(raw),
            background: None,
            transparent: None,
            primary: None,
            secondary: None,
            failure: None,
            failed_stage: None,
            regenerations: 0,
            events: None,
        }
    }

    /// A completed run rebuilt from stored artifacts, ready for regeneration.
    pub fn restore(
        id: impl Into<String>,
        category: ProductCategory,
        transparent: ImageAsset,
        primary: ViewOutcome,
        secondary: Option<ViewOutcome>,
    ) -> PipelineResult<Self> {
        if primary.selection.category != category || primary.selection.stage != ViewStage::Primary
        {
            return Err(PipelineError::validation(format!(
                "stored primary selection does not belong to a {category} primary view"
            )));
        }
        Ok(Self {
            id: id.into(),
            category,
            stage: RunStage::Complete,
            started_at: now_utc_iso(),
            finished_at: None,
            raw: None,
            background: None,
            transparent: Some(transparent),
            primary: Some(primary),
            secondary,
            failure: None,
            failed_stage: None,
            regenerations: 0,
            events: None,
        })
    }

    pub fn with_raw(mut self, raw: ImageAsset) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn with_started_at(mut self, started_at: impl Into<String>) -> Self {
        self.started_at = started_at.into();
        self
    }

    pub fn with_regenerations(mut self, regenerations: u32) -> Self {
        self.regenerations = regenerations;
        self
    }

    /// Marks a restored run as failed while `stage` was running.
    pub fn with_failed_stage(mut self, stage: RunStage) -> Self {
        self.stage = RunStage::Failed;
        self.failed_stage = Some(stage);
        self
    }

    pub fn attach_events(&mut self, writer: EventWriter) {
        self.events = Some(writer);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn raw(&self) -> Option<&ImageAsset> {
        self.raw.as_ref()
    }

    pub fn background(&self) -> Option<&BackgroundOutcome> {
        self.background.as_ref()
    }

    pub fn transparent(&self) -> Option<&ImageAsset> {
        self.transparent.as_ref()
    }

    pub fn primary(&self) -> Option<&ViewOutcome> {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> Option<&ViewOutcome> {
        self.secondary.as_ref()
    }

    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    pub fn failed_stage(&self) -> Option<RunStage> {
        self.failed_stage
    }

    /// Whether `regenerate_secondary` will accept this run.
    pub fn can_regenerate(&self) -> bool {
        self.primary.is_some() && self.stage.can_regenerate(self.failed_stage)
    }

    pub fn regenerations(&self) -> u32 {
        self.regenerations
    }

    /// Produced artifacts in stage order.
    pub fn artifacts(&self) -> Vec<&ImageAsset> {
        [
            self.transparent.as_ref(),
            self.primary.as_ref().map(|view| &view.asset),
            self.secondary.as_ref().map(|view| &view.asset),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn summary(&self, artifacts: RunArtifacts) -> RunSummary {
        RunSummary {
            run_id: self.id.clone(),
            category: self.category,
            stage: self.stage,
            started_at: self.started_at.clone(),
            finished_at: self.finished_at.clone().unwrap_or_else(now_utc_iso),
            artifacts,
            primary_selection: self.primary.as_ref().map(|view| view.selection.clone()),
            secondary_selection: self.secondary.as_ref().map(|view| view.selection.clone()),
            failure: self.failure.as_ref().map(FailureRecord::from),
            failed_stage: self.failed_stage,
            regenerations: self.regenerations,
        }
    }

    fn advance(&mut self, next: RunStage) -> PipelineResult<()> {
        self.stage = self.stage.transition(next)?;
        if self.stage.is_terminal() {
            self.finished_at = Some(now_utc_iso());
        }
        Ok(())
    }

    fn fail(&mut self, err: PipelineError) {
        self.failed_stage = Some(self.stage);
        self.stage = RunStage::Failed;
        self.failure = Some(err);
        self.finished_at = Some(now_utc_iso());
    }

    fn store(&mut self, artifact: StageArtifact) {
        match artifact {
            StageArtifact::Background(outcome) => {
                self.transparent = Some(outcome.asset.clone());
                self.background = Some(outcome);
            }
            StageArtifact::Primary(outcome) => self.primary = Some(outcome),
            StageArtifact::Secondary(outcome) => self.secondary = Some(outcome),
        }
    }

    fn emit(&self, event: RunEvent, payload: EventPayload) {
        let Some(writer) = &self.events else {
            return;
        };
        if let Err(err) = writer.emit(event, payload) {
            tracing::warn!(run_id = %self.id, event = %event, error = %err, "event log write failed");
        }
    }
}

/// Sequences background removal, primary view and secondary view.
///
/// Holds only shared, read-only collaborators, so one pipeline can serve
/// many runs.
#[derive(Clone)]
pub struct Pipeline {
    remover: Arc<dyn BackgroundRemover>,
    generator: Arc<dyn ViewGenerator>,
    references: Arc<dyn ReferenceSupplier>,
    prompts: PromptEngine,
    guard: GuardConfig,
}

impl Pipeline {
    pub fn new(
        remover: Arc<dyn BackgroundRemover>,
        generator: Arc<dyn ViewGenerator>,
        references: Arc<dyn ReferenceSupplier>,
        prompts: PromptEngine,
    ) -> Self {
        Self {
            remover,
            generator,
            references,
            prompts,
            guard: GuardConfig::default(),
        }
    }

    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    /// HTTP adapters from `config`, or the offline ones when `dryrun` is set.
    pub fn from_config(config: &EngineConfig, dryrun: bool) -> PipelineResult<Self> {
        let (remover, generator): (Arc<dyn BackgroundRemover>, Arc<dyn ViewGenerator>) = if dryrun
        {
            (Arc::new(DryrunBackgroundRemover), Arc::new(DryrunViewGenerator))
        } else {
            (
                Arc::new(JasperBackgroundRemover::from_config(config)),
                Arc::new(GeminiViewGenerator::from_config(config)),
            )
        };
        Ok(Self::new(
            remover,
            generator,
            Arc::new(DirectoryReferences::new(config.references_dir.clone())),
            PromptEngine::builtin()?,
        )
        .with_guard(config.guard))
    }

    pub fn prompts(&self) -> &PromptEngine {
        &self.prompts
    }

    /// Guard then background removal. Reads only the raw upload.
    pub fn remove_background(&self, raw: &ImageAsset) -> PipelineResult<BackgroundOutcome> {
        let guarded = guard::normalize(raw, &self.guard)?;
        tracing::info!(
            remover = self.remover.name(),
            passthrough = guarded.report.passthrough,
            passes = guarded.report.passes.len(),
            bytes = guarded.asset.len(),
            "sending image for background removal"
        );
        let output = self.remover.remove_background(&guarded.asset)?;
        Ok(BackgroundOutcome {
            asset: output.asset,
            guard: guarded.report,
            provider_request: output.provider_request,
            provider_response: output.provider_response,
        })
    }

    /// Head-on scene around the transparent product, with style references.
    pub fn generate_primary(
        &self,
        transparent: &ImageAsset,
        category: ProductCategory,
        selector: &mut dyn Selector,
    ) -> PipelineResult<ViewOutcome> {
        let assembly = self
            .prompts
            .assemble(category, ViewStage::Primary, selector)?;
        let references = self.references.references(category);
        self.generate(assembly, transparent, &references)
    }

    /// Three-quarter view of a primary image. No primary selection is known,
    /// so accents are drawn fresh and rendered as hints, and the reference
    /// image alone sets the lighting.
    pub fn generate_secondary(
        &self,
        primary: &ImageAsset,
        category: ProductCategory,
        selector: &mut dyn Selector,
    ) -> PipelineResult<ViewOutcome> {
        let assembly = self
            .prompts
            .assemble(category, ViewStage::Secondary, selector)?;
        self.generate(assembly, primary, &[])
    }

    fn generate_continuation(
        &self,
        primary: &ViewOutcome,
        selector: &mut dyn Selector,
    ) -> PipelineResult<ViewOutcome> {
        let assembly = self
            .prompts
            .assemble_continuation(&primary.selection, selector)?;
        self.generate(assembly, &primary.asset, &[])
    }

    fn generate(
        &self,
        assembly: Assembly,
        anchor: &ImageAsset,
        references: &[ReferenceImage],
    ) -> PipelineResult<ViewOutcome> {
        tracing::info!(
            generator = self.generator.name(),
            stage = %assembly.selection.stage,
            category = %assembly.selection.category,
            prompt_fingerprint = %assembly.document.fingerprint(),
            references = references.len(),
            "generating view"
        );
        let output = self.generator.generate_view(&ViewRequest {
            prompt: &assembly.document,
            anchor,
            references,
        })?;
        Ok(ViewOutcome {
            asset: output.asset,
            selection: assembly.selection,
            prompt: assembly.document,
            reference_count: references.len(),
            provider_request: output.provider_request,
            provider_response: output.provider_response,
        })
    }

    fn run_stage(
        &self,
        run: &PipelineRun,
        selector: &mut dyn Selector,
    ) -> PipelineResult<StageArtifact> {
        let missing =
            |what: &str| PipelineError::validation(format!("run {} has no {what}", run.id));
        match run.stage {
            RunStage::RemovingBackground => {
                let raw = run.raw.as_ref().ok_or_else(|| missing("raw image"))?;
                self.remove_background(raw).map(StageArtifact::Background)
            }
            RunStage::GeneratingPrimaryView => {
                let transparent = run
                    .transparent
                    .as_ref()
                    .ok_or_else(|| missing("transparent image"))?;
                self.generate_primary(transparent, run.category, selector)
                    .map(StageArtifact::Primary)
            }
            RunStage::GeneratingSecondaryView | RunStage::RegeneratingSecondaryView => {
                let primary = run.primary.as_ref().ok_or_else(|| missing("primary view"))?;
                self.generate_continuation(primary, selector)
                    .map(StageArtifact::Secondary)
            }
            RunStage::Idle | RunStage::Complete | RunStage::Failed => Err(
                PipelineError::validation(format!("run {} has no stage to execute in {}", run.id, run.stage)),
            ),
        }
    }

    /// Executes the run's current stage and moves it on. Returns the new stage.
    pub fn step(&self, run: &mut PipelineRun, selector: &mut dyn Selector) -> PipelineResult<RunStage> {
        if run.stage == RunStage::Idle {
            run.advance(RunStage::RemovingBackground)?;
            let mut payload = EventPayload::new();
            payload.insert("category".to_string(), json!(run.category));
            run.emit(RunEvent::RunStarted, payload);
            tracing::info!(run_id = %run.id, category = %run.category, "run started");
            return Ok(run.stage);
        }
        if run.stage.is_terminal() {
            return Err(PipelineError::validation(format!(
                "run {} is already {}",
                run.id, run.stage
            )));
        }

        let stage = run.stage;
        let mut payload = EventPayload::new();
        payload.insert("stage".to_string(), json!(stage));
        run.emit(RunEvent::StageStarted, payload);
        tracing::info!(run_id = %run.id, stage = %stage, "stage started");

        match self.run_stage(run, selector) {
            Ok(artifact) => {
                let mut payload = artifact.event_payload();
                run.store(artifact);
                let next = stage.on_success().unwrap_or(RunStage::Complete);
                run.advance(next)?;
                payload.insert("stage".to_string(), json!(stage));
                payload.insert("next_stage".to_string(), json!(next));
                run.emit(RunEvent::StageCompleted, payload);
                tracing::info!(run_id = %run.id, stage = %stage, next = %next, "stage completed");
                Ok(next)
            }
            Err(err) => {
                tracing::warn!(run_id = %run.id, stage = %stage, error = %err, "stage failed");
                run.fail(err.clone());
                let mut payload = EventPayload::new();
                payload.insert("stage".to_string(), json!(stage));
                payload.insert("error_kind".to_string(), json!(err.kind()));
                payload.insert("error".to_string(), json!(err.to_string()));
                if let Some(status) = err.upstream_status() {
                    payload.insert("upstream_status".to_string(), json!(status));
                }
                run.emit(RunEvent::StageFailed, payload);
                Err(err)
            }
        }
    }

    /// Runs an idle run to completion. Stops at the first failing stage.
    pub fn execute(&self, run: &mut PipelineRun, selector: &mut dyn Selector) -> PipelineResult<()> {
        if run.stage != RunStage::Idle {
            return Err(PipelineError::validation(format!(
                "run {} cannot start from {}",
                run.id, run.stage
            )));
        }
        let mut outcome = Ok(());
        while !run.stage.is_terminal() {
            if let Err(err) = self.step(run, selector) {
                outcome = Err(err);
                break;
            }
        }
        let mut payload = EventPayload::new();
        payload.insert("stage".to_string(), json!(run.stage));
        payload.insert("artifacts".to_string(), json!(run.artifacts().len()));
        run.emit(RunEvent::RunCompleted, payload);
        tracing::info!(run_id = %run.id, stage = %run.stage, "run finished");
        outcome
    }

    /// Re-runs only the secondary view. Accepts a complete run, or one that
    /// failed while producing its secondary view. The transparent and primary
    /// artifacts are never touched.
    pub fn regenerate_secondary(
        &self,
        run: &mut PipelineRun,
        selector: &mut dyn Selector,
    ) -> PipelineResult<()> {
        if run.stage == RunStage::Failed {
            if !run.can_regenerate() {
                let failed_at = run
                    .failed_stage
                    .map_or_else(|| "an unknown stage".to_string(), |stage| stage.to_string());
                return Err(PipelineError::validation(format!(
                    "run {} failed at {failed_at} and has no primary view to regenerate from",
                    run.id
                )));
            }
            tracing::info!(run_id = %run.id, failed_at = ?run.failed_stage, "retrying secondary view");
            run.stage = RunStage::RegeneratingSecondaryView;
            run.failure = None;
            run.failed_stage = None;
            run.finished_at = None;
        } else {
            run.advance(RunStage::RegeneratingSecondaryView)?;
        }
        let previous = run
            .secondary
            .as_ref()
            .map(|view| view.prompt.fingerprint());
        self.step(run, selector)?;
        run.regenerations += 1;

        let mut payload = EventPayload::new();
        payload.insert("regenerations".to_string(), json!(run.regenerations));
        payload.insert("previous_fingerprint".to_string(), json!(previous));
        payload.insert(
            "prompt_fingerprint".to_string(),
            json!(run.secondary.as_ref().map(|view| view.prompt.fingerprint())),
        );
        run.emit(RunEvent::SecondaryRegenerated, payload);
        Ok(())
    }
}
