use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scene_contracts::category::ProductCategory;
use scene_contracts::events::EventWriter;
use scene_contracts::prompts::PromptEngine;
use scene_contracts::runs::receipts::sanitize_payload;
use scene_contracts::runs::{
    build_stage_receipt, load_summary, write_receipt, write_summary, RunArtifacts, RunStage,
};
use scene_contracts::selection::{RandomSelector, SeededSelector, Selector, ViewStage};
use scene_engine::orchestrator::{BackgroundOutcome, ViewOutcome};
use scene_engine::{EngineConfig, ImageAsset, Pipeline, PipelineRun};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

const SUMMARY_FILE: &str = "summary.json";
const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Parser)]
#[command(name = "scene-rs", version, about = "Lifestyle scene pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Background removal, primary view and secondary view in one run.
    Run(RunArgs),
    RemoveBackground(RemoveBackgroundArgs),
    /// Primary head-on view from a transparent product image.
    Generate(ViewArgs),
    /// Secondary three-quarter view from a primary view.
    Angle(ViewArgs),
    /// New secondary view for a completed run directory.
    Regenerate(RegenerateArgs),
    /// Print an assembled prompt without calling any service.
    Prompt(PromptArgs),
    Banks,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    category: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct RemoveBackgroundArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct ViewArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    category: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct RegenerateArgs {
    #[arg(long)]
    run: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct PromptArgs {
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "primary")]
    stage: String,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    json: bool,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("scene-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => {
            let pipeline = pipeline(args.dryrun)?;
            run_pipeline(&pipeline, &args)
        }
        Command::RemoveBackground(args) => {
            let pipeline = pipeline(args.dryrun)?;
            run_remove_background(&pipeline, &args)
        }
        Command::Generate(args) => {
            let pipeline = pipeline(args.dryrun)?;
            run_view(&pipeline, &args, ViewStage::Primary)
        }
        Command::Angle(args) => {
            let pipeline = pipeline(args.dryrun)?;
            run_view(&pipeline, &args, ViewStage::Secondary)
        }
        Command::Regenerate(args) => {
            let pipeline = pipeline(args.dryrun)?;
            run_regenerate(&pipeline, &args)
        }
        Command::Prompt(args) => run_prompt(&args),
        Command::Banks => run_banks(),
    }
}

fn pipeline(dryrun: bool) -> Result<Pipeline> {
    let config = EngineConfig::from_env()?;
    Ok(Pipeline::from_config(&config, dryrun)?)
}

fn selector(seed: Option<u64>) -> Box<dyn Selector> {
    match seed {
        Some(seed) => Box::new(SeededSelector::new(seed)),
        None => Box::new(RandomSelector::new()),
    }
}

fn parse_category(raw: &str) -> Result<ProductCategory> {
    Ok(raw.parse::<ProductCategory>()?)
}

fn run_pipeline(pipeline: &Pipeline, args: &RunArgs) -> Result<i32> {
    let category = parse_category(&args.category)?;
    let raw = ImageAsset::read(&args.image)?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("create run dir {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join(EVENTS_FILE));

    let mut run = PipelineRun::new(category, raw);
    run.attach_events(EventWriter::new(&events_path, run.id()));
    let mut selector = selector(args.seed);
    let result = pipeline.execute(&mut run, &mut *selector);
    let artifacts = persist_run(&args.out, &run)?;
    result?;

    print_artifacts(&args.out, &artifacts);
    Ok(0)
}

fn run_remove_background(pipeline: &Pipeline, args: &RemoveBackgroundArgs) -> Result<i32> {
    let raw = ImageAsset::read(&args.image)?;
    let outcome = pipeline.remove_background(&raw)?;
    write_asset(&args.out, &outcome.asset)?;
    write_receipt(
        &receipt_path_for(&args.out),
        &background_receipt(&outcome, &args.out),
    )?;
    println!("Wrote {}", args.out.display());
    Ok(0)
}

fn run_view(pipeline: &Pipeline, args: &ViewArgs, stage: ViewStage) -> Result<i32> {
    let category = parse_category(&args.category)?;
    let anchor = ImageAsset::read(&args.image)?;
    let mut selector = selector(args.seed);
    let outcome = match stage {
        ViewStage::Primary => pipeline.generate_primary(&anchor, category, &mut *selector)?,
        ViewStage::Secondary => pipeline.generate_secondary(&anchor, category, &mut *selector)?,
    };
    write_asset(&args.out, &outcome.asset)?;
    let receipt_path = receipt_path_for(&args.out);
    write_view_receipt(&outcome, &args.out, &receipt_path)?;
    println!("Wrote {}", args.out.display());
    Ok(0)
}

fn run_regenerate(pipeline: &Pipeline, args: &RegenerateArgs) -> Result<i32> {
    let summary_path = args.run.join(SUMMARY_FILE);
    let summary = load_summary(&summary_path)?;
    if !summary.stage.can_regenerate(summary.failed_stage) {
        bail!(
            "run {} is {}; only complete runs can regenerate the secondary view, \
             or runs that failed while producing it",
            summary.run_id,
            summary.stage
        );
    }
    let artifact = |name: &Option<String>, what: &str| -> Result<ImageAsset> {
        let name = name
            .as_deref()
            .with_context(|| format!("{} lists no {what} artifact", summary_path.display()))?;
        ImageAsset::read(&args.run.join(name))
    };
    let transparent = artifact(&summary.artifacts.transparent, "transparent")?;
    let primary_selection = summary
        .primary_selection
        .clone()
        .with_context(|| format!("{} has no primary selection", summary_path.display()))?;
    let primary = ViewOutcome::restored(
        artifact(&summary.artifacts.primary, "primary")?,
        primary_selection,
    )?;
    let secondary = match (&summary.artifacts.secondary, &summary.secondary_selection) {
        (Some(name), Some(selection)) => Some(ViewOutcome::restored(
            ImageAsset::read(&args.run.join(name))?,
            selection.clone(),
        )?),
        _ => None,
    };

    let mut run = PipelineRun::restore(
        summary.run_id.clone(),
        summary.category,
        transparent,
        primary,
        secondary,
    )?
    .with_started_at(summary.started_at.clone())
    .with_regenerations(summary.regenerations);
    if let (RunStage::Failed, Some(failed_at)) = (summary.stage, summary.failed_stage) {
        run = run.with_failed_stage(failed_at);
    }
    run.attach_events(EventWriter::new(args.run.join(EVENTS_FILE), run.id()));

    let mut selector = selector(args.seed);
    let result = pipeline.regenerate_secondary(&mut run, &mut *selector);

    let mut artifacts = summary.artifacts.clone();
    if result.is_ok() {
        if let Some(view) = run.secondary() {
            artifacts.secondary = Some(write_view(&args.run, "secondary", view, run.regenerations())?);
        }
    }
    write_summary(&summary_path, &run.summary(artifacts.clone()), None)?;
    result?;

    print_artifacts(&args.run, &artifacts);
    Ok(0)
}

fn run_prompt(args: &PromptArgs) -> Result<i32> {
    let category = parse_category(&args.category)?;
    let stage = args.stage.parse::<ViewStage>()?;
    let engine = PromptEngine::builtin()?;
    let mut selector = selector(args.seed);
    let assembly = engine.assemble(category, stage, &mut *selector)?;
    if args.json {
        let payload = json!({
            "fingerprint": assembly.document.fingerprint(),
            "selection": assembly.selection,
            "prompt": assembly.document.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", assembly.document.as_str());
    }
    Ok(0)
}

fn run_banks() -> Result<i32> {
    let engine = PromptEngine::builtin()?;
    let registry = engine.registry();
    println!("bank version {}", registry.version());
    for (kind, size) in registry.sizes() {
        println!("  {:<18} {size}", kind.as_str());
    }
    Ok(0)
}

/// Writes every artifact and receipt the run holds, then `summary.json`.
fn persist_run(out: &Path, run: &PipelineRun) -> Result<RunArtifacts> {
    let mut artifacts = RunArtifacts::default();
    if let Some(raw) = run.raw() {
        let name = format!("raw.{}", raw.extension());
        write_asset(&out.join(&name), raw)?;
        artifacts.raw = Some(name);
    }
    if let Some(background) = run.background() {
        let name = format!("transparent.{}", background.asset.extension());
        let image_path = out.join(&name);
        write_asset(&image_path, &background.asset)?;
        write_receipt(
            &out.join("receipt-background.json"),
            &background_receipt(background, &image_path),
        )?;
        artifacts.transparent = Some(name);
    }
    if let Some(view) = run.primary() {
        artifacts.primary = Some(write_view(out, "primary", view, 0)?);
    }
    if let Some(view) = run.secondary() {
        artifacts.secondary = Some(write_view(out, "secondary", view, run.regenerations())?);
    }
    write_summary(&out.join(SUMMARY_FILE), &run.summary(artifacts.clone()), None)?;
    tracing::info!(run_id = %run.id(), stage = %run.stage(), dir = %out.display(), "run persisted");
    Ok(artifacts)
}

/// Writes a view and its receipt. Regenerated views get a numbered name so
/// earlier ones stay on disk.
fn write_view(out: &Path, label: &str, view: &ViewOutcome, generation: u32) -> Result<String> {
    let stem = if generation == 0 {
        label.to_string()
    } else {
        format!("{label}-r{generation}")
    };
    let name = format!("{stem}.{}", view.asset.extension());
    let image_path = out.join(&name);
    write_asset(&image_path, &view.asset)?;
    write_view_receipt(view, &image_path, &out.join(format!("receipt-{stem}.json")))?;
    Ok(name)
}

fn write_view_receipt(view: &ViewOutcome, image_path: &Path, receipt_path: &Path) -> Result<()> {
    let receipt = build_stage_receipt(
        &view.stage_request(),
        &view.provider_request,
        &view.provider_response,
        image_path,
        receipt_path,
    );
    write_receipt(receipt_path, &receipt)
}

fn background_receipt(outcome: &BackgroundOutcome, image_path: &Path) -> Value {
    sanitize_payload(&json!({
        "stage": "remove-background",
        "guard": outcome.guard,
        "provider_request": outcome.provider_request,
        "provider_response": outcome.provider_response,
        "artifacts": {
            "image_path": image_path.to_string_lossy(),
        },
    }))
}

fn receipt_path_for(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    image_path.with_file_name(format!("{stem}.receipt.json"))
}

fn write_asset(path: &Path, asset: &ImageAsset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    fs::write(path, asset.bytes()).with_context(|| format!("write image {}", path.display()))
}

fn print_artifacts(dir: &Path, artifacts: &RunArtifacts) {
    for (label, name) in [
        ("transparent", &artifacts.transparent),
        ("primary", &artifacts.primary),
        ("secondary", &artifacts.secondary),
    ] {
        if let Some(name) = name {
            println!("{label:<12} {}", dir.join(name).display());
        }
    }
}
