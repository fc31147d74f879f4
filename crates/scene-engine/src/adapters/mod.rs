//! Seams to the external image services.

pub mod dryrun;
pub mod gemini;
pub mod jasper;
pub mod references;

use reqwest::blocking::Response as HttpResponse;
use scene_contracts::category::ProductCategory;
use scene_contracts::error::{PipelineError, PipelineResult};
use scene_contracts::prompts::PromptDocument;
use serde_json::{Map, Value};

use crate::asset::ImageAsset;

pub use dryrun::{DryrunBackgroundRemover, DryrunViewGenerator};
pub use gemini::GeminiViewGenerator;
pub use jasper::JasperBackgroundRemover;
pub use references::{DirectoryReferences, NoReferences};

const ERROR_BODY_CHARS: usize = 512;

/// An adapter's result plus the request/response metadata kept for receipts.
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub asset: ImageAsset,
    pub provider_request: Map<String, Value>,
    pub provider_response: Map<String, Value>,
}

impl AdapterOutput {
    pub fn new(asset: ImageAsset) -> Self {
        Self {
            asset,
            provider_request: Map::new(),
            provider_response: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub name: String,
    pub asset: ImageAsset,
}

pub struct ViewRequest<'a> {
    pub prompt: &'a PromptDocument,
    /// Asset_1: the image the generated scene must be built around.
    pub anchor: &'a ImageAsset,
    pub references: &'a [ReferenceImage],
}

pub trait BackgroundRemover: Send + Sync {
    fn name(&self) -> &str;
    fn remove_background(&self, image: &ImageAsset) -> PipelineResult<AdapterOutput>;
}

pub trait ViewGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate_view(&self, request: &ViewRequest<'_>) -> PipelineResult<AdapterOutput>;
}

/// Style exemplars for a category. An empty list is a valid answer.
pub trait ReferenceSupplier: Send + Sync {
    fn references(&self, category: ProductCategory) -> Vec<ReferenceImage>;
}

/// Failures before any HTTP response arrived. These carry no status.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> PipelineError {
    tracing::warn!(service, error = %err, "upstream transport failed");
    PipelineError::transport(service, err.to_string())
}

/// Fails with `Upstream` on a non-success status, otherwise hands the response back.
pub(crate) fn ensure_success(service: &str, response: HttpResponse) -> PipelineResult<HttpResponse> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let body = response.text().unwrap_or_default();
    tracing::warn!(service, status = code, "upstream request failed");
    Err(PipelineError::upstream(
        service,
        code,
        truncate_text(&body, ERROR_BODY_CHARS),
    ))
}

pub(crate) fn response_json_or_error(service: &str, response: HttpResponse) -> PipelineResult<Value> {
    let response = ensure_success(service, response)?;
    let body = response
        .text()
        .map_err(|err| transport_error(service, err))?;
    serde_json::from_str(&body).map_err(|err| {
        PipelineError::no_image(
            service,
            format!("response was not valid JSON: {err}"),
            Some(truncate_text(&body, ERROR_BODY_CHARS)),
        )
    })
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

pub(crate) fn map_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
