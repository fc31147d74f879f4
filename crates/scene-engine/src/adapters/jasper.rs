use reqwest::blocking::multipart::{Form as MultipartForm, Part as MultipartPart};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use scene_contracts::error::{PipelineError, PipelineResult};
use serde_json::{json, Value};

use super::{ensure_success, map_object, transport_error, AdapterOutput, BackgroundRemover};
use crate::asset::{ImageAsset, DEFAULT_MIME};
use crate::config::EngineConfig;

const SERVICE: &str = "jasper";

/// Background removal through Jasper's `image/remove-background` endpoint.
pub struct JasperBackgroundRemover {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl JasperBackgroundRemover {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key,
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.jasper_api_base.clone(), config.jasper_api_key.clone())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/image/remove-background", self.api_base)
    }
}

impl BackgroundRemover for JasperBackgroundRemover {
    fn name(&self) -> &str {
        SERVICE
    }

    fn remove_background(&self, image: &ImageAsset) -> PipelineResult<AdapterOutput> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(PipelineError::configuration("JASPER_API_KEY not set"));
        };
        let endpoint = self.endpoint();
        let file_name = format!("image.{}", image.extension());
        let part = MultipartPart::bytes(image.bytes().to_vec())
            .file_name(file_name.clone())
            .mime_str(image.mime())
            .map_err(|err| PipelineError::validation(format!("invalid image MIME type: {err}")))?;
        let form = MultipartForm::new().part("image_file", part);

        tracing::info!(endpoint = %endpoint, bytes = image.len(), "removing background");
        let response = self
            .http
            .post(&endpoint)
            .header("X-API-KEY", api_key)
            .multipart(form)
            .send()
            .map_err(|err| transport_error(SERVICE, err))?;
        let status = response.status().as_u16();
        let response = ensure_success(SERVICE, response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let asset = if content_type
            .as_deref()
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
        {
            let payload: Value = response.json().map_err(|err| {
                PipelineError::no_image(SERVICE, format!("invalid JSON response: {err}"), None)
            })?;
            normalize_json_image(&payload)?
        } else {
            let bytes = response
                .bytes()
                .map_err(|err| transport_error(SERVICE, err))?
                .to_vec();
            normalize_binary_image(bytes, content_type.as_deref())?
        };
        tracing::info!(status, mime = asset.mime(), bytes = asset.len(), "background removed");

        Ok(AdapterOutput {
            asset,
            provider_request: map_object(json!({
                "endpoint": endpoint,
                "field": "image_file",
                "file_name": file_name,
                "mime": image.mime(),
                "bytes": image.len(),
            })),
            provider_response: map_object(json!({
                "status": status,
                "content_type": content_type,
            })),
        })
    }
}

/// The JSON body may carry the image under `image`, `data.image` or `result`,
/// as a data URL or bare base64.
pub fn normalize_json_image(payload: &Value) -> PipelineResult<ImageAsset> {
    let encoded = payload
        .get("image")
        .and_then(Value::as_str)
        .or_else(|| {
            payload
                .get("data")
                .and_then(|data| data.get("image"))
                .and_then(Value::as_str)
        })
        .or_else(|| payload.get("result").and_then(Value::as_str))
        .filter(|value| !value.trim().is_empty());
    let Some(encoded) = encoded else {
        let upstream_text = ["message", "error", "detail"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        return Err(PipelineError::no_image(
            SERVICE,
            "No image returned from Jasper API",
            upstream_text,
        ));
    };
    ImageAsset::from_data_url(encoded).map_err(|err| {
        PipelineError::no_image(SERVICE, format!("undecodable image payload: {err}"), None)
    })
}

/// Binary bodies take their MIME from `content-type`, defaulting to PNG.
pub fn normalize_binary_image(
    bytes: Vec<u8>,
    content_type: Option<&str>,
) -> PipelineResult<ImageAsset> {
    if bytes.is_empty() {
        return Err(PipelineError::no_image(SERVICE, "empty response body", None));
    }
    let mime = content_type
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MIME);
    Ok(ImageAsset::new(bytes, mime))
}
