use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use scene_contracts::error::{PipelineError, PipelineResult};
use serde_json::{json, Map, Value};

use super::{
    map_object, response_json_or_error, transport_error, truncate_text, AdapterOutput,
    ViewGenerator, ViewRequest,
};
use crate::asset::{ImageAsset, DEFAULT_MIME};
use crate::config::EngineConfig;

const SERVICE: &str = "gemini";

pub const REFERENCE_MARKER: &str =
    "\n\nREFERENCE IMAGES (for aesthetic and material guidance only - do not copy directly):";

pub struct GeminiViewGenerator {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: HttpClient,
}

impl GeminiViewGenerator {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.gemini_api_base.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )
    }

    pub fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

fn image_part(asset: &ImageAsset) -> Value {
    json!({
        "inlineData": {
            "mimeType": asset.mime(),
            "data": asset.to_base64(),
        }
    })
}

/// Parts in order: prompt, anchor, then the marker and references when any exist.
pub fn build_payload(request: &ViewRequest<'_>) -> Value {
    let mut parts = vec![
        json!({ "text": request.prompt.as_str() }),
        image_part(request.anchor),
    ];
    if !request.references.is_empty() {
        parts.push(json!({ "text": REFERENCE_MARKER }));
        parts.extend(request.references.iter().map(|reference| image_part(&reference.asset)));
    }
    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
        },
    })
}

fn inline_data(part: &Value) -> Option<&Map<String, Value>> {
    part.get("inlineData")
        .or_else(|| part.get("inline_data"))
        .and_then(Value::as_object)
}

fn inline_mime(data: &Map<String, Value>) -> Option<&str> {
    data.get("mimeType")
        .or_else(|| data.get("mime_type"))
        .and_then(Value::as_str)
}

/// First image part of the first candidate. A response with only text is a
/// content error carrying that text.
pub fn extract_generated_image(payload: &Value) -> PipelineResult<ImageAsset> {
    let Some(candidate) = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
    else {
        return Err(PipelineError::no_image(
            SERVICE,
            "No response from Gemini API",
            None,
        ));
    };
    let parts = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .filter(|parts| !parts.is_empty());
    let Some(parts) = parts else {
        let reason = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(PipelineError::no_image(
            SERVICE,
            "No content in Gemini response",
            reason,
        ));
    };

    let image = parts.iter().filter_map(inline_data).find(|data| {
        inline_mime(data).is_some_and(|mime| mime.starts_with("image/"))
    });
    let Some(image) = image else {
        let text = parts
            .iter()
            .find_map(|part| part.get("text").and_then(Value::as_str))
            .map(str::to_string);
        if let Some(text) = text.as_deref() {
            tracing::warn!(text = %truncate_text(text, 200), "gemini answered with text only");
        }
        return Err(PipelineError::no_image(
            SERVICE,
            "No image generated by Gemini",
            text,
        ));
    };

    let mime = inline_mime(image).unwrap_or(DEFAULT_MIME);
    let data = image.get("data").and_then(Value::as_str).unwrap_or_default();
    let bytes = BASE64.decode(data.as_bytes()).map_err(|err| {
        PipelineError::no_image(SERVICE, format!("image part is not valid base64: {err}"), None)
    })?;
    if bytes.is_empty() {
        return Err(PipelineError::no_image(SERVICE, "image part was empty", None));
    }
    Ok(ImageAsset::new(bytes, mime))
}

impl ViewGenerator for GeminiViewGenerator {
    fn name(&self) -> &str {
        SERVICE
    }

    fn generate_view(&self, request: &ViewRequest<'_>) -> PipelineResult<AdapterOutput> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(PipelineError::configuration(
                "GEMINI_API_KEY or GOOGLE_API_KEY not set",
            ));
        };
        let endpoint = self.endpoint();
        let payload = build_payload(request);
        tracing::info!(
            endpoint = %endpoint,
            prompt_chars = request.prompt.len(),
            anchor_bytes = request.anchor.len(),
            references = request.references.len(),
            "requesting view generation"
        );

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .map_err(|err| transport_error(SERVICE, err))?;
        let status = response.status().as_u16();
        let response_payload = response_json_or_error(SERVICE, response)?;
        let asset = extract_generated_image(&response_payload)?;
        tracing::info!(status, mime = asset.mime(), bytes = asset.len(), "view generated");

        Ok(AdapterOutput {
            asset,
            provider_request: map_object(json!({
                "endpoint": endpoint,
                "model": self.model,
                "prompt_fingerprint": request.prompt.fingerprint(),
                "anchor_mime": request.anchor.mime(),
                "references": request
                    .references
                    .iter()
                    .map(|reference| reference.name.clone())
                    .collect::<Vec<_>>(),
                "generationConfig": payload.get("generationConfig").cloned().unwrap_or(Value::Null),
            })),
            provider_response: map_object(json!({
                "status": status,
                "candidates": response_payload
                    .get("candidates")
                    .and_then(Value::as_array)
                    .map(|rows| rows.len())
                    .unwrap_or(0),
                "usage_metadata": response_payload.get("usageMetadata").cloned().unwrap_or(Value::Null),
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use scene_contracts::category::ProductCategory;
    use scene_contracts::prompts::PromptEngine;
    use scene_contracts::selection::{SeededSelector, ViewStage};
    use scene_contracts::PipelineError;
    use serde_json::json;

    use super::{build_payload, extract_generated_image, GeminiViewGenerator, REFERENCE_MARKER};
    use crate::adapters::{ReferenceImage, ViewGenerator, ViewRequest};
    use crate::asset::ImageAsset;

    fn prompt() -> scene_contracts::prompts::PromptDocument {
        PromptEngine::builtin()
            .unwrap()
            .assemble(
                ProductCategory::WallArt,
                ViewStage::Primary,
                &mut SeededSelector::new(1),
            )
            .unwrap()
            .document
    }

    #[test]
    fn payload_orders_prompt_anchor_marker_references() {
        let prompt = prompt();
        let anchor = ImageAsset::new(b"anchor".to_vec(), "image/png");
        let references = vec![
            ReferenceImage {
                name: "01.jpg".to_string(),
                asset: ImageAsset::new(b"r1".to_vec(), "image/jpeg"),
            },
            ReferenceImage {
                name: "02.webp".to_string(),
                asset: ImageAsset::new(b"r2".to_vec(), "image/webp"),
            },
        ];
        let payload = build_payload(&ViewRequest {
            prompt: &prompt,
            anchor: &anchor,
            references: &references,
        });
        let parts = payload["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0]["text"], json!(prompt.as_str()));
        assert_eq!(parts[1]["inlineData"]["data"], json!(anchor.to_base64()));
        assert_eq!(parts[2]["text"], json!(REFERENCE_MARKER));
        assert_eq!(parts[3]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(parts[4]["inlineData"]["mimeType"], json!("image/webp"));
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["IMAGE"])
        );
    }

    #[test]
    fn payload_without_references_has_no_marker() {
        let prompt = prompt();
        let anchor = ImageAsset::new(b"anchor".to_vec(), "image/png");
        let payload = build_payload(&ViewRequest {
            prompt: &prompt,
            anchor: &anchor,
            references: &[],
        });
        assert_eq!(payload["contents"][0]["parts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn extracts_first_image_part() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your scene" },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "aGk=" } },
                    ]
                }
            }]
        });
        let asset = extract_generated_image(&payload).unwrap();
        assert_eq!(asset.mime(), "image/jpeg");
        assert_eq!(asset.bytes(), b"hi");
    }

    #[test]
    fn text_only_response_is_content_error_with_text() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I can't render that room." }] }
            }]
        });
        match extract_generated_image(&payload).unwrap_err() {
            PipelineError::Content { upstream_text, .. } => {
                assert_eq!(upstream_text.as_deref(), Some("I can't render that room."));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_candidates_or_parts_are_content_errors() {
        for payload in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
            json!({ "candidates": [{ "content": { "parts": [] } }] }),
        ] {
            assert_eq!(extract_generated_image(&payload).unwrap_err().kind(), "content");
        }
    }

    #[test]
    fn endpoint_and_missing_key() {
        let generator = GeminiViewGenerator::new("https://example.invalid/v1beta/", None, "gemini-x");
        assert_eq!(
            generator.endpoint(),
            "https://example.invalid/v1beta/models/gemini-x:generateContent"
        );
        let prompt = prompt();
        let anchor = ImageAsset::new(b"anchor".to_vec(), "image/png");
        let err = generator
            .generate_view(&ViewRequest {
                prompt: &prompt,
                anchor: &anchor,
                references: &[],
            })
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }
}
