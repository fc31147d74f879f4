use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::ProductCategory;
use crate::selection::{SceneSelection, ViewStage};

pub const RECEIPT_SCHEMA_VERSION: u64 = 1;

const OMITTED_KEYS: &[&str] = &[
    "b64_json",
    "image",
    "image_bytes",
    "image_file",
    "data",
    "inline_data",
];

/// What one generation stage asked for. The prompt itself is referenced by
/// fingerprint; the selection is enough to re-render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequest {
    pub category: ProductCategory,
    pub stage: ViewStage,
    pub selection: SceneSelection,
    pub prompt_fingerprint: String,
    pub prompt_chars: usize,
    #[serde(default)]
    pub reference_count: usize,
}

pub fn build_stage_receipt(
    request: &StageRequest,
    provider_request: &Map<String, Value>,
    provider_response: &Map<String, Value>,
    image_path: &Path,
    receipt_path: &Path,
) -> Value {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number(RECEIPT_SCHEMA_VERSION.into()),
    );
    root.insert(
        "request".to_string(),
        sanitize_payload(&serde_json::to_value(request).unwrap_or(Value::Null)),
    );
    root.insert(
        "provider_request".to_string(),
        sanitize_payload(&Value::Object(provider_request.clone())),
    );
    root.insert(
        "provider_response".to_string(),
        sanitize_payload(&Value::Object(provider_response.clone())),
    );

    let mut artifacts = Map::new();
    artifacts.insert(
        "image_path".to_string(),
        Value::String(image_path.to_string_lossy().to_string()),
    );
    artifacts.insert(
        "receipt_path".to_string(),
        Value::String(receipt_path.to_string_lossy().to_string()),
    );
    root.insert("artifacts".to_string(), Value::Object(artifacts));
    Value::Object(root)
}

pub fn write_receipt(path: &Path, payload: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create receipt dir {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)
        .with_context(|| format!("write receipt {}", path.display()))?;
    Ok(())
}

/// Replaces image payloads with a placeholder, recursively.
pub fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        Value::Array(rows) => Value::Array(rows.iter().map(sanitize_payload).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, row) in map {
                let lowered = key.to_ascii_lowercase();
                if OMITTED_KEYS.contains(&lowered.as_str()) {
                    out.insert(key.clone(), Value::String("<omitted>".to_string()));
                    continue;
                }
                out.insert(key.clone(), sanitize_payload(row));
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{build_stage_receipt, write_receipt, StageRequest, RECEIPT_SCHEMA_VERSION};
    use crate::category::ProductCategory;
    use crate::prompts::PromptEngine;
    use crate::selection::{SeededSelector, ViewStage};

    #[test]
    fn receipt_has_expected_shape_and_omits_image_data() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let receipt_path = temp.path().join("primary-receipt.json");
        let image_path = temp.path().join("primary.png");

        let engine = PromptEngine::builtin()?;
        let assembly = engine.assemble(
            ProductCategory::WallArt,
            ViewStage::Primary,
            &mut SeededSelector::new(4),
        )?;
        let request = StageRequest {
            category: ProductCategory::WallArt,
            stage: ViewStage::Primary,
            selection: assembly.selection.clone(),
            prompt_fingerprint: assembly.document.fingerprint(),
            prompt_chars: assembly.document.len(),
            reference_count: 2,
        };
        let mut provider_request = Map::new();
        provider_request.insert("endpoint".to_string(), json!("models/x:generateContent"));
        provider_request.insert(
            "parts".to_string(),
            json!([{ "inlineData": { "mimeType": "image/png", "data": "AAAA" } }]),
        );
        let mut provider_response = Map::new();
        provider_response.insert("status".to_string(), json!(200));

        let payload = build_stage_receipt(
            &request,
            &provider_request,
            &provider_response,
            &image_path,
            &receipt_path,
        );
        write_receipt(&receipt_path, &payload)?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&receipt_path)?)?;
        assert_eq!(parsed["schema_version"], json!(RECEIPT_SCHEMA_VERSION));
        assert_eq!(parsed["request"]["category"], json!("wall-art"));
        assert_eq!(parsed["request"]["stage"], json!("primary"));
        assert_eq!(
            parsed["request"]["prompt_fingerprint"],
            json!(assembly.document.fingerprint())
        );
        assert_eq!(
            parsed["provider_request"]["parts"][0]["inlineData"]["data"],
            json!("<omitted>")
        );
        assert_eq!(parsed["provider_response"]["status"], json!(200));
        assert_eq!(
            parsed["artifacts"]["image_path"],
            json!(image_path.to_string_lossy())
        );
        Ok(())
    }
}
