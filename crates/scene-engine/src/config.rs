use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use scene_contracts::error::{PipelineError, PipelineResult};

use crate::guard::{GuardConfig, OversizePolicy};

pub const DEFAULT_JASPER_API_BASE: &str = "https://api.jasper.ai/v1";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_REFERENCES_DIR: &str = "references";

/// Host configuration. Credentials are optional here; adapters report a
/// configuration error when called without one.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub jasper_api_key: Option<String>,
    pub jasper_api_base: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub references_dir: PathBuf,
    pub guard: GuardConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jasper_api_key: None,
            jasper_api_base: DEFAULT_JASPER_API_BASE.to_string(),
            gemini_api_key: None,
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            references_dir: PathBuf::from(DEFAULT_REFERENCES_DIR),
            guard: GuardConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(non_empty_env)
    }

    /// Builds from any key lookup; values are expected trimmed and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PipelineResult<Self> {
        let defaults = Self::default();
        let trim_base = |value: String| value.trim_end_matches('/').to_string();

        let scale: f32 = parse_or(&lookup, "SCENE_GUARD_SCALE", defaults.guard.scale)?;
        let guard = GuardConfig {
            max_dimension: parse_or(&lookup, "SCENE_MAX_DIMENSION", defaults.guard.max_dimension)?
                .max(1),
            max_bytes: parse_or(&lookup, "SCENE_MAX_BYTES", defaults.guard.max_bytes)?.max(1),
            max_passes: parse_or(&lookup, "SCENE_GUARD_MAX_PASSES", defaults.guard.max_passes)?,
            scale: if scale.is_finite() {
                scale.clamp(0.1, 0.95)
            } else {
                defaults.guard.scale
            },
            policy: parse_or(&lookup, "SCENE_OVERSIZE_POLICY", OversizePolicy::Fail)?,
        };

        Ok(Self {
            jasper_api_key: lookup("JASPER_API_KEY"),
            jasper_api_base: lookup("JASPER_API_BASE")
                .map(trim_base)
                .unwrap_or(defaults.jasper_api_base),
            gemini_api_key: lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")),
            gemini_api_base: lookup("GEMINI_API_BASE")
                .map(trim_base)
                .unwrap_or(defaults.gemini_api_base),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            references_dir: lookup("SCENE_REFERENCES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.references_dir),
            guard,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> PipelineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| PipelineError::configuration(format!("{key}='{raw}' is invalid: {err}"))),
        None => Ok(default),
    }
}

pub fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
