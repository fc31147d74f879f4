use crate::banks::BankKind;
use crate::category::ProductCategory;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Typed failure taxonomy shared by every pipeline stage.
///
/// Variants are cloneable so a failed run can keep its cause alongside the
/// artifacts it did produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Missing or malformed input the caller can fix (payload, category, run state).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Required credentials or registry configuration absent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-success response from an upstream service. `status` is `None`
    /// when no response arrived (connection, TLS or timeout failures).
    #[error("{service} request failed{}: {body}", status_label(.status))]
    Upstream {
        service: String,
        status: Option<u16>,
        body: String,
    },

    /// Structurally valid upstream response that carried no usable image.
    #[error("{service} produced no image: {message}")]
    Content {
        service: String,
        message: String,
        upstream_text: Option<String>,
    },

    /// Local preprocessing failure (undecodable image, guard budget exhausted).
    #[error("processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }

    pub fn upstream(service: &str, status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            status: Some(status),
            body: body.into(),
        }
    }

    /// Upstream call that never produced an HTTP response.
    pub fn transport(service: &str, body: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.to_string(),
            status: None,
            body: body.into(),
        }
    }

    pub fn no_image(service: &str, message: impl Into<String>, upstream_text: Option<String>) -> Self {
        Self::Content {
            service: service.to_string(),
            message: message.into(),
            upstream_text,
        }
    }

    /// Stable machine-readable label, used in event payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::Content { .. } => "content",
            Self::Processing(_) => "processing",
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({code})"),
        None => " (no response)".to_string(),
    }
}

/// Bank registry construction failures. These are configuration bugs and are
/// raised once, when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("bank '{0}' has no entries")]
    EmptyBank(BankKind),

    #[error("bank '{kind}' is required by {category} but not registered")]
    MissingBank {
        category: ProductCategory,
        kind: BankKind,
    },

    #[error("bank '{kind}' is required by the secondary view but not registered")]
    MissingSecondaryBank { kind: BankKind },

    #[error("bank '{0}' holds prop sets and cannot be registered as a text bank")]
    WrongShape(BankKind),

    #[error("bank '{0}' is registered twice")]
    Duplicate(BankKind),
}

impl From<RegistryError> for PipelineError {
    fn from(err: RegistryError) -> Self {
        Self::Configuration(err.to_string())
    }
}
