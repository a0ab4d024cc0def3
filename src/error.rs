//! Error taxonomy shared by every renderer.
//!
//! None of these are fatal to the host page: setup errors are turned into a
//! degraded (static) mount by [`crate::lifecycle::degrade`].

use std::fmt;

use thiserror::Error;

/// Rendering context a renderer asked its canvas for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// `canvas.getContext("2d")`
    Canvas2d,
    /// `canvas.getContext("webgl2")`
    WebGl2,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canvas2d => f.write_str("2d"),
            Self::WebGl2 => f.write_str("webgl2"),
        }
    }
}

/// Shader pipeline stage, used to label compiler diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} rendering context unavailable")]
    ContextUnavailable(ContextKind),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },

    #[error("failed to allocate {0}")]
    ResourceAllocation(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown renderer kind `{0}`")]
    UnknownRenderer(String),

    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("browser call failed: {0}")]
    Js(String),
}

impl RenderError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for RenderError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<RenderError> for wasm_bindgen::JsValue {
    fn from(err: RenderError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_carries_diagnostic() {
        let err = RenderError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:12: 'fbm' : no matching overloaded function".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("fragment shader"));
        assert!(text.contains("no matching overloaded function"));
    }

    #[test]
    fn context_error_names_context() {
        let err = RenderError::ContextUnavailable(ContextKind::WebGl2);
        assert_eq!(err.to_string(), "webgl2 rendering context unavailable");
    }
}
