//! Transform options, deserialised from the JSON the JS side passes through.

use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_true")]
    pub is_module: bool,
    #[serde(default)]
    pub typescript: Option<bool>,
    #[serde(default)]
    pub jsx: Option<bool>,
    /// Abort the whole file when any worklet fails to transform.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub debug: bool,
    /// Accepted for parity with the host compiler. Worklet bodies always drop comments.
    #[serde(default)]
    pub preserve_comments: bool,
    /// Extra names provided by the remote runtime (host functions etc.).
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub patterns: Option<PatternRegistryConfig>,
}

/// Additions to the built-in pattern tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatternRegistryConfig {
    /// Hook name -> indices of the arguments that are worklets.
    #[serde(default)]
    pub function_hooks: HashMap<String, Vec<usize>>,
    #[serde(default)]
    pub object_hooks: Vec<String>,
    #[serde(default)]
    pub object_callbacks: Vec<String>,
    /// Builder root object -> factory methods starting a chain.
    #[serde(default)]
    pub builders: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub optimizable_hooks: Vec<String>,
}

fn default_filename() -> String {
    "unknown".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            filename: default_filename(),
            is_module: true,
            typescript: None,
            jsx: None,
            strict: false,
            debug: false,
            preserve_comments: false,
            globals: Vec::new(),
            patterns: None,
        }
    }
}

impl TransformOptions {
    pub fn with_filename(filename: &str) -> Self {
        TransformOptions {
            filename: filename.to_string(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Dialect comes from the file extension unless forced.
    pub fn source_type(&self) -> SourceType {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let is_ts = matches!(ext.as_str(), "ts" | "tsx" | "mts" | "cts");
        let is_jsx = matches!(ext.as_str(), "tsx" | "jsx" | "js");
        let is_module = match ext.as_str() {
            "mjs" | "mts" => true,
            "cjs" | "cts" => false,
            _ => self.is_module,
        };

        SourceType::default()
            .with_typescript(self.typescript.unwrap_or(is_ts))
            .with_jsx(self.jsx.unwrap_or(is_jsx))
            .with_module(is_module)
    }
}
