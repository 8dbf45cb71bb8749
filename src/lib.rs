//! # Worklets Native
//!
//! Source-to-source pass that turns functions marked as worklets into
//! self-describing closures the UI runtime can serialize and run on another
//! thread.
//!
//! ## Pipeline
//!
//! 1. **Parse**: `oxc_parser` builds the tree for one file.
//! 2. **Classify**: a function is a worklet when its body opens with the
//!    `'worklet'` directive, or when it sits in a position the pattern registry
//!    recognises (hook argument, object-hook callback, gesture builder chain).
//! 3. **Resolve**: every identifier inside a worklet is resolved through the
//!    lexical scope chain. Outer bindings become the worklet's closure, narrowed
//!    to static property paths where possible. Free globals are never captured.
//! 4. **Serialize**: the body is re-emitted without directive and comments as
//!    the canonical `asString`, which is hashed into `__workletHash`.
//! 5. **Rewrite**: the function node is replaced by an immediately-invoked
//!    wrapper that attaches `_closure`, `asString`, `__workletHash`,
//!    `__location` (and `__optimalization` when eligible) to the function.
//!
//! ## Failure Policy
//!
//! A worklet that cannot be processed is left untouched and reported as a
//! `WorkletDiagnostic`. Only parse failures, or any error diagnostic in strict
//! mode, fail the whole file.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod classify;
mod closure;
mod codegen;
mod hash;
mod options;
mod registry;
mod scope;
mod serialize;
mod transform;
mod validate;

#[cfg(test)]
mod closure_tests;

pub use classify::{ImplicitPattern, WorkletKind};
pub use closure::ClosureBinding;
pub use hash::worklet_hash;
pub use options::{PatternRegistryConfig, TransformOptions};
pub use registry::PatternRegistry;
pub use transform::{
    transform_files, transform_with_registry, transform_worklets, FileResult, SourceFile,
    TransformOutput, WorkletSummary,
};
pub use validate::*;

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi(object)]
pub struct NativeTransformOutput {
    pub code: String,
    pub worklets_json: String,
    pub diagnostics_json: String,
}

/// JS-facing entry. `options_json` is a serialized `TransformOptions`.
#[cfg(feature = "napi")]
#[napi]
pub fn transform_sync(
    code: String,
    options_json: Option<String>,
) -> napi::Result<NativeTransformOutput> {
    let options = match options_json {
        Some(json) => TransformOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(format!("Options parse error: {}", e)))?,
        None => TransformOptions::default(),
    };
    let output = transform_worklets(&code, &options)
        .map_err(|e| napi::Error::from_reason(format!("[{}] {}", e.code(), e)))?;

    Ok(NativeTransformOutput {
        code: output.code,
        worklets_json: serde_json::to_string(&output.worklets)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        diagnostics_json: serde_json::to_string(&output.diagnostics)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
    })
}
