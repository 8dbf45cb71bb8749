#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "W-ERR-PARSE";
pub const ERR_UNSUPPORTED_SYNTAX: &str = "W-ERR-UNSUPPORTED-SYNTAX";
pub const ERR_DYNAMIC_SCOPE: &str = "W-ERR-DYNAMIC-SCOPE";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_PARSE => "Only syntactically valid files are transformed.",
        ERR_UNSUPPORTED_SYNTAX => {
            "A worklet is only rewritten when its body can be re-emitted as a standalone function."
        }
        ERR_DYNAMIC_SCOPE => "Worklet closures are resolved statically from lexical scope.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem tied to one node of one file. Worklet-level diagnostics never
/// abort the file unless the caller runs in strict mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkletDiagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl WorkletDiagnostic {
    pub fn new(code: &str, message: &str, file: &str, location: SourceLocation) -> Self {
        Self::with_details(code, message, file, location, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        location: SourceLocation,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        WorkletDiagnostic {
            code: code.to_string(),
            severity: Severity::Error,
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            line: location.line,
            column: location.column,
            context,
            hints,
        }
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for WorkletDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{} [{}] {}",
            self.file, self.line, self.column, self.code, self.message
        )
    }
}

/// File-level failure. Sibling files are unaffected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransformError {
    #[error("failed to parse {file}: {}", .messages.join("; "))]
    Parse { file: String, messages: Vec<String> },
    #[error("strict mode rejected {file}: {} worklet diagnostic(s)", .diagnostics.len())]
    Strict {
        file: String,
        diagnostics: Vec<WorkletDiagnostic>,
    },
}

impl TransformError {
    /// Code of the failure; for strict mode, that of the first error diagnostic.
    pub fn code(&self) -> &str {
        match self {
            TransformError::Parse { .. } => ERR_PARSE,
            TransformError::Strict { diagnostics, .. } => diagnostics
                .iter()
                .find(|d| d.is_error())
                .map_or(ERR_UNSUPPORTED_SYNTAX, |d| d.code.as_str()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// 1-based line and column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets into line/column pairs. Columns count chars, not bytes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    pub fn locate(&self, source: &str, offset: u32) -> SourceLocation {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line] as usize;
        let end = (offset as usize).min(source.len());
        let column = source.get(start..end).map_or(end - start, |s| s.chars().count());
        SourceLocation {
            line: line as u32 + 1,
            column: column as u32 + 1,
        }
    }
}
