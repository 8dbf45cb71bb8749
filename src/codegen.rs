//! Worklet Codegen
//!
//! Turns a serialized worklet into replacement text for its original node.
//! Rewrites are span-keyed text replacements over the untouched input, so
//! everything that is not a worklet keeps its exact bytes.

use crate::closure::{closure_object, ClosureBinding};
use oxc_span::Span;

// ═══════════════════════════════════════════════════════════════════════════════
// REPLACEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub span: Span,
    pub text: String,
    /// Text spliced into an enclosing worklet's `asString`. Carries nothing
    /// position-dependent, so the enclosing hash survives edits elsewhere.
    pub canonical: String,
}

impl Replacement {
    pub fn new(span: Span, text: String) -> Self {
        Replacement {
            span,
            canonical: text.clone(),
            text,
        }
    }

    pub fn with_canonical(mut self, canonical: String) -> Self {
        self.canonical = canonical;
        self
    }

    pub fn within(&self, range: Span) -> bool {
        self.span.start >= range.start && self.span.end <= range.end
    }
}

/// Source text of `range` with every replacement that lies inside it applied.
/// Replacements must not overlap each other.
pub fn splice(source: &str, range: Span, replacements: &[Replacement]) -> String {
    let mut inner: Vec<&Replacement> = replacements.iter().filter(|r| r.within(range)).collect();
    inner.sort_by_key(|r| r.span.start);

    let mut out = String::with_capacity((range.end - range.start) as usize);
    let mut cursor = range.start as usize;
    for replacement in inner {
        let start = replacement.span.start as usize;
        if start < cursor {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&replacement.text);
        cursor = replacement.span.end as usize;
    }
    out.push_str(&source[cursor..range.end as usize]);
    out
}

/// The same replacements, reading their canonical text.
pub fn canonical_view(replacements: &[Replacement]) -> Vec<Replacement> {
    replacements
        .iter()
        .map(|r| Replacement::new(r.span, r.canonical.clone()))
        .collect()
}

/// Applies top-level replacements to the whole file.
pub fn apply(source: &str, replacements: &[Replacement]) -> String {
    splice(source, Span::new(0, source.len() as u32), replacements)
}

// ═══════════════════════════════════════════════════════════════════════════════
// WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the immediately-invoked wrapper attaches to the runtime function.
#[derive(Debug, Clone)]
pub struct WorkletArtifact {
    pub wrapper_name: String,
    /// `const <wrapper_name> = ...;`
    pub runtime_declaration: String,
    pub closure: Vec<ClosureBinding>,
    pub as_string: String,
    pub hash: u64,
    /// Left out of the canonical form spliced into enclosing worklets.
    pub location: Option<String>,
    pub optimalization: Option<u32>,
}

/// `(()=>{const _f=...;_f._closure={...};...;return _f;})()`
pub fn wrapper_expression(artifact: &WorkletArtifact) -> Result<String, serde_json::Error> {
    let name = &artifact.wrapper_name;
    let mut out = String::from("(()=>{\n");
    out.push_str(&artifact.runtime_declaration);
    out.push('\n');
    out.push_str(&format!("{}._closure={};\n", name, closure_object(&artifact.closure)));
    out.push_str(&format!(
        "{}.asString={};\n",
        name,
        serde_json::to_string(&artifact.as_string)?
    ));
    out.push_str(&format!("{}.__workletHash={};\n", name, artifact.hash));
    if let Some(location) = &artifact.location {
        out.push_str(&format!(
            "{}.__location={};\n",
            name,
            serde_json::to_string(location)?
        ));
    }
    if let Some(flags) = artifact.optimalization {
        out.push_str(&format!("{}.__optimalization={};\n", name, flags));
    }
    out.push_str(&format!("return {};\n}})()", name));
    Ok(out)
}

/// `<file> (<line>:<column>)`
pub fn location_string(file: &str, line: u32, column: u32) -> String {
    format!("{} ({}:{})", file, line, column)
}

/// First `_f`, `_f1`, `_f2`, ... not used anywhere in the worklet body.
pub fn wrapper_name<F: Fn(&str) -> bool>(is_taken: F) -> String {
    let base = crate::classify::PLACEHOLDER_NAME;
    if !is_taken(base) {
        return base.to_string();
    }
    let mut index = 1;
    loop {
        let candidate = format!("{}{}", base, index);
        if !is_taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLACEMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the wrapper goes, decided by the node's syntactic position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// `function foo(){}` becomes `const foo=<wrapper>;`
    Declaration { name: String },
    /// `export default function [foo](){}`; `span` covers the whole export.
    ExportDefault { span: Span, name: Option<String> },
    /// Any expression position: only the function node is replaced.
    Expression,
    /// `key(){}` in an object literal becomes `key:<wrapper>`.
    ObjectMethod { span: Span, key: String },
    /// Class method keeps its key and modifiers, loses its parameters, and
    /// returns the wrapper.
    ClassMethod { span: Span, head: String },
}

pub fn place(placement: &Placement, function_span: Span, wrapper: &str) -> Replacement {
    match placement {
        Placement::Declaration { name } => {
            Replacement::new(function_span, format!("const {}={};", name, wrapper))
        }
        Placement::ExportDefault { span, name: Some(name) } => Replacement::new(
            *span,
            format!("const {}={};\nexport default {};", name, wrapper, name),
        ),
        Placement::ExportDefault { span, name: None } => {
            Replacement::new(*span, format!("export default {};", wrapper))
        }
        Placement::Expression => Replacement::new(function_span, wrapper.to_string()),
        Placement::ObjectMethod { span, key } => {
            Replacement::new(*span, format!("{}:{}", key, wrapper))
        }
        Placement::ClassMethod { span, head } => {
            Replacement::new(*span, format!("{}(){{\nreturn {};\n}}", head, wrapper))
        }
    }
}
