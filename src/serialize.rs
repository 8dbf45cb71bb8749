//! Canonical Serializer
//!
//! Produces the two texts of a worklet: the canonical `asString` that is hashed
//! and stored, and the runtime inner function that Codegen declares. Both are
//! assembled from source slices (with already-rewritten nested worklets spliced
//! in), reparsed as a standalone program and re-emitted by the printer, which
//! drops every comment and normalises formatting.

use crate::codegen::{splice, Replacement};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

/// Source-level pieces of one function-like node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParts {
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    /// The function's own binding name, if it had one.
    pub own_name: Option<String>,
    /// `(a,b=1,...rest)`
    pub params: String,
    /// Directives other than `'worklet'`. They stay ahead of the closure prologue.
    pub directives: String,
    pub body: String,
}

impl FunctionParts {
    pub fn from_function(
        source: &str,
        func: &Function<'_>,
        body: &FunctionBody<'_>,
        nested: &[Replacement],
    ) -> Self {
        FunctionParts {
            is_async: func.r#async,
            is_generator: func.generator,
            is_arrow: false,
            own_name: func.id.as_ref().map(|id| id.name.to_string()),
            params: params_text(source, &func.params, nested),
            directives: directives_text(source, body),
            body: body_text(source, body, false, nested),
        }
    }

    pub fn from_arrow(source: &str, arrow: &ArrowFunctionExpression<'_>, nested: &[Replacement]) -> Self {
        FunctionParts {
            is_async: arrow.r#async,
            is_generator: false,
            is_arrow: true,
            own_name: None,
            params: params_text(source, &arrow.params, nested),
            directives: directives_text(source, &arrow.body),
            body: body_text(source, &arrow.body, arrow.expression, nested),
        }
    }

    fn function_keyword(&self) -> String {
        format!(
            "{}function{}",
            if self.is_async { "async " } else { "" },
            if self.is_generator { "*" } else { "" }
        )
    }
}

fn params_text(source: &str, params: &FormalParameters<'_>, nested: &[Replacement]) -> String {
    let mut items: Vec<String> = params
        .items
        .iter()
        .map(|param| splice(source, param.span, nested))
        .collect();
    if let Some(rest) = &params.rest {
        items.push(splice(source, rest.span, nested));
    }
    format!("({})", items.join(","))
}

fn body_text(
    source: &str,
    body: &FunctionBody<'_>,
    is_expression: bool,
    nested: &[Replacement],
) -> String {
    if is_expression {
        if let Some(Statement::ExpressionStatement(stmt)) = body.statements.first() {
            return format!("return {};", splice(source, stmt.expression.span(), nested));
        }
    }

    match (body.statements.first(), body.statements.last()) {
        (Some(first), Some(last)) => {
            splice(source, Span::new(first.span().start, last.span().end), nested)
        }
        _ => String::new(),
    }
}

fn directives_text(source: &str, body: &FunctionBody<'_>) -> String {
    let kept: Vec<&str> = body
        .directives
        .iter()
        .filter(|directive| directive.expression.value.as_str() != crate::classify::DIRECTIVE)
        .filter_map(|directive| source.get(directive.span.start as usize..directive.span.end as usize))
        .collect();
    kept.join("\n")
}

/// `let {a,b}=<receiver>._closure;` or nothing for an empty closure. `let`, as
/// the body may reassign a captured name.
fn closure_prologue(receiver: &str, names: &[String]) -> String {
    if names.is_empty() {
        return String::new();
    }
    format!("let {{{}}}={}._closure;\n", names.join(","), receiver)
}

/// `{directives prologue body}` as one function body text.
fn body_block(parts: &FunctionParts, prologue: &str) -> String {
    let mut block = String::from("{\n");
    if !parts.directives.is_empty() {
        block.push_str(&parts.directives);
        block.push('\n');
    }
    block.push_str(prologue);
    block.push_str(&parts.body);
    block.push_str("\n}");
    block
}

/// Stored and hashed form: always a named `function` declaration reading its
/// closure through `this`.
pub fn canonical_source(
    parts: &FunctionParts,
    display_name: &str,
    closure_names: &[String],
    source_type: SourceType,
) -> Result<String, String> {
    let text = format!(
        "{} {}{}{}",
        parts.function_keyword(),
        display_name,
        parts.params,
        body_block(parts, &closure_prologue("this", closure_names))
    );
    reprint(&text, source_type, CodegenOptions::minify())
}

/// Executable form: `const <wrapper>=<function>;`, destructuring the closure
/// from the wrapper binding itself.
pub fn runtime_declaration(
    parts: &FunctionParts,
    wrapper_name: &str,
    closure_names: &[String],
    source_type: SourceType,
) -> Result<String, String> {
    let prologue = closure_prologue(wrapper_name, closure_names);
    let function = if parts.is_arrow {
        format!(
            "{}{}=>{}",
            if parts.is_async { "async " } else { "" },
            parts.params,
            body_block(parts, &prologue)
        )
    } else {
        format!(
            "{}{}{}{}",
            parts.function_keyword(),
            parts
                .own_name
                .as_ref()
                .map(|name| format!(" {}", name))
                .unwrap_or_default(),
            parts.params,
            body_block(parts, &prologue)
        )
    };
    let text = format!("const {}={};", wrapper_name, function);
    reprint(&text, source_type, CodegenOptions::default())
}

fn reprint(text: &str, source_type: SourceType, options: CodegenOptions) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, text, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(messages.join("; "));
    }
    let mut program = ret.program;
    program.comments.clear();
    let code = Codegen::new().with_options(options).build(&program).code;
    Ok(code.trim().to_string())
}
