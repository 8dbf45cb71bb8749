//! Worklet Candidate Classifier
//!
//! Decides which function-like nodes become worklets. Explicit worklets carry a
//! `'worklet'` directive; implicit ones are found by their position relative to
//! a call the pattern registry recognises. Callee names are checked through the
//! scope chain so a local that happens to share a hook's name never matches.

use crate::registry::PatternRegistry;
use crate::scope::ScopeChain;
use oxc_ast::ast::*;
use oxc_span::Span;
use serde::{Deserialize, Serialize};

pub const DIRECTIVE: &str = "worklet";
pub const PLACEHOLDER_NAME: &str = "_f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkletKind {
    FunctionDeclaration,
    NamedFunctionExpression,
    FunctionExpression,
    ArrowFunction,
    ObjectMethod,
    ClassMethod,
}

impl WorkletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkletKind::FunctionDeclaration => "FunctionDeclaration",
            WorkletKind::NamedFunctionExpression => "FunctionExpression-named",
            WorkletKind::FunctionExpression => "FunctionExpression-unnamed",
            WorkletKind::ArrowFunction => "ArrowFunctionExpression",
            WorkletKind::ObjectMethod => "ObjectMethod",
            WorkletKind::ClassMethod => "ClassMethod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImplicitPattern {
    HookArgument,
    ObjectCallback,
    FluentChain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitMark {
    pub pattern: ImplicitPattern,
    pub hook: Option<String>,
    /// Argument of a hook whose result may take the runtime's object fast path.
    pub optimizable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Explicit,
    Implicit(ImplicitMark),
    NotAWorklet,
}

impl Classification {
    pub fn origin(&self) -> &'static str {
        match self {
            Classification::Explicit => "explicit",
            Classification::Implicit(_) => "implicit",
            Classification::NotAWorklet => "none",
        }
    }
}

/// A directive inside the function always wins over any positional match.
pub fn classify(body: Option<&FunctionBody<'_>>, mark: Option<&ImplicitMark>) -> Classification {
    let Some(body) = body else {
        return Classification::NotAWorklet;
    };
    if has_worklet_directive(&body.directives) {
        return Classification::Explicit;
    }
    match mark {
        Some(mark) => Classification::Implicit(mark.clone()),
        None => Classification::NotAWorklet,
    }
}

/// The directive must be the body's first statement. A `'worklet'` string
/// anywhere else (a variable's initializer, a later directive or statement) is
/// ordinary code.
pub fn has_worklet_directive(directives: &[Directive<'_>]) -> bool {
    directives
        .first()
        .is_some_and(|directive| directive.expression.value.as_str() == DIRECTIVE)
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPLICIT PATTERNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Marks every function-like argument of `call` that one of the implicit
/// patterns claims. A span appears at most once; the first pattern to claim it
/// (hook argument, then object callback, then fluent chain) wins.
pub fn classify_call(
    call: &CallExpression<'_>,
    registry: &PatternRegistry,
    scopes: &ScopeChain,
) -> Vec<(Span, ImplicitMark)> {
    let mut marks: Vec<(Span, ImplicitMark)> = Vec::new();
    let mut claim = |span: Span, mark: ImplicitMark| {
        if !marks.iter().any(|(claimed, _)| *claimed == span) {
            marks.push((span, mark));
        }
    };

    if let Some(hook) = hook_name(&call.callee, scopes) {
        let hook = hook.as_str();
        if let Some(indices) = registry.hook_arguments(hook) {
            for index in indices {
                if let Some(span) = call.arguments.get(*index).and_then(function_argument_span) {
                    claim(
                        span,
                        ImplicitMark {
                            pattern: ImplicitPattern::HookArgument,
                            hook: Some(hook.to_string()),
                            optimizable: registry.is_optimizable_hook(hook),
                        },
                    );
                }
            }
        }

        if registry.is_object_hook(hook) {
            if let Some(Expression::ObjectExpression(object)) =
                call.arguments.first().and_then(|arg| arg.as_expression())
            {
                for property in &object.properties {
                    let ObjectPropertyKind::ObjectProperty(property) = property else {
                        continue;
                    };
                    if property.kind != PropertyKind::Init || property.computed {
                        continue;
                    }
                    let is_callback = static_key_name(&property.key)
                        .map_or(false, |key| registry.is_object_callback(key));
                    if !is_callback {
                        continue;
                    }
                    if let Some(span) = function_span(&property.value) {
                        claim(
                            span,
                            ImplicitMark {
                                pattern: ImplicitPattern::ObjectCallback,
                                hook: Some(hook.to_string()),
                                optimizable: false,
                            },
                        );
                    }
                }
            }
        }
    }

    if is_builder_chain_link(call, registry, scopes) {
        for argument in &call.arguments {
            if let Some(span) = function_argument_span(argument) {
                claim(
                    span,
                    ImplicitMark {
                        pattern: ImplicitPattern::FluentChain,
                        hook: None,
                        optimizable: false,
                    },
                );
            }
        }
    }

    marks
}

/// The exported name a callee stands for: `useHook(...)` through a named
/// import (aliases included) or a free global, `Namespace.useHook(...)` through
/// a namespace import. Locals never name a hook, whatever their spelling.
fn hook_name(callee: &Expression<'_>, scopes: &ScopeChain) -> Option<String> {
    match callee {
        Expression::Identifier(ident) => scopes.external_name(&ident.name),
        Expression::StaticMemberExpression(member) => match &member.object {
            Expression::Identifier(object) if scopes.is_namespace_or_free(&object.name) => {
                Some(member.property.name.to_string())
            }
            _ => None,
        },
        _ => None,
    }
}

/// True for `<root>.<Factory>(...).link(...)` and every later link of the chain.
fn is_builder_chain_link(
    call: &CallExpression<'_>,
    registry: &PatternRegistry,
    scopes: &ScopeChain,
) -> bool {
    let Expression::StaticMemberExpression(member) = &call.callee else {
        return false;
    };
    let Expression::CallExpression(receiver) = &member.object else {
        return false;
    };
    is_builder_factory_call(receiver, registry, scopes)
        || is_builder_chain_link(receiver, registry, scopes)
}

fn is_builder_factory_call(
    call: &CallExpression<'_>,
    registry: &PatternRegistry,
    scopes: &ScopeChain,
) -> bool {
    let Expression::StaticMemberExpression(member) = &call.callee else {
        return false;
    };
    let Expression::Identifier(root) = &member.object else {
        return false;
    };
    scopes
        .external_name(&root.name)
        .is_some_and(|root| registry.is_builder_factory(&root, &member.property.name))
}

fn function_argument_span(argument: &Argument<'_>) -> Option<Span> {
    argument.as_expression().and_then(function_span)
}

fn function_span(expr: &Expression<'_>) -> Option<Span> {
    match expr {
        Expression::FunctionExpression(func) => Some(func.span),
        Expression::ArrowFunctionExpression(arrow) => Some(arrow.span),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn static_key_name<'b>(key: &'b PropertyKey<'_>) -> Option<&'b str> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.as_str()),
        PropertyKey::StringLiteral(literal) => Some(literal.value.as_str()),
        _ => None,
    }
}

/// The function's own name, else the property or method key when it is a
/// usable identifier, else the placeholder.
pub fn display_name(own_name: Option<&str>, key: Option<&str>) -> String {
    own_name
        .or(key.filter(|key| is_valid_identifier(key)))
        .unwrap_or(PLACEHOLDER_NAME)
        .to_string()
}

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !is_reserved_word(name)
}

fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
            | "let"
            | "static"
            | "implements"
            | "interface"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "await"
            | "arguments"
            | "eval"
    )
}
