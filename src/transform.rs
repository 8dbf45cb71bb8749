//! Worklet transform pass.
//!
//! One pre-order walk over the parsed file drives classification, scope
//! tracking and closure capture. Each worklet is finished on the way back up,
//! so a nested worklet is already rewritten when its enclosing worklet is
//! serialized. Output is the original text with span-keyed replacements applied.

use crate::classify::{
    classify, classify_call, display_name, static_key_name, Classification, ImplicitMark,
    WorkletKind,
};
use crate::closure::ClosureCollector;
use crate::codegen::{
    apply, canonical_view, location_string, place, wrapper_expression, wrapper_name, Placement,
    Replacement, WorkletArtifact,
};
use crate::hash::worklet_hash;
use crate::options::TransformOptions;
use crate::registry::PatternRegistry;
use crate::scope::{BindingKind, ScopeChain};
use crate::serialize::{canonical_source, runtime_declaration, FunctionParts};
use crate::validate::{
    LineIndex, SourceLocation, TransformError, WorkletDiagnostic, ERR_DYNAMIC_SCOPE,
    ERR_UNSUPPORTED_SYNTAX,
};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use oxc_syntax::operator::UnaryOperator;
use oxc_syntax::scope::ScopeFlags;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// `__optimalization` bit: the body calls no plain identifiers.
const FUNCTIONLESS_FLAG: u32 = 0b01;
/// `__optimalization` bit: the body has no `if` statements.
const STATEMENTLESS_FLAG: u32 = 0b10;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkletSummary {
    pub name: String,
    pub kind: WorkletKind,
    pub origin: String,
    pub hash: u64,
    pub location: SourceLocation,
    pub closure: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    pub worklets: Vec<WorkletSummary>,
    pub diagnostics: Vec<WorkletDiagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub code: String,
}

#[derive(Debug)]
pub struct FileResult {
    pub filename: String,
    pub result: Result<TransformOutput, TransformError>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn transform_worklets(
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    let registry = PatternRegistry::from_options(options);
    transform_with_registry(source, options, &registry)
}

/// Transforms independent files in parallel. Results keep the input order and
/// one file's failure never touches another's result.
pub fn transform_files(files: Vec<SourceFile>, options: &TransformOptions) -> Vec<FileResult> {
    let registry = PatternRegistry::from_options(options);
    files
        .into_par_iter()
        .map(|file| {
            let mut file_options = options.clone();
            file_options.filename = file.filename.clone();
            let result = transform_with_registry(&file.code, &file_options, &registry);
            FileResult {
                filename: file.filename,
                result,
            }
        })
        .collect()
}

pub fn transform_with_registry(
    source: &str,
    options: &TransformOptions,
    registry: &PatternRegistry,
) -> Result<TransformOutput, TransformError> {
    let source_type = options.source_type();
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(TransformError::Parse {
            file: options.filename.clone(),
            messages: ret.errors.iter().map(|e| e.to_string()).collect(),
        });
    }

    let mut transformer = WorkletTransformer::new(source, options, registry, source_type);
    transformer.visit_program(&ret.program);

    let code = if transformer.replacements.is_empty() {
        source.to_string()
    } else {
        apply(source, &transformer.replacements)
    };

    if options.strict && transformer.diagnostics.iter().any(|d| d.is_error()) {
        return Err(TransformError::Strict {
            file: options.filename.clone(),
            diagnostics: transformer.diagnostics,
        });
    }

    transformer.log(&format!(
        "{}: {} worklet(s), {} diagnostic(s)",
        options.filename,
        transformer.worklets.len(),
        transformer.diagnostics.len()
    ));

    Ok(TransformOutput {
        code,
        worklets: transformer.worklets,
        diagnostics: transformer.diagnostics,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORMER
// ═══════════════════════════════════════════════════════════════════════════════

/// Position of a function inside its parent, recorded by the parent before the
/// function itself is visited.
#[derive(Debug, Clone)]
enum FunctionContext {
    ExportDefault { span: Span },
    ObjectMethod { span: Span, key: String, key_name: Option<String> },
    ClassMethod { span: Span, head: String, key_name: Option<String> },
    /// Getters, setters and constructors.
    Accessor,
}

/// Bookkeeping for a worklet whose body is being walked.
struct CandidateFrame {
    /// Scope depth outside the worklet. Bindings resolved below it are captured.
    base_depth: usize,
    replacement_start: usize,
    closure: ClosureCollector,
    referenced: HashSet<String>,
    problems: Vec<WorkletDiagnostic>,
    has_identifier_call: bool,
    has_if: bool,
    /// Set until the worklet's own parameter list is reached.
    params_pending: bool,
    /// Set while that parameter list is walked.
    in_params: bool,
    /// Outer names read by parameter defaults. They run before the closure
    /// prologue can bind them.
    param_captures: Vec<String>,
}

/// Everything needed to finish a candidate once its body has been walked.
struct CandidateInfo {
    kind: WorkletKind,
    classification: Classification,
    display_name: String,
    placement: Placement,
    function_span: Span,
    location_offset: u32,
    returns_object: bool,
}

pub struct WorkletTransformer<'s, 'r> {
    source: &'s str,
    options: &'s TransformOptions,
    registry: &'r PatternRegistry,
    source_type: SourceType,
    line_index: LineIndex,
    scopes: ScopeChain,
    marks: HashMap<Span, ImplicitMark>,
    contexts: HashMap<Span, FunctionContext>,
    frames: Vec<CandidateFrame>,
    replacements: Vec<Replacement>,
    worklets: Vec<WorkletSummary>,
    diagnostics: Vec<WorkletDiagnostic>,
}

impl<'s, 'r> WorkletTransformer<'s, 'r> {
    pub fn new(
        source: &'s str,
        options: &'s TransformOptions,
        registry: &'r PatternRegistry,
        source_type: SourceType,
    ) -> Self {
        WorkletTransformer {
            source,
            options,
            registry,
            source_type,
            line_index: LineIndex::new(source),
            scopes: ScopeChain::new(),
            marks: HashMap::new(),
            contexts: HashMap::new(),
            frames: Vec::new(),
            replacements: Vec::new(),
            worklets: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn log(&self, message: &str) {
        if self.options.debug {
            eprintln!("[Worklets] {}", message);
        }
    }

    fn locate(&self, offset: u32) -> SourceLocation {
        self.line_index.locate(self.source, offset)
    }

    fn diagnostic(&self, code: &str, message: &str, span: Span) -> WorkletDiagnostic {
        let location = self.locate(span.start);
        let context = self
            .source
            .get(span.start as usize..span.end as usize)
            .map(|text| text.lines().next().unwrap_or_default().to_string());
        WorkletDiagnostic::with_details(
            code,
            message,
            &self.options.filename,
            location,
            context,
            vec![],
        )
    }

    fn slice(&self, span: Span) -> &'s str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Captures
    // ───────────────────────────────────────────────────────────────────────────

    /// Records a read of `name`, narrowed to `path` when given.
    fn capture(&mut self, name: &str, path: Option<Vec<String>>) {
        if self.frames.is_empty() {
            return;
        }
        for frame in self.frames.iter_mut() {
            frame.referenced.insert(name.to_string());
        }
        let Some(resolution) = self.scopes.resolve(name) else {
            return;
        };
        if resolution.is_module_level() && self.registry.is_runtime_global(name) {
            return;
        }
        for frame in self.frames.iter_mut() {
            if resolution.depth < frame.base_depth {
                match &path {
                    Some(path) => frame.closure.record_path(name, path.clone()),
                    None => frame.closure.record_whole(name),
                }
                if frame.in_params && !frame.param_captures.iter().any(|n| n == name) {
                    frame.param_captures.push(name.to_string());
                }
            }
        }
    }

    /// Dynamic scope defeats static capture for every enclosing worklet.
    fn note_dynamic_scope(&mut self, what: &str, span: Span) {
        if self.frames.is_empty() {
            return;
        }
        let message = format!("'{}' inside a worklet makes its closure unresolvable.", what);
        let diagnostic = self.diagnostic(ERR_DYNAMIC_SCOPE, &message, span);
        for frame in self.frames.iter_mut() {
            frame.problems.push(diagnostic.clone());
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Candidates
    // ───────────────────────────────────────────────────────────────────────────

    fn begin_candidate(&mut self) {
        self.frames.push(CandidateFrame {
            base_depth: self.scopes.depth(),
            replacement_start: self.replacements.len(),
            closure: ClosureCollector::new(),
            referenced: HashSet::new(),
            problems: Vec::new(),
            has_identifier_call: false,
            has_if: false,
            params_pending: true,
            in_params: false,
            param_captures: Vec::new(),
        });
    }

    /// Takes the frame and the replacements made inside it. The caller builds
    /// the function parts from those before calling `finish_candidate`.
    fn end_candidate(&mut self) -> Option<(CandidateFrame, Vec<Replacement>)> {
        let frame = self.frames.pop()?;
        let nested = self.replacements.split_off(frame.replacement_start);
        Some((frame, nested))
    }

    fn skip_candidate(&mut self, info: &CandidateInfo, nested: Vec<Replacement>, problems: Vec<WorkletDiagnostic>) {
        self.replacements.extend(nested);
        for problem in problems {
            self.log(&format!(
                "skipped {} '{}': [{}] {}",
                info.kind.as_str(),
                info.display_name,
                problem.code,
                problem.message
            ));
            let duplicate = self.diagnostics.iter().any(|d| {
                d.code == problem.code && d.line == problem.line && d.column == problem.column
            });
            if !duplicate {
                self.diagnostics.push(problem);
            }
        }
    }

    /// `parts` carries nested worklets as full wrappers; `canonical_parts`
    /// carries their location-free form and feeds `asString`.
    fn finish_candidate(
        &mut self,
        mut frame: CandidateFrame,
        nested: Vec<Replacement>,
        parts: FunctionParts,
        canonical_parts: FunctionParts,
        info: CandidateInfo,
    ) {
        for name in &frame.param_captures {
            let message = format!(
                "Captured binding '{}' is read by a parameter default, before the closure is unpacked.",
                name
            );
            let problem = self.diagnostic(ERR_UNSUPPORTED_SYNTAX, &message, info.function_span);
            frame.problems.push(problem);
        }
        if !frame.problems.is_empty() {
            return self.skip_candidate(&info, nested, frame.problems);
        }

        let bindings = frame.closure.bindings();
        let names = frame.closure.names().to_vec();
        let wrapper = wrapper_name(|name| frame.referenced.contains(name));

        let texts = canonical_source(&canonical_parts, &info.display_name, &names, self.source_type)
            .and_then(|as_string| {
                runtime_declaration(&parts, &wrapper, &names, self.source_type)
                    .map(|runtime| (as_string, runtime))
            })
            .and_then(|(as_string, runtime)| {
                let canonical_runtime = if parts == canonical_parts {
                    runtime.clone()
                } else {
                    runtime_declaration(&canonical_parts, &wrapper, &names, self.source_type)?
                };
                Ok((as_string, runtime, canonical_runtime))
            });
        let (as_string, runtime, canonical_runtime) = match texts {
            Ok(texts) => texts,
            Err(reason) => {
                let problem = self.diagnostic(
                    ERR_UNSUPPORTED_SYNTAX,
                    &format!("Worklet body cannot be re-emitted standalone: {}", reason),
                    info.function_span,
                );
                return self.skip_candidate(&info, nested, vec![problem]);
            }
        };

        let hash = worklet_hash(&as_string);
        let location = self.locate(info.location_offset);
        let optimalization = match &info.classification {
            Classification::Implicit(mark) if mark.optimizable && info.returns_object => {
                let mut flags = 0;
                if !frame.has_identifier_call {
                    flags |= FUNCTIONLESS_FLAG;
                }
                if !frame.has_if {
                    flags |= STATEMENTLESS_FLAG;
                }
                (flags != 0).then_some(flags)
            }
            _ => None,
        };

        let artifact = WorkletArtifact {
            wrapper_name: wrapper,
            runtime_declaration: runtime,
            closure: bindings,
            as_string,
            hash,
            location: Some(location_string(&self.options.filename, location.line, location.column)),
            optimalization,
        };
        let canonical_artifact = WorkletArtifact {
            runtime_declaration: canonical_runtime,
            location: None,
            ..artifact.clone()
        };
        let (text, canonical_text) =
            match wrapper_expression(&artifact).and_then(|text| {
                wrapper_expression(&canonical_artifact).map(|canonical| (text, canonical))
            }) {
                Ok(texts) => texts,
                Err(e) => {
                    let problem = self.diagnostic(
                        ERR_UNSUPPORTED_SYNTAX,
                        &format!("Worklet metadata cannot be encoded: {}", e),
                        info.function_span,
                    );
                    return self.skip_candidate(&info, nested, vec![problem]);
                }
            };
        let canonical = place(&info.placement, info.function_span, &canonical_text).text;
        self.replacements.push(
            place(&info.placement, info.function_span, &text).with_canonical(canonical),
        );

        self.log(&format!(
            "{} {} '{}' -> {}",
            info.classification.origin(),
            info.kind.as_str(),
            info.display_name,
            hash
        ));
        self.worklets.push(WorkletSummary {
            name: info.display_name,
            kind: info.kind,
            origin: info.classification.origin().to_string(),
            hash,
            location,
            closure: names,
        });
    }

    fn key_text(&self, key: &PropertyKey<'_>, computed: bool) -> String {
        let text = self.slice(key.span());
        if computed {
            format!("[{}]", text)
        } else {
            text.to_string()
        }
    }

    fn accessor_warning(&mut self, func: &Function<'_>) {
        let diagnostic = self
            .diagnostic(
                ERR_UNSUPPORTED_SYNTAX,
                "Getters, setters and constructors cannot be worklets; directive ignored.",
                func.span,
            )
            .as_warning();
        self.log(&format!("ignored directive at {}:{}", diagnostic.line, diagnostic.column));
        self.diagnostics.push(diagnostic);
    }
}

fn returns_object_literal(body: &FunctionBody<'_>, is_expression: bool) -> bool {
    let value = match body.statements.last() {
        Some(Statement::ExpressionStatement(stmt)) if is_expression => Some(&stmt.expression),
        Some(Statement::ReturnStatement(stmt)) => stmt.argument.as_ref(),
        _ => None,
    };
    matches!(
        value.map(|expr| expr.without_parentheses()),
        Some(Expression::ObjectExpression(_))
    )
}

/// `a.b.c` as (`a`, [`b`, `c`]). Optional hops and computed keys do not narrow.
fn static_member_path<'b>(expr: &'b StaticMemberExpression<'_>) -> Option<(&'b str, Vec<String>)> {
    if expr.optional {
        return None;
    }
    let mut path = vec![expr.property.name.to_string()];
    let mut object = &expr.object;
    loop {
        match object {
            Expression::Identifier(ident) => {
                path.reverse();
                return Some((ident.name.as_str(), path));
            }
            Expression::StaticMemberExpression(inner) if !inner.optional => {
                path.push(inner.property.name.to_string());
                object = &inner.object;
            }
            _ => return None,
        }
    }
}

fn member_root<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::StaticMemberExpression(member) => member_root(&member.object),
        Expression::ComputedMemberExpression(member) => member_root(&member.object),
        Expression::PrivateFieldExpression(member) => member_root(&member.object),
        _ => None,
    }
}

impl<'a, 's, 'r> Visit<'a> for WorkletTransformer<'s, 'r> {
    fn visit_program(&mut self, program: &Program<'a>) {
        self.scopes.enter_program(program);
        walk::walk_program(self, program);
        self.scopes.pop();
    }

    fn visit_export_default_declaration(&mut self, decl: &ExportDefaultDeclaration<'a>) {
        if let ExportDefaultDeclarationKind::FunctionDeclaration(func) = &decl.declaration {
            self.contexts
                .insert(func.span, FunctionContext::ExportDefault { span: decl.span });
        }
        walk::walk_export_default_declaration(self, decl);
    }

    fn visit_object_property(&mut self, property: &ObjectProperty<'a>) {
        if let Expression::FunctionExpression(func) = &property.value {
            let context = if property.kind != PropertyKind::Init {
                Some(FunctionContext::Accessor)
            } else if property.method {
                Some(FunctionContext::ObjectMethod {
                    span: property.span,
                    key: self.key_text(&property.key, property.computed),
                    key_name: static_key_name(&property.key)
                        .filter(|_| !property.computed)
                        .map(str::to_string),
                })
            } else {
                None
            };
            if let Some(context) = context {
                self.contexts.insert(func.span, context);
            }
        }
        walk::walk_object_property(self, property);
    }

    fn visit_method_definition(&mut self, method: &MethodDefinition<'a>) {
        let context = if method.kind == MethodDefinitionKind::Method {
            let decorators: Vec<&str> = method
                .decorators
                .iter()
                .map(|decorator| self.slice(decorator.span))
                .collect();
            let mut head = String::new();
            for decorator in decorators {
                head.push_str(decorator);
                head.push(' ');
            }
            if let Some(accessibility) = &method.accessibility {
                head.push_str(match accessibility {
                    TSAccessibility::Public => "public ",
                    TSAccessibility::Private => "private ",
                    TSAccessibility::Protected => "protected ",
                });
            }
            if method.r#static {
                head.push_str("static ");
            }
            if method.r#override {
                head.push_str("override ");
            }
            head.push_str(&self.key_text(&method.key, method.computed));
            FunctionContext::ClassMethod {
                span: method.span,
                head,
                key_name: static_key_name(&method.key)
                    .filter(|_| !method.computed)
                    .map(str::to_string),
            }
        } else {
            FunctionContext::Accessor
        };
        self.contexts.insert(method.value.span, context);
        walk::walk_method_definition(self, method);
    }

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        let context = self.contexts.remove(&func.span);
        let mut classification = classify(func.body.as_deref(), self.marks.get(&func.span));
        if matches!(context, Some(FunctionContext::Accessor))
            && classification != Classification::NotAWorklet
        {
            self.accessor_warning(func);
            classification = Classification::NotAWorklet;
        }
        let is_candidate = classification != Classification::NotAWorklet;

        if is_candidate {
            self.begin_candidate();
        }
        if let Some(id) = &func.id {
            self.scopes.enter_self_name(id, BindingKind::Function);
        }
        self.scopes.enter_function(&func.params, func.body.as_deref());
        walk::walk_function(self, func, flags);
        self.scopes.pop();
        if func.id.is_some() {
            self.scopes.pop();
        }

        if !is_candidate {
            return;
        }
        let Some((frame, nested)) = self.end_candidate() else {
            return;
        };
        let Some(body) = func.body.as_deref() else {
            return self.replacements.extend(nested);
        };

        let own_name = func.id.as_ref().map(|id| id.name.as_str());
        let is_declaration = func.r#type == FunctionType::FunctionDeclaration;
        let (kind, placement, key_name, location_offset) = match context {
            Some(FunctionContext::ExportDefault { span }) => (
                WorkletKind::FunctionDeclaration,
                Placement::ExportDefault {
                    span,
                    name: own_name.map(str::to_string),
                },
                None,
                func.span.start,
            ),
            Some(FunctionContext::ObjectMethod { span, key, key_name }) => (
                WorkletKind::ObjectMethod,
                Placement::ObjectMethod { span, key },
                key_name,
                span.start,
            ),
            Some(FunctionContext::ClassMethod { span, head, key_name }) => (
                WorkletKind::ClassMethod,
                Placement::ClassMethod { span, head },
                key_name,
                span.start,
            ),
            _ if is_declaration => match own_name {
                Some(name) => (
                    WorkletKind::FunctionDeclaration,
                    Placement::Declaration {
                        name: name.to_string(),
                    },
                    None,
                    func.span.start,
                ),
                None => {
                    let problem = self.diagnostic(
                        ERR_UNSUPPORTED_SYNTAX,
                        "Anonymous function declaration outside `export default`.",
                        func.span,
                    );
                    self.replacements.extend(nested);
                    self.diagnostics.push(problem);
                    return;
                }
            },
            _ => (
                if own_name.is_some() {
                    WorkletKind::NamedFunctionExpression
                } else {
                    WorkletKind::FunctionExpression
                },
                Placement::Expression,
                None,
                func.span.start,
            ),
        };

        let parts = FunctionParts::from_function(self.source, func, body, &nested);
        let canonical_parts =
            FunctionParts::from_function(self.source, func, body, &canonical_view(&nested));
        let info = CandidateInfo {
            kind,
            display_name: display_name(own_name, key_name.as_deref()),
            classification,
            placement,
            function_span: func.span,
            location_offset,
            returns_object: returns_object_literal(body, false),
        };
        self.finish_candidate(frame, nested, parts, canonical_parts, info);
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        let classification = classify(Some(&*arrow.body), self.marks.get(&arrow.span));
        let is_candidate = classification != Classification::NotAWorklet;

        if is_candidate {
            self.begin_candidate();
        }
        self.scopes.enter_function(&arrow.params, Some(&*arrow.body));
        walk::walk_arrow_function_expression(self, arrow);
        self.scopes.pop();

        if !is_candidate {
            return;
        }
        let Some((frame, nested)) = self.end_candidate() else {
            return;
        };
        let parts = FunctionParts::from_arrow(self.source, arrow, &nested);
        let canonical_parts = FunctionParts::from_arrow(self.source, arrow, &canonical_view(&nested));
        let info = CandidateInfo {
            kind: WorkletKind::ArrowFunction,
            display_name: display_name(None, None),
            classification,
            placement: Placement::Expression,
            function_span: arrow.span,
            location_offset: arrow.span.start,
            returns_object: returns_object_literal(&arrow.body, arrow.expression),
        };
        self.finish_candidate(frame, nested, parts, canonical_parts, info);
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        if let Some(id) = &class.id {
            self.scopes.enter_self_name(id, BindingKind::Class);
        }
        walk::walk_class(self, class);
        if class.id.is_some() {
            self.scopes.pop();
        }
    }

    fn visit_static_block(&mut self, block: &StaticBlock<'a>) {
        self.scopes.enter_static_block(&block.body);
        walk::walk_static_block(self, block);
        self.scopes.pop();
    }

    fn visit_block_statement(&mut self, block: &BlockStatement<'a>) {
        self.scopes.enter_block(&block.body);
        walk::walk_block_statement(self, block);
        self.scopes.pop();
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement<'a>) {
        let decl = match &stmt.init {
            Some(ForStatementInit::VariableDeclaration(decl)) => Some(&**decl),
            _ => None,
        };
        self.scopes.enter_loop_head(decl);
        walk::walk_for_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_for_in_statement(&mut self, stmt: &ForInStatement<'a>) {
        let decl = match &stmt.left {
            ForStatementLeft::VariableDeclaration(decl) => Some(&**decl),
            _ => None,
        };
        self.scopes.enter_loop_head(decl);
        walk::walk_for_in_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'a>) {
        let decl = match &stmt.left {
            ForStatementLeft::VariableDeclaration(decl) => Some(&**decl),
            _ => None,
        };
        self.scopes.enter_loop_head(decl);
        walk::walk_for_of_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        self.scopes.enter_catch(clause.param.as_ref());
        walk::walk_catch_clause(self, clause);
        self.scopes.pop();
    }

    fn visit_switch_statement(&mut self, stmt: &SwitchStatement<'a>) {
        self.scopes.enter_switch(&stmt.cases);
        walk::walk_switch_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        for (span, mark) in classify_call(call, self.registry, &self.scopes) {
            self.marks.entry(span).or_insert(mark);
        }

        if !self.frames.is_empty() {
            match &call.callee {
                Expression::Identifier(ident) => {
                    for frame in self.frames.iter_mut() {
                        frame.has_identifier_call = true;
                    }
                    if ident.name.as_str() == "eval" && self.scopes.resolve("eval").is_none() {
                        self.note_dynamic_scope("eval", call.span);
                    }
                }
                Expression::StaticMemberExpression(member) => {
                    if let Some((root, mut path)) = static_member_path(member) {
                        // The receiver of a method call is needed whole for `this`.
                        path.pop();
                        self.capture(root, Some(path));
                        for argument in &call.arguments {
                            self.visit_argument(argument);
                        }
                        return;
                    }
                }
                _ => {}
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_static_member_expression(&mut self, expr: &StaticMemberExpression<'a>) {
        if !self.frames.is_empty() {
            if let Some((root, path)) = static_member_path(expr) {
                self.capture(root, Some(path));
                return;
            }
        }
        walk::walk_static_member_expression(self, expr);
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        self.capture(&ident.name, None);
    }

    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        for frame in self.frames.iter_mut() {
            frame.referenced.insert(ident.name.to_string());
        }
    }

    /// A reassigned name is read as an identifier reference and so captured
    /// whole. A write through a member needs its root whole as well.
    fn visit_simple_assignment_target(&mut self, target: &SimpleAssignmentTarget<'a>) {
        if !self.frames.is_empty() {
            if let Some(root) = target
                .as_member_expression()
                .and_then(|member| member_root(member.object()))
            {
                self.capture(root, None);
            }
        }
        walk::walk_simple_assignment_target(self, target);
    }

    fn visit_formal_parameters(&mut self, params: &FormalParameters<'a>) {
        let opened = match self.frames.last_mut() {
            Some(frame) if frame.params_pending => {
                frame.params_pending = false;
                frame.in_params = true;
                true
            }
            _ => false,
        };
        walk::walk_formal_parameters(self, params);
        if opened {
            if let Some(frame) = self.frames.last_mut() {
                frame.in_params = false;
            }
        }
    }

    fn visit_unary_expression(&mut self, expr: &UnaryExpression<'a>) {
        if expr.operator == UnaryOperator::Delete {
            if let Some(root) = expr
                .argument
                .as_member_expression()
                .and_then(|member| member_root(member.object()))
            {
                self.capture(root, None);
            }
        }
        walk::walk_unary_expression(self, expr);
    }

    fn visit_with_statement(&mut self, stmt: &WithStatement<'a>) {
        self.note_dynamic_scope("with", stmt.span);
        walk::walk_with_statement(self, stmt);
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement<'a>) {
        for frame in self.frames.iter_mut() {
            frame.has_if = true;
        }
        walk::walk_if_statement(self, stmt);
    }

    // Types never reach the runtime.
    fn visit_ts_type(&mut self, _ty: &TSType<'a>) {}

    fn visit_ts_interface_declaration(&mut self, _decl: &TSInterfaceDeclaration<'a>) {}

    fn visit_ts_type_alias_declaration(&mut self, _decl: &TSTypeAliasDeclaration<'a>) {}
}
