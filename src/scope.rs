//! Binding Resolver
//!
//! Lexical scope chain maintained alongside the single traversal. Each scope is
//! populated on entry with everything it declares (hoisted `var`s and function
//! declarations included), so a reference resolves to the same declaration the
//! JS engine would pick, independent of textual order.

use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Import,
    Var,
    Let,
    Const,
    Function,
    Class,
    Enum,
    Param,
    CatchParam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    /// Holds only the name of a named function or class, visible inside it.
    SelfName,
    Block,
    StaticBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub span: Span,
    /// For imports, the name the module exports: the imported name of a named
    /// specifier, `default`, or `*` for a namespace.
    pub imported: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Index of the declaring scope in the chain, 0 being the module scope.
    pub depth: usize,
    pub scope_kind: ScopeKind,
    pub binding: Binding,
}

impl Resolution {
    pub fn is_module_level(&self) -> bool {
        self.scope_kind == ScopeKind::Module
    }
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    bindings: HashMap<String, Binding>,
}

#[derive(Debug, Default)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            bindings: HashMap::new(),
        });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Declares into the innermost scope. The first declaration of a name wins.
    pub fn declare(&mut self, name: &str, kind: BindingKind, span: Span) {
        self.insert(name, Binding { kind, span, imported: None });
    }

    fn declare_import(&mut self, local: &str, imported: &str, span: Span) {
        self.insert(
            local,
            Binding {
                kind: BindingKind::Import,
                span,
                imported: Some(imported.to_string()),
            },
        );
    }

    fn insert(&mut self, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.entry(name.to_string()).or_insert(binding);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| {
                scope.bindings.get(name).map(|binding| Resolution {
                    depth,
                    scope_kind: scope.kind,
                    binding: binding.clone(),
                })
            })
    }

    /// The name `local` refers to outside this module: itself when it is a
    /// free global, the exported name when it is a named import. `None` for
    /// any local binding, default import or namespace.
    pub fn external_name(&self, local: &str) -> Option<String> {
        match self.resolve(local) {
            None => Some(local.to_string()),
            Some(resolution) => match resolution.binding.imported.as_deref() {
                Some("default") | Some("*") | None => None,
                Some(imported) => Some(imported.to_string()),
            },
        }
    }

    /// True when `local` is a namespace import or a free global, i.e. a
    /// `local.member` access names an export of another module.
    pub fn is_namespace_or_free(&self, local: &str) -> bool {
        match self.resolve(local) {
            None => true,
            Some(resolution) => resolution.binding.imported.as_deref() == Some("*"),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCOPE ENTRY
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn enter_program(&mut self, program: &Program<'_>) {
        self.push(ScopeKind::Module);
        self.declare_hoisted(&program.body);
        self.declare_lexical(&program.body);
    }

    pub fn enter_self_name(&mut self, ident: &BindingIdentifier<'_>, kind: BindingKind) {
        self.push(ScopeKind::SelfName);
        self.declare(&ident.name, kind, ident.span);
    }

    pub fn enter_function(&mut self, params: &FormalParameters<'_>, body: Option<&FunctionBody<'_>>) {
        self.push(ScopeKind::Function);
        let mut collector = BindingNameCollector::default();
        collector.visit_formal_parameters(params);
        for (name, span) in collector.names {
            self.declare(&name, BindingKind::Param, span);
        }
        if let Some(body) = body {
            self.declare_hoisted(&body.statements);
            self.declare_lexical(&body.statements);
        }
    }

    pub fn enter_block(&mut self, statements: &[Statement<'_>]) {
        self.push(ScopeKind::Block);
        self.declare_lexical(statements);
    }

    pub fn enter_static_block(&mut self, statements: &[Statement<'_>]) {
        self.push(ScopeKind::StaticBlock);
        self.declare_hoisted(statements);
        self.declare_lexical(statements);
    }

    pub fn enter_switch(&mut self, cases: &[SwitchCase<'_>]) {
        self.push(ScopeKind::Block);
        for case in cases {
            self.declare_lexical(&case.consequent);
        }
    }

    /// Loop heads (`for (let i ...)`) get their own block scope.
    pub fn enter_loop_head(&mut self, decl: Option<&VariableDeclaration<'_>>) {
        self.push(ScopeKind::Block);
        if let Some(decl) = decl {
            if decl.kind != VariableDeclarationKind::Var {
                self.declare_variable_declaration(decl);
            }
        }
    }

    pub fn enter_catch(&mut self, param: Option<&CatchParameter<'_>>) {
        self.push(ScopeKind::Block);
        if let Some(param) = param {
            self.declare_pattern(&param.pattern, BindingKind::CatchParam);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DECLARATION COLLECTION
    // ═══════════════════════════════════════════════════════════════════════════

    fn declare_pattern(&mut self, pattern: &BindingPattern<'_>, kind: BindingKind) {
        for (name, span) in binding_names(pattern) {
            self.declare(&name, kind, span);
        }
    }

    fn declare_hoisted(&mut self, statements: &[Statement<'_>]) {
        let mut collector = HoistedVarCollector::default();
        for stmt in statements {
            collector.visit_statement(stmt);
        }
        for (name, span) in collector.names {
            self.declare(&name, BindingKind::Var, span);
        }
    }

    fn declare_variable_declaration(&mut self, decl: &VariableDeclaration<'_>) {
        let kind = match decl.kind {
            VariableDeclarationKind::Var => BindingKind::Var,
            VariableDeclarationKind::Const => BindingKind::Const,
            _ => BindingKind::Let,
        };
        for declarator in &decl.declarations {
            self.declare_pattern(&declarator.id, kind);
        }
    }

    fn declare_function_id(&mut self, func: &Function<'_>) {
        if let Some(id) = &func.id {
            self.declare(&id.name, BindingKind::Function, id.span);
        }
    }

    fn declare_class_id(&mut self, class: &Class<'_>) {
        if let Some(id) = &class.id {
            self.declare(&id.name, BindingKind::Class, id.span);
        }
    }

    fn declare_lexical(&mut self, statements: &[Statement<'_>]) {
        for stmt in statements {
            match stmt {
                Statement::VariableDeclaration(decl) => {
                    if decl.kind != VariableDeclarationKind::Var {
                        self.declare_variable_declaration(decl);
                    }
                }
                Statement::FunctionDeclaration(func) => self.declare_function_id(func),
                Statement::ClassDeclaration(class) => self.declare_class_id(class),
                Statement::TSEnumDeclaration(decl) => {
                    self.declare(&decl.id.name, BindingKind::Enum, decl.id.span);
                }
                Statement::ImportDeclaration(import_decl) => {
                    if let Some(specifiers) = &import_decl.specifiers {
                        for specifier in specifiers {
                            let (local, imported) = match specifier {
                                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                    (&s.local, s.imported.name().to_string())
                                }
                                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                                    (&s.local, "default".to_string())
                                }
                                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                                    (&s.local, "*".to_string())
                                }
                            };
                            self.declare_import(&local.name, &imported, local.span);
                        }
                    }
                }
                Statement::ExportNamedDeclaration(export) => match &export.declaration {
                    Some(Declaration::VariableDeclaration(decl)) => {
                        if decl.kind != VariableDeclarationKind::Var {
                            self.declare_variable_declaration(decl);
                        }
                    }
                    Some(Declaration::FunctionDeclaration(func)) => self.declare_function_id(func),
                    Some(Declaration::ClassDeclaration(class)) => self.declare_class_id(class),
                    Some(Declaration::TSEnumDeclaration(decl)) => {
                        self.declare(&decl.id.name, BindingKind::Enum, decl.id.span);
                    }
                    _ => {}
                },
                Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        self.declare_function_id(func)
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        self.declare_class_id(class)
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }
}

/// Names bound by a pattern, in source order.
pub fn binding_names(pattern: &BindingPattern<'_>) -> Vec<(String, Span)> {
    let mut collector = BindingNameCollector::default();
    collector.visit_binding_pattern(pattern);
    collector.names
}

/// Collects binding identifiers of a pattern or parameter list. Default values,
/// computed keys and type annotations are skipped: they bind nothing here.
#[derive(Default)]
struct BindingNameCollector {
    names: Vec<(String, Span)>,
}

impl<'a> Visit<'a> for BindingNameCollector {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.push((ident.name.to_string(), ident.span));
    }

    fn visit_expression(&mut self, _expr: &Expression<'a>) {}

    fn visit_ts_type_annotation(&mut self, _annotation: &TSTypeAnnotation<'a>) {}

    fn visit_decorator(&mut self, _decorator: &Decorator<'a>) {}
}

/// `var` declarations hoisted to the nearest function (or module) scope.
#[derive(Default)]
struct HoistedVarCollector {
    names: Vec<(String, Span)>,
}

impl<'a> Visit<'a> for HoistedVarCollector {
    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
        if decl.kind == VariableDeclarationKind::Var {
            for declarator in &decl.declarations {
                self.names.extend(binding_names(&declarator.id));
            }
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        // Nested declarations other than `var` never reach the enclosing function scope.
        match stmt {
            Statement::FunctionDeclaration(_) | Statement::ClassDeclaration(_) => {}
            _ => walk::walk_statement(self, stmt),
        }
    }

    fn visit_function(&mut self, _func: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _func: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _class: &Class<'a>) {}

    fn visit_expression(&mut self, _expr: &Expression<'a>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_program<F: FnOnce(&Program<'_>)>(code: &str, f: F) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        f(&ret.program);
    }

    #[test]
    fn test_module_scope_declarations() {
        with_program(
            "import A, { b as c } from 'x';\nconst d = 1;\nfunction e() { var inner; }\nif (d) { var f = 2; let g = 3; }\nclass H {}",
            |program| {
                let mut chain = ScopeChain::new();
                chain.enter_program(program);
                assert_eq!(chain.resolve("A").unwrap().binding.kind, BindingKind::Import);
                assert_eq!(chain.resolve("c").unwrap().binding.kind, BindingKind::Import);
                assert!(chain.resolve("b").is_none());
                assert_eq!(chain.resolve("d").unwrap().binding.kind, BindingKind::Const);
                assert_eq!(chain.resolve("e").unwrap().binding.kind, BindingKind::Function);
                assert_eq!(chain.resolve("f").unwrap().binding.kind, BindingKind::Var);
                assert_eq!(chain.resolve("H").unwrap().binding.kind, BindingKind::Class);
                // Block-scoped and function-local names stay out of module scope.
                assert!(chain.resolve("g").is_none());
                assert!(chain.resolve("inner").is_none());
            },
        );
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        with_program("const x = 1;", |program| {
            let mut chain = ScopeChain::new();
            chain.enter_program(program);
            chain.push(ScopeKind::Block);
            chain.declare("x", BindingKind::Let, Span::new(0, 0));
            let resolution = chain.resolve("x").unwrap();
            assert_eq!(resolution.depth, 1);
            assert!(!resolution.is_module_level());
            chain.pop();
            assert!(chain.resolve("x").unwrap().is_module_level());
        });
    }

    #[test]
    fn test_external_names() {
        with_program(
            "import { useAnimatedStyle, useAnimatedGestureHandler as h, x as useDerivedValue } from 'lib';\nimport R, * as NS from 'lib';\nfunction local() {}",
            |program| {
                let mut chain = ScopeChain::new();
                chain.enter_program(program);
                assert_eq!(chain.external_name("useAnimatedStyle").as_deref(), Some("useAnimatedStyle"));
                assert_eq!(chain.external_name("h").as_deref(), Some("useAnimatedGestureHandler"));
                assert_eq!(chain.external_name("useDerivedValue").as_deref(), Some("x"));
                assert_eq!(chain.external_name("withTiming").as_deref(), Some("withTiming"));
                assert_eq!(chain.external_name("local"), None);
                assert_eq!(chain.external_name("R"), None);
                assert!(chain.is_namespace_or_free("NS"));
                assert!(chain.is_namespace_or_free("Gesture"));
                assert!(!chain.is_namespace_or_free("R"));
                assert_eq!(
                    chain.resolve("h").unwrap().binding.imported.as_deref(),
                    Some("useAnimatedGestureHandler")
                );
            },
        );
    }

    #[test]
    fn test_pattern_names() {
        with_program("const { a, b: [c, ...d], e = (z) => z, ...f } = obj;", |program| {
            let Statement::VariableDeclaration(decl) = &program.body[0] else {
                panic!("expected declaration");
            };
            let names: Vec<String> = binding_names(&decl.declarations[0].id)
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            assert_eq!(names, vec!["a", "c", "d", "e", "f"]);
        });
    }
}
