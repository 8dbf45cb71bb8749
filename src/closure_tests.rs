#[cfg(test)]
mod tests {
    use crate::options::TransformOptions;
    use crate::transform::{transform_worklets, TransformOutput};

    fn run(code: &str) -> TransformOutput {
        run_with(code, &TransformOptions::with_filename("/app/src/closure.js"))
    }

    fn run_with(code: &str, options: &TransformOptions) -> TransformOutput {
        match transform_worklets(code, options) {
            Ok(output) => output,
            Err(e) => panic!("transform failed: {}", e),
        }
    }

    /// Closure names of the only worklet in `code`.
    fn closure_of(code: &str) -> Vec<String> {
        let output = run(code);
        assert_eq!(output.worklets.len(), 1, "worklets: {:?}", output.worklets);
        output.worklets[0].closure.clone()
    }

    /// The `_closure` literal of the outermost wrapper. Wrappers nested inside
    /// another worklet are reprinted with indentation, so they never match.
    fn closure_literal(code: &str) -> String {
        let output = run(code);
        output
            .code
            .lines()
            .find_map(|line| line.strip_prefix("_f._closure="))
            .map(|value| value.trim_end_matches(';').to_string())
            .unwrap_or_else(|| panic!("no closure line in:\n{}", output.code))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // RESOLUTION
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_first_encounter_order() {
        let closure = closure_of(
            "const a = 1, b = 2, c = 3;\nfunction f() { 'worklet'; return c + a + b + a; }",
        );
        assert_eq!(closure, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_param_shadows_outer_binding() {
        assert!(closure_of("const x = 1;\nfunction f(x) { 'worklet'; return x; }").is_empty());
        assert!(closure_of(
            "const a = 1, c = 2;\nfunction f({ a, b: [c] }, ...rest) { 'worklet'; return a + c + rest.length; }"
        )
        .is_empty());
    }

    #[test]
    fn test_var_is_hoisted_to_worklet_scope() {
        let closure = closure_of(
            "const y = 1;\nfunction f() { 'worklet'; if (true) { var y = 2; } return y; }",
        );
        assert!(closure.is_empty());
    }

    #[test]
    fn test_inner_block_local_is_not_visible() {
        let closure = closure_of(
            "const z = 1;\nfunction f() { 'worklet'; { const z = 2; } return z; }",
        );
        assert_eq!(closure, vec!["z"]);
    }

    #[test]
    fn test_enclosing_function_locals_are_captured() {
        let closure = closure_of(
            "function outer(k) {\n  const local = 1;\n  {\n    const blockLocal = 2;\n    useDerivedValue(() => k + local + blockLocal);\n  }\n}",
        );
        assert_eq!(closure, vec!["k", "local", "blockLocal"]);
    }

    #[test]
    fn test_catch_parameter() {
        assert!(closure_of("function f() { 'worklet'; try {} catch (e) { return e; } }").is_empty());
        assert_eq!(
            closure_of("try {} catch (err) { useDerivedValue(() => err); }"),
            vec!["err"]
        );
    }

    #[test]
    fn test_loop_bindings() {
        assert_eq!(
            closure_of("for (let i = 0; i < 3; i++) { useDerivedValue(() => i); }"),
            vec!["i"]
        );
        assert!(closure_of(
            "function f() { 'worklet'; for (let j = 0; j < 2; j++) {} for (const k of []) { k; } }"
        )
        .is_empty());
    }

    #[test]
    fn test_free_globals_are_not_captured() {
        let closure = closure_of("function f() { 'worklet'; return fetchSomething(window.x); }");
        assert!(closure.is_empty());
        assert!(closure_of("function f() { 'worklet'; return this.x; }").is_empty());
    }

    #[test]
    fn test_imports_are_captured() {
        let code = "import { theme } from './theme';\nfunction f() { 'worklet'; return theme.colors.primary; }";
        assert_eq!(closure_of(code), vec!["theme"]);
        assert_eq!(
            closure_literal(code),
            "{theme:{colors:{primary:theme.colors.primary}}}"
        );
    }

    #[test]
    fn test_runtime_globals() {
        // Module-level declarations of runtime-provided names are left to the runtime.
        assert!(closure_of("const _WORKLET = true;\nfunction f() { 'worklet'; return _WORKLET; }").is_empty());
        // A local of the same spelling is an ordinary binding.
        let closure = closure_of(
            "function outer() {\n  const console = make();\n  useDerivedValue(() => console.log(1));\n}",
        );
        assert_eq!(closure, vec!["console"]);
    }

    #[test]
    fn test_configured_globals_are_excluded() {
        let mut options = TransformOptions::with_filename("/app/src/closure.js");
        options.globals = vec!["myGlobal".to_string()];
        let code = "const myGlobal = 1, other = 2;\nfunction f() { 'worklet'; return myGlobal + other; }";
        let output = run_with(code, &options);
        assert_eq!(output.worklets[0].closure, vec!["other"]);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // NARROWING
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_paths_narrow() {
        assert_eq!(
            closure_literal("const o = {};\nfunction f() { 'worklet'; return o.a.b + o.c; }"),
            "{o:{a:{b:o.a.b},c:o.c}}"
        );
    }

    #[test]
    fn test_whole_use_overrides_paths() {
        assert_eq!(
            closure_literal("const o = {};\nfunction f() { 'worklet'; g(o.a); return o; }"),
            "{o:o}"
        );
    }

    #[test]
    fn test_method_call_keeps_receiver() {
        assert_eq!(
            closure_literal("const api = {};\nfunction f() { 'worklet'; api.run(); }"),
            "{api:api}"
        );
        assert_eq!(
            closure_literal("const a = {};\nfunction f() { 'worklet'; a.b.run(); }"),
            "{a:{b:a.b}}"
        );
    }

    #[test]
    fn test_optional_chain_captures_whole() {
        assert_eq!(
            closure_literal("const o = {};\nfunction f() { 'worklet'; return o?.a; }"),
            "{o:o}"
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // NESTED WORKLETS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_inner_captures_propagate_outward() {
        let output = run(
            "const x = 1;\nfunction outer() {\n  'worklet';\n  const inner = () => { 'worklet'; return x; };\n  return inner;\n}",
        );
        assert_eq!(output.worklets.len(), 2);
        assert_eq!(output.worklets[0].closure, vec!["x"]);
        assert_eq!(output.worklets[1].name, "outer");
        assert_eq!(output.worklets[1].closure, vec!["x"]);
    }

    #[test]
    fn test_outer_worklet_local_stays_inside() {
        let output = run(
            "function outer() {\n  'worklet';\n  const y = 1;\n  const inner = () => { 'worklet'; return y; };\n  return inner;\n}",
        );
        assert_eq!(output.worklets[0].closure, vec!["y"]);
        assert!(output.worklets[1].closure.is_empty());
    }
}
