//! Closure capture bookkeeping for one worklet.
//!
//! Every outer reference seen while walking the worklet body is recorded here,
//! either as a whole-value use or as a static property path (`objX.a.b`).
//! Any whole-value use wins over paths recorded for the same name.

use std::collections::HashMap;

/// One captured outer-scope dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureBinding {
    pub name: String,
    /// Property paths read through `name`. Empty means the whole value is captured.
    pub access_paths: Vec<Vec<String>>,
}

impl ClosureBinding {
    pub fn is_whole(&self) -> bool {
        self.access_paths.is_empty()
    }

    /// Expression rebuilding the captured value where the worklet is defined.
    pub fn value_expression(&self) -> String {
        if self.is_whole() {
            return self.name.clone();
        }
        let mut tree = PathTree::default();
        for path in &self.access_paths {
            tree.insert(path);
        }
        tree.render(&self.name)
    }
}

#[derive(Debug, Clone)]
enum Usage {
    Whole,
    Paths(Vec<Vec<String>>),
}

#[derive(Debug, Clone, Default)]
pub struct ClosureCollector {
    order: Vec<String>,
    usages: HashMap<String, Usage>,
}

impl ClosureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_whole(&mut self, name: &str) {
        if !self.usages.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.usages.insert(name.to_string(), Usage::Whole);
    }

    pub fn record_path(&mut self, name: &str, path: Vec<String>) {
        if path.is_empty() {
            return self.record_whole(name);
        }
        match self.usages.get_mut(name) {
            Some(Usage::Whole) => {}
            Some(Usage::Paths(paths)) => {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            None => {
                self.order.push(name.to_string());
                self.usages.insert(name.to_string(), Usage::Paths(vec![path]));
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn bindings(&self) -> Vec<ClosureBinding> {
        self.order
            .iter()
            .map(|name| ClosureBinding {
                name: name.clone(),
                access_paths: match self.usages.get(name) {
                    Some(Usage::Paths(paths)) => paths.clone(),
                    _ => Vec::new(),
                },
            })
            .collect()
    }
}

/// `{a:x,b:{c:y.b.c}}` object literal for the `_closure` field.
pub fn closure_object(bindings: &[ClosureBinding]) -> String {
    let fields: Vec<String> = bindings
        .iter()
        .map(|binding| format!("{}:{}", binding.name, binding.value_expression()))
        .collect();
    format!("{{{}}}", fields.join(","))
}

/// Prefix tree of property paths. A terminal node swallows its children:
/// reading `a.b` already captures everything `a.b.c` needs.
#[derive(Debug, Default)]
struct PathTree {
    terminal: bool,
    children: Vec<(String, PathTree)>,
}

impl PathTree {
    fn insert(&mut self, path: &[String]) {
        if self.terminal {
            return;
        }
        let Some((head, rest)) = path.split_first() else {
            self.terminal = true;
            self.children.clear();
            return;
        };
        let index = match self.children.iter().position(|(key, _)| key == head) {
            Some(index) => index,
            None => {
                self.children.push((head.clone(), PathTree::default()));
                self.children.len() - 1
            }
        };
        self.children[index].1.insert(rest);
    }

    fn render(&self, prefix: &str) -> String {
        if self.terminal {
            return prefix.to_string();
        }
        let fields: Vec<String> = self
            .children
            .iter()
            .map(|(key, child)| format!("{}:{}", key, child.render(&format!("{}.{}", prefix, key))))
            .collect();
        format!("{{{}}}", fields.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_whole_capture_is_verbatim() {
        let mut collector = ClosureCollector::new();
        collector.record_whole("x");
        assert_eq!(closure_object(&collector.bindings()), "{x:x}");
    }

    #[test]
    fn test_single_path_narrows() {
        let mut collector = ClosureCollector::new();
        collector.record_path("objX", path(&["x"]));
        collector.record_path("objX", path(&["x"]));
        assert_eq!(closure_object(&collector.bindings()), "{objX:{x:objX.x}}");
    }

    #[test]
    fn test_whole_use_overrides_paths() {
        let mut collector = ClosureCollector::new();
        collector.record_path("objX", path(&["x"]));
        collector.record_whole("objX");
        collector.record_path("objX", path(&["y"]));
        let bindings = collector.bindings();
        assert!(bindings[0].is_whole());
        assert_eq!(closure_object(&bindings), "{objX:objX}");
    }

    #[test]
    fn test_nested_paths_merge() {
        let mut collector = ClosureCollector::new();
        collector.record_path("o", path(&["a", "b"]));
        collector.record_path("o", path(&["a", "c"]));
        collector.record_path("o", path(&["d"]));
        assert_eq!(
            closure_object(&collector.bindings()),
            "{o:{a:{b:o.a.b,c:o.a.c},d:o.d}}"
        );
    }

    #[test]
    fn test_shorter_path_swallows_longer() {
        let mut collector = ClosureCollector::new();
        collector.record_path("o", path(&["a", "b"]));
        collector.record_path("o", path(&["a"]));
        assert_eq!(closure_object(&collector.bindings()), "{o:{a:o.a}}");
    }

    #[test]
    fn test_first_encounter_order() {
        let mut collector = ClosureCollector::new();
        collector.record_whole("b");
        collector.record_path("a", path(&["x"]));
        collector.record_whole("b");
        collector.record_whole("c");
        assert_eq!(collector.names(), &["b", "a", "c"]);
    }
}
