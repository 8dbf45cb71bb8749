//! Pattern Registry
//!
//! Static tables consulted by the classifier: hooks whose arguments are
//! worklets, hooks taking an object of callbacks, and fluent builder roots.
//! Built once per transform invocation and only ever read afterwards.

use crate::options::{PatternRegistryConfig, TransformOptions};
use std::collections::{HashMap, HashSet};

lazy_static::lazy_static! {
    static ref FUNCTION_HOOKS: Vec<(&'static str, Vec<usize>)> = vec![
        ("useFrameCallback", vec![0]),
        ("useAnimatedStyle", vec![0]),
        ("useAnimatedProps", vec![0]),
        ("createAnimatedPropAdapter", vec![0]),
        ("useDerivedValue", vec![0]),
        ("useAnimatedScrollHandler", vec![0]),
        ("useAnimatedReaction", vec![0, 1]),
        ("useWorkletCallback", vec![0]),
        ("createWorklet", vec![0]),
        ("withTiming", vec![2]),
        ("withSpring", vec![2]),
        ("withDecay", vec![1]),
        ("withRepeat", vec![3]),
    ];

    static ref OBJECT_HOOKS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("useAnimatedGestureHandler");
        s.insert("useAnimatedScrollHandler");
        s
    };

    static ref OBJECT_CALLBACKS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("onStart");
        s.insert("onActive");
        s.insert("onEnd");
        s.insert("onFail");
        s.insert("onCancel");
        s.insert("onFinish");
        s.insert("onScroll");
        s.insert("onBeginDrag");
        s.insert("onEndDrag");
        s.insert("onMomentumBegin");
        s.insert("onMomentumEnd");
        s.insert("onUpdate");
        s.insert("onBegin");
        s
    };

    static ref GESTURE_FACTORIES: Vec<&'static str> = vec![
        "Tap",
        "Pan",
        "Pinch",
        "Rotation",
        "Fling",
        "LongPress",
        "ForceTouch",
        "Native",
        "Manual",
        "Race",
        "Simultaneous",
        "Exclusive",
    ];

    static ref OPTIMIZABLE_HOOKS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("useAnimatedStyle");
        s.insert("useAnimatedProps");
        s
    };

    /// Names the remote runtime provides on its own.
    pub static ref RUNTIME_GLOBALS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("this");
        s.insert("console");
        s.insert("performance");
        s.insert("_setGlobalConsole");
        s.insert("_chronoNow");
        s.insert("Date");
        s.insert("Array");
        s.insert("ArrayBuffer");
        s.insert("Int8Array");
        s.insert("Int16Array");
        s.insert("Int32Array");
        s.insert("Uint8Array");
        s.insert("Uint8ClampedArray");
        s.insert("Uint16Array");
        s.insert("Uint32Array");
        s.insert("Float32Array");
        s.insert("Float64Array");
        s.insert("HermesInternal");
        s.insert("JSON");
        s.insert("Math");
        s.insert("Number");
        s.insert("Object");
        s.insert("String");
        s.insert("Symbol");
        s.insert("undefined");
        s.insert("null");
        s.insert("UIManager");
        s.insert("requestAnimationFrame");
        s.insert("_WORKLET");
        s.insert("arguments");
        s.insert("Boolean");
        s.insert("parseInt");
        s.insert("parseFloat");
        s.insert("Map");
        s.insert("Set");
        s.insert("_log");
        s.insert("_updatePropsPaper");
        s.insert("_updatePropsFabric");
        s.insert("_removeShadowNodeFromRegistry");
        s.insert("RegExp");
        s.insert("Error");
        s.insert("global");
        s.insert("_measure");
        s.insert("_scrollTo");
        s.insert("_dispatchCommand");
        s.insert("_setGestureState");
        s.insert("_getCurrentTime");
        s.insert("_eventTimestamp");
        s.insert("_frameTimestamp");
        s.insert("isNaN");
        s.insert("LayoutAnimationRepository");
        s.insert("_stopObservingProgress");
        s.insert("_startObservingProgress");
        s
    };
}

#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    function_hooks: HashMap<String, Vec<usize>>,
    object_hooks: HashSet<String>,
    object_callbacks: HashSet<String>,
    builders: HashMap<String, HashSet<String>>,
    optimizable_hooks: HashSet<String>,
    globals: HashSet<String>,
}

impl PatternRegistry {
    /// Built-in tables only.
    pub fn builtin() -> Self {
        let mut registry = PatternRegistry::default();
        for (name, indices) in FUNCTION_HOOKS.iter() {
            registry
                .function_hooks
                .insert(name.to_string(), indices.clone());
        }
        registry.object_hooks = OBJECT_HOOKS.iter().map(|s| s.to_string()).collect();
        registry.object_callbacks = OBJECT_CALLBACKS.iter().map(|s| s.to_string()).collect();
        registry.builders.insert(
            "Gesture".to_string(),
            GESTURE_FACTORIES.iter().map(|s| s.to_string()).collect(),
        );
        registry.optimizable_hooks = OPTIMIZABLE_HOOKS.iter().map(|s| s.to_string()).collect();
        registry.globals = RUNTIME_GLOBALS.iter().map(|s| s.to_string()).collect();
        registry
    }

    pub fn from_options(options: &TransformOptions) -> Self {
        let mut registry = Self::builtin();
        registry.globals.extend(options.globals.iter().cloned());
        if let Some(config) = &options.patterns {
            registry.extend(config);
        }
        registry
    }

    pub fn extend(&mut self, config: &PatternRegistryConfig) {
        for (name, indices) in &config.function_hooks {
            let entry = self.function_hooks.entry(name.clone()).or_default();
            for index in indices {
                if !entry.contains(index) {
                    entry.push(*index);
                }
            }
        }
        self.object_hooks.extend(config.object_hooks.iter().cloned());
        self.object_callbacks
            .extend(config.object_callbacks.iter().cloned());
        for (root, factories) in &config.builders {
            self.builders
                .entry(root.clone())
                .or_default()
                .extend(factories.iter().cloned());
        }
        self.optimizable_hooks
            .extend(config.optimizable_hooks.iter().cloned());
    }

    /// Argument indices of `name` that are worklets, if it is a function hook.
    pub fn hook_arguments(&self, name: &str) -> Option<&[usize]> {
        self.function_hooks.get(name).map(|v| v.as_slice())
    }

    pub fn is_object_hook(&self, name: &str) -> bool {
        self.object_hooks.contains(name)
    }

    pub fn is_object_callback(&self, name: &str) -> bool {
        self.object_callbacks.contains(name)
    }

    pub fn is_builder_factory(&self, root: &str, method: &str) -> bool {
        self.builders
            .get(root)
            .map_or(false, |factories| factories.contains(method))
    }

    pub fn is_optimizable_hook(&self, name: &str) -> bool {
        self.optimizable_hooks.contains(name)
    }

    pub fn is_runtime_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }
}
