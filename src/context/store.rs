//! Per-thread context layers and the process-wide default context.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::value::ContextValue;

/// One set of bindings pushed by one `enter` call.
#[derive(Debug)]
pub(crate) struct Layer {
    id: u64,
    values: BTreeMap<String, ContextValue>,
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Layer>> = const { RefCell::new(Vec::new()) };
}

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

// Fallback values visible to every thread that has not bound the key
// locally. Reset once per setup call.
static DEFAULT_CONTEXT: Mutex<BTreeMap<String, ContextValue>> = Mutex::new(BTreeMap::new());

/// A set of context bindings that can be entered as a scope.
///
/// Entering pushes one layer onto the current thread's stack; dropping the
/// returned guard restores whatever was visible before, even when the scope
/// body panics.
///
/// ```
/// use ctxlog::LogContext;
///
/// let _guard = LogContext::new().with_value("trace_id", 123).enter();
/// log::info!("something happened"); // enriched with trace_id=123
/// ```
#[derive(Debug, Default, Clone)]
pub struct LogContext {
    values: BTreeMap<String, ContextValue>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one binding to this layer. Binding a key already visible in an
    /// outer scope shadows it for the lifetime of the guard.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Snapshot the flattened current context (defaults included) as a new
    /// layer. This is the explicit propagation point for handing context to
    /// a spawned thread or task.
    pub fn from_current() -> Self {
        Self {
            values: current_context(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Push this layer onto the current thread's stack.
    pub fn enter(self) -> ContextGuard {
        let layer = Layer {
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
            values: self.values,
        };
        let id = layer.id;
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(layer));
        ContextGuard { id }
    }

    pub(crate) fn into_layer(self) -> Layer {
        Layer {
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
            values: self.values,
        }
    }
}

/// RAII handle for an entered scope. Removes its layer when dropped.
#[must_use = "dropping the guard immediately exits the scope"]
#[derive(Debug)]
pub struct ContextGuard {
    id: u64,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            // Scopes nest, so the matching layer is almost always on top.
            // Searching by id keeps restore correct if an instrumented
            // future was dropped with a guard still alive.
            if let Some(pos) = stack.iter().rposition(|layer| layer.id == self.id) {
                stack.remove(pos);
            }
        });
    }
}

/// Innermost-wins lookup of a single key, falling back to the default
/// context. Pure reader.
pub fn current_value(key: &str) -> Option<ContextValue> {
    let local = CONTEXT_STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(key).cloned())
    });
    local.or_else(|| default_context().get(key).cloned())
}

/// The merged view of defaults and all open layers, innermost wins.
/// Computed at call time, so values bound after a scope was entered are
/// visible. Pure reader.
pub fn current_context() -> BTreeMap<String, ContextValue> {
    let mut merged = default_context().clone();
    CONTEXT_STACK.with(|stack| {
        for layer in stack.borrow().iter() {
            for (k, v) in &layer.values {
                merged.insert(k.clone(), v.clone());
            }
        }
    });
    merged
}

/// Set a process-wide fallback value, visible to every thread that has not
/// bound the key locally.
pub fn set_default(key: impl Into<String>, value: impl Into<ContextValue>) {
    default_context().insert(key.into(), value.into());
}

/// Clear all process-wide fallback values.
pub fn reset_defaults() {
    default_context().clear();
}

fn default_context() -> std::sync::MutexGuard<'static, BTreeMap<String, ContextValue>> {
    // The logging path must stay usable after a panic on another thread.
    DEFAULT_CONTEXT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn install_layers(layers: Vec<Layer>) -> usize {
    CONTEXT_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let base = stack.len();
        stack.extend(layers);
        base
    })
}

pub(crate) fn detach_layers(base: usize) -> Vec<Layer> {
    CONTEXT_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if base <= stack.len() {
            stack.split_off(base)
        } else {
            Vec::new()
        }
    })
}
