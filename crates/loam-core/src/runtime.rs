//! Runtime context object
//!
//! `Runtime` owns every piece of shared mutable state a runtime instance
//! has: the value stack, the registry of anchors, the proxy cache, the
//! per-type metatable registry, and the globals table. There are no
//! process-wide reserved keys — lifecycle is the struct's lifecycle.
//!
//! # Concurrency
//!
//! A `Runtime` is single-threaded by construction: values hold `Rc`
//! handles and raw pointers, so the type is `!Send` and `!Sync`. Callers
//! needing cross-thread access must confine the instance to one thread and
//! serialize entry points externally.

use rustc_hash::FxHashMap;

use crate::error::{RuntimeError, RuntimeResult};
use crate::proxy::ProxyCache;
use crate::registry::{Anchor, Registry};
use crate::stack::ValueStack;
use crate::value::{FuncRef, TableRef, Value};

/// One embedded runtime instance.
pub struct Runtime {
    stack: ValueStack,
    registry: Registry,
    proxies: ProxyCache,
    metatables: FxHashMap<&'static str, TableRef>,
    globals: TableRef,
}

impl Runtime {
    /// Create a fresh runtime instance
    pub fn new() -> Self {
        Self {
            stack: ValueStack::new(),
            registry: Registry::new(),
            proxies: ProxyCache::new(),
            metatables: FxHashMap::default(),
            globals: TableRef::new(),
        }
    }

    // ========================================================================
    // Stack facade
    // ========================================================================

    /// Current stack depth
    #[inline]
    pub fn top(&self) -> usize {
        self.stack.top()
    }

    /// Push one value
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop `n` values
    #[inline]
    pub fn pop(&mut self, n: usize) {
        self.stack.pop(n);
    }

    /// Read the slot at `idx` (1-based, negative from the top); reads
    /// outside the live window yield nil.
    #[inline]
    pub fn value_at(&self, idx: isize) -> Value {
        self.stack.get(idx)
    }

    /// Direct access to the stack (traversal, diagnostics)
    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Allocate a fresh table and push it; returns the handle.
    pub fn push_new_table(&mut self) -> TableRef {
        let table = TableRef::new();
        self.stack.push(Value::Table(table.clone()));
        table
    }

    /// Wrap a native closure as a function value and push it
    pub fn push_function<F>(&mut self, f: F) -> FuncRef
    where
        F: Fn(&mut Runtime) -> RuntimeResult<usize> + 'static,
    {
        let func = FuncRef::new(f);
        self.stack.push(Value::Func(func.clone()));
        func
    }

    /// Run `f` with the stack depth restored afterwards, whatever `f`
    /// pushed and on every return path. This is the scope-guard all
    /// traversal helpers use to honor the stack-balance contract.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Runtime) -> R) -> R {
        let depth = self.stack.top();
        let out = f(self);
        self.stack.truncate(depth);
        out
    }

    // ========================================================================
    // Subsystems
    // ========================================================================

    /// The registry of anchors
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry access
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The proxy identity cache
    pub fn proxies(&self) -> &ProxyCache {
        &self.proxies
    }

    /// Mutable proxy cache access
    pub fn proxies_mut(&mut self) -> &mut ProxyCache {
        &mut self.proxies
    }

    /// The globals table
    pub fn globals(&self) -> TableRef {
        self.globals.clone()
    }

    /// Register the metatable for a bound native type. Populated by the
    /// external type-binding subsystem; last write wins.
    pub fn register_metatable(&mut self, name: &'static str, meta: TableRef) {
        self.metatables.insert(name, meta);
    }

    /// Look up a type's metatable by name
    pub fn metatable(&self, name: &str) -> Option<TableRef> {
        self.metatables.get(name).cloned()
    }

    // ========================================================================
    // Anchoring
    // ========================================================================

    /// Pop the top-of-stack value and anchor it in the registry.
    /// An empty stack anchors nil, yielding the nil sentinel.
    pub fn anchor_from_stack(&mut self) -> Anchor {
        let value = self.stack.get(-1);
        if !self.stack.is_empty() {
            self.stack.pop(1);
        }
        self.registry.anchor(value)
    }

    /// Push the value an anchor references (nil for sentinels)
    pub fn push_anchor(&mut self, anchor: Anchor) {
        let value = self.registry.fetch(anchor);
        self.stack.push(value);
    }

    // ========================================================================
    // Call boundary
    // ========================================================================

    /// Call the function value sitting below its `nargs` arguments on the
    /// stack. On return the function and arguments are consumed and the
    /// function's results occupy the top of the stack; returns how many.
    ///
    /// # Errors
    ///
    /// `NotCallable` when the slot below the arguments is not a function;
    /// native errors propagate from the function body. In both error cases
    /// the function and argument window is consumed.
    ///
    /// # Panics
    ///
    /// Asserts if the stack does not hold `nargs + 1` values.
    pub fn call(&mut self, nargs: usize) -> RuntimeResult<usize> {
        let top = self.stack.top();
        assert!(top > nargs, "call window underflows the stack");
        let fslot = top - nargs - 1;

        let func = match self.stack.get(fslot as isize + 1) {
            Value::Func(f) => f,
            other => {
                self.stack.truncate(fslot);
                return Err(RuntimeError::NotCallable(other.type_name()));
            }
        };

        match func.invoke(self) {
            Ok(nresults) => {
                debug_assert!(
                    self.stack.top() >= fslot + 1 + nargs + nresults,
                    "native function popped beyond its argument window"
                );
                let results = self.stack.drain_from(self.stack.top() - nresults);
                self.stack.truncate(fslot);
                self.stack.extend(results);
                Ok(nresults)
            }
            Err(e) => {
                self.stack.truncate(fslot);
                Err(e)
            }
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
