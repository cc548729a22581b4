//! Scoped references — owning handles to script-side values
//!
//! A `ScriptRef` anchors one arbitrary value (table, function, anything)
//! in the runtime's registry and guarantees its release. Ownership is
//! move-only: Rust moves replace the source's destructive "copy", so a
//! moved-from handle simply ceases to exist and can never double-release.
//! Genuine duplication is the explicit [`ScriptRef::duplicate`], which
//! spends a second registry slot.
//!
//! Dropping a handle cannot reach the registry mutably, so release is
//! deferred through the shared expiry queue; the registry frees the slot
//! on its next sweep or mutating operation.

use std::collections::HashMap;
use std::hash::Hash;

use loam_core::{Anchor, ExpiryQueue, Runtime, Value};

use crate::container;
use crate::convert::{FromScript, ToScript};

/// Owning handle to an anchored script-side value.
///
/// Move-only by design; see the module docs.
pub struct ScriptRef {
    anchor: Anchor,
    queue: ExpiryQueue,
}

impl std::fmt::Debug for ScriptRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScriptRef({:?})", self.anchor)
    }
}

impl ScriptRef {
    /// Consume the top-of-stack value and anchor it.
    ///
    /// Anchoring nil (or an empty stack) yields a handle in the nil
    /// sentinel state — valid, releasable-for-free.
    pub fn from_stack(rt: &mut Runtime) -> Self {
        let queue = rt.registry().expiry_queue();
        let anchor = rt.anchor_from_stack();
        Self { anchor, queue }
    }

    /// Anchor a copy of the value at `idx` without consuming it
    pub fn from_slot(rt: &mut Runtime, idx: isize) -> Self {
        let value = rt.value_at(idx);
        rt.push(value);
        Self::from_stack(rt)
    }

    /// The underlying anchor handle
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// True when the handle owns a registry slot (not a sentinel state)
    pub fn holds_value(&self) -> bool {
        !self.anchor.is_sentinel()
    }

    /// Re-push the anchored value. May be called any number of times and
    /// never consumes the anchor.
    pub fn push_stack(&self, rt: &mut Runtime) {
        debug_assert!(
            self.queue.same_registry(&rt.registry().expiry_queue()),
            "reference used with a runtime it does not belong to"
        );
        rt.push_anchor(self.anchor);
    }

    /// Read the anchored value without touching the stack
    pub fn value(&self, rt: &Runtime) -> Value {
        rt.registry().fetch(self.anchor)
    }

    /// Anchor the same value under a second, independently owned slot.
    /// This is the explicit duplication operation — there is no implicit
    /// copy.
    pub fn duplicate(&self, rt: &mut Runtime) -> ScriptRef {
        let value = rt.registry().fetch(self.anchor);
        let anchor = rt.registry_mut().anchor(value);
        ScriptRef {
            anchor,
            queue: self.queue.clone(),
        }
    }

    /// Release the anchor eagerly instead of waiting for the next registry
    /// sweep. Sentinel states release for free.
    pub fn release(mut self, rt: &mut Runtime) {
        let anchor = std::mem::replace(&mut self.anchor, Anchor::Empty);
        rt.registry_mut().release(anchor);
        // Drop now sees the empty sentinel and enqueues nothing
    }

    /// Snapshot the anchored table's values into a native sequence,
    /// converting each through the primitive converter. A non-table
    /// anchored value yields an empty vector. Stack depth is restored on
    /// every exit path.
    pub fn to_sequence<T: FromScript>(&self, rt: &mut Runtime) -> Vec<T> {
        rt.scoped(|rt| {
            self.push_stack(rt);
            container::pull_sequence(rt, -1)
        })
    }

    /// Snapshot the anchored table's entries into a native mapping.
    /// A non-table anchored value yields an empty map.
    pub fn to_associate<K, V>(&self, rt: &mut Runtime) -> HashMap<K, V>
    where
        K: FromScript + Eq + Hash,
        V: FromScript,
    {
        rt.scoped(|rt| {
            self.push_stack(rt);
            container::pull_mapping(rt, -1)
        })
    }
}

impl Drop for ScriptRef {
    fn drop(&mut self) {
        if let Anchor::Slot(slot) = self.anchor {
            self.queue.enqueue(slot);
        }
    }
}

/// Pushing a reference re-pushes its anchored value.
impl ToScript for &ScriptRef {
    fn push(self, rt: &mut Runtime) -> usize {
        self.push_stack(rt);
        1
    }
}
