//! Object identity operations
//!
//! A native object crossing the boundary is represented by exactly one
//! proxy table per live (pointer, type) pair. The proxy carries the raw
//! pointer under a reserved field and the metatable registered for the
//! type. Identity is enforced by the runtime's weak proxy cache: attaching
//! the same pointer twice yields the same proxy object, observable from
//! the script side as table identity.
//!
//! Ownership never crosses: the cache deduplicates identity only, and
//! [`detach`] must run at or before the native object's destruction so a
//! stale script-side proxy can no longer resolve the dead pointer.

use std::ffi::c_void;

use loam_core::{ObjectKey, Runtime, TableRef, Value};

use crate::convert::{FromScript, ToScript};

/// Reserved field holding the raw native pointer on proxy tables.
/// Never collides with user-visible fields.
pub const PROXY_POINTER_FIELD: &str = "__pointer";

/// A native type that can cross the boundary as an object pointer.
///
/// `CLASS_NAME` keys both the identity cache and the metatable registry;
/// it must be stable and unique per bound type. The metatable itself is
/// registered by the external type-binding subsystem via
/// [`Runtime::register_metatable`].
pub trait ScriptBound {
    /// Stable metatable name for this native type
    const CLASS_NAME: &'static str;
}

/// Push the canonical proxy for `ptr`, creating and caching it on first
/// sight. A null pointer pushes nil. Returns the slot count (always 1).
pub fn attach<T: ScriptBound>(rt: &mut Runtime, ptr: *mut T) -> usize {
    if ptr.is_null() {
        rt.push(Value::Nil);
        return 1;
    }

    let key = ObjectKey::new(T::CLASS_NAME, ptr as usize);
    if let Some(proxy) = rt.proxies().get(&key) {
        log::trace!("attach hit {:?}", key);
        rt.push(Value::Table(proxy));
        return 1;
    }

    let proxy = TableRef::new();
    proxy.set_field(PROXY_POINTER_FIELD, Value::LightPtr(ptr as *mut c_void));
    if let Some(meta) = rt.metatable(T::CLASS_NAME) {
        proxy.set_metatable(Some(meta));
    }
    rt.proxies_mut().insert(key, &proxy);
    log::trace!("attach new {:?}", key);
    rt.push(Value::Table(proxy));
    1
}

/// Disconnect `ptr` from its proxy: the proxy's pointer field is cleared
/// (stale script-side references resolve to null from now on) and the
/// cache entry is removed. Idempotent; null pointers are ignored.
pub fn detach<T: ScriptBound>(rt: &mut Runtime, ptr: *mut T) {
    if ptr.is_null() {
        return;
    }

    let key = ObjectKey::new(T::CLASS_NAME, ptr as usize);
    if let Some(proxy) = rt.proxies_mut().remove(&key) {
        proxy.set_field(PROXY_POINTER_FIELD, Value::Nil);
        log::trace!("detach {:?}", key);
    }
}

/// Read the native pointer out of a value believed to be a proxy.
///
/// Any non-table shape, and any proxy whose pointer was cleared by
/// [`detach`], yields a null pointer — never an error.
pub fn resolve<T: ScriptBound>(value: &Value) -> *mut T {
    match value.as_table() {
        Some(table) => match table.get_field(PROXY_POINTER_FIELD).as_light_ptr() {
            Some(ptr) => ptr as *mut T,
            None => std::ptr::null_mut(),
        },
        None => std::ptr::null_mut(),
    }
}

/// Resolve the proxy at a stack slot
pub fn pull_object<T: ScriptBound>(rt: &Runtime, idx: isize) -> *mut T {
    resolve(&rt.value_at(idx))
}

impl<T: ScriptBound> ToScript for *mut T {
    fn push(self, rt: &mut Runtime) -> usize {
        attach(rt, self)
    }
}

impl<T: ScriptBound> FromScript for *mut T {
    fn pull(rt: &mut Runtime, idx: isize) -> Self {
        pull_object(rt, idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl ScriptBound for Widget {
        const CLASS_NAME: &'static str = "Widget";
    }

    struct Gadget;

    impl ScriptBound for Gadget {
        const CLASS_NAME: &'static str = "Gadget";
    }

    fn fake_ptr<T>(addr: usize) -> *mut T {
        addr as *mut T
    }

    #[test]
    fn test_attach_identity() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x1000);

        attach(&mut rt, w);
        attach(&mut rt, w);

        let a = rt.value_at(-2);
        let b = rt.value_at(-1);
        match (a.as_table(), b.as_table()) {
            (Some(ta), Some(tb)) => assert!(ta.ptr_eq(tb)),
            _ => panic!("expected proxies"),
        }
        assert_eq!(rt.proxies().len(), 1);
    }

    #[test]
    fn test_attach_null_pushes_nil() {
        let mut rt = Runtime::new();
        let null: *mut Widget = std::ptr::null_mut();

        assert_eq!(attach(&mut rt, null), 1);
        assert!(rt.value_at(-1).is_nil());
        assert!(rt.proxies().is_empty());
    }

    #[test]
    fn test_types_get_distinct_proxies() {
        let mut rt = Runtime::new();
        // same address, different bound types
        attach(&mut rt, fake_ptr::<Widget>(0x1000));
        attach(&mut rt, fake_ptr::<Gadget>(0x1000));

        let a = rt.value_at(-2);
        let b = rt.value_at(-1);
        assert!(!a.as_table().unwrap().ptr_eq(b.as_table().unwrap()));
        assert_eq!(rt.proxies().len(), 2);
    }

    #[test]
    fn test_resolve() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x1000);
        attach(&mut rt, w);

        let proxy = rt.value_at(-1);
        assert_eq!(resolve::<Widget>(&proxy), w);

        // non-table shapes resolve to null
        assert!(resolve::<Widget>(&Value::Int(3)).is_null());
        assert!(resolve::<Widget>(&Value::Nil).is_null());
    }

    #[test]
    fn test_detach_clears_stale_proxy() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x1000);
        attach(&mut rt, w);
        let proxy = rt.value_at(-1);

        detach(&mut rt, w);

        // the held proxy can no longer resolve the pointer
        assert!(resolve::<Widget>(&proxy).is_null());
        assert!(rt.proxies().is_empty());
    }

    #[test]
    fn test_detach_idempotent() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x1000);

        detach(&mut rt, w); // never attached: no-op
        attach(&mut rt, w);
        detach(&mut rt, w);
        detach(&mut rt, w); // again: no-op
        detach(&mut rt, std::ptr::null_mut::<Widget>());
    }

    #[test]
    fn test_reattach_after_detach_creates_fresh_proxy() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x1000);

        attach(&mut rt, w);
        let old = rt.value_at(-1);
        detach(&mut rt, w);

        attach(&mut rt, w);
        let new = rt.value_at(-1);
        assert!(!old.as_table().unwrap().ptr_eq(new.as_table().unwrap()));
        assert_eq!(resolve::<Widget>(&new), w);
    }

    #[test]
    fn test_metatable_assignment() {
        let mut rt = Runtime::new();
        let meta = TableRef::new();
        rt.register_metatable("Widget", meta.clone());

        attach(&mut rt, fake_ptr::<Widget>(0x3000));
        let proxy = rt.value_at(-1);
        assert!(proxy
            .as_table()
            .unwrap()
            .metatable()
            .unwrap()
            .ptr_eq(&meta));

        // unregistered types still get a proxy, just without a metatable
        attach(&mut rt, fake_ptr::<Gadget>(0x3000));
        assert!(rt.value_at(-1).as_table().unwrap().metatable().is_none());
    }

    #[test]
    fn test_weak_reclamation_then_fresh_attach() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x4000);

        attach(&mut rt, w);
        rt.pop(1); // script side drops its only reference

        assert_eq!(rt.proxies_mut().reclaim(), 1);

        attach(&mut rt, w);
        assert_eq!(resolve::<Widget>(&rt.value_at(-1)), w);
        assert_eq!(rt.proxies().len(), 1);
    }

    #[test]
    fn test_converter_integration() {
        let mut rt = Runtime::new();
        let w: *mut Widget = fake_ptr(0x5000);

        w.push(&mut rt);
        let back = <*mut Widget>::pull(&mut rt, -1);
        assert_eq!(back, w);
    }
}
