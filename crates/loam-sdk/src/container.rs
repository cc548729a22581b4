//! Container round-tripping — sequences and mappings to/from tables
//!
//! Every crossing materializes a fresh table or a fresh native container;
//! containers have no identity on the other side and are never cached.
//! Elements convert one at a time through the primitive converter, staged
//! on the stack so that converter contracts (including object attachment)
//! apply uniformly; every helper restores the stack depth it found.
//!
//! Table-to-native conversions iterate a snapshot of the table: array part
//! first in `1..=N` order, then the hash part in unspecified order —
//! callers must not depend on hash ordering. Non-table inputs yield empty
//! containers, never errors.

use std::collections::HashMap;
use std::hash::Hash;

use loam_core::{Runtime, TableKey, TableRef, Value};

use crate::convert::{FromScript, ToScript};

/// Mirror a native sequence into a fresh table (consecutive 1-based
/// integer keys, iteration order) and push it. Returns the slot count
/// (always 1).
pub fn push_sequence<I>(rt: &mut Runtime, items: I) -> usize
where
    I: IntoIterator,
    I::Item: ToScript,
{
    let table = TableRef::new();
    let mut index = 1i64;
    for item in items {
        rt.scoped(|rt| {
            item.push(rt);
            table.set(TableKey::Int(index), rt.value_at(-1));
        });
        index += 1;
    }
    rt.push(Value::Table(table));
    1
}

/// Mirror a native mapping into a fresh table and push it. Entries whose
/// key has no table-key form (nil, NaN) are dropped silently. Returns the
/// slot count (always 1).
pub fn push_mapping<I, K, V>(rt: &mut Runtime, entries: I) -> usize
where
    I: IntoIterator<Item = (K, V)>,
    K: ToScript,
    V: ToScript,
{
    let table = TableRef::new();
    for (key, value) in entries {
        rt.scoped(|rt| {
            key.push(rt);
            value.push(rt);
            if let Some(k) = TableKey::from_value(&rt.value_at(-2)) {
                table.set(k, rt.value_at(-1));
            }
        });
    }
    rt.push(Value::Table(table));
    1
}

/// Convert the table at `idx` into a native sequence, pulling every value
/// in snapshot order. A non-table slot yields an empty vector. Stack depth
/// is restored on every exit path.
pub fn pull_sequence<T: FromScript>(rt: &mut Runtime, idx: isize) -> Vec<T> {
    let table = match rt.value_at(idx).as_table() {
        Some(t) => t.clone(),
        None => return Vec::new(),
    };
    let entries = table.entries();
    let mut out = Vec::with_capacity(entries.len());
    rt.scoped(|rt| {
        for (_key, value) in entries {
            rt.push(value);
            Vec::push(&mut out, T::pull(rt, -1));
            rt.pop(1);
        }
    });
    out
}

/// Convert the table at `idx` into a native mapping, pulling every key and
/// value. Duplicate pulled keys resolve last-write-wins. A non-table slot
/// yields an empty map.
pub fn pull_mapping<K, V>(rt: &mut Runtime, idx: isize) -> HashMap<K, V>
where
    K: FromScript + Eq + Hash,
    V: FromScript,
{
    let table = match rt.value_at(idx).as_table() {
        Some(t) => t.clone(),
        None => return HashMap::new(),
    };
    let entries = table.entries();
    let mut out = HashMap::with_capacity(entries.len());
    rt.scoped(|rt| {
        for (key, value) in entries {
            rt.push(key.to_value());
            rt.push(value);
            let k = K::pull(rt, -2);
            let v = V::pull(rt, -1);
            rt.pop(2);
            out.insert(k, v);
        }
    });
    out
}

impl<T: ToScript> ToScript for Vec<T> {
    fn push(self, rt: &mut Runtime) -> usize {
        push_sequence(rt, self)
    }
}

impl<T: FromScript> FromScript for Vec<T> {
    fn pull(rt: &mut Runtime, idx: isize) -> Self {
        pull_sequence(rt, idx)
    }
}

impl<K: ToScript + Eq + Hash, V: ToScript> ToScript for HashMap<K, V> {
    fn push(self, rt: &mut Runtime) -> usize {
        push_mapping(rt, self)
    }
}

impl<K, V> FromScript for HashMap<K, V>
where
    K: FromScript + Eq + Hash,
    V: FromScript,
{
    fn pull(rt: &mut Runtime, idx: isize) -> Self {
        pull_mapping(rt, idx)
    }
}
