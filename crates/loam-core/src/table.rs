//! Tables — the runtime's only aggregate shape
//!
//! A table is a hybrid of a contiguous array part (integer keys `1..=N`)
//! and a hash part for everything else. Sequence writes at the border grow
//! the array part and migrate any queued hash entries; float keys with an
//! integral value normalize to integer keys so `t[2.0]` and `t[2]` name the
//! same slot. Nil and NaN can never be keys — such writes are dropped,
//! matching the runtime-wide degrade-to-default policy.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::{TableRef, Value};

/// A normalized table key.
///
/// `Num` holds the bit pattern of a non-integral, non-NaN float; integral
/// floats are folded into `Int` at construction so they hash alike.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// Boolean key
    Bool(bool),

    /// Integer key (also normalized integral floats)
    Int(i64),

    /// Non-integral float key, stored by bit pattern
    Num(u64),

    /// String key
    Str(Rc<str>),
}

impl TableKey {
    /// String key, copying the bytes
    pub fn str(s: &str) -> TableKey {
        TableKey::Str(Rc::from(s))
    }

    /// Float key with normalization. NaN has no key form.
    pub fn num(n: f64) -> Option<TableKey> {
        if n.is_nan() {
            return None;
        }
        if n.fract() == 0.0 && n.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(&n) {
            Some(TableKey::Int(n as i64))
        } else {
            Some(TableKey::Num(n.to_bits()))
        }
    }

    /// Derive a key from a value. Nil, NaN, and reference shapes (tables,
    /// functions, pointers) have no key form here and yield `None`.
    pub fn from_value(value: &Value) -> Option<TableKey> {
        match value {
            Value::Bool(b) => Some(TableKey::Bool(*b)),
            Value::Int(i) => Some(TableKey::Int(*i)),
            Value::Num(n) => TableKey::num(*n),
            Value::Str(s) => Some(TableKey::Str(Rc::clone(s))),
            _ => None,
        }
    }

    /// Rebuild the value form of this key
    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Bool(b) => Value::Bool(*b),
            TableKey::Int(i) => Value::Int(*i),
            TableKey::Num(bits) => Value::Num(f64::from_bits(*bits)),
            TableKey::Str(s) => Value::Str(Rc::clone(s)),
        }
    }
}

/// Array-plus-hash table storage.
pub struct Table {
    /// Contiguous sequence part, keys `1..=arr.len()`
    arr: Vec<Value>,

    /// Everything else
    hash: FxHashMap<TableKey, Value>,

    /// Optional metatable
    meta: Option<TableRef>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            arr: Vec::new(),
            hash: FxHashMap::default(),
            meta: None,
        }
    }

    /// Get by key; absent entries read as nil.
    pub fn get(&self, key: &TableKey) -> Value {
        if let TableKey::Int(i) = key {
            if *i >= 1 && (*i as usize) <= self.arr.len() {
                return self.arr[*i as usize - 1].clone();
            }
        }
        self.hash.get(key).cloned().unwrap_or(Value::Nil)
    }

    /// Set by key. Nil values remove the entry; writes at the array border
    /// grow the array part and pull in any now-contiguous hash entries.
    pub fn set(&mut self, key: TableKey, value: Value) {
        if let TableKey::Int(i) = key {
            if i >= 1 {
                let idx = i as usize;
                if idx <= self.arr.len() {
                    self.arr[idx - 1] = value;
                    if idx == self.arr.len() {
                        self.trim_border();
                    }
                    return;
                }
                if idx == self.arr.len() + 1 {
                    if value.is_nil() {
                        return;
                    }
                    self.arr.push(value);
                    self.migrate_from_hash();
                    return;
                }
            }
        }
        if value.is_nil() {
            self.hash.remove(&key);
        } else {
            self.hash.insert(key, value);
        }
    }

    /// Border length of the array part
    #[inline]
    pub fn len(&self) -> usize {
        self.arr.len()
    }

    /// True when both parts are empty
    pub fn is_empty(&self) -> bool {
        self.arr.iter().all(Value::is_nil) && self.hash.is_empty()
    }

    /// Snapshot all live entries: array part in order, then hash part in
    /// unspecified order.
    pub fn entries(&self) -> Vec<(TableKey, Value)> {
        let mut out = Vec::with_capacity(self.arr.len() + self.hash.len());
        for (i, v) in self.arr.iter().enumerate() {
            if !v.is_nil() {
                out.push((TableKey::Int(i as i64 + 1), v.clone()));
            }
        }
        for (k, v) in &self.hash {
            out.push((k.clone(), v.clone()));
        }
        out
    }

    /// The table's metatable, if any
    pub fn metatable(&self) -> Option<TableRef> {
        self.meta.clone()
    }

    /// Install or clear the metatable
    pub fn set_metatable(&mut self, meta: Option<TableRef>) {
        self.meta = meta;
    }

    // Writes of nil at the border shrink the array part back to the last
    // non-nil slot.
    fn trim_border(&mut self) {
        while matches!(self.arr.last(), Some(Value::Nil)) {
            self.arr.pop();
        }
    }

    // After the border grows, adjacent integer keys parked in the hash part
    // become part of the sequence.
    fn migrate_from_hash(&mut self) {
        loop {
            let next = TableKey::Int(self.arr.len() as i64 + 1);
            match self.hash.remove(&next) {
                Some(v) => self.arr.push(v),
                None => break,
            }
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
