//! Loam runtime value surface
//!
//! This crate provides the data model of a Loam runtime instance:
//! - Tagged dynamic values and shared table/function handles
//! - The value stack all boundary crossings go through
//! - The registry of anchored values with sentinel-aware handles
//! - The weak proxy map deduplicating native-object identity
//! - The `Runtime` context object tying the above to one instance lifecycle
//!
//! The interpreter that would execute script source is an external
//! collaborator; this crate only models the surface it and the marshaling
//! layer (`loam-sdk`) operate on.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod proxy;
pub mod registry;
pub mod runtime;
pub mod stack;
pub mod table;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use proxy::{ObjectKey, ProxyCache};
pub use registry::{Anchor, ExpiryQueue, Registry};
pub use runtime::Runtime;
pub use stack::ValueStack;
pub use table::{Table, TableKey};
pub use value::{FuncRef, NativeFn, TableRef, Value, WeakTableRef};
