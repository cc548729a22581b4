//! Loam SDK — native marshaling for the Loam scripting runtime
//!
//! This crate is the bidirectional value-marshaling layer between
//! statically typed Rust and a Loam runtime instance:
//!
//! - [`convert`]: type-directed push/pull of scalars, strings, pointers
//! - [`object`]: canonical proxies for native objects (identity cache)
//! - [`reference`]: owning, move-only handles to script-side values
//! - [`container`]: sequence and mapping round-tripping through tables
//! - [`variadic`]: tuple pack/unpack for call and return boundaries
//! - [`call`]: typed invocation of anchored function values
//!
//! # Example
//!
//! ```ignore
//! use loam_core::Runtime;
//! use loam_sdk::{FromScript, ToScript};
//!
//! let mut rt = Runtime::new();
//! vec![1i64, 2, 3].push(&mut rt);
//! let back: Vec<i64> = Vec::pull(&mut rt, -1);
//! assert_eq!(back, vec![1, 2, 3]);
//! ```
//!
//! Failure philosophy: pulls degrade to defaults, pushes of "nothing"
//! shapes write nil, and only caller contract violations (stack-window
//! underflow, double anchor free) assert. See the individual modules.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod call;
pub mod container;
pub mod convert;
pub mod object;
pub mod reference;
pub mod variadic;

pub use loam_core::{Anchor, Runtime, RuntimeError, RuntimeResult, TableKey, TableRef, Value};

pub use call::call_function;
pub use container::{pull_mapping, pull_sequence, push_mapping, push_sequence};
pub use convert::{FromScript, ToScript};
pub use object::{attach, detach, pull_object, resolve, ScriptBound, PROXY_POINTER_FIELD};
pub use reference::ScriptRef;
pub use variadic::{PullValues, PushValues, VariadicResults};
