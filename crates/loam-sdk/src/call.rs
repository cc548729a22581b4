//! Call boundary — typed invocation of anchored function values
//!
//! Composes the variadic marshaler with [`Runtime::call`]: arguments pack
//! onto the stack, the function runs, missing results pad with nil so the
//! fixed-arity pull always sees its full window, and the stack comes back
//! at its pre-call depth whatever happens.

use loam_core::{Runtime, RuntimeResult, Value};

use crate::reference::ScriptRef;
use crate::variadic::{PullValues, PushValues};

/// Call the function anchored by `func` with a packed argument tuple,
/// pulling a fixed-arity result tuple.
///
/// The result window is adjusted to exactly `R::ARITY`: results beyond it
/// are discarded (the first `R::ARITY` are kept), missing results pad with
/// nil and read as the element type's default.
///
/// # Errors
///
/// `NotCallable` when the anchored value is not a function; native errors
/// propagate from the function body. The stack is restored either way.
pub fn call_function<A, R>(rt: &mut Runtime, func: &ScriptRef, args: A) -> RuntimeResult<R>
where
    A: PushValues,
    R: PullValues,
{
    rt.scoped(|rt| {
        func.push_stack(rt);
        let nargs = args.push_values(rt);
        let nresults = rt.call(nargs)?;
        if nresults > R::ARITY {
            rt.pop(nresults - R::ARITY);
        } else {
            for _ in nresults..R::ARITY {
                rt.push(Value::Nil);
            }
        }
        Ok(R::pull_values(rt))
    })
}
