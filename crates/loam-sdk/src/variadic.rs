//! Variadic marshaling — N native values to/from N stack slots
//!
//! Tuples pack left-to-right for calls and unpack positionally for
//! multi-value returns. Pulling computes the negative base offset from the
//! tuple arity: element `i` of an arity-`N` tuple reads slot `i − N`, so
//! the caller must leave exactly its result window on top of the stack.
//! Reading before slot 1 is a caller contract violation and asserts — the
//! call boundary guards the window, not this component.

use loam_core::Runtime;

use crate::convert::{FromScript, ToScript};
use crate::reference::ScriptRef;

/// Pack a native argument list onto the stack.
pub trait PushValues {
    /// Push every value left-to-right; returns the total slot count, each
    /// argument occupying exactly the slots its own converter defines.
    fn push_values(self, rt: &mut Runtime) -> usize;
}

/// Unpack a fixed-arity tuple of native out-values from the top of the
/// stack.
pub trait PullValues: Sized {
    /// Number of stack slots this tuple reads
    const ARITY: usize;

    /// Pull each element positionally from the result window.
    ///
    /// # Panics
    ///
    /// Asserts if fewer than `ARITY` slots are live — an out-of-window
    /// read is a programming error, not a recoverable condition.
    fn pull_values(rt: &mut Runtime) -> Self;
}

impl PushValues for () {
    fn push_values(self, _rt: &mut Runtime) -> usize {
        0
    }
}

impl PullValues for () {
    const ARITY: usize = 0;

    fn pull_values(_rt: &mut Runtime) -> Self {}
}

macro_rules! impl_tuple_values {
    ($len:expr => $($t:ident : $i:tt),+) => {
        impl<$($t: ToScript),+> PushValues for ($($t,)+) {
            fn push_values(self, rt: &mut Runtime) -> usize {
                let mut slots = 0;
                $( slots += self.$i.push(rt); )+
                slots
            }
        }

        impl<$($t: FromScript),+> PullValues for ($($t,)+) {
            const ARITY: usize = $len;

            fn pull_values(rt: &mut Runtime) -> Self {
                assert!(
                    rt.top() >= $len,
                    "variadic pull underflows the stack window"
                );
                ( $( $t::pull(rt, $i as isize - $len as isize), )+ )
            }
        }
    };
}

impl_tuple_values!(1 => A:0);
impl_tuple_values!(2 => A:0, B:1);
impl_tuple_values!(3 => A:0, B:1, C:2);
impl_tuple_values!(4 => A:0, B:1, C:2, D:3);
impl_tuple_values!(5 => A:0, B:1, C:2, D:3, E:4);
impl_tuple_values!(6 => A:0, B:1, C:2, D:3, E:4, F:5);
impl_tuple_values!(7 => A:0, B:1, C:2, D:3, E:4, F:5, G:6);
impl_tuple_values!(8 => A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7);

/// Result list of anchored values forwarded variadically: pushing re-pushes
/// every anchored value in order, and the slot count is the list length.
pub struct VariadicResults(Vec<ScriptRef>);

impl VariadicResults {
    /// Empty result list
    pub fn new() -> Self {
        VariadicResults(Vec::new())
    }

    /// Append an anchored result
    pub fn push_ref(&mut self, r: ScriptRef) {
        self.0.push(r);
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no results
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for VariadicResults {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<ScriptRef>> for VariadicResults {
    fn from(refs: Vec<ScriptRef>) -> Self {
        VariadicResults(refs)
    }
}

impl ToScript for VariadicResults {
    fn push(self, rt: &mut Runtime) -> usize {
        let count = self.0.len();
        for r in &self.0 {
            r.push_stack(rt);
        }
        count
    }
}

impl PushValues for VariadicResults {
    fn push_values(self, rt: &mut Runtime) -> usize {
        self.push(rt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::Value;

    #[test]
    fn test_push_values_order_and_count() {
        let mut rt = Runtime::new();
        let n = (1i64, "two", 3.0f64).push_values(&mut rt);

        assert_eq!(n, 3);
        assert_eq!(rt.value_at(1), Value::Int(1));
        assert_eq!(rt.value_at(2), Value::str("two"));
        assert_eq!(rt.value_at(3), Value::Num(3.0));
    }

    #[test]
    fn test_pull_values_window() {
        let mut rt = Runtime::new();
        rt.push(Value::str("ignored"));
        rt.push(Value::Int(10));
        rt.push(Value::Int(20));

        // arity 2 reads slots -2 and -1, leaving lower slots alone
        let (a, b): (i64, i64) = PullValues::pull_values(&mut rt);
        assert_eq!((a, b), (10, 20));
        assert_eq!(rt.top(), 3); // pulls never pop
    }

    #[test]
    fn test_unit_round_trip() {
        let mut rt = Runtime::new();
        assert_eq!(().push_values(&mut rt), 0);
        <() as PullValues>::pull_values(&mut rt);
        assert_eq!(rt.top(), 0);
    }

    #[test]
    fn test_mixed_tuple_pull() {
        let mut rt = Runtime::new();
        (true, 7i64, "x".to_string()).push_values(&mut rt);

        let (b, i, s): (bool, i64, String) = PullValues::pull_values(&mut rt);
        assert!(b);
        assert_eq!(i, 7);
        assert_eq!(s, "x");
    }

    #[test]
    #[should_panic(expected = "underflows the stack window")]
    fn test_window_underflow_asserts() {
        let mut rt = Runtime::new();
        rt.push(Value::Int(1));
        // arity 2 against a single live slot
        let _: (i64, i64) = PullValues::pull_values(&mut rt);
    }

    #[test]
    fn test_variadic_results_forwarding() {
        let mut rt = Runtime::new();

        rt.push(Value::Int(1));
        let a = ScriptRef::from_stack(&mut rt);
        rt.push(Value::Int(2));
        let b = ScriptRef::from_stack(&mut rt);

        let results = VariadicResults::from(vec![a, b]);
        assert_eq!(results.len(), 2);
        let n = results.push_values(&mut rt);

        assert_eq!(n, 2);
        assert_eq!(rt.value_at(-2), Value::Int(1));
        assert_eq!(rt.value_at(-1), Value::Int(2));
    }
}
