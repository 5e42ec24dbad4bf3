use alloc::vec::Vec;

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::value::{Array, Object, Value};

/// Composite values already entered during one serialization call.
///
/// Identities are allocation addresses, so every entered handle is retained
/// until the tracker is dropped: an accessor that returns a fresh object on
/// each read must not see its address reused by a later value.
pub(crate) struct IdentityTracker {
    seen: HashSet<usize, FxBuildHasher>,
    retained: Vec<Value>,
}

impl IdentityTracker {
    pub(crate) fn new() -> Self {
        Self {
            seen: HashSet::default(),
            retained: Vec::new(),
        }
    }

    /// Records `array`, returning `false` if it was already entered.
    pub(crate) fn enter_array(&mut self, array: &Array) -> bool {
        self.enter(array.identity(), || Value::Array(array.clone()))
    }

    /// Records `object`, returning `false` if it was already entered.
    pub(crate) fn enter_object(&mut self, object: &Object) -> bool {
        self.enter(object.identity(), || Value::Object(object.clone()))
    }

    fn enter(&mut self, identity: usize, handle: impl FnOnce() -> Value) -> bool {
        if !self.seen.insert(identity) {
            return false;
        }
        self.retained.push(handle());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_entry_is_rejected() {
        let mut tracker = IdentityTracker::new();
        let object = Object::new();
        let array = Array::new();

        assert!(tracker.enter_object(&object));
        assert!(!tracker.enter_object(&object.clone()));
        assert!(tracker.enter_array(&array));
        assert!(!tracker.enter_array(&array));
        assert!(tracker.enter_object(&Object::new()));
    }

    #[test]
    fn test_entered_values_are_retained() {
        let mut tracker = IdentityTracker::new();
        let object = Object::new();
        assert!(tracker.enter_object(&object));
        drop(object);

        // The tracker keeps the allocation alive, so a new object can never
        // share its address.
        for _ in 0..64 {
            assert!(tracker.enter_object(&Object::new()));
        }
    }
}
