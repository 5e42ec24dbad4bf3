//! Serialization settings.

use alloc::{string::String, vec::Vec};
use core::fmt;

use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{encoder::serialize, handlers::SerializeHandler, value::Value};

/// Settings for one [`serialize`] call.
///
/// ```
/// use diagnote::{SerializeOptions, Value, handler_fn, serialize};
///
/// let options = SerializeOptions::new()
///     .depth(1)
///     .handler(handler_fn(|value| matches!(value, Value::Promise), |_, _, _| {
///         Ok(String::from("[Pending]"))
///     }));
/// assert_eq!(options.max_depth(), 1);
/// assert_eq!(serialize(&Value::array([Value::Promise]), &options), "[[Pending]]");
/// ```
#[derive(Clone)]
pub struct SerializeOptions {
    pub(crate) depth: u32,
    pub(crate) handlers: Vec<Arc<dyn SerializeHandler>>,
}

impl SerializeOptions {
    /// The depth budget used unless configured otherwise.
    pub const DEFAULT_DEPTH: u32 = 3;

    /// Creates options with the default depth and no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            depth: Self::DEFAULT_DEPTH,
            handlers: Vec::new(),
        }
    }

    /// Sets how many levels of arrays and objects are expanded. At depth 0
    /// even the top-level container renders as a placeholder.
    #[must_use]
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Appends a handler. Handlers registered earlier take precedence.
    #[must_use]
    pub fn handler<H: SerializeHandler>(mut self, handler: H) -> Self {
        let handler = Arc::new(handler).unsize(unsize::Coercion!(to dyn SerializeHandler));
        self.handlers.push(handler);
        self
    }

    /// Returns the depth budget.
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.depth
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("depth", &self.depth)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A reusable serializer holding its options.
///
/// This is the configuration a reporting client keeps: the handlers supplied
/// at install time, applied to every value it tracks.
///
/// ```
/// use diagnote::{Serializer, Value};
///
/// let serializer = Serializer::default();
/// assert_eq!(serializer.serialize(&Value::from(42)), "42");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Serializer {
    options: SerializeOptions,
}

impl Serializer {
    /// Creates a serializer using `options`.
    #[must_use]
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Serializes `value`. See [`serialize`].
    #[must_use]
    pub fn serialize(&self, value: &Value) -> String {
        serialize(value, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler_fn;

    #[test]
    fn test_options_send_sync() {
        static_assertions::assert_impl_all!(SerializeOptions: Send, Sync, Clone);
        static_assertions::assert_impl_all!(Serializer: Send, Sync, Clone);
    }

    #[test]
    fn test_defaults() {
        let options = SerializeOptions::default();
        assert_eq!(options.max_depth(), 3);
        assert_eq!(options.handler_count(), 0);
    }

    #[test]
    fn test_earlier_handler_wins() {
        let options = SerializeOptions::new()
            .handler(handler_fn(|_| false, |_, _, _| Ok(String::from("never"))))
            .handler(handler_fn(|_| true, |_, _, _| Ok(String::from("first"))))
            .handler(handler_fn(|_| true, |_, _, _| Ok(String::from("second"))));
        assert_eq!(options.handler_count(), 3);
        let serializer = Serializer::new(options);
        assert_eq!(serializer.serialize(&Value::Null), "first");
        assert_eq!(serializer.options().max_depth(), 3);
    }
}
