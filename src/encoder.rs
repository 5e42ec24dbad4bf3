//! The recursive walk.

use alloc::string::String;

use triomphe::Arc;

use crate::{
    UNSERIALIZABLE,
    classify::{error_shape, render_error, render_scalar},
    escape::quote,
    fault::Fault,
    handlers::SerializeHandler,
    options::SerializeOptions,
    tracker::IdentityTracker,
    value::{Array, Object, Value},
};

const ARRAY_PLACEHOLDER: &str = "[Array]";
const OBJECT_PLACEHOLDER: &str = "{Object}";

/// Serializes `value` into diagnostic text.
///
/// Never fails: if rendering any part of the value faults, the result is
/// [`UNSERIALIZABLE`] and everything rendered so far is discarded. With the
/// `std` feature a panic inside a handler or accessor is caught the same
/// way.
///
/// ```
/// use diagnote::{SerializeOptions, Value, serialize};
///
/// let value = Value::object([("a", Value::object([("b", 1)]))]);
/// assert_eq!(serialize(&value, &SerializeOptions::new()), r#"{"a":{"b":1}}"#);
/// assert_eq!(serialize(&value, &SerializeOptions::new().depth(1)), r#"{"a":{Object}}"#);
/// ```
#[must_use]
pub fn serialize(value: &Value, options: &SerializeOptions) -> String {
    let mut encoder = Encoder::new(&options.handlers);
    guarded(|| encoder.encode(value, options.depth)).unwrap_or_else(|_| String::from(UNSERIALIZABLE))
}

/// Serializes `value` with the default options: depth 3 and no handlers.
///
/// ```
/// use diagnote::{Value, serialize_default};
///
/// assert_eq!(serialize_default(&Value::array([1, 2, 3])), "[1,2,3]");
/// ```
#[must_use]
pub fn serialize_default(value: &Value) -> String {
    serialize(value, &SerializeOptions::default())
}

#[cfg(feature = "std")]
fn guarded(walk: impl FnOnce() -> Result<String, Fault>) -> Result<String, Fault> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(walk)).unwrap_or(Err(Fault::Panicked))
}

#[cfg(not(feature = "std"))]
fn guarded(walk: impl FnOnce() -> Result<String, Fault>) -> Result<String, Fault> {
    walk()
}

pub(crate) struct Encoder<'h> {
    handlers: &'h [Arc<dyn SerializeHandler>],
    tracker: IdentityTracker,
}

impl<'h> Encoder<'h> {
    fn new(handlers: &'h [Arc<dyn SerializeHandler>]) -> Self {
        Self {
            handlers,
            tracker: IdentityTracker::new(),
        }
    }

    fn encode(&mut self, value: &Value, depth: u32) -> Result<String, Fault> {
        let handlers = self.handlers;
        if let Some(handler) = handlers.iter().find(|handler| handler.matches(value)) {
            return handler.render(value, &mut Recurse { encoder: self }, depth);
        }

        match value {
            Value::Array(array) => self.encode_array(array, depth),
            Value::Object(object) => match error_shape(object)? {
                Some(error) => Ok(render_error(&error)),
                None => self.encode_object(object, depth),
            },
            scalar => render_scalar(scalar),
        }
    }

    fn encode_array(&mut self, array: &Array, depth: u32) -> Result<String, Fault> {
        if depth == 0 || !self.tracker.enter_array(array) {
            return Ok(String::from(ARRAY_PLACEHOLDER));
        }

        let mut out = String::from("[");
        for (i, item) in array.to_vec().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&self.encode(item, depth - 1)?);
        }
        out.push(']');
        Ok(out)
    }

    fn encode_object(&mut self, object: &Object, depth: u32) -> Result<String, Fault> {
        if depth == 0 || !self.tracker.enter_object(object) {
            return Ok(String::from(OBJECT_PLACEHOLDER));
        }

        let mut out = String::from("{");
        for (i, (key, property)) in object.enumerable_properties().into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&self.encode(&Value::Text(key), depth - 1)?);
            out.push(':');
            let value = property.read(object)?;
            out.push_str(&self.encode(&value, depth - 1)?);
        }
        out.push('}');
        Ok(out)
    }
}

/// Callback handed to [`SerializeHandler::render`] for serializing nested
/// values within the same call.
pub struct Recurse<'a, 'h> {
    encoder: &'a mut Encoder<'h>,
}

impl Recurse<'_, '_> {
    /// Serializes `value` with `depth` remaining, going through the full
    /// handler chain and the identity tracking of the enclosing call.
    pub fn serialize(&mut self, value: &Value, depth: u32) -> Result<String, Fault> {
        self.encoder.encode(value, depth)
    }

    /// Renders text the way the built-in rules do, quoted and escaped,
    /// without consulting handlers.
    #[must_use]
    pub fn quote(&self, text: &str) -> String {
        quote(text)
    }
}
