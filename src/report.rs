//! Turning a tracked value into the error carried by a report payload.
//!
//! Reporting clients accept anything as the thing that went wrong. Errors
//! and error-like objects keep their own name and message; every other value
//! becomes a plain `Error` whose message is the value's serialized text.

use alloc::string::String;
use core::fmt;

use crate::{
    UNSERIALIZABLE,
    classify::error_shape,
    options::Serializer,
    value::{ErrorValue, Value},
};

/// The name and message of a tracked value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedError {
    /// The error name, `Error` for values that are not errors.
    pub name: String,
    /// The error message.
    pub message: String,
}

impl From<ErrorValue> for TrackedError {
    fn from(error: ErrorValue) -> Self {
        Self {
            name: error.name,
            message: error.message,
        }
    }
}

impl fmt::Display for TrackedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error = ErrorValue::new(self.name.as_str(), self.message.as_str());
        fmt::Display::fmt(&error, f)
    }
}

impl core::error::Error for TrackedError {}

/// Returns the error carried by `value`, if it is an error or error-like.
///
/// Probing runs accessors; one that fails makes the value count as not
/// error-like.
fn as_error(value: &Value) -> Option<ErrorValue> {
    match value {
        Value::Error(error) => Some(error.clone()),
        Value::Object(object) => error_shape(object).ok().flatten(),
        _ => None,
    }
}

impl Serializer {
    /// Converts a tracked value into the error sent with a report.
    ///
    /// ```
    /// use diagnote::{ErrorValue, Serializer, Value};
    ///
    /// let serializer = Serializer::default();
    ///
    /// let error = serializer.track(&Value::Error(ErrorValue::new("TypeError", "x is undefined")));
    /// assert_eq!(error.to_string(), "TypeError: x is undefined");
    ///
    /// let error = serializer.track(&Value::object([("code", 7)]));
    /// assert_eq!(error.name, "Error");
    /// assert_eq!(error.message, r#"{"code":7}"#);
    /// ```
    #[must_use]
    pub fn track(&self, value: &Value) -> TrackedError {
        if let Some(error) = as_error(value) {
            return error.into();
        }

        let message = self.serialize(value);

        #[cfg(feature = "tracing")]
        if message == UNSERIALIZABLE {
            tracing::debug!("tracked value could not be serialized");
        } else {
            tracing::debug!(
                len = message.len(),
                "tracked value is not an error; using its serialized form as message"
            );
        }

        TrackedError {
            name: String::from("Error"),
            message,
        }
    }
}

/// Returns `true` if `message` is the fallback produced when a value could
/// not be serialized.
#[must_use]
pub fn is_unserializable(message: &str) -> bool {
    message == UNSERIALIZABLE
}
