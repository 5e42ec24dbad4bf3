//! The error type threaded through a serialization walk.
//!
//! A [`Fault`] never escapes [`serialize`](crate::serialize): the first fault
//! raised anywhere below the top-level call unwinds the whole walk with `?`
//! and the result is replaced by [`UNSERIALIZABLE`](crate::UNSERIALIZABLE).
//! Handler authors and property accessors return faults to signal that a
//! value cannot be rendered.

use alloc::string::{String, ToString};
use core::fmt;

/// Failure raised while rendering a value.
///
/// # Examples
///
/// ```
/// use diagnote::Fault;
///
/// let fault = Fault::property("secret", "access denied");
/// assert_eq!(fault.to_string(), "cannot read property `secret`: access denied");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum Fault {
    /// A property accessor failed.
    PropertyAccess {
        /// The key being read.
        key: String,
        /// Why the read failed.
        reason: String,
    },
    /// A date holds a timestamp that has no calendar representation.
    InvalidDate {
        /// Milliseconds since the Unix epoch.
        millis: i64,
    },
    /// A custom handler refused to render its value.
    Handler(String),
    /// A panic was caught at the serialization boundary.
    Panicked,
}

impl Fault {
    /// Creates a [`Fault::PropertyAccess`].
    pub fn property(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::PropertyAccess {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a [`Fault::Handler`].
    pub fn handler(message: impl fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropertyAccess { key, reason } => f
                .debug_struct("PropertyAccess")
                .field("key", key)
                .field("reason", reason)
                .finish(),
            Self::InvalidDate { millis } => {
                f.debug_struct("InvalidDate").field("millis", millis).finish()
            }
            Self::Handler(message) => f.debug_tuple("Handler").field(message).finish(),
            Self::Panicked => f.write_str("Panicked"),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropertyAccess { key, reason } => {
                write!(f, "cannot read property `{key}`: {reason}")
            }
            Self::InvalidDate { millis } => write!(f, "timestamp {millis}ms is out of range"),
            Self::Handler(message) => write!(f, "handler failed: {message}"),
            Self::Panicked => f.write_str("panicked while serializing"),
        }
    }
}

impl core::error::Error for Fault {}
