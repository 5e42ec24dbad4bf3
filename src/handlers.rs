//! Handlers that override how specific values are serialized.
//!
//! A handler is consulted before any built-in rule. Handlers are tried in
//! registration order and the first one whose
//! [`matches`](SerializeHandler::matches) returns `true` renders the value;
//! the built-in rules never see it.
//!
//! # Recursion
//!
//! [`render`](SerializeHandler::render) receives a [`Recurse`] callback and the
//! current depth budget. Calling [`Recurse::serialize`] re-enters the full
//! dispatch, handlers included, and shares the identity tracking of the
//! enclosing call, so cycles running through handled values still terminate.
//! A handler decides itself how much depth to spend; the convention is to pass
//! `depth - 1` and to render a placeholder once the budget reaches zero.
//!
//! # Failure
//!
//! A handler that returns an error, or a nested call that does, aborts the
//! whole serialization and the top-level result becomes
//! [`UNSERIALIZABLE`](crate::UNSERIALIZABLE). There is no per-handler
//! isolation.
//!
//! # Examples
//!
//! ```rust
//! use std::fmt;
//!
//! use diagnote::{HostObject, Host, SerializeOptions, Value, handler_fn, serialize};
//!
//! struct Url(String);
//!
//! impl HostObject for Url {
//!     fn render_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         f.write_str("[object URL]")
//!     }
//! }
//!
//! let urls = handler_fn(
//!     |value| matches!(value, Value::Host(host) if host.is::<Url>()),
//!     |value, _recurse, _depth| {
//!         let Value::Host(host) = value else { unreachable!() };
//!         let url = host.downcast_ref::<Url>().map_or("", |url| url.0.as_str());
//!         Ok(format!("[URL:{url}]"))
//!     },
//! );
//!
//! let value = Value::array([Value::Host(Host::new(Url("https://example.com".into())))]);
//! assert_eq!(serialize(&value, &SerializeOptions::new()), "[[object URL]]");
//! assert_eq!(
//!     serialize(&value, &SerializeOptions::new().handler(urls)),
//!     "[[URL:https://example.com]]"
//! );
//! ```

use alloc::string::String;
use core::fmt;

use crate::{encoder::Recurse, fault::Fault, value::Value};

/// A caller supplied rule for rendering matching values.
pub trait SerializeHandler: 'static + Send + Sync {
    /// Returns `true` if this handler renders `value`.
    fn matches(&self, value: &Value) -> bool;

    /// Renders a value for which [`matches`](SerializeHandler::matches)
    /// returned `true`.
    ///
    /// `depth` is the remaining budget at this value. Nested values should be
    /// rendered through `recurse`.
    fn render(
        &self,
        value: &Value,
        recurse: &mut Recurse<'_, '_>,
        depth: u32,
    ) -> Result<String, Fault>;
}

/// A [`SerializeHandler`] built from two closures. See [`handler_fn`].
pub struct FnHandler<M, R> {
    matches: M,
    render: R,
}

/// Builds a handler from a predicate and a renderer.
///
/// ```
/// use diagnote::{SerializeOptions, Value, handler_fn, serialize};
///
/// let shout = handler_fn(
///     |value| matches!(value, Value::Text(_)),
///     |value, _, _| match value {
///         Value::Text(text) => Ok(text.to_uppercase()),
///         _ => unreachable!(),
///     },
/// );
/// let options = SerializeOptions::new().handler(shout);
/// assert_eq!(serialize(&Value::array(["a", "b"]), &options), "[A,B]");
/// ```
pub fn handler_fn<M, R>(matches: M, render: R) -> FnHandler<M, R>
where
    M: Fn(&Value) -> bool + 'static + Send + Sync,
    R: Fn(&Value, &mut Recurse<'_, '_>, u32) -> Result<String, Fault> + 'static + Send + Sync,
{
    FnHandler { matches, render }
}

impl<M, R> SerializeHandler for FnHandler<M, R>
where
    M: Fn(&Value) -> bool + 'static + Send + Sync,
    R: Fn(&Value, &mut Recurse<'_, '_>, u32) -> Result<String, Fault> + 'static + Send + Sync,
{
    fn matches(&self, value: &Value) -> bool {
        (self.matches)(value)
    }

    fn render(
        &self,
        value: &Value,
        recurse: &mut Recurse<'_, '_>,
        depth: u32,
    ) -> Result<String, Fault> {
        (self.render)(value, recurse, depth)
    }
}

impl<M, R> fmt::Debug for FnHandler<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
