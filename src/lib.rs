#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Bounded, cycle-safe diagnostic serialization of dynamic values.
//!
//! ## Overview
//!
//! When an error report is built from something that is not an error, the
//! report still needs a message. This crate turns an arbitrary [`Value`] into
//! a short, deterministic text meant for people reading the report:
//!
//! ```
//! use diagnote::{Array, Object, Value, serialize_default};
//!
//! let tags = Array::from_iter(["db", "timeout"]);
//! let request = Object::new();
//! request.set("id", 17);
//! request.set("tags", tags.clone());
//! request.set("retry_tags", tags);
//! request.set("parent", request.clone());
//!
//! assert_eq!(
//!     serialize_default(&Value::from(request)),
//!     r#"{"id":17,"tags":["db","timeout"],"retry_tags":[Array],"parent":{Object}}"#
//! );
//! ```
//!
//! Serialization never fails and always terminates:
//!
//! - Nesting is bounded by a depth budget ([`SerializeOptions::depth`],
//!   default 3). Containers past the budget render as `[Array]` or
//!   `{Object}`.
//! - Each array and object is expanded at most once per call. A cycle, or a
//!   second reference to something already rendered, renders as the same
//!   placeholder.
//! - If anything faults along the way, such as an accessor property that
//!   refuses to be read, the whole result is [`UNSERIALIZABLE`].
//!
//! The output looks like a structured data literal but is not one: the
//! placeholders `[Array]`, `{Object}`, `[Promise]`, `[Global]` and
//! `[Unserializable]` are not valid values in any data format, and no
//! parser should be pointed at it.
//!
//! ## Rendering Rules
//!
//! Values are dispatched in a fixed order, see [`Kind`]:
//!
//! | Value | Rendering |
//! |-------|-----------|
//! | text | `"escaped text"` |
//! | arbitrary precision integer | `9007199254740993n` |
//! | boolean, number, null | `true`, `32.12`, `NaN`, `null` |
//! | pattern | `/source/flags` |
//! | function | its source text |
//! | symbol | `Symbol(description)` |
//! | global context | `[Global]` |
//! | error or error-like object | `[Name: message]` |
//! | date | `2025-01-01T00:00:00.000Z` |
//! | promise | `[Promise]` |
//! | array | `[a,b]` |
//! | object | `{"key":value}` |
//! | anything else | its default textual form |
//!
//! ## Handlers
//!
//! [`SerializeHandler`]s registered on [`SerializeOptions`] are consulted
//! before any of the rules above; see the [`handlers`] module.
//!
//! ## Features
//!
//! - `std`: use `std::sync` locks and catch panics raised by handlers and
//!   accessors at the serialization boundary.
//! - `tracing`: emit `tracing` events from [`Serializer::track`].

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod handlers;

mod classify;
mod encoder;
mod escape;
mod fault;
mod lock;
mod options;
mod report;
mod tracker;
mod value;

pub use self::{
    classify::{Kind, classify},
    encoder::{Recurse, serialize, serialize_default},
    escape::{escape_into, escape_text},
    fault::Fault,
    handlers::{FnHandler, SerializeHandler, handler_fn},
    options::{SerializeOptions, Serializer},
    report::{TrackedError, is_unserializable},
    value::{
        Accessor, Array, BigInt, ErrorValue, Host, HostObject, Object, ParseBigIntError, Pattern,
        Property, Value,
    },
};

/// The result of a serialization that faulted.
pub const UNSERIALIZABLE: &str = "[Unserializable]";
