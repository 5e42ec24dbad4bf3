//! The dynamic value graph walked by the serializer.
//!
//! Scalars are stored inline. Arrays and objects are shared handles: cloning
//! an [`Array`] or [`Object`] clones the handle, not the contents, and two
//! handles to the same allocation are the same value for identity tracking.
//! Both can be mutated through a shared reference, which is how cyclic graphs
//! are built:
//!
//! ```
//! use diagnote::{Object, Value};
//!
//! let a = Object::new();
//! a.set("self", a.clone());
//! assert_eq!(diagnote::serialize_default(&Value::from(a)), r#"{"self":{Object}}"#);
//! ```
//!
//! Handles are reference counted, so a cyclic graph is never freed. This is
//! fine for the short-lived values captured by an error report.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{any::Any, fmt};

use hashbrown::HashSet;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{fault::Fault, lock::SharedLock};

/// A runtime value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The absent value. Renders as `undefined`.
    #[default]
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double precision number.
    Number(f64),
    /// An arbitrary precision integer.
    BigInt(BigInt),
    /// Text. Boxed text objects are represented the same way.
    Text(String),
    /// A unique token with an optional description.
    Symbol(Option<String>),
    /// A regular expression.
    Pattern(Pattern),
    /// A function, carrying its source text.
    Function(String),
    /// The global execution context.
    Global,
    /// A native error.
    Error(ErrorValue),
    /// A point in time, in milliseconds since the Unix epoch.
    Date(i64),
    /// A deferred result. Settlement state is never inspected.
    Promise,
    /// An array.
    Array(Array),
    /// A generic object.
    Object(Object),
    /// A host specific object.
    Host(Host),
}

impl Value {
    /// Creates a text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a symbol with a description.
    pub fn symbol(description: impl Into<String>) -> Self {
        Self::Symbol(Some(description.into()))
    }

    /// Creates a regular expression value.
    pub fn pattern(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::Pattern(Pattern {
            source: source.into(),
            flags: flags.into(),
        })
    }

    /// Creates a function value from its source text.
    pub fn function(source: impl Into<String>) -> Self {
        Self::Function(source.into())
    }

    /// Creates an array value from its elements.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Array(items.into_iter().collect())
    }

    /// Creates an object value from `(key, value)` pairs, in order.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(entries.into_iter().collect())
    }
}

/// Renders the value with the default options.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialize_default(self))
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )*
    };
}

number_from!(f64, f32, i8, i16, i32, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Self::BigInt(value)
    }
}

impl From<ErrorValue> for Value {
    fn from(value: ErrorValue) -> Self {
        Self::Error(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Host> for Value {
    fn from(value: Host) -> Self {
        Self::Host(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self::Date(value.timestamp_millis())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// An arbitrary precision integer, stored as normalized decimal digits.
///
/// ```
/// use diagnote::BigInt;
///
/// let big: BigInt = "-0009007199254740993".parse().unwrap();
/// assert_eq!(big.digits(), "-9007199254740993");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BigInt(String);

impl BigInt {
    /// Returns the digits, with a leading `-` for negative values.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}n", self.0)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing a [`BigInt`] from text that is not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseBigIntError;

impl fmt::Display for ParseBigIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid integer literal")
    }
}

impl core::error::Error for ParseBigIntError {}

impl core::str::FromStr for BigInt {
    type Err = ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBigIntError);
        }
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self(String::from("0")));
        }
        let mut normalized = String::with_capacity(digits.len() + 1);
        if negative {
            normalized.push('-');
        }
        normalized.push_str(digits);
        Ok(Self(normalized))
    }
}

macro_rules! bigint_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for BigInt {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

bigint_from!(i64, u64, i128, u128, isize, usize);

/// A regular expression, rendered as `/source/flags`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    /// The pattern source.
    pub source: String,
    /// The flags, such as `gi`.
    pub flags: String,
}

/// A native error: a name and a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    /// The error name, such as `RangeError`.
    pub name: String,
    /// The error message.
    pub message: String,
}

impl ErrorValue {
    /// Creates an error value.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Captures a Rust error as an `Error` with its display text as message.
    pub fn from_error(error: &(dyn core::error::Error + '_)) -> Self {
        Self::new("Error", error.to_string())
    }
}

/// The standard error text: `name: message`, dropping whichever part is
/// empty.
impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.message.is_empty()) {
            (true, _) => f.write_str(&self.message),
            (false, true) => f.write_str(&self.name),
            (false, false) => write!(f, "{}: {}", self.name, self.message),
        }
    }
}

struct ArrayData {
    items: SharedLock<Vec<Value>>,
}

/// A shared, growable array handle.
#[derive(Clone)]
pub struct Array(Arc<ArrayData>);

impl Array {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates an array of `len` holes. Holes render as `undefined`.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self::from_vec(alloc::vec![Value::Undefined; len])
    }

    /// Creates an array owning `items`.
    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(ArrayData {
            items: SharedLock::new(items),
        }))
    }

    /// Appends an element.
    pub fn push(&self, value: impl Into<Value>) {
        self.0.items.write().push(value.into());
    }

    /// Stores `value` at `index`, filling any gap with holes.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.items.write();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value.into();
    }

    /// Returns the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.read().get(index).cloned()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the elements. Composite elements are shared.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.read().clone()
    }

    /// Returns `true` if both handles point to the same array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        core::ptr::from_ref(&*self.0).addr()
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array").field("len", &self.len()).finish()
    }
}

/// Computes the value of an accessor property.
///
/// Implemented for every `Fn(&Object) -> Result<Value, Fault>`. The argument
/// is the object the property was read through, which may be an object
/// inheriting the accessor from its prototype.
pub trait Accessor: 'static + Send + Sync {
    /// Reads the property.
    fn get(&self, receiver: &Object) -> Result<Value, Fault>;
}

impl<F> Accessor for F
where
    F: Fn(&Object) -> Result<Value, Fault> + 'static + Send + Sync,
{
    fn get(&self, receiver: &Object) -> Result<Value, Fault> {
        self(receiver)
    }
}

#[derive(Clone)]
enum Slot {
    Data(Value),
    Accessor(Arc<dyn Accessor>),
}

/// A property slot of an [`Object`].
#[derive(Clone)]
pub struct Property {
    slot: Slot,
    enumerable: bool,
}

impl Property {
    /// An enumerable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data(value.into()),
            enumerable: true,
        }
    }

    /// A non-enumerable data property. It can be read but is skipped when
    /// the object is rendered.
    pub fn hidden(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data(value.into()),
            enumerable: false,
        }
    }

    /// An enumerable accessor property.
    pub fn accessor(accessor: impl Accessor) -> Self {
        let accessor = Arc::new(accessor).unsize(unsize::Coercion!(to dyn Accessor));
        Self {
            slot: Slot::Accessor(accessor),
            enumerable: true,
        }
    }

    /// Sets whether the property is enumerated.
    #[must_use]
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Returns `true` if the property is enumerated.
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    pub(crate) fn read(&self, receiver: &Object) -> Result<Value, Fault> {
        match &self.slot {
            Slot::Data(value) => Ok(value.clone()),
            Slot::Accessor(accessor) => accessor.get(receiver),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Property");
        match &self.slot {
            Slot::Data(value) => debug.field("value", value),
            Slot::Accessor(_) => debug.field("value", &format_args!("<accessor>")),
        };
        debug.field("enumerable", &self.enumerable).finish()
    }
}

type PropertyMap = IndexMap<String, Property, FxBuildHasher>;

struct ObjectData {
    properties: SharedLock<PropertyMap>,
    prototype: Option<Object>,
}

/// A shared object handle with insertion-ordered string keys.
///
/// The prototype is fixed at construction, so prototype chains are always
/// finite.
#[derive(Clone)]
pub struct Object(Arc<ObjectData>);

impl Object {
    /// Creates an empty object without a prototype.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates an empty object inheriting the properties of `prototype`.
    #[must_use]
    pub fn with_prototype(prototype: &Object) -> Self {
        Self::build(Some(prototype.clone()))
    }

    fn build(prototype: Option<Object>) -> Self {
        Self(Arc::new(ObjectData {
            properties: SharedLock::new(PropertyMap::default()),
            prototype,
        }))
    }

    /// Returns the prototype.
    #[must_use]
    pub fn prototype(&self) -> Option<&Object> {
        self.0.prototype.as_ref()
    }

    /// Sets an enumerable data property. An existing key keeps its position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.define(key, Property::data(value));
    }

    /// Defines a property. An existing key keeps its position.
    pub fn define(&self, key: impl Into<String>, property: Property) {
        self.0.properties.write().insert(key.into(), property);
    }

    /// Removes an own property, returning it.
    pub fn remove(&self, key: &str) -> Option<Property> {
        self.0.properties.write().shift_remove(key)
    }

    /// Returns `true` if the object has the own property `key`.
    #[must_use]
    pub fn has_own(&self, key: &str) -> bool {
        self.0.properties.read().contains_key(key)
    }

    /// Reads a property, following the prototype chain. Missing properties
    /// read as [`Value::Undefined`].
    pub fn get(&self, key: &str) -> Result<Value, Fault> {
        let mut current = Some(self);
        while let Some(object) = current {
            let property = object.0.properties.read().get(key).cloned();
            if let Some(property) = property {
                return property.read(self);
            }
            current = object.prototype();
        }
        Ok(Value::Undefined)
    }

    /// Returns the enumerable properties in enumeration order: own
    /// properties in insertion order, then inherited ones not shadowed by a
    /// nearer property of the same key.
    ///
    /// The result is a snapshot; no lock is held once this returns.
    #[must_use]
    pub fn enumerable_properties(&self) -> Vec<(String, Property)> {
        let mut seen = HashSet::<String, FxBuildHasher>::default();
        let mut entries = Vec::new();
        let mut current = Some(self);
        while let Some(object) = current {
            let properties = object.0.properties.read();
            for (key, property) in properties.iter() {
                if seen.insert(key.clone()) && property.enumerable {
                    entries.push((key.clone(), property.clone()));
                }
            }
            drop(properties);
            current = object.prototype();
        }
        entries
    }

    /// Returns `true` if both handles point to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        core::ptr::from_ref(&*self.0).addr()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Self::new();
        {
            let mut properties = object.0.properties.write();
            for (key, value) in iter {
                properties.insert(key.into(), Property::data(value));
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties = self.0.properties.read();
        f.debug_struct("Object")
            .field("keys", &properties.keys().collect::<Vec<_>>())
            .field("has_prototype", &self.0.prototype.is_some())
            .finish()
    }
}

/// A host specific object.
///
/// Host objects are not enumerated. Without a matching handler they render
/// through [`render_default`](HostObject::render_default); handlers recognize
/// them with [`Host::downcast_ref`].
pub trait HostObject: Any + Send + Sync {
    /// Writes the default textual form.
    fn render_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// The name shown by `Debug`.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A shared handle to a [`HostObject`].
#[derive(Clone)]
pub struct Host(Arc<dyn HostObject>);

impl Host {
    /// Wraps a host object.
    pub fn new<T: HostObject>(object: T) -> Self {
        Self(Arc::new(object).unsize(unsize::Coercion!(to dyn HostObject)))
    }

    /// Returns `true` if the wrapped object is a `T`.
    #[must_use]
    pub fn is<T: HostObject>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Returns the wrapped object if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        let object: &dyn Any = &*self.0;
        object.downcast_ref::<T>()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render_default(f)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Host").field(&self.0.type_name()).finish()
    }
}
