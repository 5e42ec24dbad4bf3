//! Integration tests for custom serialization handlers.
//!
//! - `test_handler_precedence`: first matching handler wins
//! - `test_unmatched_values_fall_through`: default rules apply when nothing
//!   matches
//! - `test_map_and_set_handlers`: handlers for host containers that recurse
//!   into their contents, including into each other
//! - `test_cycles_through_handlers`: identity tracking is shared with nested
//!   calls made by handlers
//! - `test_handler_failure`: a failing handler discards the whole result
//! - `test_reentrant_serialize`: a handler may start an unrelated top-level
//!   call

use std::{fmt, sync::Mutex, thread};

use diagnote::{
    Fault, Host, HostObject, Object, Recurse, SerializeHandler, SerializeOptions, UNSERIALIZABLE,
    Value, handler_fn, serialize, serialize_default,
};

struct Map(Mutex<Vec<(Value, Value)>>);

impl Map {
    fn new(entries: impl IntoIterator<Item = (Value, Value)>) -> Host {
        Host::new(Map(Mutex::new(entries.into_iter().collect())))
    }
}

impl HostObject for Map {
    fn render_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[object Map]")
    }
}

struct Set(Vec<Value>);

impl HostObject for Set {
    fn render_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[object Set]")
    }
}

fn render_map(value: &Value, recurse: &mut Recurse<'_, '_>, depth: u32) -> Result<String, Fault> {
    let Value::Host(host) = value else {
        return Err(Fault::handler("not a map"));
    };
    let map = host
        .downcast_ref::<Map>()
        .ok_or_else(|| Fault::handler("not a map"))?;
    if depth == 0 {
        return Ok(String::from("[Map]"));
    }
    let entries = map.0.lock().map_err(|_| Fault::handler("map poisoned"))?.clone();
    let mut rendered = Vec::new();
    for (key, value) in &entries {
        rendered.push(format!(
            "[{},{}]",
            recurse.serialize(key, depth - 1)?,
            recurse.serialize(value, depth - 1)?
        ));
    }
    Ok(format!("[Map[{}]]", rendered.join(",")))
}

fn map_options() -> SerializeOptions {
    SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Host(host) if host.is::<Map>()),
        render_map,
    ))
}

fn set_handler() -> impl SerializeHandler {
    handler_fn(
        |value| matches!(value, Value::Host(host) if host.is::<Set>()),
        |value, recurse, depth| {
            let Value::Host(host) = value else {
                return Err(Fault::handler("not a set"));
            };
            let set = host
                .downcast_ref::<Set>()
                .ok_or_else(|| Fault::handler("not a set"))?;
            if depth == 0 {
                return Ok(String::from("[Set]"));
            }
            let items = set
                .0
                .iter()
                .map(|item| recurse.serialize(item, depth - 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[Set[{}]]", items.join(",")))
        },
    )
}

#[test]
fn test_handler_precedence() {
    let handler = |name: &'static str, matches: bool| {
        handler_fn(move |_| matches, move |_, _, _| Ok(String::from(name)))
    };
    let options = SerializeOptions::new()
        .handler(handler("handler1", false))
        .handler(handler("handler2", true))
        .handler(handler("handler3", false));
    assert_eq!(serialize(&Value::text("something"), &options), "handler2");

    let text_handler = |tag: &'static str| {
        handler_fn(
            |value| matches!(value, Value::Text(_)),
            move |value, _, _| match value {
                Value::Text(text) => Ok(format!("[{tag}:{text}]")),
                _ => Err(Fault::handler("expected text")),
            },
        )
    };
    let one_first = SerializeOptions::new()
        .handler(text_handler("Handler1"))
        .handler(text_handler("Handler2"));
    let two_first = SerializeOptions::new()
        .handler(text_handler("Handler2"))
        .handler(text_handler("Handler1"));
    assert_eq!(serialize(&Value::text("test"), &one_first), "[Handler1:test]");
    assert_eq!(serialize(&Value::text("test"), &two_first), "[Handler2:test]");
}

#[test]
fn test_unmatched_values_fall_through() {
    let options = SerializeOptions::new().handler(handler_fn(
        |_| false,
        |_, _, _| Ok(String::from("handler1")),
    ));
    assert_eq!(serialize(&Value::from(42), &options), "42");
}

#[test]
fn test_handlers_also_see_object_keys() {
    let options = SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Text(_)),
        |value, recurse, _| match value {
            Value::Text(text) => Ok(recurse.quote(&text.to_uppercase())),
            _ => Err(Fault::handler("expected text")),
        },
    ));
    assert_eq!(
        serialize(&Value::object([("key", "value")]), &options),
        r#"{"KEY":"VALUE"}"#
    );
}

#[test]
fn test_handlers_override_default_rules_for_composites() {
    let options = SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Array(array) if array.len() > 2),
        |value, _, _| match value {
            Value::Array(array) => Ok(format!("[Array({})]", array.len())),
            _ => Err(Fault::handler("expected array")),
        },
    ));
    let value = Value::array([Value::array([1, 2, 3, 4]), Value::array([5])]);
    assert_eq!(serialize(&value, &options), "[[Array(4)],[5]]");
}

#[test]
fn test_map_and_set_handlers() {
    let map = Map::new([
        (Value::text("name"), Value::text("diagnote")),
        (Value::text("version"), Value::text("2.0")),
        (
            Value::text("features"),
            Value::array(["error-tracking", "telemetry"]),
        ),
    ]);
    let value = Value::from(map);

    assert_eq!(serialize_default(&value), "[object Map]");
    assert_eq!(
        serialize(&value, &map_options()),
        r#"[Map[["name","diagnote"],["version","2.0"],["features",["error-tracking","telemetry"]]]]"#
    );
    assert_eq!(
        serialize(&value, &map_options().depth(1)),
        r#"[Map[["name","diagnote"],["version","2.0"],["features",[Array]]]]"#
    );

    let set = Value::from(Host::new(Set(vec![
        Value::text("red"),
        Value::from(map_value_with_config()),
    ])));
    let both = map_options().handler(set_handler());
    assert_eq!(
        serialize(&set, &both),
        r#"[Set["red",[Map[["debug",true]]]]]"#
    );
    assert_eq!(serialize(&set, &both.clone().depth(1)), r#"[Set["red",[Map]]]"#);
}

fn map_value_with_config() -> Host {
    Map::new([(Value::text("debug"), Value::from(true))])
}

#[test]
fn test_cycles_through_handlers() {
    let map = Map::new([]);
    let object = Object::new();
    object.set("map", map.clone());
    if let Some(inner) = map.downcast_ref::<Map>() {
        inner
            .0
            .lock()
            .unwrap()
            .push((Value::text("owner"), Value::from(object.clone())));
    }

    assert_eq!(
        serialize(&Value::from(object), &map_options().depth(u32::MAX)),
        r#"{"map":[Map[["owner",{Object}]]]}"#
    );
}

#[test]
fn test_handler_failure() {
    let options = SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Promise),
        |_, _, _| Err(Fault::handler("promises are not supported")),
    ));
    let value = Value::array([Value::text("before"), Value::Promise, Value::text("after")]);
    assert_eq!(serialize(&value, &options), UNSERIALIZABLE);
    assert_eq!(serialize(&value, &SerializeOptions::new()), r#"["before",[Promise],"after"]"#);
}

#[test]
fn test_reentrant_serialize() {
    let options = SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Object(object) if object.has_own("nested")),
        |value, recurse, depth| {
            let Value::Object(object) = value else {
                return Err(Fault::handler("expected object"));
            };
            // An independent top-level call has its own tracker.
            let independent = serialize_default(&object.get("nested")?);
            let threaded = recurse.serialize(&object.get("nested")?, depth)?;
            Ok(format!("{independent}|{threaded}"))
        },
    ));
    let shared = Value::array([1]);
    let holder = Value::object([("nested", shared.clone())]);
    let value = Value::array([shared, holder]);
    assert_eq!(serialize(&value, &options), "[[1],[1]|[Array]]");
}

#[test]
fn test_concurrent_calls_do_not_interfere() {
    let shared = Value::array([Value::text("x")]);
    let value = Value::array([shared.clone(), shared]);
    let options = map_options();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| serialize(&value, &options)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), r#"[["x"],[Array]]"#);
        }
    });
}

#[cfg(feature = "std")]
#[test]
fn test_panicking_handler_is_contained() {
    let options = SerializeOptions::new().handler(handler_fn(
        |value| matches!(value, Value::Null),
        |_, _, _| panic!("handler bug"),
    ));
    assert_eq!(serialize(&Value::array([Value::Null]), &options), UNSERIALIZABLE);
}
