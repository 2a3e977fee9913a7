//! Transport abstraction: connection, interface description, server, client,
//! and name registration (§4.A). One concrete backend ships with this crate
//! (the AT-SPI2 D-Bus backend, Linux-only); a "dummy" backend satisfies the
//! same contract without ever touching a wire.

#[cfg(target_os = "linux")]
pub mod dbus;
pub mod dummy;

use std::cell::RefCell;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::address::Address;
use crate::error::{Error, Result};
use crate::model::{AccessibilityEvent, Rect};

/// Which well-known bus to connect to (§4.A item 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    System,
    Session,
}

/// A tagged signal payload: int | string | address | rect (§4.A item 3).
#[derive(Debug, Clone)]
pub enum SignalValue {
    Int(i32),
    Text(String),
    Addr(Address),
    Rect(Rect<i32>),
    None,
}

/// Opaque handle to a session with a message broker. Failure to connect
/// yields an empty handle elsewhere in this module rather than a panic;
/// callers MUST tolerate that (§4.A item 1).
pub trait Connection: Send + Sync {
    /// The connection's unique name on the bus, if connected.
    fn unique_name(&self) -> Option<String>;
    fn is_connected(&self) -> bool;
}

/// Per-thread dispatch context: the object path the server resolved the
/// incoming call against, set by the server before invoking a handler
/// (§4.A item 3, §9 "thread-local current bridge/object path").
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    pub object_path: String,
    pub sender: Option<String>,
}

thread_local! {
    static CURRENT_DISPATCH: RefCell<Option<DispatchContext>> = const { RefCell::new(None) };
}

/// Runs `f` with `ctx` installed as the current dispatch context, matching
/// the source's thread-local "current object path" during handler dispatch.
pub fn with_dispatch_context<R>(ctx: DispatchContext, f: impl FnOnce() -> R) -> R {
    CURRENT_DISPATCH.with(|cell| *cell.borrow_mut() = Some(ctx));
    let result = f();
    CURRENT_DISPATCH.with(|cell| *cell.borrow_mut() = None);
    result
}

/// The dispatch context for the call currently being handled on this thread,
/// if any handler is presently executing.
pub fn current_dispatch_context() -> Option<DispatchContext> {
    CURRENT_DISPATCH.with(|cell| cell.borrow().clone())
}

pub type MethodHandler = Box<dyn Fn(&DispatchContext, Json) -> Result<Json> + Send + Sync>;
pub type PropertyGetter = Box<dyn Fn(&DispatchContext) -> Result<Json> + Send + Sync>;
pub type PropertySetter = Box<dyn Fn(&DispatchContext, Json) -> Result<()> + Send + Sync>;

struct PropertyHandlers {
    getter: Option<PropertyGetter>,
    setter: Option<PropertySetter>,
}

/// Accumulates (method-name → typed callback), (property-name → optional
/// getter/setter), and (signal-name → signal-id) for one interface (§4.A
/// item 2).
#[derive(Default)]
pub struct InterfaceDescription {
    pub name: String,
    methods: HashMap<String, MethodHandler>,
    properties: HashMap<String, PropertyHandlers>,
    signals: Vec<String>,
}

impl InterfaceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            properties: HashMap::new(),
            signals: Vec::new(),
        }
    }

    pub fn method(mut self, name: impl Into<String>, handler: MethodHandler) -> Self {
        self.methods.insert(name.into(), handler);
        self
    }

    pub fn property_get(mut self, name: impl Into<String>, getter: PropertyGetter) -> Self {
        self.properties
            .entry(name.into())
            .or_insert(PropertyHandlers { getter: None, setter: None })
            .getter = Some(getter);
        self
    }

    pub fn property_set(mut self, name: impl Into<String>, setter: PropertySetter) -> Self {
        self.properties
            .entry(name.into())
            .or_insert(PropertyHandlers { getter: None, setter: None })
            .setter = Some(setter);
        self
    }

    pub fn signal(mut self, name: impl Into<String>) -> Self {
        self.signals.push(name.into());
        self
    }

    pub fn dispatch_method(&self, ctx: &DispatchContext, method: &str, args: Json) -> Result<Json> {
        let handler = self
            .methods
            .get(method)
            .ok_or_else(|| Error::CapabilityMissing {
                path: ctx.object_path.clone(),
                interface: format!("{}.{}", self.name, method),
            })?;
        handler(ctx, args)
    }

    pub fn get_property(&self, ctx: &DispatchContext, name: &str) -> Result<Json> {
        let handlers = self
            .properties
            .get(name)
            .ok_or_else(|| Error::CapabilityMissing {
                path: ctx.object_path.clone(),
                interface: format!("{}.{}", self.name, name),
            })?;
        let getter = handlers.getter.as_ref().ok_or_else(|| Error::CapabilityMissing {
            path: ctx.object_path.clone(),
            interface: format!("{}.{}", self.name, name),
        })?;
        getter(ctx)
    }

    pub fn set_property(&self, ctx: &DispatchContext, name: &str, value: Json) -> Result<()> {
        let handlers = self
            .properties
            .get(name)
            .ok_or_else(|| Error::CapabilityMissing {
                path: ctx.object_path.clone(),
                interface: format!("{}.{}", self.name, name),
            })?;
        let setter = handlers.setter.as_ref().ok_or_else(|| Error::CapabilityMissing {
            path: ctx.object_path.clone(),
            interface: format!("{}.{}", self.name, name),
        })?;
        setter(ctx, value)
    }
}

/// Binds interface descriptions at object paths and emits signals (§4.A
/// item 3). A "fallback" registration matches any sub-path not otherwise
/// claimed.
pub trait Server: Send {
    /// Registers `iface` at the exact path `path`.
    fn register(&mut self, path: &str, iface: InterfaceDescription) -> Result<()>;

    /// Registers `iface` as the catch-all for any path not exactly registered.
    fn register_fallback(&mut self, iface: InterfaceDescription) -> Result<()>;

    fn unregister(&mut self, path: &str) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn emit_signal(
        &self,
        path: &str,
        interface: &str,
        signal: &str,
        detail: &str,
        detail1: i32,
        detail2: i32,
        payload: SignalValue,
    ) -> Result<()>;
}

/// Method and property calls bound at construction to (endpoint, path,
/// interface) (§4.A item 4).
pub trait Client: Send + Sync {
    fn call_method_raw(&self, method: &str, args: Json) -> Result<Json>;

    fn call_method_async_raw(
        &self,
        method: &str,
        args: Json,
        callback: Box<dyn FnOnce(Result<Json>) + Send>,
    );

    fn get_property_raw(&self, name: &str) -> Result<Json>;
    fn set_property_raw(&self, name: &str, value: Json) -> Result<()>;
}

/// Ergonomic, generically-typed wrappers over the object-safe [`Client`]
/// trait; method arguments and return values round-trip through JSON so the
/// trait itself stays object-safe.
pub trait ClientExt: Client {
    fn call_method<A: Serialize, R: DeserializeOwned>(&self, method: &str, args: &A) -> Result<R> {
        let json = serde_json::to_value(args)
            .map_err(|e| Error::TransportTransient(e.to_string()))?;
        let reply = self.call_method_raw(method, json)?;
        serde_json::from_value(reply).map_err(|e| Error::TransportTransient(e.to_string()))
    }

    fn get_property<R: DeserializeOwned>(&self, name: &str) -> Result<R> {
        let json = self.get_property_raw(name)?;
        serde_json::from_value(json).map_err(|e| Error::TransportTransient(e.to_string()))
    }

    fn set_property<A: Serialize>(&self, name: &str, value: &A) -> Result<()> {
        let json = serde_json::to_value(value)
            .map_err(|e| Error::TransportTransient(e.to_string()))?;
        self.set_property_raw(name, json)
    }
}

impl<T: Client + ?Sized> ClientExt for T {}

/// Requests/releases ownership of a name on the bus (§4.A item 5).
pub trait NameRegistration: Send {
    fn request_name(&self, name: &str) -> Result<bool>;
    fn release_name(&self, name: &str) -> Result<()>;
}

/// Everything a bridge needs from a connected backend: the connection
/// itself, a server for registering local objects, and name ownership.
pub trait Backend: Send {
    fn connection(&self) -> &dyn Connection;
    fn server(&mut self) -> &mut dyn Server;
    fn names(&self) -> &dyn NameRegistration;

    /// Builds a client bound to (endpoint, path, interface).
    fn client(&self, endpoint: &str, path: &str, interface: &str) -> Box<dyn Client>;

    /// Drains AT-SPI events the backend's own event loop has forwarded
    /// since the last call (non-blocking). Backends with no separate event
    /// loop (the dummy backend) never have any to report (§5 "cross-thread
    /// event delivery").
    fn drain_events(&mut self) -> Vec<AccessibilityEvent>;
}

/// Whether the dummy (no-op) backend should be used instead of the real
/// transport: `DALI_DISABLE_ATSPI=1` (§6), or no platform backend compiled in.
pub fn dummy_mode_requested() -> bool {
    std::env::var("DALI_DISABLE_ATSPI").ok().as_deref() == Some("1")
}

/// Constructs the appropriate backend for the current platform and
/// environment: the real AT-SPI2 D-Bus backend on Linux unless dummy mode is
/// requested, otherwise the dummy backend everywhere else (§4.A supplemental).
pub fn connect(kind: BusKind) -> Box<dyn Backend> {
    if dummy_mode_requested() {
        return Box::new(dummy::DummyBackend::new());
    }
    #[cfg(target_os = "linux")]
    {
        match dbus::DbusBackend::connect(kind) {
            Ok(backend) => return Box::new(backend),
            Err(err) => {
                tracing::warn!(target: "atspi_bridge", error = %err, "falling back to dummy transport");
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = kind;
    }
    Box::new(dummy::DummyBackend::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_description_reports_missing_capability() {
        let iface = InterfaceDescription::new("org.a11y.atspi.Value");
        let ctx = DispatchContext {
            object_path: "/org/a11y/atspi/accessible/7".into(),
            sender: None,
        };
        let err = iface.dispatch_method(&ctx, "SetCurrentValue", Json::Null).unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { .. }));
    }

    #[test]
    fn method_handler_round_trips_json_args() {
        let iface = InterfaceDescription::new("org.a11y.atspi.Accessible").method(
            "GetChildAtIndex",
            Box::new(|_ctx, args| {
                let index: i32 = serde_json::from_value(args).unwrap();
                Ok(serde_json::json!(index * 2))
            }),
        );
        let ctx = DispatchContext::default();
        let out = iface.dispatch_method(&ctx, "GetChildAtIndex", serde_json::json!(3)).unwrap();
        assert_eq!(out, serde_json::json!(6));
    }

    #[test]
    fn dispatch_context_is_thread_local_and_scoped() {
        assert!(current_dispatch_context().is_none());
        with_dispatch_context(
            DispatchContext { object_path: "/x".into(), sender: None },
            || {
                assert_eq!(current_dispatch_context().unwrap().object_path, "/x");
            },
        );
        assert!(current_dispatch_context().is_none());
    }
}
