//! Bridge lifecycle (§4.D): the three external condition flags
//! (a11y-enabled, screen-reader-enabled, application-running), the UP/DOWN
//! transition rule, and the force-up/force-down procedures. Grounded on
//! `original_source/accessibility/internal/bridge/bridge-impl.cpp`'s
//! `SwitchBridge`/`ForceUp`/`ForceDown`/`Initialize` and on
//! `bridge-base.h`'s `AddCoalescableMessage`/`FindByPath`/
//! `RegisterDefaultLabel` surface (carried by [`crate::registry`] and
//! [`crate::scheduler`] rather than reimplemented here).
//!
//! The retry timer called for by §4.D is expressed as a manually-ticked
//! countdown (`Bridge::tick`, driven by the embedder once per scheduler
//! tick) rather than through [`crate::platform::RepeatingTimer`]: the
//! latter's tick callback must be `Send + Sync` so it can be installed from
//! a host's own event loop, but the coalescable-message actions this bridge
//! also needs to run on the same cadence are not (§4.I), and a bridge that
//! must self-schedule into its own retry timer would otherwise need shared,
//! thread-safe interior mutability it has no other use for. A single
//! `tick()` entry point keeps both concerns on the same 100 ms cadence
//! without that cost.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::address::{Address, ACCESSIBLE_PATH_PREFIX};
use crate::error::Result;
use crate::model::AccessibilityEvent;
use crate::proxy::ProxyContext;
use crate::registry::Registry;
use crate::scheduler::{MessageKind, Scheduler};
use crate::transport::{self, Backend, Client, ClientExt, Server, SignalValue};
use crate::window_tracker::{DbusWindowTracker, NullWindowTracker, WindowTracker};

const REGISTRY_BUS: &str = "org.a11y.atspi.Registry";
const REGISTRY_ROOT_PATH: &str = "root";
const SOCKET_INTERFACE: &str = "org.a11y.atspi.Socket";
const EVENT_WINDOW_INTERFACE: &str = "org.a11y.atspi.Event.Window";

/// Retry cadence for a failed `force_up`: 1000 ms at the scheduler's 100 ms
/// tick (§4.D "default 1000 ms").
const RETRY_TICKS: u32 = 10;

/// Outcome of a [`Bridge::force_up`] attempt (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceUpResult {
    JustStarted,
    AlreadyUp,
    Failed,
}

/// Shared handle to the connected transport backend: cloned by
/// [`BackendProxyContext`] so the navigation engine can query the very tree
/// this bridge serves (§4.E), without the bridge giving up ownership.
pub type SharedBackend = Rc<RefCell<Box<dyn Backend>>>;

/// A three-state monitor over external conditions (a11y-enabled,
/// screen-reader-enabled, application-running), driving the bridge UP or
/// DOWN per the transition rule in §4.D.
pub struct Bridge {
    backend: SharedBackend,
    dummy_mode: bool,
    registry: Registry,
    scheduler: Scheduler,
    window_tracker: Box<dyn WindowTracker>,
    interface_builders: Vec<Box<dyn Fn(&mut dyn Server)>>,

    a11y_enabled: bool,
    screen_reader_enabled: bool,
    screen_reader_suppressed: bool,
    application_running: bool,
    is_up: bool,
    terminated: bool,
    preferred_bus_name: Option<String>,
    application_socket_parent: Address,
    retry_countdown: Option<u32>,

    enabled_callbacks: Vec<Box<dyn FnMut()>>,
    disabled_callbacks: Vec<Box<dyn FnMut()>>,
}

impl Bridge {
    /// Builds a bridge over an already-connected backend (the caller is
    /// expected to have obtained it from [`crate::transport::connect`]).
    /// Local-only ("dummy") mode is detected the same way `connect` itself
    /// decided which backend to hand back (§6 `DALI_DISABLE_ATSPI`).
    pub fn new(backend: Box<dyn Backend>, preferred_bus_name: Option<String>) -> Self {
        let dummy_mode = transport::dummy_mode_requested();
        Self::with_mode(backend, preferred_bus_name, dummy_mode)
    }

    fn with_mode(backend: Box<dyn Backend>, preferred_bus_name: Option<String>, dummy_mode: bool) -> Self {
        let bus_name = backend.connection().unique_name().unwrap_or_default();
        let window_tracker: Box<dyn WindowTracker> = if dummy_mode {
            Box::new(NullWindowTracker)
        } else {
            Box::new(DbusWindowTracker::new(backend.as_ref()))
        };

        Self {
            backend: Rc::new(RefCell::new(backend)),
            dummy_mode,
            registry: Registry::new(bus_name),
            scheduler: Scheduler::new(),
            window_tracker,
            interface_builders: Vec::new(),
            a11y_enabled: false,
            screen_reader_enabled: false,
            screen_reader_suppressed: false,
            application_running: false,
            is_up: false,
            terminated: false,
            preferred_bus_name,
            application_socket_parent: Address::default(),
            retry_countdown: None,
            enabled_callbacks: Vec::new(),
            disabled_callbacks: Vec::new(),
        }
    }

    /// Registers one capability module's interface-description builder,
    /// invoked against the transport's server on every successful
    /// `force_up` (§9: "a vector of interface-description builders; each
    /// capability module contributes a registration function", replacing
    /// the source's per-interface bridge mixins).
    pub fn register_interface_builder(&mut self, builder: impl Fn(&mut dyn Server) + 'static) {
        self.interface_builders.push(Box::new(builder));
    }

    pub fn on_enabled(&mut self, callback: impl FnMut() + 'static) {
        self.enabled_callbacks.push(Box::new(callback));
    }

    pub fn on_disabled(&mut self, callback: impl FnMut() + 'static) {
        self.disabled_callbacks.push(Box::new(callback));
    }

    /// A cloned handle to the connected backend, for building a
    /// [`BackendProxyContext`] (or any other collaborator that needs to
    /// issue its own calls without taking the bridge's ownership).
    pub fn backend_handle(&self) -> SharedBackend {
        self.backend.clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Appends `window` to the application's top-level windows (§4.C
    /// `add-top-level`).
    pub fn add_top_level_window(&mut self, window: u32) {
        self.registry.add_top_level(window);
    }

    /// Removes `window` from the application's top-level windows, emitting
    /// `Event.Window::Destroy` iff it was actually present (§4.C
    /// `remove-top-level`).
    pub fn remove_top_level_window(&mut self, window: u32) {
        if self.registry.remove_top_level(window) {
            self.emit_window_destroy(window);
        }
    }

    /// Drains any AT-SPI events the transport backend has forwarded since
    /// the last call, for the embedder to route into the screen-reader
    /// orchestrator's `on-event` (§2 "forwards transport-delivered events to
    /// H", §5 "cross-thread event delivery").
    pub fn drain_events(&mut self) -> Vec<AccessibilityEvent> {
        self.backend.borrow_mut().drain_events()
    }

    fn emit_window_destroy(&self, window: u32) {
        let path = format!("{ACCESSIBLE_PATH_PREFIX}{window}");
        if let Err(err) = self.backend.borrow_mut().server().emit_signal(
            &path,
            EVENT_WINDOW_INTERFACE,
            "Destroy",
            "",
            0,
            0,
            SignalValue::None,
        ) {
            tracing::warn!(target: "atspi_bridge", %err, window, "failed to emit Event.Window::Destroy");
        }
    }

    pub fn window_tracker(&self) -> &dyn WindowTracker {
        self.window_tracker.as_ref()
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Effective screen-reader state after suppression (§4.D transition rule).
    pub fn screen_reader_effectively_enabled(&self) -> bool {
        self.screen_reader_enabled && !self.screen_reader_suppressed
    }

    pub fn application_socket_parent(&self) -> &Address {
        &self.application_socket_parent
    }

    /// Defers `action` by `delay_ms`, coalescing repeats for the same
    /// `(kind, target)` (§4.I).
    pub fn add_coalescable_message(
        &mut self,
        kind: MessageKind,
        target: Address,
        delay_ms: u32,
        action: Box<dyn FnMut()>,
    ) {
        self.scheduler.add(kind, target, delay_ms, action);
    }

    /// Drives the coalescable-message tick and the force-up retry
    /// countdown; the embedder calls this once per 100 ms (§4.I, §4.D).
    pub fn tick(&mut self) {
        self.scheduler.tick();
        if let Some(remaining) = self.retry_countdown {
            if remaining == 0 {
                self.retry_countdown = None;
                self.switch();
            } else {
                self.retry_countdown = Some(remaining - 1);
            }
        }
    }

    pub fn set_a11y_enabled(&mut self, enabled: bool) {
        self.a11y_enabled = enabled;
        self.switch();
    }

    pub fn set_screen_reader_enabled(&mut self, enabled: bool) {
        self.screen_reader_enabled = enabled;
        self.switch();
    }

    pub fn set_application_running(&mut self, running: bool) {
        self.application_running = running;
        self.switch();
    }

    pub fn suppress_screen_reader(&mut self, suppress: bool) {
        if self.screen_reader_suppressed == suppress {
            return;
        }
        self.screen_reader_suppressed = suppress;
        self.switch();
    }

    /// Re-evaluates the UP/DOWN transition rule against the current flags
    /// (§4.D): `application-running ∧ (a11y-enabled ∨ (screen-reader-enabled
    /// ∧ ¬suppressed))`.
    fn switch(&mut self) {
        if self.terminated {
            return;
        }
        let up = self.application_running && (self.a11y_enabled || self.screen_reader_effectively_enabled());
        if up {
            self.force_up();
        } else {
            self.force_down();
        }
    }

    /// Force-up procedure (§4.D). Step numbers below refer to §4.D's
    /// ordered list.
    pub fn force_up(&mut self) -> ForceUpResult {
        if self.is_up {
            return ForceUpResult::AlreadyUp;
        }

        // Step 1: local-only mode never touches the transport at all.
        if self.dummy_mode {
            self.is_up = true;
            self.retry_countdown = None;
            self.run_enabled_callbacks();
            return ForceUpResult::JustStarted;
        }

        // Steps 2-3 (resolve address, open connection) already happened in
        // `crate::transport::connect`; here we only check the result held.
        if !self.backend.borrow().connection().is_connected() {
            if self.retry_countdown.is_none() {
                self.retry_countdown = Some(RETRY_TICKS);
            }
            return ForceUpResult::Failed;
        }

        // Step 4: register every capability module's interface description.
        {
            let mut backend = self.backend.borrow_mut();
            for builder in &self.interface_builders {
                builder(backend.server());
            }
        }

        // Steps 5-6 (event-listener-registered subscription, key-event
        // forwarder / direct-reading client) are not distinct IPC clients in
        // this crate: the orchestrator (§4.H) hosts the direct-reading
        // surface itself rather than calling out to a separate service.

        // Step 7: request the preferred bus name, skipped entirely (not a
        // no-op call) when unset (§9 open-question resolution).
        self.request_bus_name();

        // Step 8: synchronously embed the application root into the
        // registry's root socket.
        self.embed_application();

        self.is_up = true;
        self.retry_countdown = None;
        // Step 9: emit the enabled signal.
        self.run_enabled_callbacks();
        ForceUpResult::JustStarted
    }

    /// Force-down procedure: reverses force-up in the opposite order.
    /// Repeated calls are a no-op (§4.D, §8 idempotence).
    pub fn force_down(&mut self) {
        if !self.is_up {
            self.retry_countdown = None;
            return;
        }

        if !self.dummy_mode {
            // §4.C "on bridge down: emits DESTROY for every remaining
            // top-level window before tearing down transport".
            for window in self.registry.top_level_windows().to_vec() {
                self.emit_window_destroy(window);
            }
            self.unembed_application();
            self.release_bus_name();
        }
        self.scheduler = Scheduler::new();
        self.retry_countdown = None;
        self.is_up = false;
        self.run_disabled_callbacks();
    }

    /// Tears the bridge down permanently; further flag changes have no
    /// effect (mirrors `BridgeImpl::TerminateInternal`'s guard against
    /// acting after the bridge has been destroyed).
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.force_down();
        self.terminated = true;
    }

    fn request_bus_name(&self) {
        let Some(name) = self.preferred_bus_name.as_deref().filter(|n| !n.is_empty()) else {
            return;
        };
        if let Err(err) = self.backend.borrow().names().request_name(name) {
            tracing::warn!(target: "atspi_bridge", %err, "failed to request preferred bus name");
        }
    }

    fn release_bus_name(&self) {
        let Some(name) = self.preferred_bus_name.as_deref().filter(|n| !n.is_empty()) else {
            return;
        };
        if let Err(err) = self.backend.borrow().names().release_name(name) {
            tracing::warn!(target: "atspi_bridge", %err, "failed to release preferred bus name");
        }
    }

    fn embed_application(&mut self) {
        let bus_name = self.backend.borrow().connection().unique_name().unwrap_or_default();
        let plug = Address::root(bus_name);
        let client = self.backend.borrow().client(REGISTRY_BUS, REGISTRY_ROOT_PATH, SOCKET_INTERFACE);
        match client.call_method::<Address, Address>("Embed", &plug) {
            Ok(parent) => self.application_socket_parent = parent,
            Err(err) => tracing::warn!(target: "atspi_bridge", %err, "failed to embed application socket"),
        }
    }

    fn unembed_application(&mut self) {
        let bus_name = self.backend.borrow().connection().unique_name().unwrap_or_default();
        let plug = Address::root(bus_name);
        let client = self.backend.borrow().client(REGISTRY_BUS, REGISTRY_ROOT_PATH, SOCKET_INTERFACE);
        let _ = client.call_method::<Address, ()>("Unembed", &plug);
        self.application_socket_parent = Address::default();
    }

    fn run_enabled_callbacks(&mut self) {
        for callback in &mut self.enabled_callbacks {
            callback();
        }
    }

    fn run_disabled_callbacks(&mut self) {
        for callback in &mut self.disabled_callbacks {
            callback();
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Adapts a bridge's shared backend handle to [`ProxyContext`] so the
/// navigation engine (§4.E) can query the very tree this bridge serves,
/// without the proxy layer depending on `Bridge` itself.
pub struct BackendProxyContext {
    backend: SharedBackend,
    include_hidden: Cell<bool>,
}

impl BackendProxyContext {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend, include_hidden: Cell::new(false) }
    }

    pub fn set_include_hidden(&self, include_hidden: bool) {
        self.include_hidden.set(include_hidden);
    }
}

impl ProxyContext for BackendProxyContext {
    fn client(&self, endpoint: &str, path: &str, interface: &str) -> Box<dyn Client> {
        self.backend.borrow().client(endpoint, path, interface)
    }

    fn include_hidden(&self) -> bool {
        self.include_hidden.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Connection, InterfaceDescription, NameRegistration, SignalValue};
    use serde_json::Value as Json;
    use std::cell::RefCell as StdRefCell;

    struct FakeConnection {
        connected: bool,
    }

    impl Connection for FakeConnection {
        fn unique_name(&self) -> Option<String> {
            Some(":1.99".to_string())
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    #[derive(Default)]
    struct FakeServer {
        #[allow(dead_code)]
        registered: Vec<String>,
        emitted: Rc<StdRefCell<Vec<(String, String, String)>>>,
    }

    impl Server for FakeServer {
        fn register(&mut self, path: &str, _iface: InterfaceDescription) -> Result<()> {
            self.registered.push(path.to_string());
            Ok(())
        }
        fn register_fallback(&mut self, _iface: InterfaceDescription) -> Result<()> {
            Ok(())
        }
        fn unregister(&mut self, _path: &str) -> Result<()> {
            Ok(())
        }
        fn emit_signal(
            &self,
            path: &str,
            interface: &str,
            signal: &str,
            _detail: &str,
            _detail1: i32,
            _detail2: i32,
            _payload: SignalValue,
        ) -> Result<()> {
            self.emitted.borrow_mut().push((path.to_string(), interface.to_string(), signal.to_string()));
            Ok(())
        }
    }

    struct FakeNames;

    impl NameRegistration for FakeNames {
        fn request_name(&self, _name: &str) -> Result<bool> {
            Ok(true)
        }
        fn release_name(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FakeClient;

    impl Client for FakeClient {
        fn call_method_raw(&self, method: &str, _args: Json) -> Result<Json> {
            match method {
                "Embed" => Ok(serde_json::to_value(Address::new(":1.99", "root")).unwrap()),
                _ => Ok(Json::Null),
            }
        }
        fn call_method_async_raw(&self, _method: &str, _args: Json, callback: Box<dyn FnOnce(Result<Json>) + Send>) {
            callback(Ok(Json::Null));
        }
        fn get_property_raw(&self, _name: &str) -> Result<Json> {
            Ok(Json::Null)
        }
        fn set_property_raw(&self, _name: &str, _value: Json) -> Result<()> {
            Ok(())
        }
    }

    struct FakeBackend {
        connection: FakeConnection,
        server: FakeServer,
        names: FakeNames,
    }

    impl FakeBackend {
        fn new(connected: bool) -> Self {
            Self { connection: FakeConnection { connected }, server: FakeServer::default(), names: FakeNames }
        }

        fn with_emitted(connected: bool, emitted: Rc<StdRefCell<Vec<(String, String, String)>>>) -> Self {
            Self {
                connection: FakeConnection { connected },
                server: FakeServer { registered: Vec::new(), emitted },
                names: FakeNames,
            }
        }
    }

    impl Backend for FakeBackend {
        fn connection(&self) -> &dyn Connection {
            &self.connection
        }
        fn server(&mut self) -> &mut dyn Server {
            &mut self.server
        }
        fn names(&self) -> &dyn NameRegistration {
            &self.names
        }
        fn client(&self, _endpoint: &str, _path: &str, _interface: &str) -> Box<dyn Client> {
            Box::new(FakeClient)
        }
        fn drain_events(&mut self) -> Vec<AccessibilityEvent> {
            Vec::new()
        }
    }

    fn bridge(connected: bool) -> Bridge {
        Bridge::with_mode(Box::new(FakeBackend::new(connected)), None, false)
    }

    #[test]
    fn stays_down_until_application_running_and_a_flag_enabled() {
        let mut b = bridge(true);
        b.set_a11y_enabled(true);
        assert!(!b.is_up());
        b.set_application_running(true);
        assert!(b.is_up());
    }

    #[test]
    fn screen_reader_flag_alone_brings_it_up_when_running() {
        let mut b = bridge(true);
        b.set_application_running(true);
        b.set_screen_reader_enabled(true);
        assert!(b.is_up());
    }

    #[test]
    fn suppression_keeps_it_down_despite_screen_reader_enabled() {
        let mut b = bridge(true);
        b.set_application_running(true);
        b.suppress_screen_reader(true);
        b.set_screen_reader_enabled(true);
        assert!(!b.is_up());
        b.suppress_screen_reader(false);
        assert!(b.is_up());
    }

    #[test]
    fn application_stopping_brings_it_back_down() {
        let mut b = bridge(true);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert!(b.is_up());
        b.set_application_running(false);
        assert!(!b.is_up());
    }

    #[test]
    fn force_up_is_idempotent() {
        let mut b = bridge(true);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert_eq!(b.force_up(), ForceUpResult::AlreadyUp);
    }

    #[test]
    fn force_down_on_a_down_bridge_is_a_no_op() {
        let mut b = bridge(true);
        b.force_down();
        assert!(!b.is_up());
    }

    #[test]
    fn disconnected_backend_fails_force_up_and_schedules_retry() {
        let mut b = bridge(false);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert!(!b.is_up());
        assert_eq!(b.force_up(), ForceUpResult::Failed);
        assert!(b.retry_countdown.is_some());
    }

    #[test]
    fn retry_ticks_do_not_falsely_bring_it_up_while_still_disconnected() {
        let mut b = bridge(false);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        for _ in 0..(RETRY_TICKS * 2) {
            b.tick();
        }
        assert!(!b.is_up());
    }

    #[test]
    fn dummy_mode_comes_up_without_touching_the_backend() {
        let mut b = Bridge::with_mode(Box::new(FakeBackend::new(false)), None, true);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert!(b.is_up());
    }

    #[test]
    fn enabled_and_disabled_callbacks_fire_on_transition() {
        let mut b = bridge(true);
        let enabled = Rc::new(StdRefCell::new(0));
        let e2 = enabled.clone();
        b.on_enabled(move || *e2.borrow_mut() += 1);
        let disabled = Rc::new(StdRefCell::new(0));
        let d2 = disabled.clone();
        b.on_disabled(move || *d2.borrow_mut() += 1);

        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert_eq!(*enabled.borrow(), 1);
        b.set_application_running(false);
        assert_eq!(*disabled.borrow(), 1);
    }

    #[test]
    fn embed_captures_the_returned_parent_address_on_force_up() {
        let mut b = bridge(true);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        assert_eq!(b.application_socket_parent(), &Address::new(":1.99", "root"));
    }

    #[test]
    fn remove_top_level_window_emits_event_window_destroy() {
        let emitted = Rc::new(StdRefCell::new(Vec::new()));
        let mut b = Bridge::with_mode(Box::new(FakeBackend::with_emitted(true, emitted.clone())), None, false);
        b.set_a11y_enabled(true);
        b.set_application_running(true);

        b.add_top_level_window(7);
        b.remove_top_level_window(7);

        assert!(emitted.borrow().iter().any(|(path, iface, signal)| {
            path == "/org/a11y/atspi/accessible/7" && iface == "org.a11y.atspi.Event.Window" && signal == "Destroy"
        }));
    }

    #[test]
    fn remove_top_level_window_is_silent_when_window_was_never_added() {
        let emitted = Rc::new(StdRefCell::new(Vec::new()));
        let mut b = Bridge::with_mode(Box::new(FakeBackend::with_emitted(true, emitted.clone())), None, false);
        b.set_a11y_enabled(true);
        b.set_application_running(true);

        b.remove_top_level_window(42);

        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn force_down_destroys_every_remaining_top_level_window() {
        let emitted = Rc::new(StdRefCell::new(Vec::new()));
        let mut b = Bridge::with_mode(Box::new(FakeBackend::with_emitted(true, emitted.clone())), None, false);
        b.set_a11y_enabled(true);
        b.set_application_running(true);
        b.add_top_level_window(3);
        b.add_top_level_window(4);

        b.set_application_running(false);

        let destroyed_paths: Vec<String> = emitted
            .borrow()
            .iter()
            .filter(|(_, _, signal)| signal == "Destroy")
            .map(|(path, _, _)| path.clone())
            .collect();
        assert!(destroyed_paths.contains(&"/org/a11y/atspi/accessible/3".to_string()));
        assert!(destroyed_paths.contains(&"/org/a11y/atspi/accessible/4".to_string()));
    }
}
