//! No-op transport backend: every operation succeeds locally without ever
//! touching a wire (§4.A supplemental, §4.D force-up step 1 "local-only
//! mode").

use serde_json::Value as Json;

use crate::error::Result;
use crate::model::AccessibilityEvent;

use super::{Backend, Client, Connection, InterfaceDescription, NameRegistration, Server, SignalValue};

pub struct DummyConnection;

impl Connection for DummyConnection {
    fn unique_name(&self) -> Option<String> {
        Some(":dummy.1".to_string())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct DummyServer {
    registered: Vec<String>,
}

impl Server for DummyServer {
    fn register(&mut self, path: &str, _iface: InterfaceDescription) -> Result<()> {
        self.registered.push(path.to_string());
        Ok(())
    }

    fn register_fallback(&mut self, _iface: InterfaceDescription) -> Result<()> {
        Ok(())
    }

    fn unregister(&mut self, path: &str) -> Result<()> {
        self.registered.retain(|p| p != path);
        Ok(())
    }

    fn emit_signal(
        &self,
        _path: &str,
        _interface: &str,
        _signal: &str,
        _detail: &str,
        _detail1: i32,
        _detail2: i32,
        _payload: SignalValue,
    ) -> Result<()> {
        Ok(())
    }
}

pub struct DummyNames;

impl NameRegistration for DummyNames {
    fn request_name(&self, _name: &str) -> Result<bool> {
        Ok(true)
    }

    fn release_name(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

pub struct DummyClient;

impl Client for DummyClient {
    fn call_method_raw(&self, _method: &str, _args: Json) -> Result<Json> {
        Ok(Json::Null)
    }

    fn call_method_async_raw(
        &self,
        _method: &str,
        _args: Json,
        callback: Box<dyn FnOnce(Result<Json>) + Send>,
    ) {
        callback(Ok(Json::Null));
    }

    fn get_property_raw(&self, _name: &str) -> Result<Json> {
        Ok(Json::Null)
    }

    fn set_property_raw(&self, _name: &str, _value: Json) -> Result<()> {
        Ok(())
    }
}

pub struct DummyBackend {
    connection: DummyConnection,
    server: DummyServer,
    names: DummyNames,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self {
            connection: DummyConnection,
            server: DummyServer::default(),
            names: DummyNames,
        }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DummyBackend {
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
        Box::new(DummyClient)
    }

    fn drain_events(&mut self) -> Vec<AccessibilityEvent> {
        Vec::new()
    }
}
