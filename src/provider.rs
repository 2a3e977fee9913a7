//! External-collaborator contract between the server-side registry (§4.C)
//! and whatever UI toolkit owns the actual widget data. The registry only
//! tracks tree shape (parent/children/hidden) for an object-id; name, role,
//! state, and capability data live with the toolkit, which is deliberately
//! out of scope for this crate (§1: "UI toolkit integration details and glue
//! code for specific accessibility interfaces ... the core only requires
//! they be addressable as typed capabilities").
//!
//! [`AccessibleProvider`] is that addressing contract: the bridge's
//! registered interface descriptions (§4.D step 4) resolve an incoming call
//! to an object-id via the registry, then ask the provider for the data to
//! answer it.

use crate::model::{Attributes, ComponentLayer, CoordinateType, Rect};
use crate::role::Role;
use crate::state::StateSet;

/// Per-object data a toolkit must expose for its accessibles to be served
/// over the transport (§4.C, §6 "registered interfaces").
pub trait AccessibleProvider: Send {
    fn name(&self, id: u32) -> String;
    fn description(&self, id: u32) -> String;
    fn role(&self, id: u32) -> Role;
    fn states(&self, id: u32) -> StateSet;
    fn attributes(&self, id: u32) -> Attributes;
    fn toolkit_name(&self) -> String;

    /// Component capability (screen position/layer), if the object has one.
    fn extents(&self, _id: u32, _coord: CoordinateType) -> Option<Rect<i32>> {
        None
    }
    fn layer(&self, _id: u32) -> Option<ComponentLayer> {
        None
    }

    /// Value capability, if the object has one.
    fn current_value(&self, _id: u32) -> Option<f64> {
        None
    }
    fn set_current_value(&mut self, _id: u32, _value: f64) -> bool {
        false
    }

    /// Action capability: returns the action names available on `id`.
    fn action_names(&self, _id: u32) -> Vec<String> {
        Vec::new()
    }
    fn do_action(&mut self, _id: u32, _index: usize) -> bool {
        false
    }
}

/// A provider with nothing behind it: used when a bridge is brought up
/// without a toolkit attached (tests, the dummy transport path). Every
/// query returns the type's defaults; no capability is ever reported.
#[derive(Default)]
pub struct EmptyProvider;

impl AccessibleProvider for EmptyProvider {
    fn name(&self, _id: u32) -> String {
        String::new()
    }
    fn description(&self, _id: u32) -> String {
        String::new()
    }
    fn role(&self, _id: u32) -> Role {
        Role::Invalid
    }
    fn states(&self, _id: u32) -> StateSet {
        StateSet::default()
    }
    fn attributes(&self, _id: u32) -> Attributes {
        Attributes::default()
    }
    fn toolkit_name(&self) -> String {
        String::new()
    }
}
