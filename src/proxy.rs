//! Remote node proxy + navigation engine (§4.E). Grounded on
//! `original_source/accessibility/api/node-proxy.h` (the abstract `NodeProxy`
//! method list) and `original_source/accessibility/internal/service/
//! atspi-node-proxy.h/.cpp` (one typed client per interface). The DFS
//! neighbor-navigation algorithm itself was not present in the retrieved
//! `original_source/` file set, so it is written directly from SPEC_FULL
//! §4.E and exposed generically over [`NavNode`] so it can be exercised
//! against an in-memory mock tree without any transport.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::model::{
    Attributes, ComponentLayer, CoordinateType, NodeInfo, ReadingMaterial, Rect, Relation, RelationType,
};
use crate::role::Role;
use crate::state::{State, StateSet};
use crate::transport::{Client, ClientExt};

const IFACE_ACCESSIBLE: &str = "org.a11y.atspi.Accessible";
const IFACE_APPLICATION: &str = "org.a11y.atspi.Application";
const IFACE_COMPONENT: &str = "org.a11y.atspi.Component";
const IFACE_ACTION: &str = "org.a11y.atspi.Action";
const IFACE_VALUE: &str = "org.a11y.atspi.Value";
const IFACE_TEXT: &str = "org.a11y.atspi.Text";
const IFACE_SELECTION: &str = "org.a11y.atspi.Selection";

/// What a [`NodeProxy`] needs from its owning bridge: a way to build a typed
/// client for a given (endpoint, path, interface), and the current
/// include-hidden flag (§4.E: "hidden when the global include-hidden flag is
/// false").
pub trait ProxyContext {
    fn client(&self, endpoint: &str, path: &str, interface: &str) -> Box<dyn Client>;
    fn include_hidden(&self) -> bool;
}

struct Inner {
    address: Address,
    ctx: Rc<dyn ProxyContext>,
}

/// A shared, reference-counted handle to a remote node (§3). Cheap to
/// clone; no parent back-pointer is stored — the parent is retrieved on
/// demand instead.
#[derive(Clone)]
pub struct NodeProxy(Rc<Inner>);

impl PartialEq for NodeProxy {
    fn eq(&self, other: &Self) -> bool {
        self.0.address == other.0.address
    }
}

impl NodeProxy {
    pub fn new(address: Address, ctx: Rc<dyn ProxyContext>) -> Self {
        Self(Rc::new(Inner { address, ctx }))
    }

    pub fn address(&self) -> &Address {
        &self.0.address
    }

    fn client(&self, interface: &str) -> Box<dyn Client> {
        self.0.ctx.client(&self.0.address.bus, &self.0.address.path, interface)
    }

    fn sibling(&self, address: Address) -> NodeProxy {
        NodeProxy::new(address, self.0.ctx.clone())
    }

    // --- Accessible ---------------------------------------------------

    pub fn states(&self) -> StateSet {
        if self.0.address.is_null() {
            return State::Defunct.into();
        }
        self.client(IFACE_ACCESSIBLE)
            .call_method::<(), (u32, u32)>("GetState", &())
            .map(|(w0, w1)| crate::state::from_wire_words(w0, w1))
            .unwrap_or_else(|_| State::Defunct.into())
    }

    pub fn is_defunct(&self) -> bool {
        self.0.address.is_null() || self.states().contains(State::Defunct)
    }

    pub fn is_showing(&self) -> bool {
        self.states().contains(State::Showing)
    }

    pub fn is_highlightable(&self) -> bool {
        self.states().contains(State::Highlightable)
    }

    pub fn name(&self) -> String {
        self.client(IFACE_ACCESSIBLE).call_method("GetName", &()).unwrap_or_default()
    }

    pub fn description(&self) -> String {
        self.client(IFACE_ACCESSIBLE).call_method("GetDescription", &()).unwrap_or_default()
    }

    pub fn localized_name(&self) -> String {
        self.client(IFACE_ACCESSIBLE)
            .get_property("LocalizedRoleName")
            .unwrap_or_default()
    }

    pub fn role(&self) -> Role {
        self.client(IFACE_ACCESSIBLE)
            .call_method::<(), u8>("GetRole", &())
            .ok()
            .and_then(Role::from_u8)
            .unwrap_or(Role::Invalid)
    }

    pub fn attributes(&self) -> Attributes {
        self.client(IFACE_ACCESSIBLE).call_method("GetAttributes", &()).unwrap_or_default()
    }

    pub fn child_count(&self) -> i32 {
        self.client(IFACE_ACCESSIBLE).get_property("ChildCount").unwrap_or(0)
    }

    pub fn index_in_parent(&self) -> i32 {
        self.client(IFACE_ACCESSIBLE).call_method("GetIndexInParent", &()).unwrap_or(-1)
    }

    pub fn child_at(&self, index: i32) -> Result<NodeProxy> {
        let address: Address = self
            .client(IFACE_ACCESSIBLE)
            .call_method("GetChildAtIndex", &index)
            .map_err(|_| Error::InvalidIndex { index, len: self.child_count() })?;
        Ok(self.sibling(address))
    }

    pub fn parent(&self) -> Option<NodeProxy> {
        let address: Address = self.client(IFACE_ACCESSIBLE).call_method("GetParent", &()).ok()?;
        if address.is_null() {
            None
        } else {
            Some(self.sibling(address))
        }
    }

    pub fn children(&self) -> Vec<NodeProxy> {
        (0..self.child_count()).filter_map(|i| self.child_at(i).ok()).collect()
    }

    fn relations(&self) -> Vec<Relation> {
        self.client(IFACE_ACCESSIBLE)
            .call_method::<(), Vec<(String, Vec<Address>)>>("GetRelationSet", &())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(kind, targets)| relation_kind_from_str(&kind).map(|kind| Relation { kind, targets }))
            .collect()
    }

    fn relation_target(&self, kind: RelationType) -> Option<Address> {
        self.relations().into_iter().find(|r| r.kind == kind)?.targets.into_iter().next()
    }

    pub fn described_by(&self) -> Address {
        self.relation_target(RelationType::DescribedBy).unwrap_or_default()
    }

    pub fn labeled_by_name(&self) -> String {
        self.relation_target(RelationType::LabelledBy)
            .map(|addr| self.sibling(addr).name())
            .unwrap_or_default()
    }

    // --- Application -----------------------------------------------------

    pub fn toolkit_name(&self) -> String {
        self.client(IFACE_APPLICATION).get_property("ToolkitName").unwrap_or_default()
    }

    // --- Component --------------------------------------------------------

    pub fn extents(&self, coord: CoordinateType) -> Rect<i32> {
        self.client(IFACE_COMPONENT)
            .call_method("GetExtents", &coord_tag(coord))
            .unwrap_or_default()
    }

    pub fn layer(&self) -> ComponentLayer {
        self.client(IFACE_COMPONENT)
            .call_method::<(), ComponentLayer>("GetLayer", &())
            .unwrap_or(ComponentLayer::Invalid)
    }

    pub fn contains_point(&self, x: i32, y: i32, coord: CoordinateType) -> bool {
        self.extents(coord).contains_point(x, y)
    }

    /// Deepest descendant whose own extents contain `(x, y)`, preferring the
    /// highest-layer child on overlap (§4.E "point hit-testing").
    pub fn navigable_at_point(&self, x: i32, y: i32, coord: CoordinateType) -> Option<NodeProxy> {
        if !self.contains_point(x, y, coord) {
            return None;
        }
        let mut current = self.clone();
        loop {
            let mut best: Option<(NodeProxy, ComponentLayer)> = None;
            for child in current.children() {
                if child.is_defunct() || !child.contains_point(x, y, coord) {
                    continue;
                }
                let layer = child.layer();
                let take = match &best {
                    Some((_, best_layer)) => layer as u8 >= *best_layer as u8,
                    None => true,
                };
                if take {
                    best = Some((child, layer));
                }
            }
            match best {
                Some((next, _)) => current = next,
                None => return Some(current),
            }
        }
    }

    // --- Action -------------------------------------------------------

    pub fn action_count(&self) -> i32 {
        self.client(IFACE_ACTION).call_method("GetNActions", &()).unwrap_or(0)
    }

    pub fn action_name(&self, index: i32) -> String {
        self.client(IFACE_ACTION).call_method("GetName", &index).unwrap_or_default()
    }

    pub fn do_action_at(&self, index: i32) -> Result<bool> {
        self.client(IFACE_ACTION).call_method("DoAction", &index)
    }

    /// Finds an action by (case-insensitive) name and invokes it, e.g. the
    /// "activate" action the orchestrator's double-tap gesture performs.
    pub fn do_action(&self, name: &str) -> Result<bool> {
        for i in 0..self.action_count() {
            if self.action_name(i).eq_ignore_ascii_case(name) {
                return self.do_action_at(i);
            }
        }
        Err(Error::CapabilityMissing {
            path: self.0.address.path.clone(),
            interface: format!("{IFACE_ACTION}.{name}"),
        })
    }

    // --- Value ----------------------------------------------------------

    pub fn current_value(&self) -> f64 {
        self.client(IFACE_VALUE).get_property("CurrentValue").unwrap_or(0.0)
    }

    pub fn set_current_value(&self, value: f64) -> Result<()> {
        self.client(IFACE_VALUE).set_property("CurrentValue", &value)
    }

    pub fn minimum_value(&self) -> f64 {
        self.client(IFACE_VALUE).get_property("MinimumValue").unwrap_or(0.0)
    }

    pub fn maximum_value(&self) -> f64 {
        self.client(IFACE_VALUE).get_property("MaximumValue").unwrap_or(0.0)
    }

    pub fn minimum_increment(&self) -> f64 {
        self.client(IFACE_VALUE).get_property("MinimumIncrement").unwrap_or(0.0)
    }

    pub fn formatted_value(&self) -> String {
        self.client(IFACE_VALUE).get_property("FormattedValue").unwrap_or_default()
    }

    // --- Text -------------------------------------------------------------

    pub fn character_count(&self) -> i32 {
        self.client(IFACE_TEXT).get_property("CharacterCount").unwrap_or(0)
    }

    pub fn text_range(&self, start: i32, end: i32) -> Result<String> {
        self.client(IFACE_TEXT).call_method("GetText", &(start, end))
    }

    /// Full text content, used as the reading material's
    /// `text_interface_name` name-fallback (§3 field, §4.F name trait).
    pub fn text_interface_name(&self) -> String {
        self.text_range(0, -1).unwrap_or_default()
    }

    // --- Selection (§9 open-question resolution) -------------------------

    /// `GetNSelectedChildren` on this node's own Selection capability;
    /// `0` (via the missing-capability default) on a non-container role.
    pub fn selected_child_count(&self) -> i32 {
        self.client(IFACE_SELECTION)
            .call_method::<(), i32>("GetNSelectedChildren", &())
            .unwrap_or(0)
    }

    pub fn is_selected_in_parent(&self) -> bool {
        let Some(parent) = self.parent() else { return false };
        let index = self.index_in_parent();
        parent
            .client(IFACE_SELECTION)
            .call_method::<i32, bool>("IsChildSelected", &index)
            .unwrap_or(false)
    }

    pub fn first_selected_child_index(&self) -> i32 {
        self.children()
            .iter()
            .position(|c| c.states().contains(State::Selected))
            .map(|i| i as i32)
            .unwrap_or(-1)
    }

    pub fn has_checkbox_child(&self) -> bool {
        self.children().iter().any(|c| c.role() == Role::CheckBox)
    }

    pub fn list_children_count(&self) -> i32 {
        if matches!(self.role(), Role::List | Role::ListBox) {
            self.child_count()
        } else {
            0
        }
    }

    // --- Batch snapshots (§3) ---------------------------------------------

    /// Assembles the 24-field `ReadingMaterial` batch snapshot (§3, §4.F).
    pub fn reading_material(&self) -> ReadingMaterial {
        let parent = self.parent();
        ReadingMaterial {
            attributes: self.attributes(),
            name: self.name(),
            labeled_by_name: self.labeled_by_name(),
            text_interface_name: self.text_interface_name(),
            role: self.role(),
            states: self.states(),
            localized_name: self.localized_name(),
            child_count: self.child_count(),
            current_value: self.current_value(),
            formatted_value: self.formatted_value(),
            min_increment: self.minimum_increment(),
            maximum: self.maximum_value(),
            minimum: self.minimum_value(),
            description: self.description(),
            index_in_parent: self.index_in_parent(),
            is_selected_in_parent: self.is_selected_in_parent(),
            has_checkbox_child: self.has_checkbox_child(),
            list_children_count: self.list_children_count(),
            first_selected_child_index: self.first_selected_child_index(),
            parent_address: parent.as_ref().map(|p| p.address().clone()).unwrap_or_default(),
            parent_states: parent.as_ref().map(|p| p.states()).unwrap_or_default(),
            parent_child_count: parent.as_ref().map(|p| p.child_count()).unwrap_or(0),
            parent_role: parent.as_ref().map(|p| p.role()).unwrap_or_default(),
            selected_child_count: self.selected_child_count(),
            described_by: self.described_by(),
        }
    }

    /// Assembles the lighter `NodeInfo` batch snapshot (§3).
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            role_name: self.role().name().to_string(),
            name: self.name(),
            toolkit_name: self.toolkit_name(),
            attributes: self.attributes(),
            states: self.states(),
            screen_extents: self.extents(CoordinateType::Screen),
            window_extents: self.extents(CoordinateType::Window),
            current_value: self.current_value(),
            min_increment: self.minimum_increment(),
            maximum: self.maximum_value(),
            minimum: self.minimum_value(),
            formatted_value: self.formatted_value(),
        }
    }
}

fn coord_tag(coord: CoordinateType) -> u8 {
    match coord {
        CoordinateType::Screen => 0,
        CoordinateType::Window => 1,
    }
}

fn relation_kind_from_str(s: &str) -> Option<RelationType> {
    use RelationType::*;
    Some(match s {
        "NULL_OF" => NullOf,
        "LABEL_FOR" => LabelFor,
        "LABELLED_BY" => LabelledBy,
        "CONTROLLER_FOR" => ControllerFor,
        "CONTROLLED_BY" => ControlledBy,
        "MEMBER_OF" => MemberOf,
        "FLOWS_TO" => FlowsTo,
        "FLOWS_FROM" => FlowsFrom,
        "SUBWINDOW_OF" => SubwindowOf,
        "EMBEDS" => Embeds,
        "EMBEDDED_BY" => EmbeddedBy,
        "POPUP_FOR" => PopupFor,
        "PARENT_WINDOW_OF" => ParentWindowOf,
        "DESCRIPTION_FOR" => DescriptionFor,
        "DESCRIBED_BY" => DescribedBy,
        "DETAILS_FOR" => DetailsFor,
        "DETAILS" => Details,
        "ERROR_FOR" => ErrorFor,
        "ERROR_MESSAGE" => ErrorMessage,
        _ => return None,
    })
}

/// Address-keyed weak cache: repeated lookups of the same address return the
/// same live proxy; a proxy with no remaining holder is recreated on next
/// lookup (§3, §5).
pub struct ProxyFactory {
    ctx: Rc<dyn ProxyContext>,
    cache: RefCell<HashMap<Address, Weak<Inner>>>,
}

impl ProxyFactory {
    pub fn new(ctx: Rc<dyn ProxyContext>) -> Self {
        Self { ctx, cache: RefCell::new(HashMap::new()) }
    }

    pub fn get(&self, address: Address) -> NodeProxy {
        if let Some(weak) = self.cache.borrow().get(&address) {
            if let Some(inner) = weak.upgrade() {
                return NodeProxy(inner);
            }
        }
        let inner = Rc::new(Inner { address: address.clone(), ctx: self.ctx.clone() });
        self.cache.borrow_mut().insert(address, Rc::downgrade(&inner));
        NodeProxy(inner)
    }

    #[cfg(test)]
    fn live_count(&self) -> usize {
        self.cache.borrow().values().filter(|w| w.strong_count() > 0).count()
    }
}

// --- Neighbor navigation (§4.E) --------------------------------------------

/// Abstracts over what the DFS neighbor-navigation algorithm needs from a
/// node, so it can be driven by [`NodeProxy`] over live IPC or by a plain
/// in-memory mock in tests (§4.E is specified precisely enough that its
/// correctness should not depend on a transport at all).
pub trait NavNode: Clone {
    fn address(&self) -> Address;
    fn is_null(&self) -> bool {
        self.address().is_null()
    }
    fn is_defunct(&self) -> bool;
    fn is_showing(&self) -> bool;
    fn is_highlightable(&self) -> bool;
    fn children(&self) -> Vec<Self>;
    fn parent(&self) -> Option<Self>;
}

impl NavNode for NodeProxy {
    fn address(&self) -> Address {
        self.0.address.clone()
    }
    fn is_defunct(&self) -> bool {
        NodeProxy::is_defunct(self)
    }
    fn is_showing(&self) -> bool {
        NodeProxy::is_showing(self)
    }
    fn is_highlightable(&self) -> bool {
        NodeProxy::is_highlightable(self)
    }
    fn children(&self) -> Vec<Self> {
        NodeProxy::children(self)
    }
    fn parent(&self) -> Option<Self> {
        NodeProxy::parent(self)
    }
}

/// Navigation mode (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMode {
    Normal,
    RecurseFromRoot,
    ContinueAfterFailedRecursion,
    RecurseToOutside,
}

/// Bound on DFS iterations, large enough to cover any realistic tree while
/// still tolerating the cyclic graphs §4.E calls out as tolerated-not-forbidden.
const MAX_ITERATIONS: usize = 100_000;

fn valid_children<N: NavNode>(of: &N, start: &N, filter_start: bool, include_hidden: bool) -> Vec<N> {
    of.children()
        .into_iter()
        .filter(|c| {
            !c.is_null()
                && !c.is_defunct()
                && (include_hidden || c.is_showing())
                && !(filter_start && c.address() == start.address())
        })
        .collect()
}

/// Computes the next/previous highlightable node under `root`'s scope,
/// starting from `start`, via the iterative DFS specified in §4.E.
///
/// Mode resolution: `RecurseFromRoot` starts descent at `root` instead of
/// `start` and never filters a child that equals `start` (start is unused
/// for the first descent, so there is nothing to avoid revisiting); `Normal`
/// filters out a child equal to `start` only on the very first child
/// computation, to avoid immediately re-finding the node navigation began
/// from (§4.E 2a, "for NORMAL mode when descending from start"); the other
/// modes never apply that filter. Leaving `root`'s scope always yields
/// `None`, regardless of mode — the mode distinction there is a signal to
/// the *caller* (e.g. "wrap to the next window"), not a different return
/// value from this function.
pub fn find_neighbor<N: NavNode>(root: &N, start: &N, forward: bool, mode: NeighborMode, include_hidden: bool) -> Option<N> {
    let scope_parent_addr = root.parent().map(|p| p.address());
    let filters_start_on_first_descent = matches!(mode, NeighborMode::Normal);

    let mut current = match mode {
        NeighborMode::RecurseFromRoot => root.clone(),
        _ => start.clone(),
    };
    let mut first_descent = true;

    'outer: for _ in 0..MAX_ITERATIONS {
        let filter_start = first_descent && filters_start_on_first_descent;
        first_descent = false;

        let children = valid_children(&current, start, filter_start, include_hidden);
        if !children.is_empty() {
            current = if forward { children.first().cloned().unwrap() } else { children.last().cloned().unwrap() };
            if current.is_highlightable() {
                return Some(current);
            }
            continue 'outer;
        }

        // Leaf or exhausted: ascend, trying siblings along the way (§4.E 2c-2e).
        loop {
            let parent = current.parent()?;
            if parent.is_null() || Some(parent.address()) == scope_parent_addr {
                return None;
            }

            let siblings = valid_children(&parent, start, false, include_hidden);
            let my_index = siblings.iter().position(|s| s.address() == current.address());
            let next_sibling = my_index.and_then(|i| {
                if forward {
                    siblings.get(i + 1)
                } else if i > 0 {
                    siblings.get(i - 1)
                } else {
                    None
                }
            });

            match next_sibling {
                Some(sibling) => {
                    current = sibling.clone();
                    if current.is_highlightable() {
                        return Some(current);
                    }
                    continue 'outer;
                }
                None => {
                    current = parent;
                    // keep ascending
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    // --- Mock tree for DFS tests, independent of any transport ------------

    #[derive(Clone)]
    struct MockNode(Rc<MockInner>);

    struct MockInner {
        id: u32,
        defunct: StdRefCell<bool>,
        showing: bool,
        highlightable: bool,
        children: StdRefCell<Vec<MockNode>>,
        parent: StdRefCell<Weak<MockInner>>,
    }

    impl MockNode {
        fn leaf(id: u32, showing: bool, highlightable: bool) -> MockNode {
            MockNode(Rc::new(MockInner {
                id,
                defunct: StdRefCell::new(false),
                showing,
                highlightable,
                children: StdRefCell::new(Vec::new()),
                parent: StdRefCell::new(Weak::new()),
            }))
        }

        fn add_child(&self, child: &MockNode) {
            *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            self.0.children.borrow_mut().push(child.clone());
        }
    }

    impl NavNode for MockNode {
        fn address(&self) -> Address {
            Address::for_object_id(":1.1", self.0.id)
        }
        fn is_defunct(&self) -> bool {
            *self.0.defunct.borrow()
        }
        fn is_showing(&self) -> bool {
            self.0.showing
        }
        fn is_highlightable(&self) -> bool {
            self.0.highlightable
        }
        fn children(&self) -> Vec<Self> {
            self.0.children.borrow().clone()
        }
        fn parent(&self) -> Option<Self> {
            self.0.parent.borrow().upgrade().map(MockNode)
        }
    }

    /// window[panel[button(H), label], panel2[slider(H)]]
    fn sample_tree() -> (MockNode, MockNode, MockNode, MockNode) {
        let window = MockNode::leaf(1, true, false);
        let panel = MockNode::leaf(2, true, false);
        let button = MockNode::leaf(3, true, true);
        let label = MockNode::leaf(4, true, false);
        let panel2 = MockNode::leaf(5, true, false);
        let slider = MockNode::leaf(6, true, true);

        window.add_child(&panel);
        window.add_child(&panel2);
        panel.add_child(&button);
        panel.add_child(&label);
        panel2.add_child(&slider);

        (window, button, panel2, slider)
    }

    #[test]
    fn recurse_from_root_finds_first_highlightable() {
        let (window, button, _panel2, _slider) = sample_tree();
        let found = find_neighbor(&window, &window, true, NeighborMode::RecurseFromRoot, false).unwrap();
        assert_eq!(found.address(), button.address());
    }

    #[test]
    fn normal_forward_from_button_finds_slider() {
        let (window, button, _panel2, slider) = sample_tree();
        let found = find_neighbor(&window, &button, true, NeighborMode::Normal, false).unwrap();
        assert_eq!(found.address(), slider.address());
    }

    #[test]
    fn normal_backward_from_slider_finds_button() {
        let (window, button, _panel2, slider) = sample_tree();
        let found = find_neighbor(&window, &slider, false, NeighborMode::Normal, false).unwrap();
        assert_eq!(found.address(), button.address());
    }

    #[test]
    fn forward_from_last_highlightable_returns_none_in_normal_mode() {
        let (window, _button, _panel2, slider) = sample_tree();
        assert!(find_neighbor(&window, &slider, true, NeighborMode::Normal, false).is_none());
    }

    #[test]
    fn recurse_to_outside_also_returns_none_leaving_scope() {
        let (window, _button, _panel2, slider) = sample_tree();
        assert!(find_neighbor(&window, &slider, true, NeighborMode::RecurseToOutside, false).is_none());
    }

    #[test]
    fn defunct_nodes_are_skipped_without_aborting() {
        let (window, button, _panel2, slider) = sample_tree();
        *slider.0.defunct.borrow_mut() = true;
        // Forward from button should now fail to find anything past panel2's subtree.
        assert!(find_neighbor(&window, &button, true, NeighborMode::Normal, false).is_none());
    }

    #[test]
    fn hidden_nodes_excluded_unless_include_hidden() {
        let window = MockNode::leaf(1, true, false);
        let hidden_button = MockNode::leaf(2, false, true);
        window.add_child(&hidden_button);

        assert!(find_neighbor(&window, &window, true, NeighborMode::RecurseFromRoot, false).is_none());
        let found = find_neighbor(&window, &window, true, NeighborMode::RecurseFromRoot, true).unwrap();
        assert_eq!(found.address(), hidden_button.address());
    }

    #[test]
    fn cyclic_graph_is_tolerated_via_loop_guard() {
        let a = MockNode::leaf(1, true, false);
        let b = MockNode::leaf(2, true, true);
        a.add_child(&b);
        b.0.children.borrow_mut().push(a.clone());
        *b.0.parent.borrow_mut() = Rc::downgrade(&a.0);

        // Must terminate (within MAX_ITERATIONS) rather than loop forever.
        let found = find_neighbor(&a, &a, true, NeighborMode::RecurseFromRoot, false);
        assert_eq!(found.unwrap().address(), b.address());
    }

    #[test]
    fn proxy_factory_collapses_identity_while_held() {
        struct NullCtx;
        impl ProxyContext for NullCtx {
            fn client(&self, _endpoint: &str, _path: &str, _interface: &str) -> Box<dyn Client> {
                unimplemented!("not exercised by this test")
            }
            fn include_hidden(&self) -> bool {
                false
            }
        }

        let factory = ProxyFactory::new(Rc::new(NullCtx));
        let addr = Address::for_object_id(":1.1", 7);
        let first = factory.get(addr.clone());
        let second = factory.get(addr.clone());
        assert!(Rc::ptr_eq(&first.0, &second.0));
        assert_eq!(factory.live_count(), 1);

        drop(first);
        drop(second);
        let third = factory.get(addr);
        assert_eq!(factory.live_count(), 1);
        let _ = third;
    }
}
