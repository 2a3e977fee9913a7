use std::collections::HashMap;

use crate::address::Address;
use crate::role::Role;
use crate::state::StateSet;
use serde::{Deserialize, Serialize};

/// An order-irrelevant mapping from attribute-name to value, keys unique (§3).
pub type Attributes = HashMap<String, String>;

/// Generic rectangle type. Grounded on `original_source/accessibility/api/types.h`'s
/// `Rect<T>` (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T>
where
    T: Copy + PartialOrd + std::ops::Add<Output = T>,
{
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self { x, y, width, height }
    }

    /// Whether this rectangle intersects `other` (§3).
    pub fn intersects(&self, other: &Rect<T>) -> bool {
        !(self.x + self.width <= other.x
            || other.x + other.width <= self.x
            || self.y + self.height <= other.y
            || other.y + other.height <= self.y)
    }

    /// Whether `(px, py)` falls within this rectangle's bounds.
    pub fn contains_point(&self, px: T, py: T) -> bool
    where
        T: PartialOrd,
    {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// A text range: (start-offset, end-offset, content-string) (§3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start_offset: i32,
    pub end_offset: i32,
    pub content: String,
}

/// Coordinate frame for a `Rect`/point query, mirroring AT-SPI's `CoordType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateType {
    Screen,
    Window,
}

/// Z-order layer of a component, mirroring AT-SPI's `ComponentLayer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentLayer {
    Invalid,
    Background,
    Canvas,
    Widget,
    Mdi,
    Popup,
    Overlay,
    Window,
}

/// A relation to one or more other addresses (e.g. LABELLED_BY, CONTROLLED_BY).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationType {
    NullOf,
    LabelFor,
    LabelledBy,
    ControllerFor,
    ControlledBy,
    MemberOf,
    FlowsTo,
    FlowsFrom,
    SubwindowOf,
    Embeds,
    EmbeddedBy,
    PopupFor,
    ParentWindowOf,
    DescriptionFor,
    DescribedBy,
    DetailsFor,
    Details,
    ErrorFor,
    ErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationType,
    pub targets: Vec<Address>,
}

/// Batch snapshot returned by one proxy call; 24 fields (§3). Grounded on
/// `original_source/accessibility/api/node-proxy.h`'s `ReadingMaterial`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingMaterial {
    pub attributes: Attributes,
    pub name: String,
    pub labeled_by_name: String,
    pub text_interface_name: String,
    pub role: Role,
    pub states: StateSet,
    pub localized_name: String,
    pub child_count: i32,
    pub current_value: f64,
    pub formatted_value: String,
    pub min_increment: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub description: String,
    pub index_in_parent: i32,
    pub is_selected_in_parent: bool,
    pub has_checkbox_child: bool,
    pub list_children_count: i32,
    pub first_selected_child_index: i32,
    pub parent_address: Address,
    pub parent_states: StateSet,
    pub parent_child_count: i32,
    pub parent_role: Role,
    pub selected_child_count: i32,
    pub described_by: Address,
}

/// Lighter batch: role-name, name, toolkit-name, attributes, states, extents,
/// value fields (§3). Grounded on `node-proxy.h`'s `NodeInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    pub role_name: String,
    pub name: String,
    pub toolkit_name: String,
    pub attributes: Attributes,
    pub states: StateSet,
    pub screen_extents: Rect<i32>,
    pub window_extents: Rect<i32>,
    pub current_value: f64,
    pub min_increment: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub formatted_value: String,
}

/// A snapshot of one top-level window as seen by the window tracker (§3 supplemental).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub pid: i32,
    pub bus_name: String,
    pub focused: bool,
}

/// Wire shape for a UI event forwarded from a remote application into the
/// dispatcher (§3 supplemental). Grounded on `accessibility-event.h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityEvent {
    pub kind: AccessibilityEventKind,
    pub source: Address,
    pub detail: String,
    pub detail1: i32,
    pub detail2: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessibilityEventKind {
    StateChanged,
    PropertyChanged,
    BoundsChanged,
    ActiveDescendantChanged,
    TextCaretMoved,
    TextChanged,
    MovedOut,
    ScrollStarted,
    ScrollFinished,
    WindowChanged,
}

/// Platform gesture kinds the screen-reader orchestrator reacts to (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureType {
    OneFingerFlickRight,
    OneFingerFlickLeft,
    OneFingerFlickUp,
    OneFingerFlickDown,
    OneFingerSingleTap,
    OneFingerDoubleTap,
    TwoFingersSingleTap,
    ThreeFingersSingleTap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureInfo {
    pub kind: GestureType,
    pub x: f32,
    pub y: f32,
}

/// A key event, mirroring `original_source/accessibility/api/types.h`'s `KeyEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key_name: String,
    pub key_string: String,
    pub key_code: i32,
    pub state: KeyState,
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    Down,
    Up,
}

/// Screen-reader configuration settings, read through `SettingsProvider` (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReaderSettings {
    pub read_description: bool,
    pub haptic_feedback: bool,
    pub keyboard_feedback: bool,
    pub sound_feedback: bool,
    pub lcd_backlight_timeout: i32,
    /// Range 1..15.
    pub tts_speed: i32,
    pub multi_window_nav_enabled: bool,
}

impl Default for ScreenReaderSettings {
    fn default() -> Self {
        Self {
            read_description: true,
            haptic_feedback: true,
            keyboard_feedback: true,
            sound_feedback: true,
            lcd_backlight_timeout: 15,
            tts_speed: 5,
            multi_window_nav_enabled: false,
        }
    }
}

/// Non-speech feedback sound, mirroring `feedback-provider.h`'s `SoundType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundType {
    FocusChainEnd,
    Highlight,
    HighlightActionable,
    Action,
    LongPress,
    ContextMenu,
    WindowStateChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        let c = Rect::new(20, 20, 5, 5);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rect_contains_point() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.contains_point(5, 5));
        assert!(!a.contains_point(10, 10));
    }

    #[test]
    fn reading_material_defaults_to_empty_strings_and_zero_counts() {
        let rm = ReadingMaterial::default();
        assert_eq!(rm.child_count, 0);
        assert!(rm.name.is_empty());
        assert_eq!(rm.parent_address, Address::default());
    }
}
