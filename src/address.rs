use serde::{Deserialize, Serialize};

/// Fixed prefix every non-null accessible object path starts with (§6).
pub const ACCESSIBLE_PATH_PREFIX: &str = "/org/a11y/atspi/accessible/";
/// Alias for the application root object.
pub const ROOT_PATH: &str = "/org/a11y/atspi/accessible/root";
/// The null-address sentinel path; round-trips as [`Address::null`] regardless of bus name.
pub const NULL_PATH: &str = "/org/a11y/atspi/null";

/// An opaque identifier of a remote accessible: an ordered pair of
/// (bus-or-endpoint-name, object-path). Copyable value type (§3).
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct Address {
    pub bus: String,
    pub path: String,
}

impl Address {
    pub fn new(bus: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bus: bus.into(),
            path: path.into(),
        }
    }

    /// The null address: (bus, "null"). Compares equal across bridges regardless of `bus`.
    pub fn null(bus: impl Into<String>) -> Self {
        Self::new(bus, NULL_PATH)
    }

    pub fn is_null(&self) -> bool {
        self.path == NULL_PATH
    }

    pub fn root(bus: impl Into<String>) -> Self {
        Self::new(bus, ROOT_PATH)
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH || self.path == "root"
    }

    /// The decimal object-id following the accessible path prefix, if any.
    pub fn object_id(&self) -> Option<u32> {
        self.path
            .strip_prefix(ACCESSIBLE_PATH_PREFIX)
            .and_then(|rest| rest.parse().ok())
    }

    pub fn for_object_id(bus: impl Into<String>, id: u32) -> Self {
        Self::new(bus, format!("{ACCESSIBLE_PATH_PREFIX}{id}"))
    }
}

impl Default for Address {
    /// The null address on an empty bus, used as a safe placeholder field value.
    fn default() -> Self {
        Self::new("", NULL_PATH)
    }
}

/// The null address compares equal across bridges: only path identity matters,
/// and any two null paths are equal regardless of bus name (§3).
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        if self.is_null() && other.is_null() {
            return true;
        }
        self.bus == other.bus && self.path == other.path
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.is_null() {
            NULL_PATH.hash(state);
        } else {
            self.bus.hash(state);
            self.path.hash(state);
        }
    }
}

/// Sanitizes a widget id for use in a proxy socket bus name: any character
/// outside `[A-Za-z0-9_-.]` becomes `_` (§6).
pub fn sanitize_widget_id(widget_id: &str) -> String {
    widget_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `elm.atspi.proxy.socket-<sanitized widget-id>-<pid>` (§6).
pub fn make_bus_name_for_widget(widget_id: &str, pid: u32) -> String {
    format!(
        "elm.atspi.proxy.socket-{}-{}",
        sanitize_widget_id(widget_id),
        pid
    )
}
