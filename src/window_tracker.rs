//! Focused-window tracking collaborator consulted by the bridge and by the
//! screen-reader orchestrator's "review from top" gesture (§4.D
//! supplemental). Grounded on
//! `original_source/accessibility/internal/service/window-tracker.h`/`.cpp`.

use crate::model::WindowInfo;
use crate::transport::{Backend, Client, ClientExt};

const WM_BUS: &str = "org.enlightenment.wm";
const WM_PATH: &str = "/org/enlightenment/wm/Proc";
const WM_INTERFACE: &str = "org.enlightenment.wm.proc";
const GET_FOCUS_PROC: &str = "GetFocusProc";

pub type WindowChangedCallback = Box<dyn FnMut(WindowInfo) + 'static>;

/// Learns which top-level window currently has focus; a no-op tracker is
/// used in dummy/local-only mode (§4.D supplemental).
pub trait WindowTracker {
    fn get_focused_window(&self) -> WindowInfo;

    /// In the original, only the focused window is ever actually returned;
    /// `GetVisibleWinInfo` is referenced but not implemented
    /// (`window-tracker.cpp`'s own comment: "In full implementation, this
    /// would call GetVisibleWinInfo and parse the response. For now, return
    /// the focused window only.").
    fn get_visible_windows(&self) -> Vec<WindowInfo> {
        let focused = self.get_focused_window();
        if focused.pid != 0 {
            vec![focused]
        } else {
            Vec::new()
        }
    }

    fn start(&mut self, callback: WindowChangedCallback);
    fn stop(&mut self);
}

/// D-Bus-backed tracker: asks the window manager for the focused process id
/// (`window-tracker.cpp`'s `GetFocusProc` call). Window-manager signal
/// subscription is not wired up, matching the original's own "in full
/// implementation, subscribe to window manager signals" placeholder — so
/// `start`/`stop` only record/clear the callback without ever invoking it.
pub struct DbusWindowTracker {
    client: Box<dyn Client>,
    callback: Option<WindowChangedCallback>,
}

impl DbusWindowTracker {
    pub fn new(backend: &dyn Backend) -> Self {
        Self::with_client(backend.client(WM_BUS, WM_PATH, WM_INTERFACE))
    }

    fn with_client(client: Box<dyn Client>) -> Self {
        Self { client, callback: None }
    }
}

impl WindowTracker for DbusWindowTracker {
    fn get_focused_window(&self) -> WindowInfo {
        match self.client.call_method::<(), i32>(GET_FOCUS_PROC, &()) {
            Ok(pid) => WindowInfo { pid, bus_name: String::new(), focused: true },
            Err(_) => WindowInfo::default(),
        }
    }

    fn start(&mut self, callback: WindowChangedCallback) {
        self.callback = Some(callback);
    }

    fn stop(&mut self) {
        self.callback = None;
    }
}

/// No-op tracker: `get_focused_window` always returns the default (unfocused,
/// pid 0) window, `start`/`stop` are inert. Used when no transport is
/// available (§4.D supplemental).
#[derive(Default)]
pub struct NullWindowTracker;

impl WindowTracker for NullWindowTracker {
    fn get_focused_window(&self) -> WindowInfo {
        WindowInfo::default()
    }

    fn get_visible_windows(&self) -> Vec<WindowInfo> {
        Vec::new()
    }

    fn start(&mut self, _callback: WindowChangedCallback) {}
    fn stop(&mut self) {}
}
