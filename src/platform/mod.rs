//! Platform shim: main-thread scheduling and diagnostic output abstracted
//! behind a record of optional callbacks (§4.J). Grounded on
//! `original_source/accessibility/api/log.h`'s pluggable `LogFunction` and
//! on the bridge's need for a repeating-timer primitive (§4.D retry timers,
//! §4.I scheduler tick).

use std::sync::Arc;

/// Log level, mirroring `original_source/accessibility/api/log.h`'s
/// `LogLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

pub type LogSink = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;
pub type IdleCallback = Box<dyn FnOnce() + Send>;
pub type TimerTick = Arc<dyn Fn() -> bool + Send + Sync>;

/// A single record of optional host callbacks (§4.J). Every field is
/// optional so embedders may override only what they need; unset fields
/// fall back to the defaults constructed by [`PlatformCallbacks::default`].
#[derive(Clone)]
pub struct PlatformCallbacks {
    pub add_idle: Option<Arc<dyn Fn(IdleCallback) + Send + Sync>>,
    pub remove_idle: Option<Arc<dyn Fn() + Send + Sync>>,
    pub create_timer: Option<Arc<dyn Fn(u64, TimerTick) -> TimerId + Send + Sync>>,
    pub cancel_timer: Option<Arc<dyn Fn(TimerId) + Send + Sync>>,
    pub is_timer_running: Option<Arc<dyn Fn(TimerId) -> bool + Send + Sync>>,
    pub get_toolkit_version: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    pub get_app_name: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    pub is_host_available: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
    pub on_enable_auto_init: Option<Arc<dyn Fn() + Send + Sync>>,
    pub log_sink: LogSink,
}

/// Opaque handle to a platform timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

impl Default for PlatformCallbacks {
    fn default() -> Self {
        Self {
            add_idle: None,
            remove_idle: None,
            create_timer: None,
            cancel_timer: None,
            is_timer_running: None,
            get_toolkit_version: None,
            get_app_name: None,
            is_host_available: None,
            on_enable_auto_init: None,
            log_sink: default_log_sink(),
        }
    }
}

/// The default log sink writes through `tracing`: DEBUG/INFO/WARNING/ERROR
/// map to `tracing::{debug,info,warn,error}` events on the `"atspi_bridge"`
/// target (§4.J supplemental). Replaces only the default sink; hosts may
/// install their own via [`PlatformCallbacks::log_sink`].
pub fn default_log_sink() -> LogSink {
    Arc::new(|level, message| match level {
        LogLevel::Debug => tracing::debug!(target: "atspi_bridge", "{message}"),
        LogLevel::Info => tracing::info!(target: "atspi_bridge", "{message}"),
        LogLevel::Warning => tracing::warn!(target: "atspi_bridge", "{message}"),
        LogLevel::Error => tracing::error!(target: "atspi_bridge", "{message}"),
    })
}

impl PlatformCallbacks {
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        (self.log_sink)(level, message.as_ref());
    }

    pub fn is_host_available(&self) -> bool {
        self.is_host_available.as_ref().map(|f| f()).unwrap_or(true)
    }

    pub fn get_app_name(&self) -> String {
        self.get_app_name.as_ref().map(|f| f()).unwrap_or_default()
    }

    pub fn get_toolkit_version(&self) -> String {
        self.get_toolkit_version.as_ref().map(|f| f()).unwrap_or_default()
    }
}

/// A scoped repeating timer handle: construction delegates to
/// `create_timer`; destruction calls `cancel_timer`; re-starting cancels
/// the prior handle (§4.J).
pub struct RepeatingTimer {
    platform: PlatformCallbacks,
    id: Option<TimerId>,
}

impl RepeatingTimer {
    pub fn new(platform: PlatformCallbacks) -> Self {
        Self { platform, id: None }
    }

    /// Starts (or restarts) the timer at `interval_ms`, invoking `tick` on
    /// each firing. `tick` returns whether it should keep running; `false`
    /// stops the timer from firing again.
    pub fn start(&mut self, interval_ms: u64, tick: TimerTick) {
        self.stop();
        if let Some(create) = &self.platform.create_timer {
            self.id = Some(create(interval_ms, tick));
        }
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(cancel) = &self.platform.cancel_timer {
                cancel(id);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match (&self.id, &self.platform.is_timer_running) {
            (Some(id), Some(check)) => check(*id),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
