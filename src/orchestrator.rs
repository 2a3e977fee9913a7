//! Screen-reader service orchestrator (§4.H): event policy, gesture policy,
//! key policy, reading-material composition and TTS/feedback dispatch, plus
//! the TV profile variant. Grounded on
//! `original_source/accessibility/internal/service/screen-reader/
//! screen-reader-service.cpp`'s `onAccessibilityEvent`/`onGesture`/
//! `onKeyEvent`/`readNode`; collaborator trait shapes from
//! `original_source/accessibility/api/feedback-provider.h` and
//! `settings-provider.h`.

use crate::composer::{compose, ComposerConfig};
use crate::error::Result;
use crate::model::{
    AccessibilityEvent, AccessibilityEventKind, GestureType, KeyEvent, KeyState, ScreenReaderSettings, SoundType,
};
use crate::proxy::{find_neighbor, NeighborMode, NodeProxy};
use crate::state::State;
use crate::tts::{TtsEngine, TtsQueue};

/// Non-speech feedback capability (sounds played in response to navigation
/// and gesture events), mirroring `feedback-provider.h`'s `SoundType` player.
pub trait FeedbackProvider: Send {
    fn play_sound(&self, sound: SoundType) -> Result<()>;
}

/// A feedback provider that plays nothing, used when no driver is attached
/// (tests, headless bring-up).
pub struct NullFeedback;

impl FeedbackProvider for NullFeedback {
    fn play_sound(&self, _sound: SoundType) -> Result<()> {
        Ok(())
    }
}

/// Which orchestrator variant is running (§4.H "a distinct TV variant").
/// The TV profile omits gesture handling, feedback, and direct-reading
/// support, and switches the highlight-event detail string and composer
/// profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Standard,
    Tv,
}

impl Profile {
    fn composer_config(self) -> ComposerConfig {
        match self {
            Profile::Standard => ComposerConfig::default(),
            Profile::Tv => ComposerConfig { suppress_touch_hints: true, include_tv_traits: true },
        }
    }

    /// STATE_CHANGED detail string that drives a re-read (§4.H: "highlighted"
    /// for the standard profile, "focused" for TV).
    fn highlight_detail(self) -> &'static str {
        match self {
            Profile::Standard => "highlighted",
            Profile::Tv => "focused",
        }
    }
}

/// Converts UI events and platform gestures into navigation decisions and
/// reading-material composition, drives the TTS queue and feedback outputs
/// (§4.H). Generic over the TTS engine so callers can plug in any
/// [`TtsEngine`] implementation; the feedback provider and navigation
/// scope/cursor are held as trait objects / concrete [`NodeProxy`] values
/// since neither needs to vary per call site the way the engine does.
pub struct Orchestrator<E: TtsEngine> {
    tts: TtsQueue<E>,
    feedback: Box<dyn FeedbackProvider>,
    settings: ScreenReaderSettings,
    profile: Profile,
    include_hidden: bool,
    /// Scope root for navigation (typically the active window); `None`
    /// before the orchestrator has been handed a tree to navigate.
    root: Option<NodeProxy>,
    /// The current navigation cursor.
    current: Option<NodeProxy>,
}

impl<E: TtsEngine> Orchestrator<E> {
    pub fn new(tts: TtsQueue<E>, feedback: Box<dyn FeedbackProvider>, settings: ScreenReaderSettings, profile: Profile) -> Self {
        Self { tts, feedback, settings, profile, include_hidden: false, root: None, current: None }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn tts(&self) -> &TtsQueue<E> {
        &self.tts
    }

    pub fn tts_mut(&mut self) -> &mut TtsQueue<E> {
        &mut self.tts
    }

    pub fn current_node(&self) -> Option<&NodeProxy> {
        self.current.as_ref()
    }

    pub fn set_include_hidden(&mut self, include_hidden: bool) {
        self.include_hidden = include_hidden;
    }

    /// Sets the navigation scope (window root) and cursor (current focus).
    pub fn set_scope(&mut self, root: NodeProxy, current: NodeProxy) {
        self.root = Some(root);
        self.current = Some(current);
    }

    /// Re-reads settings on a `settings-changed` notification (§4.H
    /// supplemental: "reads a SettingsProvider capability at construction
    /// and on a settings-changed notification").
    pub fn on_settings_changed(&mut self, settings: ScreenReaderSettings) {
        self.settings = settings;
    }

    /// Event policy (§4.H `on-event`).
    pub fn on_event(&mut self, event: &AccessibilityEvent) -> Result<()> {
        match event.kind {
            AccessibilityEventKind::StateChanged
                if event.detail == self.profile.highlight_detail() && event.detail1 == 1 =>
            {
                if let Some(node) = self.current.clone() {
                    self.read_node(&node)?;
                    let sound = if node.states().contains(State::Focusable) {
                        SoundType::HighlightActionable
                    } else {
                        SoundType::Highlight
                    };
                    self.play_sound(sound)?;
                }
            }
            AccessibilityEventKind::PropertyChanged => {
                if let Some(node) = self.current.clone() {
                    self.read_node(&node)?;
                }
            }
            AccessibilityEventKind::WindowChanged => {
                self.play_sound(SoundType::WindowStateChange)?;
            }
            // Other event kinds are observed but do not drive output (§4.H).
            _ => {}
        }
        Ok(())
    }

    /// Gesture policy (§4.H `on-gesture`). A no-op on the TV profile, which
    /// has no touch surface.
    pub fn on_gesture(&mut self, gesture: GestureType) -> Result<()> {
        if self.profile == Profile::Tv {
            return Ok(());
        }
        match gesture {
            GestureType::OneFingerFlickRight => self.navigate(true)?,
            GestureType::OneFingerFlickLeft => self.navigate(false)?,
            GestureType::OneFingerDoubleTap => {
                if let Some(node) = self.current.clone() {
                    let _ = node.do_action("activate");
                    self.play_sound(SoundType::Action)?;
                }
            }
            GestureType::TwoFingersSingleTap => self.tts.toggle_pause()?,
            GestureType::ThreeFingersSingleTap => self.review_from_top()?,
            GestureType::OneFingerFlickUp | GestureType::OneFingerFlickDown | GestureType::OneFingerSingleTap => {}
        }
        Ok(())
    }

    /// Key policy (§4.H): `Back` navigates previous and reads; `Power`
    /// purges the TTS queue; everything else passes through untouched.
    pub fn on_key_event(&mut self, key: &KeyEvent) -> Result<()> {
        if key.state != KeyState::Down {
            return Ok(());
        }
        match key.key_name.as_str() {
            "Back" => self.navigate(false)?,
            "Power" => self.tts.purge_all()?,
            _ => {}
        }
        Ok(())
    }

    /// `navigate-next`/`navigate-prev`: advances the cursor via the DFS
    /// neighbor search and reads the result, or plays FOCUS_CHAIN_END when
    /// none is found (§4.H, §8 scenario 2).
    fn navigate(&mut self, forward: bool) -> Result<()> {
        let (Some(root), Some(current)) = (self.root.clone(), self.current.clone()) else {
            return Ok(());
        };
        match find_neighbor(&root, &current, forward, NeighborMode::Normal, self.include_hidden) {
            Some(next) => {
                self.current = Some(next.clone());
                self.read_node(&next)?;
                self.play_sound(SoundType::Highlight)?;
            }
            None => self.play_sound(SoundType::FocusChainEnd)?,
        }
        Ok(())
    }

    /// THREE_FINGERS_SINGLE_TAP: "review from top" — re-navigates to the
    /// first highlightable node in the active window and reads it (§4.H).
    fn review_from_top(&mut self) -> Result<()> {
        let Some(root) = self.root.clone() else { return Ok(()) };
        if let Some(first) = find_neighbor(&root, &root, true, NeighborMode::RecurseFromRoot, self.include_hidden) {
            self.current = Some(first.clone());
            self.read_node(&first)?;
        }
        Ok(())
    }

    /// Fetches `node`'s reading material in one batch, composes it, and
    /// enqueues with discardable=true, interrupt=true (§4.H).
    pub fn read_node(&mut self, node: &NodeProxy) -> Result<()> {
        let material = node.reading_material();
        let text = compose(&material, self.profile.composer_config());
        self.tts.enqueue(&text, true, true)
    }

    fn play_sound(&self, sound: SoundType) -> Result<()> {
        if !self.settings.sound_feedback {
            return Ok(());
        }
        self.feedback.play_sound(sound)
    }

    // --- Direct-reading forwarding (§4.H supplemental, §6 DirectReading) --
    //
    // Mirrors `org.tizen.DirectReading`'s `ReadCommand`/`PauseResume`/
    // `StopReading` surface so an external "read this selection aloud"
    // client drives the same queue the gesture/event policy uses, without
    // bypassing its chunking and purge semantics. Not exposed on the TV
    // profile, which has no direct-reading support.

    pub fn direct_say(&mut self, text: &str, discardable: bool) -> Result<()> {
        if self.profile == Profile::Tv {
            return Ok(());
        }
        self.tts.enqueue(text, discardable, false)
    }

    pub fn direct_pause(&mut self) -> Result<()> {
        if self.profile == Profile::Tv {
            return Ok(());
        }
        self.tts.pause()
    }

    pub fn direct_resume(&mut self) -> Result<()> {
        if self.profile == Profile::Tv {
            return Ok(());
        }
        self.tts.resume()
    }

    pub fn direct_stop_reading(&mut self) -> Result<()> {
        if self.profile == Profile::Tv {
            return Ok(());
        }
        self.tts.purge_all()
    }
}
