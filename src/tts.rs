//! TTS command queue: a driver-agnostic policy layer over a single
//! `TtsEngine` capability (§4.G). Near-direct port of
//! `original_source/accessibility/internal/service/screen-reader/
//! tts-command-queue.h/.cpp` — the chunking algorithm, `purgeDiscardable`/
//! `purgeAll`/`pause`/`resume`/`onUtteranceCompleted`/`speakNext` control
//! flow are all transcribed here into idiomatic Rust.

use std::collections::VecDeque;

use crate::error::Result;

/// Default chunk size (§4.G): matches the source's `DEFAULT_MAX_CHUNK_SIZE`.
const DEFAULT_MAX_CHUNK_SIZE: usize = 300;

/// A single TTS utterance option set; `id` is engine-assigned on `speak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeakOptions {
    pub discardable: bool,
}

/// The single capability this queue drives. Implementations own the actual
/// speech backend; the queue only sequences calls onto it.
pub trait TtsEngine: Send {
    fn speak(&mut self, text: &str, options: SpeakOptions) -> Result<u64>;
    fn stop(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<bool>;
    fn resume(&mut self) -> Result<bool>;
    fn purge(&mut self, only_discardable: bool) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Command {
    text: String,
    discardable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub max_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE }
    }
}

/// FIFO of pending commands with at-most-one in flight (§4.G).
pub struct TtsQueue<E: TtsEngine> {
    engine: E,
    config: Config,
    pending: VecDeque<Command>,
    paused: bool,
    speaking: bool,
    in_flight_id: Option<u64>,
}

impl<E: TtsEngine> TtsQueue<E> {
    /// Constructs a queue driving `engine`. The source registers the queue
    /// as the engine's `on-completed` callback at construction time (one
    /// queue per engine instance); this crate's engine trait has no
    /// built-in callback registration, so callers MUST route the engine's
    /// completion notifications back through [`TtsQueue::on_completed`].
    pub fn new(engine: E, config: Config) -> Self {
        Self {
            engine,
            config,
            pending: VecDeque::new(),
            paused: false,
            speaking: false,
            in_flight_id: None,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Splits `text` into chunks of at most `max` characters, preferring to
    /// break at the rightmost space within range; force-splits when no
    /// space is found (§4.G step 3).
    fn chunk(text: &str, max: usize) -> Vec<String> {
        if max == 0 || text.len() <= max {
            return vec![text.to_string()];
        }
        let bytes = text.as_bytes();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < bytes.len() {
            let remaining = bytes.len() - start;
            if remaining <= max {
                chunks.push(text[start..].to_string());
                break;
            }
            let window = &text[start..start + max];
            match window.rfind(' ') {
                Some(space_idx) => {
                    chunks.push(text[start..start + space_idx].to_string());
                    start += space_idx + 1;
                }
                None => {
                    chunks.push(text[start..start + max].to_string());
                    start += max;
                }
            }
        }
        chunks
    }

    /// Enqueues `text` for speech. Empty text is ignored. When `interrupt`
    /// is set, discardable commands are purged first (§4.G steps 1-5).
    pub fn enqueue(&mut self, text: &str, discardable: bool, interrupt: bool) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if interrupt {
            self.purge_discardable()?;
        }
        for chunk in Self::chunk(text, self.config.max_chunk_size) {
            self.pending.push_back(Command { text: chunk, discardable });
        }
        if !self.speaking && !self.paused {
            self.speak_next()?;
        }
        Ok(())
    }

    fn speak_next(&mut self) -> Result<()> {
        let Some(command) = self.pending.pop_front() else { return Ok(()) };
        let id = self.engine.speak(&command.text, SpeakOptions { discardable: command.discardable })?;
        self.in_flight_id = Some(id);
        self.speaking = true;
        Ok(())
    }

    /// Drops discardable pending commands and, if currently speaking, stops
    /// the engine and clears the speaking flag; resumes with the next
    /// surviving command if any (§4.G).
    pub fn purge_discardable(&mut self) -> Result<()> {
        self.engine.purge(true)?;
        self.pending.retain(|c| !c.discardable);
        if self.speaking {
            self.engine.stop()?;
            self.speaking = false;
            self.in_flight_id = None;
        }
        if !self.pending.is_empty() && !self.paused {
            self.speak_next()?;
        }
        Ok(())
    }

    /// Stops the engine and clears the queue entirely, including
    /// non-discardable commands (§4.G).
    pub fn purge_all(&mut self) -> Result<()> {
        self.engine.stop()?;
        self.pending.clear();
        self.speaking = false;
        self.in_flight_id = None;
        Ok(())
    }

    /// Sets the paused flag; forwards to the engine only while actually
    /// speaking (§4.G).
    pub fn pause(&mut self) -> Result<()> {
        self.paused = true;
        if self.speaking {
            self.engine.pause()?;
        }
        Ok(())
    }

    /// Clears the paused flag; forwards to the engine while speaking,
    /// otherwise starts the next pending command if any (§4.G).
    pub fn resume(&mut self) -> Result<()> {
        self.paused = false;
        if self.speaking {
            self.engine.resume()?;
        } else if !self.pending.is_empty() {
            self.speak_next()?;
        }
        Ok(())
    }

    /// Toggles pause/resume, used by the orchestrator's two-finger-tap
    /// gesture (§4.H).
    pub fn toggle_pause(&mut self) -> Result<()> {
        if self.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Engine-invoked completion hook: if `id` is the in-flight command,
    /// clears the speaking flag and starts the next command unless paused
    /// or empty (§4.G).
    pub fn on_completed(&mut self, id: u64) -> Result<()> {
        if self.in_flight_id != Some(id) {
            return Ok(());
        }
        self.speaking = false;
        self.in_flight_id = None;
        if !self.paused && !self.pending.is_empty() {
            self.speak_next()?;
        }
        Ok(())
    }
}

/// An engine that speaks nothing: `speak` hands back a fresh id and never
/// signals its completion, so a queue driven by it only ever speaks its
/// first-enqueued chunk (no callback loop exists to advance past it). Used
/// when no speech driver is attached (dummy-transport bring-up, tests); a
/// real driver wires its completion notifications back through
/// [`TtsQueue::on_completed`] instead.
#[derive(Default)]
pub struct NullTtsEngine {
    next_id: u64,
}

impl TtsEngine for NullTtsEngine {
    fn speak(&mut self, _text: &str, _options: SpeakOptions) -> Result<u64> {
        self.next_id += 1;
        Ok(self.next_id)
    }
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
    fn pause(&mut self) -> Result<bool> {
        Ok(true)
    }
    fn resume(&mut self) -> Result<bool> {
        Ok(true)
    }
    fn purge(&mut self, _only_discardable: bool) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingEngine {
        spoken: Vec<(String, bool)>,
        stop_calls: u32,
        pause_calls: u32,
        resume_calls: u32,
        purge_calls: Vec<bool>,
        next_id: AtomicU64,
    }

    impl TtsEngine for RecordingEngine {
        fn speak(&mut self, text: &str, options: SpeakOptions) -> Result<u64> {
            self.spoken.push((text.to_string(), options.discardable));
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }
        fn stop(&mut self) -> Result<()> {
            self.stop_calls += 1;
            Ok(())
        }
        fn pause(&mut self) -> Result<bool> {
            self.pause_calls += 1;
            Ok(true)
        }
        fn resume(&mut self) -> Result<bool> {
            self.resume_calls += 1;
            Ok(true)
        }
        fn purge(&mut self, only_discardable: bool) -> Result<()> {
            self.purge_calls.push(only_discardable);
            Ok(())
        }
    }

    #[test]
    fn chunk_splits_at_rightmost_space_within_range() {
        let text = "the quick brown fox jumps over the lazy dog";
        let chunks = TtsQueue::<RecordingEngine>::chunk(text, 20);
        assert!(chunks.iter().all(|c| c.len() <= 20));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn chunk_force_splits_when_no_space_in_range() {
        let text = "a".repeat(50);
        let chunks = TtsQueue::<RecordingEngine>::chunk(&text, 20);
        assert_eq!(chunks, vec!["a".repeat(20), "a".repeat(20), "a".repeat(10)]);
    }

    #[test]
    fn chunk_below_limit_is_single_chunk() {
        let chunks = TtsQueue::<RecordingEngine>::chunk("short", 300);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn enqueue_starts_speaking_when_idle() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("hello", true, false).unwrap();
        assert!(queue.is_speaking());
        assert_eq!(queue.engine.spoken, vec![("hello".to_string(), true)]);
    }

    #[test]
    fn enqueue_empty_text_is_ignored() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("", true, false).unwrap();
        assert!(!queue.is_speaking());
        assert!(queue.engine.spoken.is_empty());
    }

    #[test]
    fn second_enqueue_while_speaking_waits_in_queue() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        queue.enqueue("second", false, false).unwrap();
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.engine.spoken.len(), 1);
    }

    #[test]
    fn on_completed_advances_to_next_pending_command() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        queue.enqueue("second", false, false).unwrap();
        let in_flight = queue.in_flight_id.unwrap();
        queue.on_completed(in_flight).unwrap();
        assert!(queue.is_speaking());
        assert_eq!(queue.engine.spoken.len(), 2);
        assert_eq!(queue.engine.spoken[1].0, "second");
    }

    #[test]
    fn on_completed_ignores_stale_id() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        let in_flight = queue.in_flight_id.unwrap();
        queue.on_completed(in_flight + 999).unwrap();
        assert!(queue.is_speaking());
    }

    #[test]
    fn interrupt_purges_discardable_before_enqueue() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("discardable one", true, false).unwrap();
        queue.enqueue("important", false, false).unwrap();
        queue.enqueue("interrupting", true, true).unwrap();
        assert_eq!(queue.engine.purge_calls, vec![true]);
        // The non-discardable "important" command must survive the purge,
        // resuming as the next spoken command rather than being dropped.
        assert!(queue.engine.spoken.iter().any(|(text, _)| text == "important"));
    }

    #[test]
    fn purge_discardable_stops_in_flight_discardable_command() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("discardable", true, false).unwrap();
        assert!(queue.is_speaking());
        queue.purge_discardable().unwrap();
        assert_eq!(queue.engine.stop_calls, 1);
    }

    #[test]
    fn purge_all_clears_non_discardable_commands_too() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        queue.enqueue("second", false, false).unwrap();
        queue.purge_all().unwrap();
        assert_eq!(queue.pending_len(), 0);
        assert!(!queue.is_speaking());
        assert_eq!(queue.engine.stop_calls, 1);
    }

    #[test]
    fn pause_then_resume_round_trips_without_losing_queue() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        queue.pause().unwrap();
        assert!(queue.is_paused());
        assert_eq!(queue.engine.pause_calls, 1);
        queue.resume().unwrap();
        assert!(!queue.is_paused());
        assert_eq!(queue.engine.resume_calls, 1);
    }

    #[test]
    fn resume_while_idle_and_paused_starts_next_pending() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.pause().unwrap();
        queue.enqueue("queued while paused", false, false).unwrap();
        assert!(!queue.is_speaking());
        queue.resume().unwrap();
        assert!(queue.is_speaking());
    }

    #[test]
    fn toggle_pause_alternates_state() {
        let mut queue = TtsQueue::new(RecordingEngine::default(), Config::default());
        queue.enqueue("first", false, false).unwrap();
        queue.toggle_pause().unwrap();
        assert!(queue.is_paused());
        queue.toggle_pause().unwrap();
        assert!(!queue.is_paused());
    }
}
