//! Speech backend trait and implementations.
//!
//! # Overview
//!
//! [`SpeechBackend`] is the capability the narrator consumes: submit one
//! utterance, poll whether audio is still playing, cut playback off.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechBackend>` and shared with the narration worker task.
//!
//! [`SystemSpeech`] is the production implementation wrapping [`tts::Tts`]
//! (the platform speech engine — speech-dispatcher, AVFoundation, WinRT).
//!
//! [`MockSpeech`] (available under `#[cfg(test)]`) is a scripted stub with a
//! call log — the narrator's ordering and overlap tests run against it.

use std::sync::Mutex;

use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// All errors that can arise from the speech subsystem.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// No speech capability exists on this system (engine failed to
    /// initialise, or the stub backend is in use).
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),

    /// The platform engine rejected an operation.
    #[error("speech backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// SpeechBackend trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a text-to-speech engine.
///
/// # Contract
///
/// - [`speak`](Self::speak) is fire-and-forget: it submits the utterance and
///   returns without waiting for playback.  Anything still playing is
///   interrupted.
/// - [`is_speaking`](Self::is_speaking) samples the engine's "currently
///   producing audio" flag.  There is no completion event; callers poll.
/// - [`stop`](Self::stop) cuts off playback immediately.
/// - [`is_available`](Self::is_available) reports whether the capability
///   exists at all; when it returns `false` the other calls fail.
pub trait SpeechBackend: Send + Sync {
    /// Submit `text` for playback, interrupting any current utterance.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Is the engine currently producing audio?
    fn is_speaking(&self) -> Result<bool, SpeechError>;

    /// Cut off any utterance in flight.
    fn stop(&self) -> Result<(), SpeechError>;

    /// Whether a usable engine is present.
    fn is_available(&self) -> bool {
        true
    }
}

// Compile-time assertion: Box<dyn SpeechBackend> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechBackend>) {}
};

// ---------------------------------------------------------------------------
// SystemSpeech
// ---------------------------------------------------------------------------

/// Production backend wrapping the platform engine via [`tts::Tts`].
///
/// `tts::Tts` methods take `&mut self`, so the handle lives behind a
/// `Mutex`; every call is a short synchronous critical section.
pub struct SystemSpeech {
    inner: Mutex<tts::Tts>,
}

impl std::fmt::Debug for SystemSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSpeech").finish_non_exhaustive()
    }
}

// The platform handle inside `tts::Tts` is not declared thread-safe on every
// backend, but all access goes through the Mutex above and the handle is
// never exposed outside it.
// SAFETY: access to the inner Tts is serialized by `self.inner`.
unsafe impl Send for SystemSpeech {}
unsafe impl Sync for SystemSpeech {}

impl SystemSpeech {
    /// Initialise the platform engine and apply the voice policy from
    /// `config`.
    ///
    /// # Errors
    ///
    /// [`SpeechError::Unavailable`] when no platform engine can be
    /// initialised at all.  Voice selection problems are not fatal — the
    /// engine's default voice is kept.
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let mut tts = tts::Tts::default().map_err(|e| SpeechError::Unavailable(e.to_string()))?;
        select_voice(&mut tts, &config.language);
        Ok(Self {
            inner: Mutex::new(tts),
        })
    }
}

/// Pick the first voice whose language tag starts with `language`
/// (case-insensitive); fall back to the first reported voice.  With an
/// empty voice list the engine's default voice is left in place.
fn select_voice(tts: &mut tts::Tts, language: &str) {
    let voices = match tts.voices() {
        Ok(voices) => voices,
        Err(e) => {
            log::warn!("speech: could not list voices ({e}); keeping engine default");
            return;
        }
    };

    if voices.is_empty() {
        return;
    }

    let wanted = language.trim().to_lowercase();
    let voice = voices
        .iter()
        .find(|v| v.language().to_string().to_lowercase().starts_with(&wanted))
        .unwrap_or(&voices[0]);

    log::info!(
        "speech: using voice {} ({})",
        voice.name(),
        voice.language()
    );
    if let Err(e) = tts.set_voice(voice) {
        log::warn!("speech: could not set voice {} ({e})", voice.name());
    }
}

impl SpeechBackend for SystemSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut tts = self.inner.lock().unwrap();
        tts.speak(text, true)
            .map(|_| ())
            .map_err(|e| SpeechError::Backend(e.to_string()))
    }

    fn is_speaking(&self) -> Result<bool, SpeechError> {
        let mut tts = self.inner.lock().unwrap();
        tts.is_speaking()
            .map_err(|e| SpeechError::Backend(e.to_string()))
    }

    fn stop(&self) -> Result<(), SpeechError> {
        let mut tts = self.inner.lock().unwrap();
        tts.stop()
            .map(|_| ())
            .map_err(|e| SpeechError::Backend(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockSpeech  (test-only)
// ---------------------------------------------------------------------------

/// A scripted test double.
///
/// After each `speak`, `is_speaking` reports `true` for a configured number
/// of polls, then `false` — simulating an utterance of known length.  Every
/// call is recorded so tests can assert ordering, overlap and stop counts.
#[cfg(test)]
pub struct MockSpeech {
    state: Mutex<MockState>,
    polls_per_utterance: usize,
    available: bool,
}

#[cfg(test)]
#[derive(Default)]
struct MockState {
    spoken: Vec<String>,
    remaining_polls: usize,
    overlapping_speaks: usize,
    stops: usize,
}

#[cfg(test)]
impl MockSpeech {
    /// Each utterance reports "speaking" for `polls_per_utterance` polls.
    pub fn new(polls_per_utterance: usize) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            polls_per_utterance,
            available: true,
        }
    }

    /// A backend with no speech capability at all.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0)
        }
    }

    /// A backend whose utterances never report completion.
    pub fn never_finishes() -> Self {
        Self::new(usize::MAX)
    }

    /// Texts spoken so far, in submission order.
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    /// How many `speak` calls arrived while a previous utterance was still
    /// reporting "speaking".  A correct scheduler keeps this at zero.
    pub fn overlapping_speaks(&self) -> usize {
        self.state.lock().unwrap().overlapping_speaks
    }

    /// Number of `stop` calls received.
    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}

#[cfg(test)]
impl SpeechBackend for MockSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable("mock backend disabled".into()));
        }
        let mut state = self.state.lock().unwrap();
        if state.remaining_polls > 0 {
            state.overlapping_speaks += 1;
        }
        state.spoken.push(text.to_string());
        state.remaining_polls = self.polls_per_utterance;
        Ok(())
    }

    fn is_speaking(&self) -> Result<bool, SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable("mock backend disabled".into()));
        }
        let mut state = self.state.lock().unwrap();
        if state.remaining_polls > 0 {
            state.remaining_polls -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn stop(&self) -> Result<(), SpeechError> {
        let mut state = self.state.lock().unwrap();
        state.remaining_polls = 0;
        state.stops += 1;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_spoken_texts_in_order() {
        let mock = MockSpeech::new(0);
        mock.speak("one").unwrap();
        mock.speak("two").unwrap();
        assert_eq!(mock.spoken(), vec!["one", "two"]);
    }

    #[test]
    fn mock_reports_speaking_for_configured_polls() {
        let mock = MockSpeech::new(2);
        mock.speak("hello").unwrap();
        assert!(mock.is_speaking().unwrap());
        assert!(mock.is_speaking().unwrap());
        assert!(!mock.is_speaking().unwrap());
    }

    #[test]
    fn mock_counts_overlapping_speaks() {
        let mock = MockSpeech::new(3);
        mock.speak("first").unwrap();
        // Second submission while the first is still "playing".
        mock.speak("second").unwrap();
        assert_eq!(mock.overlapping_speaks(), 1);
    }

    #[test]
    fn mock_stop_clears_speaking_flag() {
        let mock = MockSpeech::new(5);
        mock.speak("long utterance").unwrap();
        mock.stop().unwrap();
        assert!(!mock.is_speaking().unwrap());
        assert_eq!(mock.stops(), 1);
    }

    #[test]
    fn unavailable_mock_rejects_speak() {
        let mock = MockSpeech::unavailable();
        assert!(!mock.is_available());
        assert!(matches!(
            mock.speak("x").unwrap_err(),
            SpeechError::Unavailable(_)
        ));
    }

    #[test]
    fn box_dyn_speech_backend_compiles() {
        // If this test compiles, the trait is object-safe.
        let backend: Box<dyn SpeechBackend> = Box::new(MockSpeech::new(0));
        let _ = backend.is_available();
    }
}
