//! Sequential narration scheduler.
//!
//! [`Narrator`] reads an ordered list of texts aloud one at a time through a
//! [`SpeechBackend`].  The backend offers no completion event — only an
//! `is_speaking()` flag — so each utterance goes through a small state
//! machine:
//!
//! ```text
//! Idle ──job starts──▶ Speaking(i)   submit texts[i], fire-and-forget
//!                          │ immediately
//!                          ▼
//!                      Waiting(i)    sample is_speaking() every poll_interval
//!                          │ flag reads false
//!                          ▼
//!                      Settling(i)   wait settle_delay (engines may drop the
//!                          │         flag a moment before audio truly ends)
//!                          ▼
//!                 Speaking(i+1) … or Idle after the last text
//! ```
//!
//! The wait is a timer suspension (`tokio::time::sleep`), not a busy loop,
//! so the scheduler ports directly to an event-driven backend if one ever
//! becomes reliable.
//!
//! [`Narrator::run`] is the worker loop: it owns the single "speech in
//! progress" slot, receives [`NarrationCommand`]s over an mpsc channel, and
//! **preempts** — a narrate request arriving mid-job cuts playback, discards
//! the rest of the running job, and starts the new one, so audio never
//! overlaps.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::SpeechConfig;

use super::backend::{SpeechBackend, SpeechError};

// ---------------------------------------------------------------------------
// NarrationPhase
// ---------------------------------------------------------------------------

/// Where the scheduler currently is.  `index` is the cursor into the job's
/// text list, `total` the job length; both are for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrationPhase {
    /// No narration in flight.
    #[default]
    Idle,
    /// `texts[index]` has been submitted to the engine.
    Speaking { index: usize, total: usize },
    /// Polling for the engine to report it is no longer producing audio.
    Waiting { index: usize, total: usize },
    /// Observing the settle delay before advancing.
    Settling { index: usize, total: usize },
}

impl NarrationPhase {
    /// Returns `true` while a job is in flight.
    pub fn is_busy(&self) -> bool {
        !matches!(self, NarrationPhase::Idle)
    }

    /// One-based progress `(current, total)` for display, `None` when idle.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match *self {
            NarrationPhase::Idle => None,
            NarrationPhase::Speaking { index, total }
            | NarrationPhase::Waiting { index, total }
            | NarrationPhase::Settling { index, total } => Some((index + 1, total)),
        }
    }
}

// ---------------------------------------------------------------------------
// NarrationStatus / SharedNarration
// ---------------------------------------------------------------------------

/// Scheduler state the UI reads each frame.
#[derive(Debug, Clone, Default)]
pub struct NarrationStatus {
    /// Current phase of the running job, or `Idle`.
    pub phase: NarrationPhase,
    /// Message from the most recent failed job, cleared when a new job
    /// starts.
    pub last_error: Option<String>,
}

/// Thread-safe handle to [`NarrationStatus`].
///
/// Cheap to clone.  Lock for a short critical section; never held across an
/// `.await` point.
pub type SharedNarration = Arc<Mutex<NarrationStatus>>;

/// Construct a new [`SharedNarration`] in the idle state.
pub fn new_shared_narration() -> SharedNarration {
    Arc::new(Mutex::new(NarrationStatus::default()))
}

// ---------------------------------------------------------------------------
// NarrationError
// ---------------------------------------------------------------------------

/// Terminal failures of a narration job.  Nothing is retried.
#[derive(Debug, Clone, Error)]
pub enum NarrationError {
    /// No speech capability exists; the job ends before any text is
    /// attempted.
    #[error("no speech backend is available")]
    BackendUnavailable,

    /// The engine never reported completion for `texts[index]` within the
    /// configured bound; the job fails closed instead of hanging.
    #[error("utterance {index} did not finish within the completion timeout")]
    SettleTimeout { index: usize },

    /// The engine rejected an operation mid-job.
    #[error(transparent)]
    Speech(SpeechError),
}

impl From<SpeechError> for NarrationError {
    fn from(e: SpeechError) -> Self {
        match e {
            SpeechError::Unavailable(_) => NarrationError::BackendUnavailable,
            other => NarrationError::Speech(other),
        }
    }
}

// ---------------------------------------------------------------------------
// NarrationCommand
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the narration worker.
#[derive(Debug, Clone)]
pub enum NarrationCommand {
    /// Narrate this snapshot of texts, preempting any running job.
    Narrate(Vec<String>),
    /// Abort the running job, if any, and cut playback.
    Stop,
}

// ---------------------------------------------------------------------------
// NarrationTiming
// ---------------------------------------------------------------------------

/// The scheduler's tunables, resolved from [`SpeechConfig`].
#[derive(Debug, Clone, Copy)]
pub struct NarrationTiming {
    /// How often the engine's speaking flag is sampled.
    pub poll_interval: Duration,
    /// Pause after the flag clears before advancing to the next text.
    pub settle_delay: Duration,
    /// Upper bound on the Waiting phase for a single utterance.
    pub completion_timeout: Duration,
}

impl From<&SpeechConfig> for NarrationTiming {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            completion_timeout: Duration::from_secs(config.completion_timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Narrator
// ---------------------------------------------------------------------------

/// Drives sequential text-to-speech playback.
///
/// Create with [`Narrator::new`], then either call
/// [`narrate`](Narrator::narrate) directly or hand the narrator a command
/// channel via [`run`](Narrator::run) inside a tokio task.
#[derive(Clone)]
pub struct Narrator {
    backend: Arc<dyn SpeechBackend>,
    timing: NarrationTiming,
    status: SharedNarration,
}

impl Narrator {
    /// Create a new narrator.
    ///
    /// * `backend` — the speech capability.
    /// * `timing`  — poll / settle / timeout durations.
    /// * `status`  — shared status slot the UI reads each frame.
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        timing: NarrationTiming,
        status: SharedNarration,
    ) -> Self {
        Self {
            backend,
            timing,
            status,
        }
    }

    // -----------------------------------------------------------------------
    // One job
    // -----------------------------------------------------------------------

    /// Narrate `texts` in order, waiting for each utterance to finish
    /// (including the settle delay) before submitting the next.
    ///
    /// An empty list completes immediately without touching the engine.
    /// On any error the job ends and the phase returns to `Idle`; no
    /// partial retry is attempted.
    pub async fn narrate(&self, texts: &[String]) -> Result<(), NarrationError> {
        {
            let mut status = self.status.lock().unwrap();
            status.last_error = None;
        }

        let result = self.narrate_inner(texts).await;
        self.set_phase(NarrationPhase::Idle);

        if let Err(ref e) = result {
            log::error!("narration: job failed: {e}");
        }
        result
    }

    async fn narrate_inner(&self, texts: &[String]) -> Result<(), NarrationError> {
        if texts.is_empty() {
            return Ok(());
        }
        if !self.backend.is_available() {
            return Err(NarrationError::BackendUnavailable);
        }

        let total = texts.len();
        for (index, text) in texts.iter().enumerate() {
            log::debug!("narration: speaking {}/{total}: {text:?}", index + 1);

            self.set_phase(NarrationPhase::Speaking { index, total });
            self.backend.speak(text)?;

            self.set_phase(NarrationPhase::Waiting { index, total });
            self.wait_until_quiet(index).await?;

            self.set_phase(NarrationPhase::Settling { index, total });
            tokio::time::sleep(self.timing.settle_delay).await;
        }

        Ok(())
    }

    /// Suspend until the engine reports it is no longer producing audio.
    ///
    /// The flag is sampled every `poll_interval`, starting one interval
    /// after submission so the engine has time to raise it.
    async fn wait_until_quiet(&self, index: usize) -> Result<(), NarrationError> {
        let deadline = tokio::time::Instant::now() + self.timing.completion_timeout;
        loop {
            tokio::time::sleep(self.timing.poll_interval).await;
            if !self.backend.is_speaking()? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(NarrationError::SettleTimeout { index });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Worker loop
    // -----------------------------------------------------------------------

    /// Run the narration worker until the command channel is closed.
    ///
    /// Owns the single "speech in progress" slot: at most one job is ever
    /// driven at a time, and a `Narrate` command arriving while a job is
    /// running preempts it — playback is cut, the remaining texts are
    /// dropped, and the new job starts.  When the channel closes mid-job,
    /// the current job is allowed to finish before the worker exits.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.
    pub async fn run(self, mut rx: mpsc::Receiver<NarrationCommand>) {
        let mut open = true;
        while open {
            let Some(command) = rx.recv().await else {
                break;
            };
            let NarrationCommand::Narrate(texts) = command else {
                // Stop with nothing running is a no-op.
                continue;
            };

            let mut pending = Some(texts);
            while let Some(texts) = pending.take() {
                pending = self.drive(&texts, &mut rx, &mut open).await;
            }
        }

        log::info!("narration: command channel closed, worker shutting down");
    }

    /// Drive one job while listening for commands.
    ///
    /// Returns `Some(replacement)` when a new `Narrate` request preempted
    /// the job, `None` when the job finished, failed, or was stopped.
    async fn drive(
        &self,
        texts: &[String],
        rx: &mut mpsc::Receiver<NarrationCommand>,
        open: &mut bool,
    ) -> Option<Vec<String>> {
        log::debug!("narration: starting job over {} texts", texts.len());

        let job = self.narrate(texts);
        tokio::pin!(job);

        loop {
            tokio::select! {
                biased;
                next = rx.recv(), if *open => match next {
                    Some(NarrationCommand::Narrate(replacement)) => {
                        log::debug!("narration: preempting running job");
                        self.halt_playback();
                        return Some(replacement);
                    }
                    Some(NarrationCommand::Stop) => {
                        log::debug!("narration: job stopped");
                        self.halt_playback();
                        self.set_phase(NarrationPhase::Idle);
                        return None;
                    }
                    None => {
                        // Channel closed: stop listening, let the job finish.
                        *open = false;
                    }
                },
                result = &mut job => {
                    if let Err(e) = result {
                        let mut status = self.status.lock().unwrap();
                        status.last_error = Some(e.to_string());
                    }
                    return None;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_phase(&self, phase: NarrationPhase) {
        let mut status = self.status.lock().unwrap();
        status.phase = phase;
    }

    /// Best-effort cut of whatever the engine is playing.
    fn halt_playback(&self) {
        if let Err(e) = self.backend.stop() {
            log::warn!("narration: could not stop playback: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::backend::MockSpeech;

    fn timing() -> NarrationTiming {
        NarrationTiming::from(&SpeechConfig::default())
    }

    fn narrator_with(backend: Arc<MockSpeech>) -> (Narrator, SharedNarration) {
        let status = new_shared_narration();
        let narrator = Narrator::new(
            backend as Arc<dyn SpeechBackend>,
            timing(),
            Arc::clone(&status),
        );
        (narrator, status)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Let spawned tasks make progress between assertions (paused-time
    /// tests run on the current thread).
    async fn settle_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    // ---- Narrator::narrate ---

    #[tokio::test(start_paused = true)]
    async fn narrates_each_text_once_in_order() {
        let backend = Arc::new(MockSpeech::new(2));
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        narrator
            .narrate(&texts(&["alpha", "beta", "gamma"]))
            .await
            .expect("job should complete");

        assert_eq!(backend.spoken(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(backend.overlapping_speaks(), 0);
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_sequence_completes_without_speaking() {
        let backend = Arc::new(MockSpeech::new(2));
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        narrator.narrate(&[]).await.expect("empty job is fine");

        assert!(backend.spoken().is_empty());
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_backend_fails_before_any_text() {
        let backend = Arc::new(MockSpeech::unavailable());
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let err = narrator.narrate(&texts(&["alpha"])).await.unwrap_err();

        assert!(matches!(err, NarrationError::BackendUnavailable));
        assert!(backend.spoken().is_empty());
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_that_never_finishes_times_out_closed() {
        let backend = Arc::new(MockSpeech::never_finishes());
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let err = narrator.narrate(&texts(&["endless"])).await.unwrap_err();

        assert!(matches!(err, NarrationError::SettleTimeout { index: 0 }));
        assert_eq!(backend.spoken(), vec!["endless"]);
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    /// With paused time the whole job takes exactly the scheduled amount:
    /// per text, polls × poll_interval to see the flag clear plus the
    /// settle delay.
    #[tokio::test(start_paused = true)]
    async fn waits_poll_and_settle_between_utterances() {
        let backend = Arc::new(MockSpeech::new(1));
        let (narrator, _status) = narrator_with(Arc::clone(&backend));

        let start = tokio::time::Instant::now();
        narrator.narrate(&texts(&["one", "two"])).await.unwrap();
        let elapsed = start.elapsed();

        // Per text: two polls (flag true once, then false) at 100 ms each,
        // then 120 ms settle = 320 ms; two texts = 640 ms.
        assert_eq!(elapsed, Duration::from_millis(640));
    }

    #[tokio::test(start_paused = true)]
    async fn phase_walks_speaking_waiting_settling() {
        let backend = Arc::new(MockSpeech::new(0));
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let job = tokio::spawn({
            let narrator = narrator.clone();
            async move { narrator.narrate(&texts(&["only"])).await }
        });

        // The job submits the text and suspends in its first poll sleep.
        settle_tasks().await;
        assert_eq!(
            status.lock().unwrap().phase,
            NarrationPhase::Waiting { index: 0, total: 1 }
        );

        // First poll sees the flag clear; the job moves to Settling.
        tokio::time::advance(Duration::from_millis(100)).await;
        settle_tasks().await;
        assert_eq!(
            status.lock().unwrap().phase,
            NarrationPhase::Settling { index: 0, total: 1 }
        );

        // After the settle delay the job is done.
        tokio::time::advance(Duration::from_millis(120)).await;
        settle_tasks().await;
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);

        job.await.unwrap().unwrap();
        assert_eq!(backend.spoken(), vec!["only"]);
    }

    // ---- Narrator::run (worker) ---

    #[tokio::test(start_paused = true)]
    async fn worker_runs_a_job_to_completion() {
        let backend = Arc::new(MockSpeech::new(1));
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let (tx, rx) = mpsc::channel(4);
        tx.send(NarrationCommand::Narrate(texts(&["a", "b"])))
            .await
            .unwrap();
        drop(tx);

        narrator.run(rx).await;

        assert_eq!(backend.spoken(), vec!["a", "b"]);
        assert_eq!(backend.overlapping_speaks(), 0);
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn preempting_narrate_stops_old_job_and_runs_new() {
        let backend = Arc::new(MockSpeech::new(50));
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(narrator.run(rx));

        // Start a long three-text job and let it submit its first text.
        tx.send(NarrationCommand::Narrate(texts(&["t1", "t2", "t3"])))
            .await
            .unwrap();
        settle_tasks().await;
        assert_eq!(backend.spoken(), vec!["t1"]);

        // A new narrate request preempts: playback is cut, t2/t3 never play.
        tx.send(NarrationCommand::Narrate(texts(&["n1"])))
            .await
            .unwrap();
        drop(tx);
        worker.await.unwrap();

        assert_eq!(backend.spoken(), vec!["t1", "n1"]);
        assert!(backend.stops() >= 1);
        assert_eq!(backend.overlapping_speaks(), 0);
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_command_aborts_running_job() {
        let backend = Arc::new(MockSpeech::never_finishes());
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(narrator.run(rx));

        tx.send(NarrationCommand::Narrate(texts(&["droning on"])))
            .await
            .unwrap();
        settle_tasks().await;
        assert_eq!(backend.spoken(), vec!["droning on"]);

        tx.send(NarrationCommand::Stop).await.unwrap();
        settle_tasks().await;
        assert_eq!(status.lock().unwrap().phase, NarrationPhase::Idle);
        assert_eq!(backend.stops(), 1);

        drop(tx);
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_with_no_job_running_is_a_noop() {
        let backend = Arc::new(MockSpeech::new(1));
        let (narrator, _status) = narrator_with(Arc::clone(&backend));

        let (tx, rx) = mpsc::channel(4);
        tx.send(NarrationCommand::Stop).await.unwrap();
        drop(tx);

        narrator.run(rx).await;
        assert!(backend.spoken().is_empty());
        assert_eq!(backend.stops(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_records_error_in_status() {
        let backend = Arc::new(MockSpeech::unavailable());
        let (narrator, status) = narrator_with(Arc::clone(&backend));

        let (tx, rx) = mpsc::channel(4);
        tx.send(NarrationCommand::Narrate(texts(&["x"]))).await.unwrap();
        drop(tx);

        narrator.run(rx).await;

        let status = status.lock().unwrap();
        assert_eq!(status.phase, NarrationPhase::Idle);
        assert!(status.last_error.is_some());
    }

    // ---- NarrationPhase ---

    #[test]
    fn idle_is_not_busy() {
        assert!(!NarrationPhase::Idle.is_busy());
    }

    #[test]
    fn active_phases_are_busy() {
        assert!(NarrationPhase::Speaking { index: 0, total: 3 }.is_busy());
        assert!(NarrationPhase::Waiting { index: 1, total: 3 }.is_busy());
        assert!(NarrationPhase::Settling { index: 2, total: 3 }.is_busy());
    }

    #[test]
    fn progress_is_one_based() {
        assert_eq!(
            NarrationPhase::Speaking { index: 0, total: 3 }.progress(),
            Some((1, 3))
        );
        assert_eq!(NarrationPhase::Idle.progress(), None);
    }

    #[test]
    fn default_phase_is_idle() {
        assert_eq!(NarrationPhase::default(), NarrationPhase::Idle);
    }

    // ---- NarrationTiming ---

    #[test]
    fn timing_resolves_from_speech_config() {
        let config = SpeechConfig {
            poll_interval_ms: 50,
            settle_delay_ms: 200,
            completion_timeout_secs: 5,
            ..SpeechConfig::default()
        };
        let timing = NarrationTiming::from(&config);
        assert_eq!(timing.poll_interval, Duration::from_millis(50));
        assert_eq!(timing.settle_delay, Duration::from_millis(200));
        assert_eq!(timing.completion_timeout, Duration::from_secs(5));
    }
}
