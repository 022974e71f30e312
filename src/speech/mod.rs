//! Speech subsystem: the backend wrapper and the sequential narrator.
//!
//! # Architecture
//!
//! ```text
//! NarrationCommand (mpsc)
//!        │
//!        ▼
//! Narrator::run()            ← async tokio task, owns the single job slot
//!        │
//!        ├─ Narrate(texts) → Speaking → Waiting → Settling per text
//!        │                   (new Narrate preempts, Stop aborts)
//!        │
//!        └─ SpeechBackend   ← speak / is_speaking / stop
//!
//! SharedNarration (Arc<Mutex<NarrationStatus>>) ←── read by the UI each frame
//! ```

pub mod backend;
pub mod narrator;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backend::{SpeechBackend, SpeechError, SystemSpeech};
pub use narrator::{
    new_shared_narration, NarrationCommand, NarrationError, NarrationPhase, NarrationStatus,
    NarrationTiming, Narrator, SharedNarration,
};
