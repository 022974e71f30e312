//! Application entry point — Wordbook.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Initialise the speech backend — degrade to a stub when the platform
//!    engine is unavailable so the browser still works without narration.
//! 5. Create the narration command channel and shared status.
//! 6. Spawn the narration worker on the tokio runtime.
//! 7. Load the saved collection, falling back to the bundled seed on first
//!    run, or to an empty collection with an inline error when loading
//!    fails.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;
use wordbook::{
    app::WordbookApp,
    book::{BookStore, Wordbook},
    config::{AppConfig, AppPaths},
    speech::{
        new_shared_narration, NarrationCommand, NarrationTiming, Narrator, SpeechBackend,
        SpeechError, SystemSpeech,
    },
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([480.0, 640.0])
        .with_min_inner_size([360.0, 320.0]);

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Wordbook starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 3. Tokio runtime (narration runs off the UI thread)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Speech backend (may fail on headless systems — degrade gracefully)
    let backend: Arc<dyn SpeechBackend> = match SystemSpeech::new(&config.speech) {
        Ok(speech) => {
            log::info!("Speech engine initialised");
            Arc::new(speech)
        }
        Err(e) => {
            log::warn!("Speech engine unavailable ({e}); narration will report an error");
            // Use a stub that rejects every request so the browser still
            // launches without a working speech engine.
            Arc::new(UnavailableSpeech {
                reason: e.to_string(),
            })
        }
    };

    // 5. Channel + shared status
    let (command_tx, command_rx) = mpsc::channel::<NarrationCommand>(16);
    let narration = new_shared_narration();

    // 6. Spawn the narration worker onto the tokio runtime
    {
        let narrator = Narrator::new(
            Arc::clone(&backend),
            NarrationTiming::from(&config.speech),
            Arc::clone(&narration),
        );
        rt.spawn(narrator.run(command_rx));
    }

    // 7. Collection: saved file → bundled seed → empty with inline error
    let store = BookStore::new(paths.book_file(&config.store.collection));
    let (book, source_error) = match store.load() {
        Ok(Some(book)) => {
            log::info!("Loaded {} entries from {}", book.len(), store.path().display());
            (book, None)
        }
        Ok(None) => {
            let book = Wordbook::seed();
            log::info!("No saved collection; starting from the bundled seed");
            (book, None)
        }
        Err(e) => {
            log::error!("Could not load collection: {e}");
            (Wordbook::new(), Some(format!("Failed to load collection: {e}")))
        }
    };

    // 8. Build the egui app and run it (blocks until the window is closed)
    let export_path = paths.export_file(&config.store.collection);
    let app = WordbookApp::new(
        config.clone(),
        book,
        source_error,
        store,
        command_tx,
        narration,
        export_path,
    );
    let options = native_options(&config);

    eframe::run_native("Wordbook", options, Box::new(move |_cc| Ok(Box::new(app))))
}

// ---------------------------------------------------------------------------
// UnavailableSpeech — stub backend when no speech engine is present
// ---------------------------------------------------------------------------

struct UnavailableSpeech {
    reason: String,
}

impl SpeechBackend for UnavailableSpeech {
    fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn is_speaking(&self) -> Result<bool, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn stop(&self) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn is_available(&self) -> bool {
        false
    }
}
