//! Vocabulary browser window — egui/eframe application.
//!
//! # Architecture
//!
//! [`WordbookApp`] is the top-level [`eframe::App`].  It owns the
//! [`Wordbook`] outright — the collection is created in `main`, handed to
//! the app, and mutated only through the add-entry form.  Narration runs on
//! a background tokio task; the app talks to it over two one-way paths:
//!
//! * `command_tx` — sends [`NarrationCommand`]s to the narration worker.
//! * `narration`  — shared [`NarrationStatus`] the worker updates and the
//!   `update` loop reads every frame.
//!
//! The filter re-runs every frame from the live query string, so the view
//! always reflects both the latest keystroke and any just-appended entry.
//! "Speak all" snapshots the words of the *currently displayed* view, in
//! view order — narration is unaffected by later filter changes.

use std::path::PathBuf;

use eframe::egui;
use tokio::sync::mpsc;

use crate::book::{BookStore, Entry, Wordbook};
use crate::config::AppConfig;
use crate::search;
use crate::speech::{NarrationCommand, SharedNarration};

// ---------------------------------------------------------------------------
// EntryForm
// ---------------------------------------------------------------------------

/// Raw add-entry form fields, exactly as typed.
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub word: String,
    pub part_of_speech: String,
    pub pronunciation: String,
    pub definition: String,
    /// Comma-separated example sentences.
    pub examples: String,
}

impl EntryForm {
    /// Build an [`Entry`] from the form: fields are trimmed, empty optional
    /// fields become `None`, and the examples split on commas with blank
    /// segments dropped.
    ///
    /// Validation of word/definition happens in [`Wordbook::append`], not
    /// here — the form only normalizes.
    pub fn to_entry(&self) -> Entry {
        let optional = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Entry {
            word: self.word.trim().to_string(),
            part_of_speech: optional(&self.part_of_speech),
            pronunciation: optional(&self.pronunciation),
            definition: self.definition.trim().to_string(),
            examples: self
                .examples
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// One-line status feedback shown under the toolbar.
#[derive(Debug, Clone)]
enum Notice {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// WordbookApp
// ---------------------------------------------------------------------------

/// eframe application — the vocabulary browser window.
pub struct WordbookApp {
    // ── Collection ───────────────────────────────────────────────────────
    /// The owned entry collection.
    book: Wordbook,
    /// Persistence for `book`; written after every successful append.
    store: BookStore,
    /// Set when the initial collection could not be loaded; rendered inline
    /// where the list would be.
    source_error: Option<String>,

    // ── Search ───────────────────────────────────────────────────────────
    /// Live query string; the filter re-runs from it every frame.
    query: String,

    // ── Add-entry form ───────────────────────────────────────────────────
    form: EntryForm,
    show_form: bool,

    // ── Feedback ─────────────────────────────────────────────────────────
    notice: Option<Notice>,

    // ── Narration ────────────────────────────────────────────────────────
    /// Send commands to the background narration worker.
    command_tx: mpsc::Sender<NarrationCommand>,
    /// Worker-updated status, read each frame.
    narration: SharedNarration,

    // ── Configuration ────────────────────────────────────────────────────
    /// Application configuration (read-only after startup).
    config: AppConfig,
    /// Where the export button writes the collection.
    export_path: PathBuf,
}

impl WordbookApp {
    /// Create a new [`WordbookApp`].
    ///
    /// * `config`       — loaded application configuration.
    /// * `book`         — the initial collection (saved, seeded, or empty).
    /// * `source_error` — set when loading the saved collection failed.
    /// * `store`        — persistence for the collection.
    /// * `command_tx`   — sender end of the narration command channel.
    /// * `narration`    — shared narration status slot.
    /// * `export_path`  — destination for the export button.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        book: Wordbook,
        source_error: Option<String>,
        store: BookStore,
        command_tx: mpsc::Sender<NarrationCommand>,
        narration: SharedNarration,
        export_path: PathBuf,
    ) -> Self {
        Self {
            book,
            store,
            source_error,
            query: String::new(),
            form: EntryForm::default(),
            show_form: false,
            notice: None,
            command_tx,
            narration,
            config,
            export_path,
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Narrate the words of the currently displayed view, in view order.
    fn speak_visible(&mut self) {
        let words: Vec<String> = search::filter(self.book.entries(), &self.query)
            .iter()
            .map(|entry| entry.word.clone())
            .collect();

        log::debug!("ui: narrate-all over {} visible words", words.len());
        let _ = self.command_tx.try_send(NarrationCommand::Narrate(words));
    }

    /// Narrate a single text right away (per-card buttons).  Preempts any
    /// running job, like the browser's per-card speech did.
    fn speak_one(&self, text: String) {
        let _ = self
            .command_tx
            .try_send(NarrationCommand::Narrate(vec![text]));
    }

    fn stop_narration(&self) {
        let _ = self.command_tx.try_send(NarrationCommand::Stop);
    }

    /// Validate and append the form entry, then persist the collection.
    fn add_entry(&mut self) {
        let entry = self.form.to_entry();
        let word = entry.word.clone();

        match self.book.append(entry) {
            Ok(()) => {
                if let Err(e) = self.store.save(&self.book) {
                    // The entry is in memory either way; surface the save
                    // problem instead of silently losing it on exit.
                    log::warn!("ui: could not persist collection: {e}");
                    self.notice = Some(Notice::Error(format!(
                        "\"{word}\" added, but saving failed: {e}"
                    )));
                } else {
                    self.notice = Some(Notice::Info(format!("Added \"{word}\"")));
                }
                self.form.clear();
            }
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }
    }

    /// Write the current in-memory collection to the export path.
    fn export(&mut self) {
        match crate::book::export_to(&self.book, &self.export_path) {
            Ok(()) => {
                self.notice = Some(Notice::Info(format!(
                    "Exported {} entries to {}",
                    self.book.len(),
                    self.export_path.display()
                )));
            }
            Err(e) => {
                log::warn!("ui: export failed: {e}");
                self.notice = Some(Notice::Error(format!("Export failed: {e}")));
            }
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    /// Search box and action buttons.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text("Search word, definition, or examples…")
                    .desired_width(220.0),
            );

            let busy = self.narration.lock().unwrap().phase.is_busy();

            if ui.button("🔊 Speak all").clicked() {
                self.speak_visible();
            }
            if ui.add_enabled(busy, egui::Button::new("⏹ Stop")).clicked() {
                self.stop_narration();
            }
            if ui.button("⬇ Export").clicked() {
                self.export();
            }
            if ui
                .button(if self.show_form {
                    "− Add word"
                } else {
                    "+ Add word"
                })
                .clicked()
            {
                self.show_form = !self.show_form;
            }
        });
    }

    /// Narration progress and the latest notice.
    fn draw_status(&mut self, ui: &mut egui::Ui) {
        let (phase, last_error) = {
            let status = self.narration.lock().unwrap();
            (status.phase, status.last_error.clone())
        };

        if let Some((current, total)) = phase.progress() {
            ui.label(
                egui::RichText::new(format!("Narrating {current} of {total}…"))
                    .color(egui::Color32::from_rgb(68, 136, 255))
                    .size(12.0),
            );
        } else if let Some(message) = last_error {
            ui.label(
                egui::RichText::new(message)
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
        }

        match &self.notice {
            Some(Notice::Info(message)) => {
                ui.label(
                    egui::RichText::new(message)
                        .color(egui::Color32::from_rgb(80, 200, 120))
                        .size(12.0),
                );
            }
            Some(Notice::Error(message)) => {
                ui.label(
                    egui::RichText::new(message)
                        .color(egui::Color32::from_rgb(255, 136, 68))
                        .size(12.0),
                );
            }
            None => {}
        }
    }

    /// The add-entry form.
    fn draw_form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("add-entry-form")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Word");
                ui.text_edit_singleline(&mut self.form.word);
                ui.end_row();

                ui.label("Part of speech");
                ui.text_edit_singleline(&mut self.form.part_of_speech);
                ui.end_row();

                ui.label("Pronunciation");
                ui.text_edit_singleline(&mut self.form.pronunciation);
                ui.end_row();

                ui.label("Definition");
                ui.text_edit_singleline(&mut self.form.definition);
                ui.end_row();

                ui.label("Examples (comma-separated)");
                ui.text_edit_singleline(&mut self.form.examples);
                ui.end_row();
            });

        if ui.button("Add to wordbook").clicked() {
            self.add_entry();
        }
    }

    /// The filtered entry cards.
    fn draw_list(&mut self, ui: &mut egui::Ui) {
        if let Some(ref message) = self.source_error {
            if self.book.is_empty() {
                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new(message.as_str())
                        .color(egui::Color32::from_rgb(255, 100, 100)),
                );
                return;
            }
        }

        // Clone the view so card buttons below can borrow self mutably.
        let visible: Vec<Entry> = search::filter(self.book.entries(), &self.query)
            .into_iter()
            .cloned()
            .collect();

        if visible.is_empty() {
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new("No results found.")
                    .color(egui::Color32::from_rgb(140, 140, 140)),
            );
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in &visible {
                self.draw_card(ui, entry);
                ui.add_space(6.0);
            }
        });
    }

    /// One entry card: word, tags, definition, examples, speak buttons.
    fn draw_card(&mut self, ui: &mut egui::Ui, entry: &Entry) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new(&entry.word).heading());

            let mut meta = Vec::new();
            if let Some(ref pos) = entry.part_of_speech {
                meta.push(pos.clone());
            }
            if self.config.ui.show_pronunciation {
                if let Some(ref pron) = entry.pronunciation {
                    meta.push(pron.clone());
                }
            }
            if !meta.is_empty() {
                ui.label(
                    egui::RichText::new(meta.join(" • "))
                        .color(egui::Color32::from_rgb(140, 140, 140))
                        .size(12.0),
                );
            }

            ui.label(&entry.definition);

            for example in &entry.examples {
                ui.label(
                    egui::RichText::new(format!("• {example}"))
                        .color(egui::Color32::from_rgb(160, 160, 160))
                        .italics()
                        .size(12.0),
                );
            }

            ui.horizontal(|ui| {
                if ui.small_button("🔊 Word").clicked() {
                    self.speak_one(entry.word.clone());
                }
                if !entry.examples.is_empty() && ui.small_button("🔉 Examples").clicked() {
                    self.speak_one(entry.examples_utterance());
                }
            });
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for WordbookApp {
    /// Called every frame by eframe.  Reads narration status, then renders
    /// the browser.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep repainting while a narration job advances in the background.
        if self.narration.lock().unwrap().phase.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Wordbook");
            ui.add_space(4.0);

            self.draw_toolbar(ui);
            self.draw_status(ui);

            if self.show_form {
                ui.separator();
                self.draw_form(ui);
            }

            ui.separator();
            self.draw_list(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("wordbook closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_trims_fields_and_splits_examples() {
        let form = EntryForm {
            word: "  meander  ".into(),
            part_of_speech: " verb ".into(),
            pronunciation: String::new(),
            definition: " to wander aimlessly ".into(),
            examples: "The river meanders. ,  , We meandered home. ".into(),
        };

        let entry = form.to_entry();
        assert_eq!(entry.word, "meander");
        assert_eq!(entry.part_of_speech.as_deref(), Some("verb"));
        assert!(entry.pronunciation.is_none());
        assert_eq!(entry.definition, "to wander aimlessly");
        assert_eq!(
            entry.examples,
            vec!["The river meanders.", "We meandered home."]
        );
    }

    #[test]
    fn empty_form_yields_empty_entry_for_append_to_reject() {
        let entry = EntryForm::default().to_entry();
        assert!(entry.word.is_empty());
        assert!(entry.definition.is_empty());
        assert!(entry.examples.is_empty());

        let mut book = Wordbook::new();
        assert!(book.append(entry).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn clear_resets_every_field() {
        let mut form = EntryForm {
            word: "cat".into(),
            part_of_speech: "noun".into(),
            pronunciation: "/kæt/".into(),
            definition: "a feline".into(),
            examples: "The cat sleeps.".into(),
        };
        form.clear();
        assert!(form.word.is_empty());
        assert!(form.examples.is_empty());
    }
}
