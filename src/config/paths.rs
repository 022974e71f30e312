//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + saved collection):
//!   Windows: %APPDATA%\wordbook\
//!   macOS:   ~/Library/Application Support/wordbook/
//!   Linux:   ~/.config/wordbook/
//!
//! Exports go to the platform downloads directory, mirroring the browser
//! behaviour the collection format comes from.

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and the saved collection.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory exported collections are written to.
    pub downloads_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "wordbook";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let downloads_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            downloads_dir,
        }
    }

    /// Path of the saved collection file for `collection`.
    pub fn book_file(&self, collection: &str) -> PathBuf {
        self.config_dir.join(format!("{collection}.json"))
    }

    /// Path the exported collection is offered at for `collection`.
    pub fn export_file(&self, collection: &str) -> PathBuf {
        self.downloads_dir.join(format!("{collection}.json"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
