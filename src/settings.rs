//! Settings store — flat key/value settings persisted as JSON.
//!
//! The persisted file is a single JSON object of string keys to string
//! values, loaded into an explicit [`Settings`] value that is injected
//! wherever configuration is read. Typed accessors parse on read and
//! substitute a default when a key is absent or unparsable; a missing
//! value is never an error.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// System instruction used when `systemInstructions` is not set.
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "You are a helpful assistant that can understand and generate both text and images. When asked to create or generate an image, you will do so while providing relevant explanations. For other queries, you will respond with appropriate text.";

/// Flat string-to-string settings map, mirroring the persisted JSON
/// object one-to-one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a float setting, falling back to `default` when the key is
    /// absent or the value does not parse.
    pub fn get_f32_or(&self, key: &str, default: f32) -> f32 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Parse an integer setting, falling back to `default` when the key
    /// is absent or the value does not parse.
    pub fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// API key for the remote generation API. The only setting whose
    /// absence is an error, since no call can be made without it.
    pub fn api_key(&self) -> Result<&str> {
        match self.get("apiKey") {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::Config(
                "API key not set. Run 'mural onboard' first.".to_string(),
            )),
        }
    }

    /// System instruction text, defaulted when unset or empty.
    pub fn system_instructions(&self) -> &str {
        self.get("systemInstructions")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTIONS)
    }
}

/// Get the Mural data directory path
pub fn mural_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mural")
}

/// Get the settings file path
pub fn settings_path() -> PathBuf {
    mural_dir().join("settings.json")
}

/// Directory where generated images are written
pub fn images_dir() -> PathBuf {
    mural_dir().join("images")
}

/// Load settings from the settings file.
///
/// A missing file yields an empty map: every read path defaults, and
/// [`Settings::api_key`] produces the actionable error when needed.
pub fn load() -> Result<Settings> {
    let path = settings_path();

    if !path.exists() {
        return Ok(Settings::new());
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    Ok(settings)
}

/// Save settings to the settings file.
pub fn save(settings: &Settings) -> Result<()> {
    let path = settings_path();

    // Create parent directory
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, content)?;
    Ok(())
}

/// Update a single key and persist.
pub fn set_value(key: &str, value: &str) -> Result<()> {
    let mut settings = load()?;
    settings.set(key, value);
    save(&settings)
}

/// Interactive first-run wizard.
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Confirm, Text};

    ui::print_mural_header("setup");
    println!("  Welcome! I'll help you get Mural configured in just a few steps.\n");

    let mut settings = load()?;

    // 1. API key
    let key = Text::new("Enter your Gemini API key:")
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    if key.trim().is_empty() {
        return Err(Error::Config("API key cannot be empty".to_string()));
    }
    settings.set("apiKey", key.trim());

    // 2. System instructions
    let keep_default = Confirm::new("Use the default system instructions?")
        .with_default(true)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if !keep_default {
        let instructions = Text::new("System instructions:")
            .with_default(DEFAULT_SYSTEM_INSTRUCTIONS)
            .prompt()
            .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
        settings.set("systemInstructions", instructions);
    }

    // 3. Generation parameters (optional)
    let tune = Confirm::new("Tune generation parameters now? (all have sensible defaults)")
        .with_default(false)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if tune {
        for (key, hint) in [
            ("temperature", "default 1.0"),
            ("top_p", "default 0.95"),
            ("top_k", "default 40"),
            ("maxOutputTokens", "default 8192"),
        ] {
            let value = Text::new(&format!("{} ({}):", key, hint))
                .prompt()
                .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
            if !value.trim().is_empty() {
                settings.set(key, value.trim());
            }
        }
    }

    // 4. Setup folders
    ui::print_thinking("Creating directories");
    std::fs::create_dir_all(images_dir())?;

    // 5. Save
    ui::print_thinking("Saving settings");
    save(&settings)?;

    println!();
    ui::print_success("Setup complete!");
    ui::print_step("You're all set! Run 'mural chat' to start chatting.");

    Ok(())
}
