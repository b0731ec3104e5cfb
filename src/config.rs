//! Configuration management for notecore.
//!
//! This module handles loading and saving configuration to/from a JSON file
//! in a config directory. The directory can be customized; without the
//! `desktop` feature it must be given explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NoteError, NoteResult};
use crate::seed::DEFAULT_UNTITLED_LABEL;
use crate::sync::CorruptDataPolicy;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Options that shape how a notebook behaves once opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookOptions {
    /// Title given to notes saved without one
    pub untitled_label: String,
    /// What to do with stored collections that cannot be parsed
    pub corrupt_data_policy: CorruptDataPolicy,
}

impl Default for NotebookOptions {
    fn default() -> Self {
        Self {
            untitled_label: DEFAULT_UNTITLED_LABEL.to_string(),
            corrupt_data_policy: CorruptDataPolicy::default(),
        }
    }
}

fn default_untitled_label() -> String {
    DEFAULT_UNTITLED_LABEL.to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    /// Path to the SQLite document store
    #[serde(default)]
    pub database_file: String,
    /// Directory holding attachment records
    #[serde(default)]
    pub attachment_directory: String,
    /// Title given to notes saved without one
    #[serde(default = "default_untitled_label")]
    pub untitled_label: String,
    /// Handling of unparseable stored collections
    #[serde(default)]
    pub corrupt_data_policy: CorruptDataPolicy,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            database_file: String::new(),
            attachment_directory: String::new(),
            untitled_label: default_untitled_label(),
            corrupt_data_policy: CorruptDataPolicy::default(),
        }
    }
}

impl ConfigData {
    /// Fill in the path defaults that depend on the config directory
    fn fill_defaults(&mut self, config_dir: &Path) {
        if self.database_file.is_empty() {
            self.database_file = config_dir.join("notes.db").to_string_lossy().to_string();
        }
        if self.attachment_directory.is_empty() {
            self.attachment_directory = config_dir
                .join("attachments")
                .to_string_lossy()
                .to_string();
        }
        if self.untitled_label.trim().is_empty() {
            self.untitled_label = default_untitled_label();
        }
    }
}

/// Configuration manager
pub struct Config {
    config_dir: PathBuf,
    config_file: PathBuf,
    data: ConfigData,
}

impl Config {
    /// Create a new configuration manager
    ///
    /// Without the `desktop` feature, `config_dir` is required.
    pub fn new(config_dir: Option<PathBuf>) -> NoteResult<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => {
                #[cfg(feature = "desktop")]
                {
                    dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("notecore")
                }
                #[cfg(not(feature = "desktop"))]
                {
                    return Err(NoteError::Config(
                        "config_dir is required without the desktop feature".to_string(),
                    ));
                }
            }
        };

        fs::create_dir_all(&config_dir)?;
        let config_file = config_dir.join(CONFIG_FILE_NAME);
        let existed = config_file.exists();

        let mut data = if existed {
            match fs::read_to_string(&config_file) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!(
                        path = %config_file.display(),
                        error = %e,
                        "Config file is invalid; using defaults"
                    );
                    ConfigData::default()
                }),
                Err(e) => {
                    tracing::warn!(
                        path = %config_file.display(),
                        error = %e,
                        "Config file is unreadable; using defaults"
                    );
                    ConfigData::default()
                }
            }
        } else {
            ConfigData::default()
        };
        data.fill_defaults(&config_dir);

        let config = Self {
            config_dir,
            config_file,
            data,
        };

        // Save default config if it doesn't exist
        if !existed {
            config.save()?;
            tracing::info!(path = %config.config_file.display(), "Wrote default config");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> NoteResult<()> {
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    /// Get the configuration directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the configuration file path
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Get the database file path
    pub fn database_file(&self) -> &str {
        &self.data.database_file
    }

    /// Set the database file path
    pub fn set_database_file(&mut self, path: &str) -> NoteResult<()> {
        if path.trim().is_empty() {
            return Err(NoteError::validation("database_file", "path must not be empty"));
        }
        self.data.database_file = path.to_string();
        self.save()
    }

    /// Get the attachment directory path
    pub fn attachment_directory(&self) -> &str {
        &self.data.attachment_directory
    }

    /// Set the attachment directory path
    pub fn set_attachment_directory(&mut self, path: &str) -> NoteResult<()> {
        if path.trim().is_empty() {
            return Err(NoteError::validation(
                "attachment_directory",
                "path must not be empty",
            ));
        }
        self.data.attachment_directory = path.to_string();
        self.save()
    }

    /// Get the title given to notes saved without one
    pub fn untitled_label(&self) -> &str {
        &self.data.untitled_label
    }

    /// Set the title given to notes saved without one
    pub fn set_untitled_label(&mut self, label: &str) -> NoteResult<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(NoteError::validation("untitled_label", "label must not be empty"));
        }
        self.data.untitled_label = label.to_string();
        self.save()
    }

    pub fn corrupt_data_policy(&self) -> CorruptDataPolicy {
        self.data.corrupt_data_policy
    }

    pub fn set_corrupt_data_policy(&mut self, policy: CorruptDataPolicy) -> NoteResult<()> {
        self.data.corrupt_data_policy = policy;
        self.save()
    }

    /// Options for opening a notebook with this configuration
    pub fn notebook_options(&self) -> NotebookOptions {
        NotebookOptions {
            untitled_label: self.data.untitled_label.clone(),
            corrupt_data_policy: self.data.corrupt_data_policy,
        }
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "database_file" => Some(self.data.database_file.clone()),
            "attachment_directory" => Some(self.data.attachment_directory.clone()),
            "untitled_label" => Some(self.data.untitled_label.clone()),
            "corrupt_data_policy" => Some(
                match self.data.corrupt_data_policy {
                    CorruptDataPolicy::Reset => "reset",
                    CorruptDataPolicy::Fail => "fail",
                }
                .to_string(),
            ),
            _ => None,
        }
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> NoteResult<()> {
        match key {
            "database_file" => self.set_database_file(value),
            "attachment_directory" => self.set_attachment_directory(value),
            "untitled_label" => self.set_untitled_label(value),
            "corrupt_data_policy" => {
                let policy = match value {
                    "reset" => CorruptDataPolicy::Reset,
                    "fail" => CorruptDataPolicy::Fail,
                    other => {
                        return Err(NoteError::validation(
                            "corrupt_data_policy",
                            format!("expected 'reset' or 'fail', got '{}'", other),
                        ))
                    }
                };
                self.set_corrupt_data_policy(policy)
            }
            _ => Err(NoteError::Config(format!("Unknown config key: {}", key))),
        }
    }
}
