//! Config file handling for caption parsing and layout.
//!
//! The file is a TOML document with one table per [`ConfigSection`].
//! Saves go through a sibling temp file and a rename. Single sections are
//! replaced with `toml_edit` so hand edits elsewhere survive.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};
use tracing::{debug, info, warn};

use super::settings::{ConfigSection, InvalidSetting, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Invalid config value: {0}")]
    Invalid(InvalidSetting),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings bound to a file on disk.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Nothing is read until [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create).
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until [`save`](Self::save) or
    /// [`update_section`](Self::update_section).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the file, rejecting unusable values.
    pub fn load(&mut self) -> ConfigResult<()> {
        let settings = self.read_settings()?;
        settings.validate().map_err(ConfigError::Invalid)?;
        self.settings = settings;
        Ok(())
    }

    /// Read the file, or write the defaults if there is none.
    ///
    /// Unusable values are reset to their defaults. The file is rewritten
    /// when anything was reset, when it has tables this crate does not
    /// know, or when fields were missing.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            info!(path = %self.config_path.display(), "Writing default config");
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        let mut settings: Settings = toml::from_str(&content)?;

        let reset = settings.repair();
        for invalid in &reset {
            warn!(path = %self.config_path.display(), %invalid, "Reset config value to default");
        }

        let foreign = foreign_tables(&content.parse::<DocumentMut>()?);
        if !foreign.is_empty() {
            warn!(path = %self.config_path.display(), tables = ?foreign, "Dropping unknown config tables");
        }

        let stale = content.trim() != toml::to_string_pretty(&settings)?.trim();
        self.settings = settings;
        if !reset.is_empty() || !foreign.is_empty() || stale {
            self.save()?;
        }
        Ok(())
    }

    /// Write every section, each under its comment.
    pub fn save(&self) -> ConfigResult<()> {
        let mut output = String::from("# Captions Core Configuration\n");
        output.push_str("# Regenerated on load when values are missing or unusable.\n");
        for section in ConfigSection::ALL {
            output.push_str(&format!(
                "\n# {}\n[{}]\n",
                section.description(),
                section.table_name()
            ));
            output.push_str(&self.section_toml(section)?);
        }
        self.atomic_write(&output)?;
        Ok(())
    }

    /// Replace one table in the file on disk, leaving the rest as written.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) => content.parse::<DocumentMut>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        let table = self.section_toml(section)?.parse::<DocumentMut>()?;
        doc[section.table_name()] = Item::Table(table.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        debug!(section = section.table_name(), "Config section updated");
        Ok(())
    }

    fn read_settings(&self) -> ConfigResult<Settings> {
        match fs::read_to_string(&self.config_path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ConfigError::NotFound(self.config_path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fields of one section, without the table header.
    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let content = match section {
            ConfigSection::Parser => toml::to_string_pretty(&self.settings.parser)?,
            ConfigSection::Layout => toml::to_string_pretty(&self.settings.layout)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        };
        Ok(content)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)
    }
}

/// Top-level keys that are not one of our sections.
fn foreign_tables(doc: &DocumentMut) -> Vec<String> {
    doc.iter()
        .map(|(key, _)| key)
        .filter(|key| !ConfigSection::ALL.iter().any(|s| s.table_name() == *key))
        .map(str::to_string)
        .collect()
}
