//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::captions::{CaptionsFormat, ParseOptions};
use crate::layout::{TextDirection, DEFAULT_COLLISION_STEP};
use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Caption parser defaults.
    #[serde(default)]
    pub parser: ParserSettings,

    /// Layout engine settings.
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Caption parser defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserSettings {
    /// Format used when it cannot be inferred from a file extension.
    #[serde(default)]
    pub format: CaptionsFormat,

    /// Stop at the first diagnostic.
    #[serde(default)]
    pub strict: bool,

    /// Keep diagnostics in the parse result.
    #[serde(default = "default_true")]
    pub collect_errors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            format: CaptionsFormat::default(),
            strict: false,
            collect_errors: default_true(),
        }
    }
}

impl From<&ParserSettings> for ParseOptions {
    fn from(settings: &ParserSettings) -> Self {
        ParseOptions::new(settings.format)
            .strict(settings.strict)
            .collect_errors(settings.collect_errors)
    }
}

/// Layout engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Distance added to every collision-avoidance move.
    #[serde(default = "default_collision_step")]
    pub collision_step: f64,

    /// Base text direction.
    #[serde(default)]
    pub direction: TextDirection,
}

fn default_collision_step() -> f64 {
    DEFAULT_COLLISION_STEP
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            collision_step: default_collision_step(),
            direction: TextDirection::default(),
        }
    }
}

impl LayoutSettings {
    /// Problem with the configured values, if any.
    fn check(&self) -> Option<InvalidSetting> {
        if self.collision_step.is_finite() && self.collision_step > 0.0 {
            return None;
        }
        Some(InvalidSetting {
            section: ConfigSection::Layout,
            key: "collision_step",
            reason: format!("must be a positive number, got {}", self.collision_step),
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,
}

/// A value that deserializes but cannot be used.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidSetting {
    pub section: ConfigSection,
    pub key: &'static str,
    pub reason: String,
}

impl fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.section.table_name(), self.key, self.reason)
    }
}

impl Settings {
    /// First unusable value, if any.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        match self.layout.check() {
            Some(invalid) => Err(invalid),
            None => Ok(()),
        }
    }

    /// Put unusable values back to their defaults, returning what was reset.
    pub fn repair(&mut self) -> Vec<InvalidSetting> {
        let mut reset = Vec::new();
        if let Some(invalid) = self.layout.check() {
            self.layout.collision_step = default_collision_step();
            reset.push(invalid);
        }
        reset
    }
}

/// Config sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Parser,
    Layout,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 3] = [
        ConfigSection::Parser,
        ConfigSection::Layout,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Parser => "parser",
            ConfigSection::Layout => "layout",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Parser => "Caption parser defaults",
            ConfigSection::Layout => "Caption layout engine",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
