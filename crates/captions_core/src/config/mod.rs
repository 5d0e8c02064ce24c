//! Configuration management for caption parsing and layout.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load; `load_or_create` resets unusable values
//!
//! # Example
//!
//! ```no_run
//! use captions_core::captions::{parse_file, ParseOptions};
//! use captions_core::config::{ConfigManager, ConfigSection};
//!
//! // Create manager and load (or create default) config
//! let mut config = ConfigManager::new(".config/captions.toml");
//! config.load_or_create().unwrap();
//!
//! // Parse with the configured defaults
//! let options = ParseOptions::from(&config.settings().parser);
//! let captions = parse_file("movie.vtt", &options).unwrap();
//!
//! // Modify a setting and save just the layout section atomically
//! config.settings_mut().layout.collision_step = 4.0;
//! config.update_section(ConfigSection::Layout).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, InvalidSetting, LayoutSettings, LoggingSettings, ParserSettings, Settings,
};
