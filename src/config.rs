//! Application configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const CONFIG_DIR: &str = "image_picker";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// MIME regexes a file must match to be loaded. `None` accepts anything.
    pub allowed: Option<Vec<String>>,
    /// Show a placeholder graphic while no image is loaded.
    pub generic: bool,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed: Some(
                ["jpe?g", "png", "gif", "bmp"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            generic: true,
            window_width: 800.0,
            window_height: 600.0,
        }
    }
}

impl AppConfig {
    /// Default location, `<config dir>/image_picker/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply command-line overrides.
    pub fn merge(mut self, cli: &Cli) -> Self {
        if let Some(allowed) = &cli.allowed {
            self.allowed = (!allowed.is_empty()).then(|| allowed.clone());
        }
        if cli.accept_any {
            self.allowed = None;
        }
        if cli.generic {
            self.generic = true;
        }
        self
    }
}

#[derive(Debug, Default, Parser)]
#[command(version, about = "Pick, preview and crop an image")]
pub struct Cli {
    /// Image to open on startup.
    pub path: Option<PathBuf>,

    /// Configuration file to read instead of the default location.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated MIME regexes to accept, e.g. `png,jpe?g`.
    #[arg(long, value_delimiter = ',')]
    pub allowed: Option<Vec<String>>,

    /// Accept files of any type.
    #[arg(long, conflicts_with = "allowed")]
    pub accept_any: bool,

    /// Show a placeholder while no image is loaded.
    #[arg(long)]
    pub generic: bool,
}

impl Cli {
    /// Resolve the configuration: file first, then flags.
    ///
    /// A config file that cannot be read or parsed is reported and replaced
    /// by the defaults.
    pub fn config(&self) -> AppConfig {
        let path = self.config.clone().or_else(AppConfig::default_path);
        let config = match path {
            Some(path) => AppConfig::load(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                AppConfig::default()
            }),
            None => AppConfig::default(),
        };
        config.merge(self)
    }
}
