//! Error types shared by the picker widgets.

use thiserror::Error;

/// Errors raised while loading, encoding or saving images.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image crate could not decode or encode the pixels.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A data URL was not of the form `data:<mime>;base64,<payload>`.
    #[error("Malformed data URL: {0}")]
    DataUrl(String),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
