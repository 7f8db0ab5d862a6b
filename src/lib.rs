//! Widgets for picking an image file, previewing it and cropping it by
//! dragging a rectangle over the preview.

pub mod app;
pub mod config;
pub mod error;
pub mod file_picker;
pub mod geometry;
pub mod picker;
pub mod preview;
pub mod state;
pub mod tracer;

pub use error::{Error, Result};
