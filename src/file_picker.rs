//! File selection.
//!
//! Files come from the native dialog or from drag-and-drop. The first one is
//! checked against the allow-list, read on a background thread and published
//! to the [`SharedImage`] from [`FilePicker::poll`] on the UI thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::ImageFormat;
use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::state::{EncodedImage, SharedImage};

const FALLBACK_MIME: &str = "application/octet-stream";
const DEFAULT_DIALOG_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// A file chosen by the user, with the MIME type it declares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub mime: String,
}

impl SelectedFile {
    /// Derive the MIME type from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = ImageFormat::from_path(&path)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        Self { path, mime }
    }
}

struct PendingRead {
    path: PathBuf,
    rx: Receiver<Result<EncodedImage>>,
}

pub struct FilePicker {
    image: SharedImage,
    allowed: Option<Vec<Regex>>,
    value: Option<PathBuf>,
    // Dropping the receiver discards a read still in flight.
    pending: Option<PendingRead>,
}

impl FilePicker {
    /// `allowed` holds regular expressions matched case-insensitively
    /// against the MIME type. Patterns that fail to compile are skipped.
    pub fn new(image: SharedImage, allowed: Option<Vec<String>>) -> Self {
        let allowed = allowed.map(|patterns| {
            patterns
                .iter()
                .filter_map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| log::warn!("Ignoring allow-list pattern {:?}: {}", pattern, e))
                        .ok()
                })
                .collect()
        });
        Self {
            image,
            allowed,
            value: None,
            pending: None,
        }
    }

    /// The currently selected path, like the value of a file input.
    pub fn value(&self) -> Option<&Path> {
        self.value.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether any allowed pattern matches `mime`. Without an allow-list
    /// everything passes.
    pub fn is_allowed(&self, mime: &str) -> bool {
        let Some(allowed) = &self.allowed else {
            return true;
        };
        allowed.iter().any(|pattern| pattern.is_match(mime))
    }

    /// Handle a selection. Only the first file is considered.
    pub fn select(&mut self, files: &[SelectedFile]) {
        let Some(file) = files.first() else {
            return;
        };

        if !self.is_allowed(&file.mime) {
            log::info!(
                "Rejected {} ({}): not in the allow-list",
                file.path.display(),
                file.mime
            );
            self.clear();
            return;
        }

        self.value = Some(file.path.clone());
        self.start_read(file.clone());
    }

    fn start_read(&mut self, file: SelectedFile) {
        let (tx, rx) = mpsc::channel::<Result<EncodedImage>>();
        let path = file.path.clone();
        thread::spawn(move || {
            let result = fs::read(&file.path)
                .map(|bytes| EncodedImage::new(file.mime, bytes))
                .map_err(Into::into);
            // The picker may be gone or have moved on to another file.
            let _ = tx.send(result);
        });
        log::debug!("Reading {}", path.display());
        self.pending = Some(PendingRead { path, rx });
    }

    /// Publish a finished read. Returns `true` when the shared image changed.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };

        match pending.rx.try_recv() {
            Ok(Ok(encoded)) => {
                log::info!(
                    "Loaded {} ({}, {} bytes)",
                    pending.path.display(),
                    encoded.mime(),
                    encoded.bytes().len()
                );
                self.pending = None;
                self.image.set(Some(encoded));
                true
            }
            Ok(Err(e)) => {
                log::warn!("Failed to read {}: {}", pending.path.display(), e);
                self.pending = None;
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                false
            }
        }
    }

    /// Reset the selection and empty the shared image.
    pub fn clear(&mut self) {
        self.value = None;
        self.pending = None;
        self.image.set(None);
    }

    /// Extensions offered by the native dialog: the known image extensions
    /// whose MIME type passes the allow-list.
    fn dialog_extensions(&self) -> Vec<&'static str> {
        DEFAULT_DIALOG_EXTENSIONS
            .into_iter()
            .filter(|ext| {
                ImageFormat::from_extension(ext)
                    .is_some_and(|format| self.is_allowed(format.to_mime_type()))
            })
            .collect()
    }

    /// Show the native file dialog and select the chosen file.
    pub fn open_dialog(&mut self) {
        let extensions = self.dialog_extensions();
        let mut dialog = rfd::FileDialog::new();
        // Patterns matching none of the known types get an unfiltered dialog;
        // `select` still applies the allow-list.
        if !extensions.is_empty() {
            dialog = dialog.add_filter("Image", &extensions);
        }
        if let Some(path) = dialog.pick_file() {
            self.select(&[SelectedFile::from_path(path)]);
        }
    }
}
