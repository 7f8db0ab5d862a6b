//! Session-wide image state shared between the file picker and the preview.
//!
//! The top-level app owns a [`SharedImage`] and hands clones of it to each
//! widget. Every write bumps a revision counter so readers polling once per
//! frame can tell that the image changed without comparing payloads.

use std::cell::RefCell;
use std::rc::Rc;

use base64::{Engine as _, engine::general_purpose};
use image::DynamicImage;

use crate::error::{Error, Result};

/// An encoded image file as it was read from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    mime: String,
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Parse a base64 data URL produced by [`EncodedImage::to_data_url`].
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUrl("missing `data:` prefix".into()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| Error::DataUrl("missing `;base64,` separator".into()))?;
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::DataUrl(e.to_string()))?;
        Ok(Self::new(mime, bytes))
    }

    /// Decode the file contents into pixels.
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

#[derive(Default)]
struct Inner {
    image: Option<Rc<EncodedImage>>,
    revision: u64,
}

/// Cloneable handle to the currently loaded image.
#[derive(Clone, Default)]
pub struct SharedImage(Rc<RefCell<Inner>>);

impl SharedImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Rc<EncodedImage>> {
        self.0.borrow().image.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.0.borrow().image.is_some()
    }

    /// Replace the current image; `None` resets to empty.
    pub fn set(&self, image: Option<EncodedImage>) {
        let mut inner = self.0.borrow_mut();
        inner.image = image.map(Rc::new);
        inner.revision += 1;
        log::debug!(
            "shared image revision {} ({})",
            inner.revision,
            if inner.image.is_some() { "loaded" } else { "empty" }
        );
    }

    pub fn revision(&self) -> u64 {
        self.0.borrow().revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_format() {
        let encoded = EncodedImage::new("image/png", vec![1, 2, 3]);
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_parse_data_url() {
        let parsed = EncodedImage::from_data_url("data:image/jpeg;base64,AQID").unwrap();
        assert_eq!(parsed.mime(), "image/jpeg");
        assert_eq!(parsed.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_parse_rejects_malformed_data_url() {
        assert!(matches!(
            EncodedImage::from_data_url("image/png;base64,AQID"),
            Err(Error::DataUrl(_))
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png,AQID"),
            Err(Error::DataUrl(_))
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png;base64,@@@"),
            Err(Error::DataUrl(_))
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let encoded = EncodedImage::new("image/png", vec![0, 1, 2, 3]);
        assert!(matches!(encoded.decode(), Err(Error::Image(_))));
    }

    #[test]
    fn test_clones_share_state() {
        let state = SharedImage::new();
        let reader = state.clone();
        assert!(!reader.is_loaded());
        assert_eq!(reader.revision(), 0);

        state.set(Some(EncodedImage::new("image/png", vec![9])));
        assert!(reader.is_loaded());
        assert_eq!(reader.get().unwrap().bytes(), &[9]);
        assert_eq!(reader.revision(), 1);

        state.set(None);
        assert!(!reader.is_loaded());
        assert_eq!(reader.revision(), 2);
    }
}
