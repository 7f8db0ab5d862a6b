//! Off-screen pixel buffer behind the preview.
//!
//! The preview never reads pixels back from the texture it shows. Instead the
//! image is traced onto this buffer at its natural size, cropping reads and
//! writes raw pixels here, and the result is re-encoded for display.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage, imageops};

use crate::error::Result;
use crate::geometry::CropRegion;
use crate::state::EncodedImage;

#[derive(Debug)]
pub struct OffscreenTracer {
    canvas: RgbaImage,
}

impl Default for OffscreenTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl OffscreenTracer {
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Resize the buffer. Like a canvas, resizing discards the content.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.canvas = RgbaImage::new(width, height);
    }

    /// Draw `image` scaled to `width` x `height`, replacing the content.
    pub fn draw(&mut self, image: &DynamicImage, width: u32, height: u32) {
        let rgba = image.to_rgba8();
        self.canvas = if rgba.dimensions() == (width, height) {
            rgba
        } else {
            imageops::resize(&rgba, width, height, imageops::FilterType::Triangle)
        };
    }

    /// Copy out a region. Pixels outside the buffer come back transparent.
    pub fn get_image_data(&self, region: CropRegion) -> RgbaImage {
        let mut out = RgbaImage::new(region.width, region.height);
        imageops::replace(
            &mut out,
            &self.canvas,
            -i64::from(region.x),
            -i64::from(region.y),
        );
        out
    }

    /// Write `data` into the buffer with its top-left corner at `(x, y)`.
    pub fn put_image_data(&mut self, data: &RgbaImage, x: i64, y: i64) {
        imageops::replace(&mut self.canvas, data, x, y);
    }

    /// Encode the buffer as PNG.
    pub fn to_encoded(&self) -> Result<EncodedImage> {
        let mut bytes = Vec::new();
        self.canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(EncodedImage::new(ImageFormat::Png.to_mime_type(), bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Each pixel encodes its own coordinates.
    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }))
    }

    #[test]
    fn test_draw_at_natural_size() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(40, 30), 40, 30);
        assert_eq!((tracer.width(), tracer.height()), (40, 30));
        assert_eq!(tracer.pixels().get_pixel(7, 9), &Rgba([7, 9, 0, 255]));
    }

    #[test]
    fn test_draw_scaled() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(40, 30), 20, 15);
        assert_eq!((tracer.width(), tracer.height()), (20, 15));
    }

    #[test]
    fn test_get_image_data() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(40, 30), 40, 30);
        let data = tracer.get_image_data(CropRegion {
            x: 10,
            y: 5,
            width: 8,
            height: 6,
        });
        assert_eq!(data.dimensions(), (8, 6));
        assert_eq!(data.get_pixel(0, 0), &Rgba([10, 5, 0, 255]));
        assert_eq!(data.get_pixel(7, 5), &Rgba([17, 10, 0, 255]));
    }

    #[test]
    fn test_get_image_data_outside_is_transparent() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(10, 10), 10, 10);
        let data = tracer.get_image_data(CropRegion {
            x: -2,
            y: 8,
            width: 4,
            height: 4,
        });
        assert_eq!(data.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(data.get_pixel(2, 0), &Rgba([0, 8, 0, 255]));
        assert_eq!(data.get_pixel(2, 2), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_resize_then_put() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(10, 10), 10, 10);
        let data = tracer.get_image_data(CropRegion {
            x: 3,
            y: 4,
            width: 2,
            height: 2,
        });
        tracer.set_size(2, 2);
        tracer.put_image_data(&data, 0, 0);
        assert_eq!(tracer.pixels().get_pixel(1, 1), &Rgba([4, 5, 0, 255]));
    }

    #[test]
    fn test_encoded_png_decodes_back() {
        let mut tracer = OffscreenTracer::new();
        tracer.draw(&test_image(6, 4), 6, 4);
        let encoded = tracer.to_encoded().unwrap();
        assert_eq!(encoded.mime(), "image/png");
        let decoded = encoded.decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }
}
