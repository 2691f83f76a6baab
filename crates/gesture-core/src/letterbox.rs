//! Aspect-preserving resize into a fixed model input, and the inverse mapping.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Scale and padding applied when fitting a source image into a model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    /// Size of the resized content inside the padded input.
    pub content_width: u32,
    pub content_height: u32,
}

impl Letterbox {
    /// Fit a `src_w` × `src_h` image into `dst_w` × `dst_h`, centered.
    pub fn fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Self {
        let scale_w = dst_w as f32 / src_w.max(1) as f32;
        let scale_h = dst_h as f32 / src_h.max(1) as f32;
        let scale = scale_w.min(scale_h);

        let content_width = ((src_w as f32 * scale).round() as u32).clamp(1, dst_w.max(1));
        let content_height = ((src_h as f32 * scale).round() as u32).clamp(1, dst_h.max(1));

        Self {
            scale,
            pad_x: (dst_w - content_width) as f32 / 2.0,
            pad_y: (dst_h - content_height) as f32 / 2.0,
            content_width,
            content_height,
        }
    }

    /// Map a point in model-input space back to source-image space.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }

    /// Top-left corner of the content, in whole input pixels.
    pub fn offset(&self) -> (u32, u32) {
        (self.pad_x.floor() as u32, self.pad_y.floor() as u32)
    }

    /// Bilinear resize of `image` to the content size.
    pub fn resize(&self, image: &RgbImage) -> RgbImage {
        if image.width() == self.content_width && image.height() == self.content_height {
            return image.clone();
        }
        imageops::resize(image, self.content_width, self.content_height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_landscape() {
        let lb = Letterbox::fit(640, 480, 640, 640);
        assert!((lb.scale - 1.0).abs() < 1e-6);
        assert_eq!((lb.content_width, lb.content_height), (640, 480));
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 80.0);
        assert_eq!(lb.offset(), (0, 80));
    }

    #[test]
    fn test_fit_portrait_downscale() {
        let lb = Letterbox::fit(480, 960, 224, 224);
        assert_eq!(lb.content_height, 224);
        assert_eq!(lb.content_width, 112);
        assert_eq!(lb.pad_x, 56.0);
        assert_eq!(lb.pad_y, 0.0);
    }

    #[test]
    fn test_coordinate_roundtrip() {
        let (width, height) = (320.0f32, 240.0f32);
        let lb = Letterbox::fit(width as u32, height as u32, 640, 640);

        let (orig_x, orig_y) = (100.0f32, 50.0f32);
        let boxed_x = orig_x * lb.scale + lb.pad_x;
        let boxed_y = orig_y * lb.scale + lb.pad_y;
        let (x, y) = lb.unmap(boxed_x, boxed_y);

        assert!((x - orig_x).abs() < 0.1, "x: {x} vs {orig_x}");
        assert!((y - orig_y).abs() < 0.1, "y: {y} vs {orig_y}");
    }

    #[test]
    fn test_resize_uniform_stays_uniform() {
        let img = RgbImage::from_pixel(100, 50, image::Rgb([128, 64, 32]));
        let lb = Letterbox::fit(100, 50, 224, 224);
        let resized = lb.resize(&img);
        assert_eq!(resized.dimensions(), (lb.content_width, lb.content_height));
        for p in resized.pixels() {
            for (got, want) in p.0.iter().zip([128u8, 64, 32]) {
                assert!(got.abs_diff(want) <= 1, "uniform resize drifted: {:?}", p.0);
            }
        }
    }
}
