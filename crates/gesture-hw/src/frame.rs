//! Raw camera frames and conversion to RGB from YUYV, packed RGB/BGR and MJPEG.

use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Pixel layout of a captured frame, as negotiated with the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel).
    Yuyv,
    /// Packed 8-bit RGB (3 bytes/pixel).
    Rgb24,
    /// Packed 8-bit BGR (3 bytes/pixel).
    Bgr24,
    /// Motion-JPEG: every buffer is a complete JPEG image.
    Mjpeg,
}

impl PixelFormat {
    /// Bytes per pixel for packed layouts; `None` for compressed ones.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Yuyv => Some(2),
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => Some(3),
            PixelFormat::Mjpeg => None,
        }
    }
}

/// A captured camera frame in the device's native layout.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    /// Convert to the RGB layout the detection providers expect.
    pub fn to_rgb(&self) -> Result<RgbImage, FrameError> {
        let (w, h) = (self.width, self.height);
        let rgb = match self.format {
            PixelFormat::Rgb24 => {
                let expected = (w * h * 3) as usize;
                check_len(&self.data, expected)?;
                self.data[..expected].to_vec()
            }
            PixelFormat::Bgr24 => bgr_to_rgb(&self.data, w, h)?,
            PixelFormat::Yuyv => yuyv_to_rgb(&self.data, w, h)?,
            PixelFormat::Mjpeg => {
                let decoded = image::load_from_memory_with_format(&self.data, ImageFormat::Jpeg)
                    .map_err(|e| FrameError::Decode(e.to_string()))?
                    .to_rgb8();
                return Ok(decoded);
            }
        };
        let actual = rgb.len();
        RgbImage::from_raw(w, h, rgb).ok_or(FrameError::InvalidLength {
            expected: (w * h * 3) as usize,
            actual,
        })
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<(), FrameError> {
    if data.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Drop per-row padding: keep the first `row_bytes` of every `stride`-byte row.
///
/// A trailing row shorter than `stride` is kept as far as it goes.
pub fn pack_rows(data: &[u8], row_bytes: usize, stride: usize, height: usize) -> Vec<u8> {
    if stride <= row_bytes {
        return data.to_vec();
    }
    data.chunks(stride)
        .take(height)
        .flat_map(|row| &row[..row.len().min(row_bytes)])
        .copied()
        .collect()
}

/// Swap packed BGR to RGB.
pub fn bgr_to_rgb(bgr: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 3) as usize;
    check_len(bgr, expected)?;
    Ok(bgr[..expected]
        .chunks_exact(3)
        .flat_map(|p| [p[2], p[1], p[0]])
        .collect())
}

/// Convert packed YUYV (4:2:2) to RGB using BT.601 studio-range coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share U/V.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    check_len(yuyv, expected)?;

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for px in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (px[0], px[1], px[2], px[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }
    Ok(rgb)
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(298 * c + 409 * e),
        clamp(298 * c - 100 * d - 208 * e),
        clamp(298 * c + 516 * d),
    ]
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("failed to decode frame: {0}")]
    Decode(String),
}
