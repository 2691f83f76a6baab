//! V4L2 camera capture via the `v4l` crate.

use crate::frame::{pack_rows, Frame, PixelFormat};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Number of mmap buffers queued with the driver.
const CAPTURE_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
}

/// Something that yields camera frames, one blocking read at a time.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Streaming V4L2 camera handle. Dropping it stops the stream and closes the device.
pub struct Camera {
    // Declared before `device` so the buffers are unmapped first.
    stream: MmapStream<'static>,
    #[allow(dead_code)]
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pub fourcc: FourCC,
    /// Bytes per row as reported by the driver (`bytesperline`).
    pub stride: u32,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open `/dev/video{index}` at the driver's default resolution.
    pub fn open_index(index: usize) -> Result<Self, CameraError> {
        Self::open(&format!("/dev/video{index}"))
    }

    /// Open a V4L2 camera device by path (e.g., "/dev/video0").
    ///
    /// Resolution and frame rate are left at the driver defaults. YUYV is
    /// requested; drivers that answer with MJPG, RGB3 or BGR3 are accepted too.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device.query_caps().map_err(|e| {
            CameraError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(CameraError::StreamingNotSupported);
        }

        let mut fmt = device.format().map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;
        fmt.fourcc = FourCC::new(b"YUYV");

        let negotiated = device.set_format(&fmt).map_err(|e| {
            CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        let fourcc = negotiated.fourcc;
        let pixel_format = pixel_format_for(fourcc).ok_or_else(|| {
            CameraError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {fourcc:?} (need YUYV, MJPG, RGB3, or BGR3)"
            ))
        })?;

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?fourcc,
            stride = negotiated.stride,
            "negotiated format"
        );

        let stream = MmapStream::with_buffers(&device, BufType::VideoCapture, CAPTURE_BUFFERS)
            .map_err(|e| {
                CameraError::CaptureFailed(format!("failed to create mmap stream: {e}"))
            })?;

        Ok(Self {
            stream,
            device,
            width: negotiated.width,
            height: negotiated.height,
            device_path: device_path.to_string(),
            fourcc,
            stride: negotiated.stride,
            pixel_format,
        })
    }

    /// Block until the next frame is available and copy it out of the driver buffer.
    pub fn capture_frame(&mut self) -> Result<Frame, CameraError> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let raw = if used > 0 { &buf[..used] } else { &buf[..] };
        let data = match self.pixel_format.bytes_per_pixel() {
            Some(bpp) => pack_rows(
                raw,
                self.width as usize * bpp,
                self.stride as usize,
                self.height as usize,
            ),
            None => raw.to_vec(),
        };

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            format: self.pixel_format,
            timestamp: std::time::Instant::now(),
            sequence: meta.sequence,
        })
    }

    /// List available V4L2 video capture devices.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }
}

impl FrameSource for Camera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.capture_frame()
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        tracing::info!(device = %self.device_path, "camera released");
    }
}

fn pixel_format_for(fourcc: FourCC) -> Option<PixelFormat> {
    match &fourcc.repr {
        b"YUYV" => Some(PixelFormat::Yuyv),
        b"MJPG" => Some(PixelFormat::Mjpeg),
        b"RGB3" => Some(PixelFormat::Rgb24),
        b"BGR3" => Some(PixelFormat::Bgr24),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_for_known_fourccs() {
        assert_eq!(pixel_format_for(FourCC::new(b"YUYV")), Some(PixelFormat::Yuyv));
        assert_eq!(pixel_format_for(FourCC::new(b"MJPG")), Some(PixelFormat::Mjpeg));
        assert_eq!(pixel_format_for(FourCC::new(b"RGB3")), Some(PixelFormat::Rgb24));
        assert_eq!(pixel_format_for(FourCC::new(b"BGR3")), Some(PixelFormat::Bgr24));
    }

    #[test]
    fn test_pixel_format_for_unsupported() {
        assert_eq!(pixel_format_for(FourCC::new(b"GREY")), None);
        assert_eq!(pixel_format_for(FourCC::new(b"H264")), None);
    }

    #[test]
    fn test_open_missing_device() {
        let err = Camera::open("/dev/video-does-not-exist").err().unwrap();
        assert!(matches!(err, CameraError::DeviceNotFound(_)));
    }
}
