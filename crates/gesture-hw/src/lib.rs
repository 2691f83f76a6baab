//! gesture-hw — Hardware abstraction for camera capture and frame display.
//!
//! Provides V4L2-based camera access, conversion of native camera pixel
//! layouts to RGB, and a `minifb` window with keyboard polling.

pub mod camera;
pub mod display;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, FrameSource};
pub use display::{DisplayError, DisplaySink, Window};
pub use frame::{Frame, FrameError, PixelFormat};
