//! On-screen display window via `minifb`.

use image::RgbImage;
use minifb::{Key, KeyRepeat, ScaleMode, WindowOptions};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("failed to create window: {0}")]
    CreateFailed(String),
    #[error("failed to present frame: {0}")]
    UpdateFailed(String),
}

/// Where annotated frames are shown, and where key presses come from.
pub trait DisplaySink {
    /// Present one RGB frame.
    fn show(&mut self, frame: &RgbImage) -> Result<(), DisplayError>;
    /// Process window events without presenting a frame.
    fn pump_events(&mut self);
    /// Next letter key pressed since the last poll, lowercase unless Shift is held.
    fn poll_key(&mut self) -> Option<char>;
    /// `false` once the user has closed the window.
    fn is_open(&self) -> bool;
}

const LETTER_KEYS: [(Key, char); 26] = [
    (Key::A, 'a'),
    (Key::B, 'b'),
    (Key::C, 'c'),
    (Key::D, 'd'),
    (Key::E, 'e'),
    (Key::F, 'f'),
    (Key::G, 'g'),
    (Key::H, 'h'),
    (Key::I, 'i'),
    (Key::J, 'j'),
    (Key::K, 'k'),
    (Key::L, 'l'),
    (Key::M, 'm'),
    (Key::N, 'n'),
    (Key::O, 'o'),
    (Key::P, 'p'),
    (Key::Q, 'q'),
    (Key::R, 'r'),
    (Key::S, 's'),
    (Key::T, 't'),
    (Key::U, 'u'),
    (Key::V, 'v'),
    (Key::W, 'w'),
    (Key::X, 'x'),
    (Key::Y, 'y'),
    (Key::Z, 'z'),
];

/// Map a physical key to the character it types.
pub fn key_to_char(key: Key, shift: bool) -> Option<char> {
    LETTER_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, c)| if shift { c.to_ascii_uppercase() } else { c })
}

/// Borderless, topmost window sized to the camera frame.
///
/// Not fullscreen: minifb cannot size a window to the screen, so the window
/// opens at the frame resolution. If the user resizes it, the frame is
/// stretched to fit with its aspect ratio kept.
pub struct Window {
    window: minifb::Window,
    buffer: Vec<u32>,
    title: String,
}

impl Window {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let mut window = minifb::Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                borderless: true,
                resize: true,
                topmost: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| DisplayError::CreateFailed(e.to_string()))?;

        // The camera paces the loop.
        window.set_target_fps(0);

        tracing::info!(title, width, height, "display window opened");

        Ok(Self {
            window,
            buffer: vec![0; (width * height) as usize],
            title: title.to_string(),
        })
    }
}

impl DisplaySink for Window {
    fn show(&mut self, frame: &RgbImage) -> Result<(), DisplayError> {
        let (w, h) = frame.dimensions();
        self.buffer.clear();
        self.buffer.extend(frame.pixels().map(|p| {
            let [r, g, b] = p.0;
            (r as u32) << 16 | (g as u32) << 8 | b as u32
        }));

        self.window
            .update_with_buffer(&self.buffer, w as usize, h as usize)
            .map_err(|e| DisplayError::UpdateFailed(e.to_string()))
    }

    fn pump_events(&mut self) {
        // Keys and close requests are only collected while minifb updates.
        self.window.update();
    }

    fn poll_key(&mut self) -> Option<char> {
        let shift = self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift);
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .find_map(|key| key_to_char(key, shift))
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        tracing::info!(title = %self.title, "display window closed");
    }
}
