//! Frame annotation: hand skeleton and gesture label, drawn in place.

use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::Text,
};
use gesture_core::{GestureLabel, LandmarkSet, HAND_CONNECTIONS, HAND_LANDMARK_COUNT};
use image::{Rgb, RgbImage};

/// Baseline origin of the label text, in pixels.
pub const LABEL_ORIGIN: Point = Point::new(40, 50);

const LABEL_COLOR: Rgb888 = Rgb888::BLACK;
const CONNECTION_COLOR: Rgb888 = Rgb888::new(224, 224, 224);
const LANDMARK_COLOR: Rgb888 = Rgb888::RED;
const CONNECTION_WIDTH: u32 = 2;
const LANDMARK_DIAMETER: u32 = 5;

/// Draw the 21 landmarks and their connections.
pub fn draw_hand(image: &mut RgbImage, hand: &LandmarkSet) {
    let (w, h) = image.dimensions();
    let point = |i: usize| {
        let (x, y) = hand[i].to_pixel(w, h);
        Point::new(x, y)
    };
    let mut target = Target(image);

    let line_style = PrimitiveStyle::with_stroke(CONNECTION_COLOR, CONNECTION_WIDTH);
    for &(from, to) in HAND_CONNECTIONS.iter() {
        match Line::new(point(from), point(to))
            .into_styled(line_style)
            .draw(&mut target)
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }

    let marker_style = PrimitiveStyle::with_fill(LANDMARK_COLOR);
    for i in 0..HAND_LANDMARK_COUNT {
        match Circle::with_center(point(i), LANDMARK_DIAMETER)
            .into_styled(marker_style)
            .draw(&mut target)
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Draw the label's display text at [`LABEL_ORIGIN`].
///
/// The text is drawn twice, one pixel apart, for a two pixel stroke.
pub fn draw_label(image: &mut RgbImage, label: GestureLabel) {
    let style = MonoTextStyle::new(&FONT_10X20, LABEL_COLOR);
    let mut target = Target(image);
    for dx in 0..2 {
        match Text::new(label.text(), LABEL_ORIGIN + Point::new(dx, 0), style).draw(&mut target) {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

struct Target<'a>(&'a mut RgbImage);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = self.0.dimensions();

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Rgb888;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(pos, color) in pixels {
            if pos.x >= 0 && (pos.x as u32) < width && pos.y >= 0 && (pos.y as u32) < height {
                self.0
                    .put_pixel(pos.x as u32, pos.y as u32, Rgb([color.r(), color.g(), color.b()]));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::Landmark;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, WHITE)
    }

    fn hand_at(x: f32, y: f32) -> LandmarkSet {
        LandmarkSet::new([Landmark::new(x, y, 0.0); 21])
    }

    #[test]
    fn test_draw_label_renders_black_text_near_origin() {
        let mut img = blank(320, 120);
        draw_label(&mut img, GestureLabel::Hi);

        let dark: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dark.is_empty());
        // Alphabetic baseline: glyphs sit above y = 50, starting at x = 40.
        assert!(dark.iter().all(|&(x, y)| x >= 40 && y < 55 && y > 25));
    }

    #[test]
    fn test_draw_label_longer_text_reaches_further() {
        let rightmost = |label| {
            let mut img = blank(400, 80);
            draw_label(&mut img, label);
            img.enumerate_pixels()
                .filter(|(_, _, p)| p.0 == [0, 0, 0])
                .map(|(x, _, _)| x)
                .max()
                .unwrap()
        };
        assert!(rightmost(GestureLabel::Unknown) > rightmost(GestureLabel::PointingAtFace));
    }

    #[test]
    fn test_draw_hand_marks_landmarks_red() {
        let mut img = blank(100, 100);
        draw_hand(&mut img, &hand_at(0.5, 0.5));
        assert_eq!(img.get_pixel(50, 50).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255]);
    }

    #[test]
    fn test_draw_hand_connects_landmarks() {
        let mut points = [Landmark::new(0.5, 0.5, 0.0); 21];
        // Wrist far left, landmark 1 far right.
        points[0] = Landmark::new(0.1, 0.5, 0.0);
        points[1] = Landmark::new(0.9, 0.5, 0.0);
        let mut img = blank(100, 100);
        draw_hand(&mut img, &LandmarkSet::new(points));

        // On the wrist to landmark 1 segment, away from any marker.
        assert_eq!(img.get_pixel(30, 50).0, [224, 224, 224]);
    }

    #[test]
    fn test_draw_hand_out_of_frame_is_clipped() {
        let mut img = blank(32, 32);
        draw_hand(&mut img, &hand_at(1.5, -0.5));
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
