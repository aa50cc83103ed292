//! # Deviation Meter Widget
//!
//! Needle showing how far the measured frequency is from the target, in Hz.
//! The shaded band in the middle is the in-tune margin.
//!
//! ## Features
//! - Scale of ten margins either side of the target
//! - Green needle inside the margin, orange outside, grey when stale

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

/// Smallest half-width of the scale, for a zero margin.
const MIN_RANGE_HZ: f32 = 1.0;

/// Deviation meter widget.
pub struct DeviationMeter {
    /// Measured minus target (None if no reading yet)
    deviation_hz: Option<f32>,
    margin_hz: f32,
    stale: bool,
}

impl DeviationMeter {
    pub fn new(deviation_hz: Option<f32>, margin_hz: f32, stale: bool) -> Self {
        Self {
            deviation_hz,
            margin_hz,
            stale,
        }
    }

    /// Half-width of the scale in Hz.
    pub fn range_hz(&self) -> f32 {
        (self.margin_hz * 10.0).max(MIN_RANGE_HZ)
    }

    /// Horizontal position of a deviation as a fraction of the width.
    pub fn position(&self, deviation_hz: f32) -> f32 {
        let range = self.range_hz();
        (deviation_hz.clamp(-range, range) + range) / (2.0 * range)
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for DeviationMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Draw meter background
        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // In-tune band
        let band_left = self.position(-self.margin_hz) * bounds.width;
        let band_right = self.position(self.margin_hz) * bounds.width;
        let band = Path::rectangle(
            Point::new(band_left, 0.0),
            Size::new((band_right - band_left).max(1.0), bounds.height),
        );
        frame.fill(&band, Color::from_rgba(0.2, 0.86, 0.6, 0.25));

        // Draw center line
        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default()
                .with_width(2.0)
                .with_color(Color::WHITE),
        );

        // Draw needle
        if let Some(deviation) = self.deviation_hz {
            let needle_pos = self.position(deviation) * bounds.width;

            let color = if self.stale {
                Color::from_rgb8(0x80, 0x80, 0x80) // Grey
            } else if deviation.abs() <= self.margin_hz {
                Color::from_rgb8(0x34, 0xDB, 0x98) // Green
            } else {
                Color::from_rgb8(0xFF, 0xA5, 0x00) // Orange
            };

            let needle =
                Path::rectangle(Point::new(needle_pos - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, color);
        }

        vec![frame.into_geometry()]
    }
}
