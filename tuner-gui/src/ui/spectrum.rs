//! # Spectrum Widget
//!
//! Plots the magnitude spectrum of the last buffer as a line, frequency on
//! the horizontal axis and linear magnitude on the vertical one. The
//! dominant frequency, when there is one, is marked.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Theme};
use tuner_core::SpectralResult;

/// Spectrum data clipped to the displayed range.
pub struct SpectrumPlot {
    points: Vec<(f32, f32)>,
    max_frequency: f32,
    dominant: Option<f32>,
}

impl SpectrumPlot {
    pub fn empty(max_frequency: f32) -> Self {
        Self {
            points: Vec::new(),
            max_frequency,
            dominant: None,
        }
    }

    /// Keeps the bins up to `max_frequency`.
    pub fn from_spectrum(spectrum: &SpectralResult, max_frequency: f32) -> Self {
        let points = spectrum
            .frequencies
            .iter()
            .zip(&spectrum.magnitudes)
            .take_while(|(f, _)| **f <= max_frequency)
            .map(|(f, m)| (*f, *m))
            .collect();
        Self {
            points,
            max_frequency,
            dominant: spectrum.dominant_frequency,
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for SpectrumPlot {
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

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x20, 0x20, 0x20));

        if !bounds.width.is_finite() || !bounds.height.is_finite() || self.max_frequency <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let x_of = |freq: f32| freq / self.max_frequency * bounds.width;
        let label_color = Color::from_rgb8(0xAA, 0xAA, 0xAA);
        frame.fill_text(canvas::Text {
            content: "0 Hz".to_string(),
            position: Point::new(2.0, bounds.height - 14.0),
            color: label_color,
            size: 12.0.into(),
            ..canvas::Text::default()
        });
        frame.fill_text(canvas::Text {
            content: format!("{:.0} Hz", self.max_frequency),
            position: Point::new(bounds.width - 60.0, bounds.height - 14.0),
            color: label_color,
            size: 12.0.into(),
            ..canvas::Text::default()
        });

        let max_magnitude = self
            .points
            .iter()
            .map(|(_, m)| *m)
            .filter(|m| m.is_finite())
            .fold(0.0f32, f32::max);
        if self.points.is_empty() || max_magnitude <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let y_of = |magnitude: f32| {
            let m = if magnitude.is_finite() { magnitude } else { 0.0 };
            bounds.height - (m / max_magnitude) * (bounds.height - 20.0)
        };
        let line = Path::new(|builder| {
            let (f0, m0) = self.points[0];
            builder.move_to(Point::new(x_of(f0), y_of(m0)));
            for &(f, m) in &self.points[1..] {
                builder.line_to(Point::new(x_of(f), y_of(m)));
            }
        });
        frame.stroke(
            &line,
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb8(0x34, 0x98, 0xDB)),
        );

        if let Some(dominant) = self.dominant.filter(|f| *f <= self.max_frequency) {
            let x = x_of(dominant);
            let marker = Path::line(Point::new(x, 0.0), Point::new(x, bounds.height));
            frame.stroke(
                &marker,
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgb8(0xFF, 0xC3, 0x00)),
            );
            frame.fill_text(canvas::Text {
                content: format!("{:.2} Hz", dominant),
                position: Point::new((x + 4.0).min(bounds.width - 80.0), 2.0),
                color: Color::from_rgb8(0xFF, 0xC3, 0x00),
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_to_display_range() {
        let spectrum = SpectralResult {
            frequencies: vec![0.0, 500.0, 1000.0, 1500.0, 2000.0, 2500.0],
            magnitudes: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            dominant_frequency: Some(2500.0),
        };
        let plot = SpectrumPlot::from_spectrum(&spectrum, 2000.0);
        assert_eq!(plot.points.len(), 5);
        assert_eq!(plot.dominant, Some(2500.0));
    }
}
