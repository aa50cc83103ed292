//! # Main Display Module
//!
//! Layout of the tuner window: status text, deviation meter and spectrum.

use iced::widget::{button, column, container, text, Space};
use iced::{Color, Element, Length};
use tuner_core::{SessionState, TuningSnapshot};

use super::{deviation_meter, spectrum};

/// How the status text should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    InTune,
    OutOfTune,
    Neutral,
}

/// Colour for a tone; `None` keeps the theme's text colour.
pub fn tone_color(tone: StatusTone) -> Option<Color> {
    match tone {
        StatusTone::InTune => Some(Color::from_rgb8(0x34, 0xDB, 0x98)), // Green
        StatusTone::OutOfTune => Some(Color::from_rgb8(0xFF, 0xA5, 0x00)), // Orange
        StatusTone::Neutral => None,
    }
}

/// Status lines for a snapshot, one field per line.
///
/// A current reading is coloured by its instruction; a stale one is shown
/// as the last known value.
pub fn status_text(snapshot: &TuningSnapshot) -> (String, StatusTone) {
    let tone = match (snapshot.state(), &snapshot.reading) {
        (SessionState::Tracking, Some(reading)) if reading.instruction.is_in_tune() => {
            StatusTone::InTune
        }
        (SessionState::Tracking, Some(_)) => StatusTone::OutOfTune,
        _ => StatusTone::Neutral,
    };
    (snapshot.to_string().replace(" | ", "\n"), tone)
}

/// Creates the complete main application view
pub fn create_main_view(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let title = text("String Tuner").size(28);

    let content = column![
        title,
        Space::with_height(20),
        create_status_panel(data),
        create_meter_panel(data),
        create_spectrum_panel(data),
    ]
    .spacing(10)
    .padding(20);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn create_status_panel(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    if !data.audio_active {
        let message = data
            .audio_error
            .clone()
            .unwrap_or_else(|| "Audio capture is not running.".to_string());
        return column![
            text(message).size(20).color(Color::from_rgb8(0xFF, 0x33, 0x33)),
            button(text("Retry audio").size(14))
                .padding([6, 10])
                .on_press(crate::Message::RestartAudio),
        ]
        .spacing(10)
        .into();
    }

    let snapshot = data
        .last_report
        .as_ref()
        .map(|r| r.snapshot.clone())
        .unwrap_or_default();
    let (status, tone) = status_text(&snapshot);
    let status = text(status).size(22);
    let status = match tone_color(tone) {
        Some(color) => status.color(color),
        None => status,
    };

    container(status)
        .width(Length::Fill)
        .padding(15)
        .into()
}

fn create_meter_panel(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let reading = data
        .last_report
        .as_ref()
        .and_then(|r| r.snapshot.reading.as_ref().map(|reading| (reading.clone(), r.snapshot.stale)));

    let caption = match &reading {
        Some((reading, _)) => format!(
            "Deviation: {:+.2} Hz ({:+.1} cents), margin ±{:.2} Hz",
            reading.deviation_hz(),
            reading.cents,
            data.config.tuning_margin_hz
        ),
        None => format!("Deviation: --, margin ±{:.2} Hz", data.config.tuning_margin_hz),
    };

    let meter = deviation_meter::DeviationMeter::new(
        reading.as_ref().map(|(r, _)| r.deviation_hz()),
        data.config.tuning_margin_hz,
        reading.as_ref().is_some_and(|(_, stale)| *stale),
    );

    column![text(caption).size(14), meter.view()]
        .spacing(5)
        .into()
}

fn create_spectrum_panel(data: &crate::AppDisplayData) -> Element<'static, crate::Message> {
    let plot = match &data.last_report {
        Some(report) => spectrum::SpectrumPlot::from_spectrum(
            &report.spectrum,
            data.config.display_max_frequency_hz,
        ),
        None => spectrum::SpectrumPlot::empty(data.config.display_max_frequency_hz),
    };

    container(
        column![
            text("Spectrum (frequency vs magnitude)").size(18),
            Space::with_height(10),
            container(plot.view()).width(Length::Fill).height(Length::Fill),
        ]
        .spacing(5),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuner_core::notes::note_of;
    use tuner_core::{Instruction, Reading};

    fn reading(measured: f32, instruction: Instruction) -> Reading {
        let note = note_of(measured).unwrap();
        Reading {
            note,
            target_frequency: note.frequency(),
            measured_frequency: measured,
            instruction,
            cents: 0.0,
        }
    }

    #[test]
    fn empty_snapshot_has_no_data() {
        let (text, tone) = status_text(&TuningSnapshot::default());
        assert_eq!(text, "Volume below threshold, no data yet");
        assert_eq!(tone, StatusTone::Neutral);
    }

    #[test]
    fn tracking_snapshot_is_coloured_by_instruction() {
        let snapshot = TuningSnapshot {
            reading: Some(reading(440.0, Instruction::InTune)),
            stale: false,
        };
        let (text, tone) = status_text(&snapshot);
        assert!(text.contains("Note: A4 (440.00 Hz)"));
        assert_eq!(tone, StatusTone::InTune);

        let snapshot = TuningSnapshot {
            reading: Some(reading(445.0, Instruction::Loosen)),
            stale: false,
        };
        assert_eq!(status_text(&snapshot).1, StatusTone::OutOfTune);
        assert!(tone_color(StatusTone::OutOfTune).is_some());
    }

    #[test]
    fn stale_snapshot_shows_last_known() {
        let snapshot = TuningSnapshot {
            reading: Some(reading(110.0, Instruction::InTune)),
            stale: true,
        };
        let (text, tone) = status_text(&snapshot);
        assert!(text.starts_with("Last frequency: 110.00 Hz"));
        assert!(text.contains("Last note: A2"));
        assert_eq!(tone, StatusTone::Neutral);
    }

    #[test]
    fn status_lines_follow_snapshot_text() {
        let snapshots = [
            TuningSnapshot::default(),
            TuningSnapshot {
                reading: Some(reading(82.41, Instruction::InTune)),
                stale: false,
            },
            TuningSnapshot {
                reading: Some(reading(82.41, Instruction::InTune)),
                stale: true,
            },
        ];
        for snapshot in snapshots {
            let (text, _) = status_text(&snapshot);
            assert_eq!(text.lines().collect::<Vec<_>>().join(" | "), snapshot.to_string());
        }
    }
}
