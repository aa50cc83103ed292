//! # String Tuner GUI
//!
//! Desktop front end of the string tuner. It plots the spectrum of the last
//! captured buffer and shows the detected note with its tuning instruction.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Tuning Thread**: `tuner_core::worker` captures and analyses one
//!   buffer per cycle
//! - **Communication**: single-slot crossbeam channel of immutable reports
//! - **Updates**: a timer subscription at the configured tick interval

mod ui;

use iced::{self, Element, Subscription, Theme};
use tuner_core::worker::{self, Worker};
use tuner_core::{CycleReport, TunerConfig};
use ui::main_display::create_main_view;

/// Main entry point for the string tuner.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting string tuner...");
    let result = iced::application("String Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    /// Timer tick: poll the tuning thread for a new report.
    Tick,
    /// Stop the tuning thread (if any) and open the device again.
    RestartAudio,
}

/// Data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub config: TunerConfig,
    pub last_report: Option<CycleReport>,
    pub audio_active: bool,
    pub audio_error: Option<String>,
}

/// Main application state.
struct TunerApp {
    worker: Option<Worker>,
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = TunerConfig::load_or_default().unwrap_or_else(|e| {
            log::warn!("Could not load configuration ({:#}), using defaults", e);
            TunerConfig::default()
        });
        let mut app = Self {
            worker: None,
            display_data: AppDisplayData {
                config,
                last_report: None,
                audio_active: false,
                audio_error: None,
            },
        };
        app.start_audio_processing();
        app
    }
}

impl TunerApp {
    /// Starts the tuning thread on the default input device.
    fn start_audio_processing(&mut self) {
        match worker::spawn_live(self.display_data.config.clone()) {
            Ok(worker) => {
                log::info!("Tuning worker started");
                self.worker = Some(worker);
                self.display_data.audio_active = true;
                self.display_data.audio_error = None;
            }
            Err(e) => {
                log::error!("Could not start tuning worker: {}", e);
                self.display_data.audio_active = false;
                self.display_data.audio_error = Some(e.to_string());
            }
        }
    }

    fn stop_audio_processing(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            log::info!("Shutting down tuning worker...");
            worker.stop();
        }
        self.display_data.audio_active = false;
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::Tick => {
                let Some(worker) = &self.worker else {
                    return;
                };
                if let Some(report) = worker.try_latest() {
                    if let Some(failure) = &report.failure {
                        log::debug!("Cycle kept previous reading: {}", failure);
                    }
                    self.display_data.last_report = Some(report);
                } else if !worker.is_running() {
                    log::warn!("Tuning worker exited, audio capture unavailable");
                    self.stop_audio_processing();
                    self.display_data.audio_error =
                        Some("Audio capture stopped. Check the input device.".to_string());
                }
            }
            Message::RestartAudio => {
                self.stop_audio_processing();
                self.start_audio_processing();
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Fires once per configured tick interval.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(self.display_data.config.tick_interval()).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl Drop for TunerApp {
    fn drop(&mut self) {
        self.stop_audio_processing();
    }
}
