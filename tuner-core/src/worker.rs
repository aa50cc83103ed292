//! # Worker Module
//!
//! Runs the tuning cycle on a dedicated thread.
//!
//! ## Architecture
//! - **Capture**: a [`BufferSource`] blocks until the next buffer is ready;
//!   the wait is the natural pacing of the loop
//! - **Hand-off**: each [`CycleReport`] is an immutable value passed through
//!   a single-slot channel, so a reader never sees a half-updated snapshot
//! - **Stop**: dropping the stop sender wakes every blocking point; the
//!   current cycle finishes and the thread exits

use std::thread::{self, JoinHandle};

use anyhow::Result;
use cpal::traits::StreamTrait;
use crossbeam_channel::{select, Receiver, Sender, TryRecvError};

use crate::audio;
use crate::error::TunerResult;
use crate::{AudioBuffer, CycleReport, TunerConfig, TuningSession};

/// Supplies one buffer per cycle.
pub trait BufferSource {
    /// Blocks until the next buffer is available. `None` once the source is
    /// exhausted or a stop was requested.
    fn next_buffer(&mut self) -> Option<AudioBuffer>;
}

/// Buffers arriving over a channel, interruptible by a stop signal.
pub struct ChannelSource {
    buffers: Receiver<AudioBuffer>,
    stop: Receiver<()>,
}

impl ChannelSource {
    pub fn new(buffers: Receiver<AudioBuffer>, stop: Receiver<()>) -> Self {
        Self { buffers, stop }
    }
}

impl BufferSource for ChannelSource {
    fn next_buffer(&mut self) -> Option<AudioBuffer> {
        select! {
            recv(self.buffers) -> msg => msg.ok(),
            recv(self.stop) -> _ => None,
        }
    }
}

/// Live microphone capture. Owns the CPAL stream, which must stay on the
/// thread that opened it.
struct LiveSource {
    stream: cpal::Stream,
    inner: ChannelSource,
}

impl BufferSource for LiveSource {
    fn next_buffer(&mut self) -> Option<AudioBuffer> {
        self.inner.next_buffer()
    }
}

impl Drop for LiveSource {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            log::warn!("Error pausing stream: {}", e);
        }
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    matches!(stop.try_recv(), Ok(()) | Err(TryRecvError::Disconnected))
}

/// Processes buffers from `source` until it runs dry, the report receiver
/// goes away, or a stop is requested. The stop signal is checked between
/// cycles and while waiting to hand off a report.
///
/// Returns the session so its snapshot outlives the loop.
pub fn run_loop<S: BufferSource + ?Sized>(
    mut session: TuningSession,
    source: &mut S,
    reports: &Sender<CycleReport>,
    stop: &Receiver<()>,
) -> TuningSession {
    loop {
        if stop_requested(stop) {
            log::info!("Stop requested");
            break;
        }
        let Some(report) = session.run_cycle(source) else {
            log::info!("Buffer source closed");
            break;
        };
        select! {
            send(reports, report) -> res => {
                if res.is_err() {
                    log::info!("Report receiver dropped");
                    break;
                }
            },
            recv(stop) -> _ => {
                log::info!("Stop requested during hand-off");
                break;
            },
        }
    }
    session
}

/// Handle to a running tuning thread.
#[derive(Debug)]
pub struct Worker {
    reports: Receiver<CycleReport>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<TuningSession>>,
}

impl Worker {
    /// Reports in production order; at most one is waiting at a time.
    pub fn reports(&self) -> &Receiver<CycleReport> {
        &self.reports
    }

    /// Most recent waiting report, if any.
    pub fn try_latest(&self) -> Option<CycleReport> {
        self.reports.try_iter().last()
    }

    /// True while the thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Requests a stop and waits for the thread. Returns the session on the
    /// first call if the thread exited cleanly.
    pub fn stop(&mut self) -> Option<TuningSession> {
        drop(self.stop_tx.take());
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(session) => {
                log::info!("Tuning worker stopped after {} cycles", session.cycles());
                Some(session)
            }
            Err(_) => {
                log::warn!("Tuning worker panicked");
                None
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns the tuning loop on its own thread.
///
/// `open` runs on the new thread and builds the buffer source there, so
/// sources that are not `Send` (such as a CPAL stream) can be used. It
/// receives the stop receiver to make its blocking waits interruptible.
pub fn spawn<S, F>(session: TuningSession, open: F) -> Worker
where
    S: BufferSource,
    F: FnOnce(Receiver<()>) -> Result<S> + Send + 'static,
{
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
    let (report_tx, report_rx) = crossbeam_channel::bounded(1);

    let handle = thread::spawn(move || {
        log::info!("Tuning worker starting");
        let mut source = match open(stop_rx.clone()) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Fatal error starting buffer source: {:#}", e);
                return session;
            }
        };
        run_loop(session, &mut source, &report_tx, &stop_rx)
    });

    Worker {
        reports: report_rx,
        stop_tx: Some(stop_tx),
        handle: Some(handle),
    }
}

/// Spawns a worker fed by the default microphone.
///
/// # Errors
/// If `config` is invalid. Device failures surface as a worker that stops
/// on its own; its report channel then disconnects.
pub fn spawn_live(config: TunerConfig) -> TunerResult<Worker> {
    let session = TuningSession::new(config.clone())?;
    Ok(spawn(session, move |stop| {
        let (buffer_tx, buffer_rx) = crossbeam_channel::bounded(1);
        let stream = audio::start_audio_capture(&config, buffer_tx)?;
        Ok(LiveSource {
            stream,
            inner: ChannelSource::new(buffer_rx, stop),
        })
    }))
}
