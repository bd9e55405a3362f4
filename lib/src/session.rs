//! The capture-session lifecycle engine
//!
//! A [`CaptureSession`] owns the selected capture device, the session clock
//! and sequence counter, and the live [`PacketStore`]. It bridges the
//! capture side into a single consumption context: a reader thread pulls
//! frames off the device and seals in their sequence number and arrival
//! offset, and a consumer thread - the only writer for the store - dissects
//! and appends them in order.
//!
//! Stopping a session is a drain barrier, not a timing heuristic: the
//! reader is signalled and joined, which closes the hand-off channel, and
//! the consumer is then joined after draining every in-flight frame. Only
//! once both joins complete may a new session clear the store, so frames
//! from a previous device can never leak into a new session.

use derive_builder::Builder;
use log::*;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{
    capture::{CapturedFrame, Device, DeviceConfig},
    dissect,
    error::{RWireLibError, Result},
    store::PacketStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Notifications emitted to session observers
pub enum SessionEvent {
    /// A capture session began delivering packets
    CaptureStarted,
    /// The running capture session stopped and drained
    CaptureStopped,
}

// A captured frame with its session bookkeeping sealed in on the capture
// side, before the asynchronous hand-off
struct SealedFrame {
    sequence: u64,
    arrival_offset: f64,
    frame: CapturedFrame,
}

/// The stateful orchestrator for one capture device at a time
///
/// Long-lived; cycles between idle and running for the life of the process.
#[derive(Builder)]
#[builder(setter(into))]
pub struct CaptureSession {
    /// The enumerated capture-capable devices selectable by index
    devices: Vec<Arc<dyn Device>>,
    /// Channel for emitting session lifecycle events to observers
    notifier: mpsc::Sender<SessionEvent>,
    /// Configuration applied when opening the selected device
    #[builder(default)]
    config: Option<DeviceConfig>,
    /// The live packet store for the current session
    #[builder(default = "Arc::new(Mutex::new(PacketStore::new()))")]
    store: Arc<Mutex<PacketStore>>,
    /// Index of the currently selected device
    #[builder(setter(skip), default)]
    selected: Option<usize>,
    /// Whether a capture is currently running
    #[builder(setter(skip), default)]
    running: bool,
    /// The next sequence number to assign, reset to 1 at session start
    #[builder(setter(skip), default = "Arc::new(AtomicU64::new(1))")]
    next_sequence: Arc<AtomicU64>,
    /// Count of frames dropped by dissection failures this session
    #[builder(setter(skip), default)]
    dropped: Arc<AtomicU64>,
    #[builder(setter(skip), default)]
    reader_handle: Option<JoinHandle<Result<()>>>,
    #[builder(setter(skip), default)]
    consumer_handle: Option<JoinHandle<()>>,
    #[builder(setter(skip), default)]
    stop_tx: Option<mpsc::Sender<()>>,
}

impl CaptureSession {
    /// Returns a builder for CaptureSession
    pub fn builder() -> CaptureSessionBuilder {
        CaptureSessionBuilder::default()
    }

    /// Returns the number of enumerated capture devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Returns true while a capture is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the index of the currently selected device, if any
    pub fn selected_device(&self) -> Option<usize> {
        self.selected
    }

    /// Returns a shared handle to the live packet store
    pub fn store(&self) -> Arc<Mutex<PacketStore>> {
        Arc::clone(&self.store)
    }

    /// Returns the number of frames dropped by dissection failures during
    /// the current session
    ///
    /// A dropped frame keeps the sequence number it was assigned on
    /// arrival, so drops appear as gaps in the stored sequence rather than
    /// renumbering later packets.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Returns the sequence number the next arriving frame will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst)
    }

    /// Starts capturing on the device at `device_index`
    ///
    /// Returns [`RWireLibError::InvalidArgument`] when the index is out of
    /// range of the enumerated device list. If a capture is already running
    /// this behaves as a restart: the running session is stopped and
    /// drained before the new one begins. A `config` of `None` keeps the
    /// previously supplied configuration, or defaults. On success the store
    /// is cleared, the sequence counter resets to 1, and
    /// [`SessionEvent::CaptureStarted`] is emitted. A failed start leaves
    /// the session idle.
    pub fn start(
        &mut self,
        device_index: usize,
        config: Option<DeviceConfig>,
    ) -> Result<()> {
        if device_index >= self.devices.len() {
            return Err(RWireLibError::InvalidArgument(format!(
                "device index {} out of range for {} devices",
                device_index,
                self.devices.len()
            )));
        }

        if self.running {
            self.stop()?;
        }

        if let Some(config) = config {
            self.config = Some(config);
        }

        self.selected = Some(device_index);

        self.launch()
    }

    /// Stops the running capture and drains all in-flight frames
    ///
    /// Returns [`RWireLibError::InvalidOperation`] when no capture is
    /// running or no device is selected; callers on shutdown paths should
    /// check [`CaptureSession::is_running`] first. When this returns, no
    /// frame from the stopped device can reach the store, and
    /// [`SessionEvent::CaptureStopped`] has been emitted.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running || self.selected.is_none() {
            return Err(RWireLibError::InvalidOperation(
                "no capture is running".into(),
            ));
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            // the reader may already be gone after a wire error
            let _ = stop_tx.send(());
        }

        // join the reader first: its exit drops the hand-off sender, which
        // lets the consumer drain every in-flight frame and terminate
        let mut read_result = Ok(());

        if let Some(handle) = self.reader_handle.take() {
            read_result = handle.join()?;
        }

        let consumer_result = match self.consumer_handle.take() {
            Some(handle) => handle.join().map_err(RWireLibError::from),
            None => Ok(()),
        };

        self.running = false;

        let _ = self.notifier.send(SessionEvent::CaptureStopped);

        consumer_result?;

        read_result
    }

    /// Stops the running capture, then starts again on `device_index` or,
    /// when `None`, the previously selected device
    pub fn restart(&mut self, device_index: Option<usize>) -> Result<()> {
        self.stop()?;

        let index = device_index.or(self.selected).ok_or_else(|| {
            RWireLibError::InvalidOperation("no device selected".into())
        })?;

        self.start(index, None)
    }

    fn launch(&mut self) -> Result<()> {
        let index = self.selected.ok_or_else(|| {
            RWireLibError::InvalidOperation("no device selected".into())
        })?;

        let device = Arc::clone(&self.devices[index]);
        let config = self.config.clone().unwrap_or_default();

        debug!("opening capture device {}", device.name());

        // a failed open leaves the session idle with its previous store
        // intact
        let mut source = device.open(&config)?;

        {
            let mut store = self.store.lock()?;
            store.clear();
        }

        self.next_sequence.store(1, Ordering::SeqCst);
        self.dropped.store(0, Ordering::SeqCst);

        let started = Instant::now();
        let (frame_tx, frame_rx) = mpsc::channel::<SealedFrame>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let next_sequence = Arc::clone(&self.next_sequence);

        let reader_handle = thread::spawn(move || -> Result<()> {
            loop {
                if stop_rx.try_recv().is_ok() {
                    debug!("exiting capture reader");
                    break;
                }

                match source.next_frame() {
                    Ok(Some(frame)) => {
                        // sequence and arrival offset are assigned here,
                        // synchronously on the capture side, so store order
                        // always matches arrival order
                        let sealed = SealedFrame {
                            sequence: next_sequence
                                .fetch_add(1, Ordering::SeqCst),
                            arrival_offset: started.elapsed().as_secs_f64(),
                            frame,
                        };

                        if frame_tx.send(sealed).is_err() {
                            break;
                        }
                    }
                    // the read timed out; loop around to poll the stop
                    // signal
                    Ok(None) => continue,
                    Err(e) => {
                        error!("capture read failed: {}", e);
                        return Err(e);
                    }
                }
            }

            Ok(())
        });

        let store = Arc::clone(&self.store);
        let dropped = Arc::clone(&self.dropped);

        // the consumer thread is the single writer for the store; it exits
        // once every reader sender is gone and the channel has drained
        let consumer_handle = thread::spawn(move || {
            for sealed in frame_rx {
                match dissect::dissect(
                    &sealed.frame.bytes,
                    sealed.frame.link_type,
                    sealed.sequence,
                    sealed.arrival_offset,
                    sealed.frame.wire_length,
                    sealed.frame.captured_length,
                ) {
                    Ok(packet) => {
                        if let Ok(mut store) = store.lock() {
                            store.push(packet);
                        }
                    }
                    Err(e) => {
                        // a frame that fails dissection is dropped; the
                        // session keeps running
                        dropped.fetch_add(1, Ordering::SeqCst);
                        debug!("dropping frame {}: {}", sealed.sequence, e);
                    }
                }
            }
        });

        self.reader_handle = Some(reader_handle);
        self.consumer_handle = Some(consumer_handle);
        self.stop_tx = Some(stop_tx);
        self.running = true;

        let _ = self.notifier.send(SessionEvent::CaptureStarted);

        Ok(())
    }
}

#[cfg(test)]
#[path = "./session_tests.rs"]
mod tests;
