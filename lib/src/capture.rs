//! Capture device abstraction
//!
//! The session core never talks to a capture backend directly; it goes
//! through the [`Device`] and [`FrameSource`] traits so tests can substitute
//! mocks. A pnet backed implementation lives in [`wire`].

use core::time;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::{error::Result, packet::LinkType};

pub mod wire;

/// Default read timeout for opened devices
///
/// Frame reads must time out periodically so the capture thread can observe
/// its stop signal between frames.
pub const DEFAULT_READ_TIMEOUT: time::Duration = time::Duration::from_millis(100);

/// Configuration applied when opening a capture device
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Whether to put the device into promiscuous mode
    pub promiscuous: bool,
    /// How long a single frame read may block before yielding
    pub read_timeout: time::Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            promiscuous: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// One raw captured unit of data as delivered by a [`FrameSource`]
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// The captured bytes including the link-layer header
    pub bytes: Vec<u8>,
    /// Length of the frame as it appeared on the wire
    pub wire_length: u32,
    /// Number of bytes actually captured
    pub captured_length: u32,
    /// Link-layer framing of the originating device
    pub link_type: LinkType,
}

#[cfg_attr(test, automock)]
/// Trait describing an open capture handle delivering frames
pub trait FrameSource: Send {
    /// Should return the next frame off of the wire, or `None` when the
    /// read timed out without a frame arriving. Dropping the source closes
    /// the underlying device.
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>>;
}

#[cfg_attr(test, automock)]
/// Trait describing an enumerable capture-capable device
pub trait Device: Send + Sync {
    /// Returns the system name of the device
    fn name(&self) -> String;

    /// Returns a human readable description of the device
    fn description(&self) -> String;

    /// Returns the link-layer framing frames from this device will carry
    fn link_type(&self) -> LinkType;

    /// Opens the device for capture and begins delivering frames
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn FrameSource>>;
}
