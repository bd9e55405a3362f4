//! Implements the capture device traits using pnet

use pnet::datalink;
use std::{io, sync::Arc};

use crate::{
    capture::{CapturedFrame, Device, DeviceConfig, FrameSource},
    error::{RWireLibError, Result},
    packet::LinkType,
};

/// A pnet implementation of [`Device`]
pub struct PNetDevice {
    interface: datalink::NetworkInterface,
}

// Implements the Device trait for our PNet implementation
impl Device for PNetDevice {
    fn name(&self) -> String {
        self.interface.name.clone()
    }

    fn description(&self) -> String {
        self.interface.description.clone()
    }

    fn link_type(&self) -> LinkType {
        // pnet datalink channels always deliver Ethernet framing
        LinkType::Ethernet
    }

    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn FrameSource>> {
        let cfg = datalink::Config {
            read_timeout: Some(config.read_timeout),
            promiscuous: config.promiscuous,
            ..datalink::Config::default()
        };

        match datalink::channel(&self.interface, cfg) {
            Ok(datalink::Channel::Ethernet(_tx, rx)) => {
                Ok(Box::new(PNetFrameSource { receiver: rx }))
            }
            Ok(_) => {
                Err(RWireLibError::Wire("failed to create frame source".into()))
            }
            Err(e) => Err(RWireLibError::Wire(e.to_string())),
        }
    }
}

/// A pnet implementation of [`FrameSource`]
pub struct PNetFrameSource {
    receiver: Box<dyn datalink::DataLinkReceiver>,
}

// Implements the FrameSource trait for our PNet implementation
impl FrameSource for PNetFrameSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>> {
        match self.receiver.next() {
            Ok(bytes) => Ok(Some(CapturedFrame {
                bytes: bytes.to_vec(),
                wire_length: bytes.len() as u32,
                captured_length: bytes.len() as u32,
                link_type: LinkType::Ethernet,
            })),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(RWireLibError::Wire(e.to_string())),
        }
    }
}

/// Returns the list of capture-capable devices on the current host
///
/// Example
/// ```no_run
/// # use r_wirelib::capture::wire;
/// let devices = wire::devices();
/// for device in devices.iter() {
///     println!("{}", device.name());
/// }
/// ```
pub fn devices() -> Vec<Arc<dyn Device>> {
    datalink::interfaces()
        .into_iter()
        .map(|interface| Arc::new(PNetDevice { interface }) as Arc<dyn Device>)
        .collect()
}

#[cfg(test)]
#[path = "./wire_tests.rs"]
mod tests;
