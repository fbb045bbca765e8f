use log::{info, warn};
use pcap::{Active, Capture, Device};

use crate::capture::interfaces;
use crate::models::config::CaptureConfig;
use crate::utils::error::{CaptureError, CaptureResult};

/// A stream of raw captured frames.
///
/// `next_frame` blocks for at most the configured read timeout and returns
/// `Ok(None)` when the timeout elapses without a packet, which is how the
/// engine gets a chance to observe its stop flag.
pub trait PacketSource: Send {
    fn next_frame(&mut self) -> CaptureResult<Option<Vec<u8>>>;
}

/// Opens capture handles and answers which interfaces exist.
///
/// The session talks to the capture machinery only through this trait, so the
/// lifecycle logic can be exercised without touching a real device.
pub trait CaptureBackend: Send + Sync {
    fn interface_names(&self) -> CaptureResult<Vec<String>>;

    fn open(&self, interface: &str, config: &CaptureConfig) -> CaptureResult<Box<dyn PacketSource>>;
}

/// Production backend on top of libpcap.
pub struct PcapBackend;

impl CaptureBackend for PcapBackend {
    fn interface_names(&self) -> CaptureResult<Vec<String>> {
        interfaces::names()
    }

    fn open(&self, interface: &str, config: &CaptureConfig) -> CaptureResult<Box<dyn PacketSource>> {
        // Prefer the fully configured device from the device list; fall back
        // to opening by name when the list is unavailable.
        let device = match Device::list() {
            Ok(devices) => devices.into_iter().find(|d| d.name == interface),
            Err(e) => {
                warn!("Failed to list devices ({e}), opening by name");
                None
            }
        };

        let builder = match device {
            Some(device) => Capture::from_device(device)?,
            None => Capture::from_device(interface)?,
        };

        let mut capture = builder
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout_ms)
            .open()?;

        if let Some(filter) = &config.filter {
            match capture.filter(filter.as_str(), true) {
                Ok(()) => info!("Applied filter: {filter}"),
                Err(e) => warn!("Failed to apply filter {filter:?}: {e}"),
            }
        }

        Ok(Box::new(PcapSource { capture }))
    }
}

struct PcapSource {
    capture: Capture<Active>,
}

impl PacketSource for PcapSource {
    fn next_frame(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Some(packet.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(CaptureError::Device(e.to_string())),
        }
    }
}
