//! Host side of the EnOcean gateway setup flow.
//!
//! This crate runs setup flows the way an integration host would: it keeps
//! every in-progress flow and every created entry, answers the registry
//! questions flows ask, and turns USB discovery events into new flows.
//!
//! # Flow Management
//!
//! The [`FlowManager`] starts flows, routes form input to them and stores
//! the [`ConfigEntry`] a finished flow produces:
//!
//! ```
//! use enocean_core::UsbServiceInfo;
//! use enocean_flow::{FlowResult, FlowStep};
//! use enocean_host::{FlowManager, HostConfig};
//! use enocean_host::mock::StaticProber;
//!
//! # fn main() -> enocean_host::Result<()> {
//! let mut manager = FlowManager::new(HostConfig::default(), StaticProber::supervised());
//!
//! let stick = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001).with_serial_number("FT5ABC12");
//! let (id, _) = manager.start_usb_flow(stick.clone())?;
//! manager.advance(id, FlowStep::UsbConfirm, Some(Default::default()))?;
//! manager.advance(id, FlowStep::Manual, Some(Default::default()))?;
//!
//! // The same stick discovered again is turned away
//! let (_, result) = manager.start_usb_flow(stick)?;
//! assert!(matches!(result, FlowResult::Abort(_)));
//! # Ok(())
//! # }
//! ```
//!
//! # Discovery
//!
//! A [`DiscoverySource`](traits::DiscoverySource) yields USB descriptors.
//! [`FlowManager::run_discovery`] drains one from a tokio task. The `mock`
//! module provides a channel-driven source for tests; with the
//! `hardware-usb` feature, `usb::UsbBusScanner` enumerates the real bus.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HostError`] error type.

pub mod error;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

#[cfg(feature = "hardware-usb")]
pub mod usb;

pub use error::{HostError, Result};
pub use manager::{DiscoveryHandle, DiscoveryReport, FlowManager};
pub use traits::DiscoverySource;
pub use types::{ConfigEntry, DEFAULT_DISCOVERY_CHANNEL_CAPACITY, HostConfig};
