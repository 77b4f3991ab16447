//! Discovery source abstraction.
//!
//! A discovery source reports USB devices that may be EnOcean gateways. The
//! [`FlowManager`](crate::FlowManager) drains a source from a tokio task and
//! starts one discovery-initiated flow per reported device.
//!
//! The method returns `impl Future + Send` rather than using `async fn` so
//! a generic source can be moved into a spawned task. Implementors can still
//! write `async fn next_device`.
//!
//! # Examples
//!
//! ```
//! use enocean_core::UsbServiceInfo;
//! use enocean_host::mock::MockUsbDiscovery;
//! use enocean_host::traits::DiscoverySource;
//!
//! #[tokio::main]
//! async fn main() -> enocean_host::Result<()> {
//!     let (mut source, handle) = MockUsbDiscovery::new();
//!     handle.plug(UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001)).await?;
//!     drop(handle);
//!
//!     assert!(source.next_device().await?.is_some());
//!     assert!(source.next_device().await?.is_none());
//!     Ok(())
//! }
//! ```

use std::future::Future;

use enocean_core::UsbServiceInfo;

use crate::Result;

/// Source of USB discovery events.
pub trait DiscoverySource: Send + 'static {
    /// Wait for the next discovered device.
    ///
    /// Returns `Ok(None)` once the source has no more devices to report.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying bus or channel fails.
    fn next_device(&mut self) -> impl Future<Output = Result<Option<UsbServiceInfo>>> + Send;

    /// Human-readable name used in logs.
    fn name(&self) -> &str;
}
