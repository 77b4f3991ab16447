//! Mock USB discovery source.
//!
//! Devices are "plugged in" through a handle; the source reports them in
//! order and ends once every handle has been dropped.

use tokio::sync::mpsc;

use enocean_core::UsbServiceInfo;

use crate::traits::DiscoverySource;
use crate::{HostError, Result};

/// Mock discovery source fed through a [`MockUsbDiscoveryHandle`].
///
/// # Examples
///
/// ```
/// use enocean_core::UsbServiceInfo;
/// use enocean_host::mock::MockUsbDiscovery;
/// use enocean_host::traits::DiscoverySource;
///
/// #[tokio::main]
/// async fn main() -> enocean_host::Result<()> {
///     let (mut source, handle) = MockUsbDiscovery::new();
///
///     tokio::spawn(async move {
///         let stick = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001);
///         handle.plug(stick).await.unwrap();
///     });
///
///     let device = source.next_device().await?.unwrap();
///     assert_eq!(device.vid, "0403");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockUsbDiscovery {
    device_rx: mpsc::Receiver<UsbServiceInfo>,
    name: String,
}

impl MockUsbDiscovery {
    /// Create a mock source and the handle that feeds it.
    pub fn new() -> (Self, MockUsbDiscoveryHandle) {
        Self::with_name("Mock USB Discovery".to_string())
    }

    /// Create a mock source with a custom name.
    pub fn with_name(name: String) -> (Self, MockUsbDiscoveryHandle) {
        let (device_tx, device_rx) = mpsc::channel(32);

        let source = Self { device_rx, name };
        let handle = MockUsbDiscoveryHandle { device_tx };

        (source, handle)
    }
}

impl DiscoverySource for MockUsbDiscovery {
    async fn next_device(&mut self) -> Result<Option<UsbServiceInfo>> {
        Ok(self.device_rx.recv().await)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for plugging devices into a [`MockUsbDiscovery`].
///
/// Clones feed the same source.
#[derive(Debug, Clone)]
pub struct MockUsbDiscoveryHandle {
    device_tx: mpsc::Sender<UsbServiceInfo>,
}

impl MockUsbDiscoveryHandle {
    /// Report a device to the source.
    ///
    /// # Errors
    ///
    /// Returns `HostError::DiscoveryClosed` if the source has been dropped.
    pub async fn plug(&self, info: UsbServiceInfo) -> Result<()> {
        self.device_tx
            .send(info)
            .await
            .map_err(|_| HostError::DiscoveryClosed)
    }

    /// Report several devices in order.
    ///
    /// # Errors
    ///
    /// Returns `HostError::DiscoveryClosed` if the source has been dropped.
    pub async fn plug_all(&self, devices: impl IntoIterator<Item = UsbServiceInfo>) -> Result<()> {
        for info in devices {
            self.plug(info).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick(path: &str) -> UsbServiceInfo {
        UsbServiceInfo::new(path, 0x0403, 0x6001)
    }

    #[tokio::test]
    async fn test_devices_arrive_in_order() {
        let (mut source, handle) = MockUsbDiscovery::new();
        handle
            .plug_all([stick("/dev/ttyUSB0"), stick("/dev/ttyUSB1")])
            .await
            .unwrap();
        drop(handle);

        let first = source.next_device().await.unwrap().unwrap();
        let second = source.next_device().await.unwrap().unwrap();
        assert_eq!(first.device, "/dev/ttyUSB0");
        assert_eq!(second.device, "/dev/ttyUSB1");
        assert!(source.next_device().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_plug_after_source_dropped() {
        let (source, handle) = MockUsbDiscovery::new();
        drop(source);

        let result = handle.plug(stick("/dev/ttyUSB0")).await;
        assert!(matches!(result, Err(HostError::DiscoveryClosed)));
    }

    #[test]
    fn test_custom_name() {
        let (source, _handle) = MockUsbDiscovery::with_name("Bench".to_string());
        assert_eq!(source.name(), "Bench");
    }
}
