//! USB bus scanner backed by `rusb`.
//!
//! Enumerates the bus once and reports every device whose vendor/product
//! pair is a known EnOcean gateway. Descriptor strings are read when the
//! device can be opened; otherwise they are left empty.
//!
//! Devices are reported by bus locator (`usb:BBB/AAA`), so flows started
//! from the scanner store no serial path in their entry.

use std::collections::VecDeque;

use rusb::{Device, DeviceDescriptor, UsbContext};
use tracing::debug;

use enocean_core::UsbServiceInfo;
use enocean_core::constants::USB_BUS_LOCATOR_PREFIX;

use crate::traits::DiscoverySource;
use crate::{HostError, Result};

/// Discovery source that scans the local USB bus.
#[derive(Debug, Default)]
pub struct UsbBusScanner {
    pending: VecDeque<UsbServiceInfo>,
    scanned: bool,
}

impl UsbBusScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate the bus and return the gateways found.
    ///
    /// Blocking; call from a blocking context.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Usb` if the device list cannot be read.
    pub fn scan() -> Result<Vec<UsbServiceInfo>> {
        let devices = rusb::devices()?;
        let mut found = Vec::new();

        for device in devices.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    let (bus, address) = (device.bus_number(), device.address());
                    debug!(bus, address, error = %e, "Skipping device");
                    continue;
                }
            };

            let info = UsbServiceInfo::new(
                device_path(device.bus_number(), device.address()),
                descriptor.vendor_id(),
                descriptor.product_id(),
            );
            if !info.is_known_gateway() {
                continue;
            }
            found.push(with_strings(info, &device, &descriptor));
        }

        debug!(count = found.len(), "USB bus scanned");
        Ok(found)
    }
}

/// Fill in the descriptor strings, if the device can be opened.
fn with_strings<T: UsbContext>(
    mut info: UsbServiceInfo,
    device: &Device<T>,
    descriptor: &DeviceDescriptor,
) -> UsbServiceInfo {
    if let Ok(handle) = device.open() {
        if let Ok(serial) = handle.read_serial_number_string_ascii(descriptor) {
            info = info.with_serial_number(serial);
        }
        if let Ok(manufacturer) = handle.read_manufacturer_string_ascii(descriptor) {
            info = info.with_manufacturer(manufacturer);
        }
        if let Ok(product) = handle.read_product_string_ascii(descriptor) {
            info = info.with_description(product);
        }
    }
    info
}

/// Bus locator for a device; the serial port it exposes is not known here.
fn device_path(bus: u8, address: u8) -> String {
    format!("{USB_BUS_LOCATOR_PREFIX}{bus:03}/{address:03}")
}

impl DiscoverySource for UsbBusScanner {
    async fn next_device(&mut self) -> Result<Option<UsbServiceInfo>> {
        if !self.scanned {
            let found = tokio::task::spawn_blocking(Self::scan)
                .await
                .map_err(|e| HostError::usb(e.to_string()))??;
            self.pending.extend(found);
            self.scanned = true;
        }
        Ok(self.pending.pop_front())
    }

    fn name(&self) -> &str {
        "USB bus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_path() {
        assert_eq!(device_path(1, 7), "usb:001/007");
        assert_eq!(device_path(12, 120), "usb:012/120");
    }

    #[test]
    fn test_device_path_is_not_a_serial_path() {
        let info = UsbServiceInfo::new(device_path(1, 7), 0x0403, 0x6001);
        assert!(info.is_known_gateway());
        assert_eq!(info.serial_path(), None);
    }

    #[tokio::test]
    async fn test_scanner_drains_pending() {
        let mut scanner = UsbBusScanner {
            pending: VecDeque::from([UsbServiceInfo::new("usb:001/007", 0x0403, 0x6001)]),
            scanned: true,
        };

        assert!(scanner.next_device().await.unwrap().is_some());
        assert!(scanner.next_device().await.unwrap().is_none());
    }
}
