//! Core constants for the EnOcean integration setup flow.
//!
//! This module defines the identifiers, configuration keys and defaults shared
//! by the flow controller, the host engine and the command line front end.
//! Keeping them in one place guarantees that a field rendered by one step is
//! read back under the same key by the next one.
//!
//! # Usage
//!
//! ```
//! use enocean_core::constants::*;
//!
//! assert_eq!(DOMAIN, "enocean_new");
//! assert_eq!(DEFAULT_URL, "ws://localhost:3000");
//! assert_eq!(TITLE, "EnOcean");
//! ```

// ============================================================================
// Integration Identification
// ============================================================================

/// Internal name of the integration.
///
/// Distinguishes this integration from every other one in the host registry.
/// Entries and in-progress flows are grouped by this value.
pub const DOMAIN: &str = "enocean_new";

/// Display title given to every entry created by the flow.
pub const TITLE: &str = "EnOcean";

/// Major version of the entry schema produced by the flow.
pub const FLOW_VERSION: u32 = 1;

/// Minor version of the entry schema produced by the flow.
pub const FLOW_MINOR_VERSION: u32 = 0;

// ============================================================================
// Configuration Keys
// ============================================================================

/// Key of the connection URL field on the manual step.
pub const CONF_URL: &str = "url";

/// Key of the "use managed add-on" field on the supervisor step.
pub const CONF_USE_ADDON: &str = "use_addon";

/// Key under which the discovered USB device path is stored.
pub const CONF_USB_PATH: &str = "usb_path";

/// Description placeholder carrying the discovered device title.
pub const CONF_NAME: &str = "name";

// ============================================================================
// Defaults
// ============================================================================

/// Default connection URL offered on the manual step.
///
/// Points at a gateway add-on listening on the local loopback.
///
/// # Examples
///
/// ```
/// use enocean_core::constants::DEFAULT_URL;
/// use enocean_core::ConnectionUrl;
///
/// let url = ConnectionUrl::new(DEFAULT_URL).unwrap();
/// assert_eq!(url.port(), Some(3000));
/// ```
pub const DEFAULT_URL: &str = "ws://localhost:3000";

/// Default value of the "use managed add-on" field.
pub const DEFAULT_USE_ADDON: bool = true;

/// URL schemes accepted for a gateway connection.
pub const ALLOWED_URL_SCHEMES: [&str; 2] = ["ws", "wss"];

// ============================================================================
// Error Codes
// ============================================================================

/// Form error code used when the submitted URL cannot be parsed.
pub const ERROR_INVALID_URL: &str = "invalid_url";

// ============================================================================
// USB Identification
// ============================================================================

/// Vendor/product pairs of known EnOcean USB gateways.
///
/// The USB300 and USB310 sticks enumerate as an FTDI serial converter.
pub const KNOWN_USB_GATEWAYS: [(u16, u16); 1] = [(0x0403, 0x6001)];

/// Prefix of device locators built from a bus number and address.
///
/// Such a locator names a USB device, not a serial port the gateway can be
/// opened on.
pub const USB_BUS_LOCATOR_PREFIX: &str = "usb:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_uses_allowed_scheme() {
        let scheme = DEFAULT_URL.split("://").next().unwrap();
        assert!(ALLOWED_URL_SCHEMES.contains(&scheme));
    }

    #[test]
    fn test_config_keys_are_distinct() {
        let keys = [CONF_URL, CONF_USE_ADDON, CONF_USB_PATH, CONF_NAME];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
