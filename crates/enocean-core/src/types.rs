use crate::{
    Result,
    constants::{ALLOWED_URL_SCHEMES, KNOWN_USB_GATEWAYS, USB_BUS_LOCATOR_PREFIX},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Identifier of one in-progress flow, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(Uuid);

impl FlowId {
    /// Generate a fresh random flow ID.
    #[must_use]
    pub fn new() -> Self {
        FlowId(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FlowId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(FlowId)
            .map_err(|e| Error::Config(format!("Invalid flow ID {s}: {e}")))
    }
}

/// Stable identifier of a physical device, used to deduplicate discoveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId(String);

impl UniqueId {
    /// Create a unique ID.
    ///
    /// # Errors
    /// Returns `Error::InvalidDescriptor` if the value is empty or blank.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::InvalidDescriptor(
                "Unique ID must not be empty".to_string(),
            ));
        }
        Ok(UniqueId(value))
    }

    /// Get the unique ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gateway connection URL (`ws://` or `wss://`).
///
/// Parsed with [`url::Url`]; the trimmed input is kept verbatim for display
/// and storage since the parser normalizes (lower-cased host, trailing `/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionUrl {
    raw: String,
    url: Url,
}

impl ConnectionUrl {
    /// Parse and validate a connection URL.
    ///
    /// The input is trimmed before parsing.
    ///
    /// # Errors
    /// Returns `Error::InvalidUrl` if:
    /// - The input is not an absolute URL
    /// - The scheme is not `ws` or `wss`
    /// - The host is missing
    /// - The URL carries credentials
    /// - The port is 0
    pub fn new(url: &str) -> Result<Self> {
        let raw = url.trim();

        let parsed = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw:?}: {e}")))?;

        if !ALLOWED_URL_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::InvalidUrl(format!(
                "Unsupported scheme {:?}, expected one of {ALLOWED_URL_SCHEMES:?}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidUrl(format!("Missing host in {raw:?}")));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(Error::InvalidUrl(format!("Credentials not allowed in {raw:?}")));
        }
        if parsed.port() == Some(0) {
            return Err(Error::InvalidUrl("Port must be 1-65535".to_string()));
        }

        Ok(ConnectionUrl {
            raw: raw.to_string(),
            url: parsed,
        })
    }

    /// Get the full URL as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the parsed URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Get the scheme, `ws` or `wss`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Get the host, with brackets for IPv6 literals.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Get the explicit port, if any.
    ///
    /// A port equal to the scheme default (80 or 443) is not reported.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Returns `true` for `wss://` URLs.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.scheme() == "wss"
    }
}

impl fmt::Display for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for ConnectionUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConnectionUrl::new(s)
    }
}

impl TryFrom<String> for ConnectionUrl {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        ConnectionUrl::new(&value)
    }
}

impl From<ConnectionUrl> for String {
    fn from(url: ConnectionUrl) -> Self {
        url.raw
    }
}

/// Descriptor of a USB device reported by the discovery source.
///
/// Vendor and product IDs are kept as upper-case hex strings, the way
/// discovery events carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbServiceInfo {
    /// Device path (e.g., "/dev/ttyUSB0"), or a `usb:BBB/AAA` bus locator
    /// when the device was found by enumerating the bus.
    pub device: String,

    /// Vendor ID as 4-digit hex.
    pub vid: String,

    /// Product ID as 4-digit hex.
    pub pid: String,

    /// Optional serial number string.
    pub serial_number: Option<String>,

    /// Optional manufacturer string.
    pub manufacturer: Option<String>,

    /// Optional product description.
    pub description: Option<String>,
}

impl UsbServiceInfo {
    /// Create a descriptor with the required fields.
    pub fn new(device: impl Into<String>, vid: u16, pid: u16) -> Self {
        Self {
            device: device.into(),
            vid: format!("{vid:04X}"),
            pid: format!("{pid:04X}"),
            serial_number: None,
            manufacturer: None,
            description: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set the product description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Derive the stable unique ID of the device.
    ///
    /// Format: `VID:PID_SERIAL_MANUFACTURER_DESCRIPTION`, missing parts empty.
    ///
    /// # Errors
    /// Returns `Error::InvalidDescriptor` if vendor or product ID is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use enocean_core::UsbServiceInfo;
    ///
    /// let info = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001)
    ///     .with_serial_number("FT5ABC12")
    ///     .with_manufacturer("EnOcean GmbH")
    ///     .with_description("USB 300");
    /// let id = info.unique_id().unwrap();
    /// assert_eq!(id.as_str(), "0403:6001_FT5ABC12_EnOcean GmbH_USB 300");
    /// ```
    pub fn unique_id(&self) -> Result<UniqueId> {
        if self.vid.is_empty() || self.pid.is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "Missing vendor/product ID for {}",
                self.device
            )));
        }
        UniqueId::new(format!(
            "{}:{}_{}_{}_{}",
            self.vid,
            self.pid,
            self.serial_number.as_deref().unwrap_or_default(),
            self.manufacturer.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default(),
        ))
    }

    /// Human-readable title suggested for the device.
    ///
    /// Prefers the description, then the manufacturer, then the device path.
    #[must_use]
    pub fn title(&self) -> String {
        [self.description.as_deref(), self.manufacturer.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.device)
            .to_string()
    }

    /// Serial device path, or `None` when `device` is only a bus locator.
    #[must_use]
    pub fn serial_path(&self) -> Option<&str> {
        if self.device.starts_with(USB_BUS_LOCATOR_PREFIX) {
            None
        } else {
            Some(&self.device)
        }
    }

    /// Returns `true` if the vendor/product pair is a known EnOcean gateway.
    #[must_use]
    pub fn is_known_gateway(&self) -> bool {
        let vid = u16::from_str_radix(&self.vid, 16).ok();
        let pid = u16::from_str_radix(&self.pid, 16).ok();
        match (vid, pid) {
            (Some(vid), Some(pid)) => KNOWN_USB_GATEWAYS.contains(&(vid, pid)),
            _ => false,
        }
    }
}

/// Reason a flow was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// USB discovery is only handled on a supervisor host.
    DiscoveryRequiresSupervisor,
    /// An entry for the integration already exists.
    AlreadyConfigured,
    /// Another flow for the integration is in progress.
    AlreadyInProgress,
}

impl AbortReason {
    /// Machine-readable reason code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            AbortReason::DiscoveryRequiresSupervisor => "discovery_requires_supervisor",
            AbortReason::AlreadyConfigured => "already_configured",
            AbortReason::AlreadyInProgress => "already_in_progress",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How a flow was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSource {
    /// Started by the user.
    User,
    /// Started by a USB discovery event.
    Usb,
}

impl fmt::Display for FlowSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FlowSource::User => write!(f, "user"),
            FlowSource::Usb => write!(f, "usb"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ws://localhost:3000", "ws", "localhost", Some(3000))]
    #[case("wss://gateway.local", "wss", "gateway.local", None)]
    #[case("ws://192.168.1.20:3000/api", "ws", "192.168.1.20", Some(3000))]
    #[case("  ws://core-enocean:3000  ", "ws", "core-enocean", Some(3000))]
    #[case("WS://LOCALHOST:8080", "ws", "localhost", Some(8080))]
    #[case("wss://gateway.local:443", "wss", "gateway.local", None)]
    #[case("ws://[::1]", "ws", "[::1]", None)]
    #[case("ws://[::1]:3000", "ws", "[::1]", Some(3000))]
    fn test_connection_url_valid(
        #[case] input: &str,
        #[case] scheme: &str,
        #[case] host: &str,
        #[case] port: Option<u16>,
    ) {
        let url = ConnectionUrl::new(input).unwrap();
        assert_eq!(url.scheme(), scheme);
        assert_eq!(url.host(), host);
        assert_eq!(url.port(), port);
        assert_eq!(url.as_str(), input.trim());
    }

    #[rstest]
    #[case("")] // empty
    #[case("localhost:3000")] // no scheme
    #[case("http://localhost:3000")] // wrong scheme
    #[case("ws://")] // no host
    #[case("ws://:3000")] // no host
    #[case("ws://localhost:abc")] // non-numeric port
    #[case("ws://localhost:0")] // port 0
    #[case("ws://localhost:70000")] // port out of range
    #[case("ws://bad host name")] // space in host
    #[case("ws://[::1")] // unterminated IPv6 literal
    #[case("ws://::1")] // unbracketed IPv6 literal
    #[case("ws://a@")] // userinfo without host
    #[case("ws://user:pass@gateway.local:3000")] // credentials
    #[case("ws://user@gateway.local")] // username only
    fn test_connection_url_invalid(#[case] input: &str) {
        let result = ConnectionUrl::new(input);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_connection_url_secure() {
        assert!(ConnectionUrl::new("wss://host").unwrap().is_secure());
        assert!(!ConnectionUrl::new("ws://host").unwrap().is_secure());
    }

    #[test]
    fn test_connection_url_serde_as_string() {
        let url = ConnectionUrl::new("ws://localhost:3000").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"ws://localhost:3000\"");

        let back: ConnectionUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);

        let bad: std::result::Result<ConnectionUrl, _> = serde_json::from_str("\"ftp://x\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_unique_id_rejects_blank() {
        assert!(UniqueId::new("").is_err());
        assert!(UniqueId::new("   ").is_err());
        assert_eq!(UniqueId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_usb_info_hex_formatting() {
        let info = UsbServiceInfo::new("/dev/ttyUSB0", 0x403, 0x6001);
        assert_eq!(info.vid, "0403");
        assert_eq!(info.pid, "6001");
    }

    #[test]
    fn test_usb_info_unique_id_with_missing_parts() {
        let info = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001);
        assert_eq!(info.unique_id().unwrap().as_str(), "0403:6001___");
    }

    #[test]
    fn test_usb_info_unique_id_requires_ids() {
        let mut info = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001);
        info.vid.clear();
        assert!(matches!(
            info.unique_id(),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[rstest]
    #[case(Some("USB 300"), Some("EnOcean GmbH"), "USB 300")]
    #[case(None, Some("EnOcean GmbH"), "EnOcean GmbH")]
    #[case(None, None, "/dev/ttyUSB0")]
    #[case(Some("  "), None, "/dev/ttyUSB0")]
    fn test_usb_info_title(
        #[case] description: Option<&str>,
        #[case] manufacturer: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut info = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001);
        info.description = description.map(str::to_string);
        info.manufacturer = manufacturer.map(str::to_string);
        assert_eq!(info.title(), expected);
    }

    #[test]
    fn test_usb_info_serial_path() {
        let tty = UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001);
        assert_eq!(tty.serial_path(), Some("/dev/ttyUSB0"));

        let located = UsbServiceInfo::new("usb:001/007", 0x0403, 0x6001);
        assert_eq!(located.serial_path(), None);
        assert_eq!(located.title(), "usb:001/007");
    }

    #[test]
    fn test_usb_info_known_gateway() {
        assert!(UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001).is_known_gateway());
        assert!(!UsbServiceInfo::new("/dev/ttyACM0", 0x10C4, 0xEA60).is_known_gateway());
    }

    #[test]
    fn test_abort_reason_codes() {
        assert_eq!(
            AbortReason::DiscoveryRequiresSupervisor.code(),
            "discovery_requires_supervisor"
        );
        assert_eq!(AbortReason::AlreadyConfigured.code(), "already_configured");
        assert_eq!(AbortReason::AlreadyInProgress.code(), "already_in_progress");

        let json = serde_json::to_string(&AbortReason::AlreadyInProgress).unwrap();
        assert_eq!(json, "\"already_in_progress\"");
    }

    #[test]
    fn test_flow_id_roundtrip_from_str() {
        let id = FlowId::new();
        let parsed: FlowId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<FlowId>().is_err());
    }
}
