//! Transient state carried through one setup attempt.

use serde::{Deserialize, Serialize};

use enocean_core::{ConnectionUrl, Error, FlowSource, Result, UniqueId, UsbServiceInfo};

/// State of one setup attempt.
///
/// Created when a flow starts and dropped with it. Step handlers receive it
/// by mutable reference; nothing outside the flow holds on to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSession {
    source: FlowSource,
    use_addon: bool,
    title: Option<String>,
    discovered_via_usb: bool,
    unique_id: Option<UniqueId>,
    usb_path: Option<String>,
    connection_url: Option<ConnectionUrl>,
}

impl FlowSession {
    /// Create an empty session for a flow started from `source`.
    pub fn new(source: FlowSource) -> Self {
        Self {
            source,
            use_addon: false,
            title: None,
            discovered_via_usb: false,
            unique_id: None,
            usb_path: None,
            connection_url: None,
        }
    }

    pub fn source(&self) -> FlowSource {
        self.source
    }

    /// Whether the managed add-on should be provisioned.
    pub fn use_addon(&self) -> bool {
        self.use_addon
    }

    /// Title of the discovered device, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether the user confirmed a discovered USB device.
    pub fn discovered_via_usb(&self) -> bool {
        self.discovered_via_usb
    }

    pub fn unique_id(&self) -> Option<&UniqueId> {
        self.unique_id.as_ref()
    }

    pub fn usb_path(&self) -> Option<&str> {
        self.usb_path.as_deref()
    }

    /// Connection URL accepted on the manual step, when it is kept.
    pub fn connection_url(&self) -> Option<&ConnectionUrl> {
        self.connection_url.as_ref()
    }

    pub(crate) fn enable_addon(&mut self) {
        self.use_addon = true;
    }

    pub(crate) fn mark_discovered_via_usb(&mut self) {
        self.discovered_via_usb = true;
    }

    pub(crate) fn set_connection_url(&mut self, url: ConnectionUrl) {
        self.connection_url = Some(url);
    }

    /// Assign the unique ID. It can only be set once.
    ///
    /// # Errors
    /// Returns `Error::UniqueIdAlreadySet` on a second assignment.
    pub(crate) fn set_unique_id(&mut self, unique_id: UniqueId) -> Result<()> {
        if let Some(existing) = &self.unique_id {
            return Err(Error::UniqueIdAlreadySet(existing.to_string()));
        }
        self.unique_id = Some(unique_id);
        Ok(())
    }

    /// Record a discovered device: unique ID, title and serial device path.
    ///
    /// A bus locator is not kept as the device path.
    ///
    /// The unique ID is derived before anything is written, so a malformed
    /// descriptor leaves the session untouched.
    pub(crate) fn apply_discovery(&mut self, info: &UsbServiceInfo) -> Result<()> {
        let unique_id = info.unique_id()?;
        self.set_unique_id(unique_id)?;
        self.title = Some(info.title());
        self.usb_path = info.serial_path().map(str::to_string);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb_info() -> UsbServiceInfo {
        UsbServiceInfo::new("/dev/ttyUSB0", 0x0403, 0x6001)
            .with_serial_number("FT5ABC12")
            .with_description("USB 300")
    }

    #[test]
    fn test_new_session_defaults() {
        let session = FlowSession::new(FlowSource::User);
        assert_eq!(session.source(), FlowSource::User);
        assert!(!session.use_addon());
        assert!(!session.discovered_via_usb());
        assert!(session.title().is_none());
        assert!(session.unique_id().is_none());
        assert!(session.usb_path().is_none());
        assert!(session.connection_url().is_none());
    }

    #[test]
    fn test_unique_id_is_set_once() {
        let mut session = FlowSession::new(FlowSource::Usb);
        session.set_unique_id(UniqueId::new("a").unwrap()).unwrap();

        let result = session.set_unique_id(UniqueId::new("b").unwrap());
        assert!(matches!(result, Err(Error::UniqueIdAlreadySet(id)) if id == "a"));
        assert_eq!(session.unique_id().unwrap().as_str(), "a");
    }

    #[test]
    fn test_apply_discovery() {
        let mut session = FlowSession::new(FlowSource::Usb);
        session.apply_discovery(&usb_info()).unwrap();

        assert_eq!(session.title(), Some("USB 300"));
        assert_eq!(session.usb_path(), Some("/dev/ttyUSB0"));
        assert_eq!(
            session.unique_id().unwrap().as_str(),
            "0403:6001_FT5ABC12__USB 300"
        );
        assert!(!session.discovered_via_usb());
    }

    #[test]
    fn test_apply_discovery_bus_locator_has_no_path() {
        let mut session = FlowSession::new(FlowSource::Usb);
        let info = UsbServiceInfo::new("usb:001/007", 0x0403, 0x6001).with_serial_number("FT1");
        session.apply_discovery(&info).unwrap();

        assert!(session.usb_path().is_none());
        assert_eq!(session.title(), Some("usb:001/007"));
        assert!(session.unique_id().is_some());
    }

    #[test]
    fn test_apply_discovery_twice_keeps_first_device() {
        let mut session = FlowSession::new(FlowSource::Usb);
        session.apply_discovery(&usb_info()).unwrap();

        let other = UsbServiceInfo::new("/dev/ttyUSB1", 0x0403, 0x6001).with_description("Other");
        assert!(session.apply_discovery(&other).is_err());
        assert_eq!(session.title(), Some("USB 300"));
        assert_eq!(session.usb_path(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_apply_discovery_with_bad_descriptor_leaves_session_untouched() {
        let mut session = FlowSession::new(FlowSource::Usb);
        let mut info = usb_info();
        info.pid.clear();

        assert!(session.apply_discovery(&info).is_err());
        assert_eq!(session, FlowSession::new(FlowSource::Usb));
    }
}
