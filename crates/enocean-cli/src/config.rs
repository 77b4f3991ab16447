//! Environment configuration for the setup binary.
//!
//! Values come from the process environment, after loading a `.env` file if
//! one exists. Empty variables count as unset.

use std::str::FromStr;

use enocean_core::constants::DEFAULT_URL;
use enocean_core::{ConnectionUrl, Error, Result};
use enocean_flow::{FlowConfig, ManualInputPolicy};
use enocean_host::HostConfig;

pub const ENV_SUPERVISED: &str = "ENOCEAN_SUPERVISED";
pub const ENV_STORE_INPUT: &str = "ENOCEAN_STORE_INPUT";
pub const ENV_DEFAULT_URL: &str = "ENOCEAN_DEFAULT_URL";
pub const ENV_USB_DEVICE: &str = "ENOCEAN_USB_DEVICE";

/// Settings for one interactive setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    /// Pretend to run under a supervisor host.
    pub supervised: bool,

    /// Validate the manual URL and store the answers in the entry.
    pub store_input: bool,

    /// URL prefilled on the manual step.
    pub default_url: String,

    /// Start as if this serial device had been discovered.
    pub usb_device: Option<String>,
}

impl SetupConfig {
    /// Load `.env`, then read the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the variable that holds an invalid value.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the variable that holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let supervised = parse_optional(ENV_SUPERVISED, optional(ENV_SUPERVISED), false)?;
        let store_input = parse_optional(ENV_STORE_INPUT, optional(ENV_STORE_INPUT), false)?;

        let default_url = match optional(ENV_DEFAULT_URL) {
            Some(url) => {
                ConnectionUrl::new(url.trim())
                    .map_err(|e| Error::Config(format!("{ENV_DEFAULT_URL}: {e}")))?;
                url.trim().to_string()
            }
            None => DEFAULT_URL.to_string(),
        };

        Ok(Self {
            supervised,
            store_input,
            default_url,
            usb_device: optional(ENV_USB_DEVICE).map(|path| path.trim().to_string()),
        })
    }

    pub fn flow_config(&self) -> FlowConfig {
        let policy = if self.store_input {
            ManualInputPolicy::ValidateAndStore
        } else {
            ManualInputPolicy::AcceptAny
        };
        FlowConfig::default()
            .with_manual_input(policy)
            .with_default_url(self.default_url.clone())
    }

    pub fn host_config(&self) -> HostConfig {
        HostConfig::default().with_flow(self.flow_config())
    }
}

fn parse_optional<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|s| {
            s.trim()
                .to_ascii_lowercase()
                .parse()
                .map_err(|e| Error::Config(format!("{key}: {e}")))
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SetupConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.supervised);
        assert!(!config.store_input);
        assert_eq!(config.default_url, DEFAULT_URL);
        assert!(config.usb_device.is_none());
        assert_eq!(config.flow_config(), FlowConfig::default());
    }

    #[test]
    fn test_all_values() {
        let config = SetupConfig::from_lookup(lookup(&[
            (ENV_SUPERVISED, "true"),
            (ENV_STORE_INPUT, "TRUE"),
            (ENV_DEFAULT_URL, "wss://gateway.local:3443"),
            (ENV_USB_DEVICE, "/dev/ttyUSB0"),
        ])).unwrap();

        assert!(config.supervised);
        assert!(config.store_input);
        assert_eq!(config.usb_device.as_deref(), Some("/dev/ttyUSB0"));

        let flow = config.host_config().flow;
        assert_eq!(flow.manual_input, ManualInputPolicy::ValidateAndStore);
        assert_eq!(flow.default_url, "wss://gateway.local:3443");
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = SetupConfig::from_lookup(lookup(&[
            (ENV_SUPERVISED, ""),
            (ENV_USB_DEVICE, "  "),
        ])).unwrap();
        assert!(!config.supervised);
        assert!(config.usb_device.is_none());
    }

    #[rstest]
    #[case(ENV_SUPERVISED, "yes")]
    #[case(ENV_STORE_INPUT, "1")]
    #[case(ENV_DEFAULT_URL, "http://localhost:3000")]
    #[case(ENV_DEFAULT_URL, "ws://")]
    fn test_invalid_values_name_the_key(#[case] key: &str, #[case] value: &str) {
        let result = SetupConfig::from_lookup(lookup(&[(key, value)]));
        match result {
            Err(Error::Config(message)) => assert!(message.starts_with(key), "{message}"),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
