//! Flow configuration.

use serde::{Deserialize, Serialize};

use enocean_core::constants::DEFAULT_URL;

/// What the manual step does with the submitted connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualInputPolicy {
    /// Accept any submission and create an entry with empty data.
    #[default]
    AcceptAny,

    /// Reject URLs that are not `ws://`/`wss://` by re-rendering the form,
    /// and store the URL, add-on choice and USB path in the entry data.
    ValidateAndStore,
}

/// Configuration of a [`ConfigFlow`](crate::ConfigFlow).
///
/// # Examples
///
/// ```
/// use enocean_flow::{FlowConfig, ManualInputPolicy};
///
/// let config = FlowConfig::default()
///     .with_manual_input(ManualInputPolicy::ValidateAndStore)
///     .with_default_url("ws://192.168.1.20:3000");
///
/// assert_eq!(config.default_url, "ws://192.168.1.20:3000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Handling of the manual step submission.
    pub manual_input: ManualInputPolicy,

    /// URL prefilled on the manual step.
    pub default_url: String,
}

impl FlowConfig {
    pub fn with_manual_input(mut self, policy: ManualInputPolicy) -> Self {
        self.manual_input = policy;
        self
    }

    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = url.into();
        self
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            manual_input: ManualInputPolicy::AcceptAny,
            default_url: DEFAULT_URL.to_string(),
        }
    }
}
