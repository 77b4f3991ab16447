//! Host-side records and configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use enocean_core::constants::{DOMAIN, FLOW_MINOR_VERSION, FLOW_VERSION};
use enocean_core::{FlowSource, UniqueId};
use enocean_flow::{EntryRequest, FlowConfig};

/// Default capacity of the queue between a discovery source and the manager.
pub const DEFAULT_DISCOVERY_CHANNEL_CAPACITY: usize = 16;

/// A persisted configuration entry.
///
/// Created from the [`EntryRequest`] a finished flow hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: Uuid,
    pub domain: String,
    pub title: String,
    pub data: Map<String, Value>,
    pub unique_id: Option<UniqueId>,
    pub source: FlowSource,
    pub created_at: DateTime<Utc>,
    pub version: u32,
    pub minor_version: u32,
}

impl ConfigEntry {
    /// Build an entry for this integration from a flow's request.
    pub fn from_request(request: EntryRequest) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            domain: DOMAIN.to_string(),
            title: request.title,
            data: request.data,
            unique_id: request.unique_id,
            source: request.source,
            created_at: Utc::now(),
            version: FLOW_VERSION,
            minor_version: FLOW_MINOR_VERSION,
        }
    }
}

/// Configuration of a [`FlowManager`](crate::FlowManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Descriptors buffered between the discovery task and the manager.
    pub discovery_channel_capacity: usize,

    /// Configuration handed to every new flow.
    pub flow: FlowConfig,
}

impl HostConfig {
    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_discovery_channel_capacity(mut self, capacity: usize) -> Self {
        self.discovery_channel_capacity = capacity;
        self
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            discovery_channel_capacity: DEFAULT_DISCOVERY_CHANNEL_CAPACITY,
            flow: FlowConfig::default(),
        }
    }
}
