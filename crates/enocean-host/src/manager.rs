//! Flow manager.
//!
//! This module provides the [`FlowManager`], which owns every in-progress
//! setup flow and every created entry, answers the registry queries flows
//! make, and pumps USB discovery events into new flows.
//!
//! # Architecture
//!
//! Flows are synchronous. A flow is taken out of the map while it is
//! started or stepped, so the "flow in progress" answer it receives only
//! counts the other flows. Discovery runs in its own tokio task and hands
//! descriptors to the manager over a bounded channel.
//!
//! ```text
//! ┌───────────┐       ┌─────────────────┐       ┌──────────────┐
//! │ Discovery │──────►│  Device Channel │──────►│ FlowManager  │
//! │ Task      │       │  (mpsc)         │       │  flows       │
//! └───────────┘       └─────────────────┘       │  entries     │
//!                                               └──────────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use enocean_flow::{FlowResult, FlowStep};
//! use enocean_host::{FlowManager, HostConfig};
//! use enocean_host::mock::StaticProber;
//!
//! # fn main() -> enocean_host::Result<()> {
//! let mut manager = FlowManager::new(HostConfig::default(), StaticProber::standalone());
//!
//! let (id, result) = manager.start_user_flow()?;
//! assert!(matches!(result, FlowResult::Form(ref f) if f.step_id == FlowStep::Manual));
//!
//! let result = manager.advance(id, FlowStep::Manual, Some(Default::default()))?;
//! assert!(matches!(result, FlowResult::CreateEntry(_)));
//! assert_eq!(manager.entries().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use enocean_core::{AbortReason, FlowId, UsbServiceInfo};
use enocean_flow::{
    ConfigFlow, EnvironmentProber, FlowOrigin, FlowRegistry, FlowResult, FlowStep, UserInput,
};

use crate::traits::DiscoverySource;
use crate::types::{ConfigEntry, HostConfig};
use crate::{HostError, Result};

/// Outcome of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Flows started and waiting for confirmation.
    pub started: Vec<FlowId>,

    /// Discoveries turned away by a flow guard.
    pub aborted: Vec<AbortReason>,

    /// Descriptors the flow refused to start with.
    pub rejected: usize,
}

/// Handle for receiving devices from a running discovery task.
pub struct DiscoveryHandle {
    /// Device receiver fed by the discovery task.
    device_rx: mpsc::Receiver<UsbServiceInfo>,

    /// Running discovery task.
    tasks: JoinSet<Result<()>>,
}

impl DiscoveryHandle {
    /// Spawn a task draining `source` into a channel of `capacity`.
    pub fn spawn<S: DiscoverySource>(source: S, capacity: usize) -> Self {
        let (device_tx, device_rx) = mpsc::channel(capacity.max(1));
        let mut tasks = JoinSet::new();
        tasks.spawn(discovery_task(source, device_tx));

        Self { device_rx, tasks }
    }

    /// Receive the next discovered device.
    ///
    /// Returns `None` once the source is exhausted and the channel drained.
    pub async fn recv(&mut self) -> Option<UsbServiceInfo> {
        self.device_rx.recv().await
    }

    /// Stop the discovery task and report how it ended.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it failed, or `HostError::DiscoveryClosed`
    /// if the task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut outcome = Ok(());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => outcome = Err(e),
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    warn!(error = %e, "Discovery task panicked");
                    outcome = Err(HostError::DiscoveryClosed);
                }
            }
        }
        outcome
    }
}

async fn discovery_task<S: DiscoverySource>(
    mut source: S,
    device_tx: mpsc::Sender<UsbServiceInfo>,
) -> Result<()> {
    loop {
        match source.next_device().await {
            Ok(Some(info)) => match device_tx.try_send(info) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(info)) => {
                    debug!(source = source.name(), "Discovery queue full, waiting");
                    if device_tx.send(info).await.is_err() {
                        break;
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            },
            Ok(None) => {
                debug!(source = source.name(), "Discovery source exhausted");
                break;
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Discovery source failed");
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Registry answers for the flow currently being driven.
struct HostView<'a, P> {
    prober: &'a P,
    has_entries: bool,
    other_flows: bool,
}

impl<P: EnvironmentProber> EnvironmentProber for HostView<'_, P> {
    fn is_supervised(&self) -> bool {
        self.prober.is_supervised()
    }
}

impl<P> FlowRegistry for HostView<'_, P> {
    fn has_entries(&self) -> bool {
        self.has_entries
    }

    fn has_flow_in_progress(&self) -> bool {
        self.other_flows
    }
}

/// Owns the in-progress flows and created entries of the integration.
///
/// # Lifecycle
///
/// 1. Create the manager with a configuration and an environment prober
/// 2. Start flows with `start_user_flow`/`start_usb_flow`, or feed a
///    discovery source to `run_discovery`
/// 3. Answer forms with `advance` until the flow creates an entry or aborts
/// 4. Read created entries with `entries`
pub struct FlowManager<P> {
    config: HostConfig,
    prober: P,
    flows: HashMap<FlowId, ConfigFlow>,
    entries: Vec<ConfigEntry>,
}

impl<P: EnvironmentProber> FlowManager<P> {
    pub fn new(config: HostConfig, prober: P) -> Self {
        Self {
            config,
            prober,
            flows: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Restore entries created in an earlier run.
    pub fn with_entries(mut self, entries: Vec<ConfigEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Entries created so far, oldest first.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// IDs of flows waiting for input.
    pub fn in_progress(&self) -> Vec<FlowId> {
        self.flows.keys().copied().collect()
    }

    /// Look up an in-progress flow.
    pub fn flow(&self, id: FlowId) -> Option<&ConfigFlow> {
        self.flows.get(&id)
    }

    /// Start a flow on the user's request.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Core` if the flow refuses to start.
    pub fn start_user_flow(&mut self) -> Result<(FlowId, FlowResult)> {
        self.start(FlowOrigin::User)
    }

    /// Start a flow for a discovered USB device.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Core` if the descriptor yields no unique ID.
    pub fn start_usb_flow(&mut self, info: UsbServiceInfo) -> Result<(FlowId, FlowResult)> {
        self.start(FlowOrigin::Usb(info))
    }

    fn start(&mut self, origin: FlowOrigin) -> Result<(FlowId, FlowResult)> {
        let id = FlowId::new();
        let source = origin.source();
        let mut flow = ConfigFlow::new(self.config.flow.clone());

        let result = flow.start(origin, &self.view())?;
        info!(flow_id = %id, %source, "Setup flow started");

        self.settle(id, flow, &result);
        Ok((id, result))
    }

    /// Submit input to the pending step of a flow.
    ///
    /// A flow whose input is rejected stays in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No flow with `id` is in progress (`HostError::FlowNotFound`)
    /// - The flow rejects the step or input (`HostError::Core`)
    pub fn advance(
        &mut self,
        id: FlowId,
        step: FlowStep,
        input: Option<UserInput>,
    ) -> Result<FlowResult> {
        let mut flow = self.flows.remove(&id).ok_or(HostError::FlowNotFound(id))?;

        let outcome = flow.advance(step, input, &self.view());
        match outcome {
            Ok(result) => {
                self.settle(id, flow, &result);
                Ok(result)
            }
            Err(e) => {
                if !flow.status().is_finished() {
                    self.flows.insert(id, flow);
                }
                Err(e.into())
            }
        }
    }

    /// Cancel an in-progress flow without creating an entry.
    ///
    /// # Errors
    ///
    /// Returns `HostError::FlowNotFound` if no such flow is in progress.
    pub fn abort_flow(&mut self, id: FlowId) -> Result<()> {
        let flow = self.flows.remove(&id).ok_or(HostError::FlowNotFound(id))?;
        info!(flow_id = %id, step = ?flow.pending_step(), "Setup flow cancelled");
        Ok(())
    }

    /// Start a flow for every device `source` reports until it is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery source fails. Descriptors that a
    /// flow refuses are counted in the report instead.
    pub async fn run_discovery<S: DiscoverySource>(
        &mut self,
        source: S,
    ) -> Result<DiscoveryReport> {
        info!(source = source.name(), "Discovery started");
        let mut handle = DiscoveryHandle::spawn(source, self.config.discovery_channel_capacity);
        let mut report = DiscoveryReport::default();

        while let Some(info) = handle.recv().await {
            let device = info.device.clone();
            match self.start_usb_flow(info) {
                Ok((id, FlowResult::Abort(reason))) => {
                    debug!(flow_id = %id, %device, %reason, "Discovery turned away");
                    report.aborted.push(reason);
                }
                Ok((id, _)) => {
                    info!(flow_id = %id, %device, "Discovered gateway awaiting confirmation");
                    report.started.push(id);
                }
                Err(e) => {
                    warn!(%device, error = %e, "Dropping discovered device");
                    report.rejected += 1;
                }
            }
        }

        handle.shutdown().await?;
        info!(
            started = report.started.len(),
            aborted = report.aborted.len(),
            rejected = report.rejected,
            "Discovery finished"
        );
        Ok(report)
    }

    fn view(&self) -> HostView<'_, P> {
        HostView {
            prober: &self.prober,
            has_entries: !self.entries.is_empty(),
            other_flows: !self.flows.is_empty(),
        }
    }

    /// Put a flow back, persist its entry, or drop it, depending on `result`.
    fn settle(&mut self, id: FlowId, flow: ConfigFlow, result: &FlowResult) {
        match result {
            FlowResult::Form(form) => {
                debug!(flow_id = %id, step = %form.step_id, "Flow awaiting input");
                self.flows.insert(id, flow);
            }
            FlowResult::Abort(reason) => {
                info!(flow_id = %id, %reason, "Setup flow finished without entry");
            }
            FlowResult::CreateEntry(request) => {
                let entry = ConfigEntry::from_request(request.clone());
                info!(
                    flow_id = %id,
                    entry_id = %entry.entry_id,
                    title = %entry.title,
                    "Setup flow finished with entry"
                );
                self.entries.push(entry);
            }
        }
    }
}
