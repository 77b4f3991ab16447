//! Collaborator interfaces queried by the flow.
//!
//! The flow only reads from its collaborators. Queries are synchronous and
//! expected to answer immediately; the host owns whatever state backs them.

/// Reports whether the host can manage add-ons.
pub trait EnvironmentProber {
    /// Returns `true` when running under a supervisor host.
    fn is_supervised(&self) -> bool;
}

/// Read-only view of the host's entries and flows for this integration.
pub trait FlowRegistry {
    /// Returns `true` if any entry for the integration already exists.
    fn has_entries(&self) -> bool;

    /// Returns `true` if another flow for the integration is in progress.
    ///
    /// The flow asking must not count itself.
    fn has_flow_in_progress(&self) -> bool;
}

/// Everything a flow needs from the host.
pub trait FlowContext: EnvironmentProber + FlowRegistry {}

impl<T: EnvironmentProber + FlowRegistry> FlowContext for T {}
