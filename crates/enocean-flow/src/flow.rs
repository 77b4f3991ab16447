//! Setup flow controller.
//!
//! [`ConfigFlow`] owns one [`FlowSession`] and drives it from an entry point
//! to exactly one terminal result. Step handlers return
//! [`StepOutcome`] values; internal transitions are validated against the
//! step table, recorded in history and followed in a loop until a handler
//! asks for a form, aborts, or creates the entry.
//!
//! # Examples
//!
//! ```
//! use enocean_flow::{
//!     ConfigFlow, EnvironmentProber, FlowOrigin, FlowRegistry, FlowResult, FlowStep,
//! };
//! use serde_json::json;
//!
//! struct Standalone;
//!
//! impl EnvironmentProber for Standalone {
//!     fn is_supervised(&self) -> bool {
//!         false
//!     }
//! }
//!
//! impl FlowRegistry for Standalone {
//!     fn has_entries(&self) -> bool {
//!         false
//!     }
//!     fn has_flow_in_progress(&self) -> bool {
//!         false
//!     }
//! }
//!
//! let mut flow = ConfigFlow::default();
//!
//! let result = flow.start(FlowOrigin::User, &Standalone).unwrap();
//! assert!(matches!(result, FlowResult::Form(ref form) if form.step_id == FlowStep::Manual));
//!
//! let input = json!({"url": "ws://localhost:3000"}).as_object().cloned();
//! let result = flow.advance(FlowStep::Manual, input, &Standalone).unwrap();
//! let FlowResult::CreateEntry(entry) = result else { panic!() };
//! assert_eq!(entry.title, "EnOcean");
//! assert!(entry.data.is_empty());
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use enocean_core::{AbortReason, Error, FlowSource, Result, UsbServiceInfo};

use crate::config::FlowConfig;
use crate::form::{FormRequest, UserInput};
use crate::handlers::{
    EntryRequest, StepOutcome, manual_step, on_supervisor_step, usb_confirm_step, usb_step,
    user_step,
};
use crate::session::FlowSession;
use crate::step::{FlowStep, StepTransition};
use crate::traits::FlowContext;

/// Maximum number of step transitions kept in history.
///
/// The longest path through the step table is three transitions
/// (usb → usb_confirm → on_supervisor → manual), so this only matters for
/// flows that re-render the manual form many times.
const MAX_HISTORY_SIZE: usize = 32;

/// How a flow is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOrigin {
    /// The user opened the setup.
    User,

    /// A matching USB device was discovered.
    Usb(UsbServiceInfo),
}

impl FlowOrigin {
    pub fn source(&self) -> FlowSource {
        match self {
            FlowOrigin::User => FlowSource::User,
            FlowOrigin::Usb(_) => FlowSource::Usb,
        }
    }

    /// Step the flow begins at.
    pub fn entry_step(&self) -> FlowStep {
        match self {
            FlowOrigin::User => FlowStep::User,
            FlowOrigin::Usb(_) => FlowStep::Usb,
        }
    }
}

/// Result returned to the host after each invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Render this form and call [`ConfigFlow::advance`] with the answer.
    Form(FormRequest),

    /// The flow ended without an entry.
    Abort(AbortReason),

    /// The flow ended; persist this entry.
    CreateEntry(EntryRequest),
}

impl FlowResult {
    /// Returns `true` if the flow has ended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::Form(_))
    }
}

/// Lifecycle of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// `start` has not been called yet.
    NotStarted,

    /// A form is shown and the flow waits for input on this step.
    AwaitingInput(FlowStep),

    /// An entry was created.
    Created,

    /// The flow was aborted.
    Aborted(AbortReason),
}

impl FlowStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, FlowStatus::Created | FlowStatus::Aborted(_))
    }
}

/// Setup flow controller for one setup attempt.
///
/// # Thread Safety
///
/// The flow holds no locks; the host must not advance the same flow from
/// two places at once.
#[derive(Debug)]
pub struct ConfigFlow {
    config: FlowConfig,
    session: Option<FlowSession>,
    status: FlowStatus,
    current_step: Option<FlowStep>,
    history: VecDeque<StepTransition>,
}

impl ConfigFlow {
    /// Create a flow that has not started yet.
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            session: None,
            status: FlowStatus::NotStarted,
            current_step: None,
            history: VecDeque::with_capacity(4),
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    /// Session state, available once the flow has started.
    pub fn session(&self) -> Option<&FlowSession> {
        self.session.as_ref()
    }

    /// Last step whose handler ran.
    pub fn current_step(&self) -> Option<FlowStep> {
        self.current_step
    }

    /// Step waiting for input, if any.
    pub fn pending_step(&self) -> Option<FlowStep> {
        match self.status {
            FlowStatus::AwaitingInput(step) => Some(step),
            _ => None,
        }
    }

    /// Internal transitions taken so far, oldest first.
    pub fn history(&self) -> &VecDeque<StepTransition> {
        &self.history
    }

    /// Start the flow at the entry point matching `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The flow has already started (`Error::UnexpectedStep`) or finished
    ///   (`Error::FlowFinished`)
    /// - The discovery descriptor cannot produce a unique ID
    pub fn start(&mut self, origin: FlowOrigin, ctx: &impl FlowContext) -> Result<FlowResult> {
        match self.status {
            FlowStatus::NotStarted => {}
            FlowStatus::AwaitingInput(pending) => {
                return Err(Error::UnexpectedStep {
                    expected: pending.to_string(),
                    actual: origin.entry_step().to_string(),
                });
            }
            _ => return Err(Error::FlowFinished),
        }

        let entry = origin.entry_step();
        debug!(step = %entry, "Starting setup flow");

        let mut session = FlowSession::new(origin.source());
        let outcome = match &origin {
            FlowOrigin::User => user_step(ctx),
            FlowOrigin::Usb(info) => usb_step(&mut session, info, ctx)?,
        };
        self.session = Some(session);
        self.current_step = Some(entry);

        self.resolve(entry, outcome, ctx)
    }

    /// Resume the pending step.
    ///
    /// With `input` absent the pending form is returned again.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The flow has not started or `step` is not the pending step
    ///   (`Error::UnexpectedStep`)
    /// - The flow has finished (`Error::FlowFinished`)
    /// - The input does not match the step's form (`Error::InvalidInput`)
    pub fn advance(
        &mut self,
        step: FlowStep,
        input: Option<UserInput>,
        ctx: &impl FlowContext,
    ) -> Result<FlowResult> {
        match self.status {
            FlowStatus::AwaitingInput(pending) if pending == step => {}
            FlowStatus::AwaitingInput(pending) => {
                return Err(Error::UnexpectedStep {
                    expected: pending.to_string(),
                    actual: step.to_string(),
                });
            }
            FlowStatus::NotStarted => {
                return Err(Error::UnexpectedStep {
                    expected: "user|usb".to_string(),
                    actual: step.to_string(),
                });
            }
            FlowStatus::Created | FlowStatus::Aborted(_) => return Err(Error::FlowFinished),
        }

        let outcome = self.run_step(step, input)?;
        self.current_step = Some(step);
        self.resolve(step, outcome, ctx)
    }

    /// Follow transitions until a handler produces a result for the host.
    fn resolve(
        &mut self,
        mut current: FlowStep,
        mut outcome: StepOutcome,
        ctx: &impl FlowContext,
    ) -> Result<FlowResult> {
        loop {
            match outcome {
                StepOutcome::Transition { to, input } => {
                    self.record_transition(current, to)?;
                    current = to;
                    self.current_step = Some(to);
                    outcome = self.run_step(to, input)?;
                }
                StepOutcome::ShowForm(form) => {
                    debug!(step = %current, errors = form.errors.len(), "Showing form");
                    self.status = FlowStatus::AwaitingInput(current);
                    return Ok(FlowResult::Form(form));
                }
                StepOutcome::Abort(reason) => {
                    warn!(step = %current, %reason, "Setup flow aborted");
                    self.status = FlowStatus::Aborted(reason);
                    return Ok(FlowResult::Abort(reason));
                }
                StepOutcome::CreateEntry(entry) => {
                    info!(
                        step = %current,
                        title = %entry.title,
                        source = %entry.source,
                        unique_id = entry.unique_id.as_ref().map(|id| id.as_str()),
                        "Setup flow created entry"
                    );
                    self.status = FlowStatus::Created;
                    return Ok(FlowResult::CreateEntry(entry));
                }
            }
        }
    }

    /// Run the handler of a step that takes form input.
    fn run_step(&mut self, step: FlowStep, input: Option<UserInput>) -> Result<StepOutcome> {
        match step {
            FlowStep::Manual => {
                manual_step(Self::started(&mut self.session, step)?, &self.config, input)
            }
            FlowStep::OnSupervisor => {
                on_supervisor_step(Self::started(&mut self.session, step)?, input)
            }
            FlowStep::UsbConfirm => {
                usb_confirm_step(Self::started(&mut self.session, step)?, input)
            }
            // Entry points are only run by `start`
            FlowStep::User | FlowStep::Usb => Err(Error::UnexpectedStep {
                expected: self
                    .pending_step()
                    .map_or_else(|| "user|usb".to_string(), |s| s.to_string()),
                actual: step.to_string(),
            }),
        }
    }

    fn started(session: &mut Option<FlowSession>, step: FlowStep) -> Result<&mut FlowSession> {
        session.as_mut().ok_or_else(|| Error::UnexpectedStep {
            expected: "user|usb".to_string(),
            actual: step.to_string(),
        })
    }

    fn record_transition(&mut self, from: FlowStep, to: FlowStep) -> Result<()> {
        if !from.can_transition_to(&to) {
            return Err(Error::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        debug!(%from, %to, "Step transition");
        self.history.push_back(StepTransition::new(from, to));
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        Ok(())
    }
}

impl Default for ConfigFlow {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}
