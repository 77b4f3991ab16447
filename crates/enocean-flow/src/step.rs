//! Setup flow steps and the transition table between them.
//!
//! # Steps
//!
//! - `User`: entry point when the user starts the setup
//! - `Usb`: entry point when a USB gateway is discovered
//! - `OnSupervisor`: offer to provision the managed add-on
//! - `UsbConfirm`: ask the user to confirm a discovered device
//! - `Manual`: connection URL entry, the only step that creates an entry
//!
//! # Valid Transitions
//!
//! - User → Manual | OnSupervisor
//! - Usb → UsbConfirm
//! - UsbConfirm → OnSupervisor
//! - OnSupervisor → Manual
//!
//! # Examples
//!
//! ```
//! use enocean_flow::FlowStep;
//!
//! assert!(FlowStep::User.can_transition_to(&FlowStep::OnSupervisor));
//! assert!(!FlowStep::Manual.can_transition_to(&FlowStep::User));
//! assert_eq!("usb_confirm".parse::<FlowStep>().unwrap(), FlowStep::UsbConfirm);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use enocean_core::Error;

/// A step of the setup flow.
///
/// Each variant maps to the step id exchanged with the host, see
/// [`step_id`](FlowStep::step_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    /// Flow started by the user.
    User,

    /// Flow started by USB discovery.
    Usb,

    /// Connection URL entry.
    Manual,

    /// Managed add-on offer, only reached on a supervisor host.
    OnSupervisor,

    /// Confirmation of a discovered USB device.
    UsbConfirm,
}

impl FlowStep {
    /// All steps, in declaration order.
    pub const ALL: [FlowStep; 5] = [
        FlowStep::User,
        FlowStep::Usb,
        FlowStep::Manual,
        FlowStep::OnSupervisor,
        FlowStep::UsbConfirm,
    ];

    /// Step id used by the host to address this step.
    #[must_use]
    pub fn step_id(&self) -> &'static str {
        match self {
            FlowStep::User => "user",
            FlowStep::Usb => "usb",
            FlowStep::Manual => "manual",
            FlowStep::OnSupervisor => "on_supervisor",
            FlowStep::UsbConfirm => "usb_confirm",
        }
    }

    /// Returns `true` if a flow may begin at this step.
    #[must_use]
    pub fn is_entry_point(&self) -> bool {
        matches!(self, FlowStep::User | FlowStep::Usb)
    }

    /// Check if an internal transition to `target` is valid from this step.
    ///
    /// The table is acyclic and every path ends at `Manual`, which has no
    /// outgoing transitions.
    ///
    /// # Examples
    ///
    /// ```
    /// use enocean_flow::FlowStep;
    ///
    /// assert!(FlowStep::Usb.can_transition_to(&FlowStep::UsbConfirm));
    /// assert!(!FlowStep::Usb.can_transition_to(&FlowStep::Manual));
    /// ```
    pub fn can_transition_to(&self, target: &FlowStep) -> bool {
        matches!(
            (self, target),
            (FlowStep::User, FlowStep::Manual | FlowStep::OnSupervisor)
                | (FlowStep::Usb, FlowStep::UsbConfirm)
                | (FlowStep::UsbConfirm, FlowStep::OnSupervisor)
                | (FlowStep::OnSupervisor, FlowStep::Manual)
        )
    }

    /// Returns `true` if this step can produce the final entry.
    #[must_use]
    pub fn creates_entry(&self) -> bool {
        matches!(self, FlowStep::Manual)
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_id())
    }
}

impl std::str::FromStr for FlowStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowStep::ALL
            .into_iter()
            .find(|step| step.step_id() == s)
            .ok_or_else(|| Error::UnknownStep(s.to_string()))
    }
}

/// Represents a single internal step transition with timestamp.
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
/// Upon deserialization it is set to the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTransition {
    /// The step transitioned from.
    pub from: FlowStep,

    /// The step transitioned to.
    pub to: FlowStep,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StepTransition {
    /// Create a new transition record stamped with the current time.
    pub fn new(from: FlowStep, to: FlowStep) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FlowStep::User, FlowStep::Manual)]
    #[case(FlowStep::User, FlowStep::OnSupervisor)]
    #[case(FlowStep::Usb, FlowStep::UsbConfirm)]
    #[case(FlowStep::UsbConfirm, FlowStep::OnSupervisor)]
    #[case(FlowStep::OnSupervisor, FlowStep::Manual)]
    fn test_valid_transitions(#[case] from: FlowStep, #[case] to: FlowStep) {
        assert!(from.can_transition_to(&to));
    }

    #[rstest]
    #[case(FlowStep::User, FlowStep::UsbConfirm)]
    #[case(FlowStep::Usb, FlowStep::Manual)]
    #[case(FlowStep::Usb, FlowStep::OnSupervisor)]
    #[case(FlowStep::UsbConfirm, FlowStep::Manual)]
    #[case(FlowStep::OnSupervisor, FlowStep::UsbConfirm)]
    #[case(FlowStep::Manual, FlowStep::OnSupervisor)]
    #[case(FlowStep::Manual, FlowStep::Manual)]
    fn test_invalid_transitions(#[case] from: FlowStep, #[case] to: FlowStep) {
        assert!(!from.can_transition_to(&to));
    }

    #[test]
    fn test_no_step_transitions_back_to_an_entry_point() {
        for from in FlowStep::ALL {
            for to in FlowStep::ALL.into_iter().filter(FlowStep::is_entry_point) {
                assert!(!from.can_transition_to(&to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_manual_is_only_creating_step_and_a_sink() {
        for step in FlowStep::ALL {
            assert_eq!(step.creates_entry(), step == FlowStep::Manual);
        }
        assert!(
            FlowStep::ALL
                .iter()
                .all(|to| !FlowStep::Manual.can_transition_to(to))
        );
    }

    #[test]
    fn test_step_id_roundtrip() {
        for step in FlowStep::ALL {
            assert_eq!(step.step_id().parse::<FlowStep>().unwrap(), step);
            assert_eq!(step.to_string(), step.step_id());
        }
    }

    #[test]
    fn test_unknown_step_id() {
        assert!(matches!(
            "confirm".parse::<FlowStep>(),
            Err(Error::UnknownStep(id)) if id == "confirm"
        ));
    }

    #[test]
    fn test_step_serializes_as_step_id() {
        for step in FlowStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.step_id()));
        }
    }

    #[test]
    fn test_transition_serialization_skips_timestamp() {
        let transition = StepTransition::new(FlowStep::User, FlowStep::Manual);
        let json = serde_json::to_value(&transition).unwrap();
        assert_eq!(json, serde_json::json!({"from": "user", "to": "manual"}));

        let back: StepTransition = serde_json::from_value(json).unwrap();
        assert_eq!(back.from, FlowStep::User);
        assert_eq!(back.to, FlowStep::Manual);
    }
}
