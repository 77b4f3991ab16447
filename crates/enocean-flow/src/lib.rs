//! Setup flow for the EnOcean gateway integration.
//!
//! This crate contains the step state machine that walks a user, or a USB
//! discovery event, from an entry point to a single configuration entry.
//! Rendering forms, persisting entries and tracking other flows belong to
//! the host, reached through the traits in [`traits`].

pub mod config;
pub mod flow;
pub mod form;
pub mod handlers;
pub mod session;
pub mod step;
pub mod traits;

pub use config::{FlowConfig, ManualInputPolicy};
pub use flow::{ConfigFlow, FlowOrigin, FlowResult, FlowStatus};
pub use form::{FieldKind, FieldSchema, FormRequest, UserInput};
pub use handlers::{EntryRequest, StepOutcome, create_entry};
pub use session::FlowSession;
pub use step::{FlowStep, StepTransition};
pub use traits::{EnvironmentProber, FlowContext, FlowRegistry};
