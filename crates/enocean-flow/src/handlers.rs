//! Step handlers.
//!
//! Each handler inspects the session and the optional input and returns a
//! [`StepOutcome`]. Handlers never call each other: moving to another step
//! is expressed as [`StepOutcome::Transition`] and carried out by
//! [`ConfigFlow`](crate::ConfigFlow).
//!
//! A handler invoked without input asks for its form; invoked with input it
//! advances.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use enocean_core::constants::{
    CONF_URL, CONF_USB_PATH, CONF_USE_ADDON, DEFAULT_USE_ADDON, ERROR_INVALID_URL, TITLE,
};
use enocean_core::{AbortReason, ConnectionUrl, FlowSource, Result, UniqueId, UsbServiceInfo};

use crate::config::{FlowConfig, ManualInputPolicy};
use crate::form::{
    FormRequest, UserInput, manual_form, on_supervisor_form, optional_bool, optional_str,
    reject_unknown_fields, usb_confirm_form,
};
use crate::session::FlowSession;
use crate::step::FlowStep;
use crate::traits::FlowContext;

/// Entry handed to the host for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRequest {
    pub title: String,
    pub data: Map<String, Value>,
    pub unique_id: Option<UniqueId>,
    pub source: FlowSource,
}

/// Result of running one step handler.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Ask the host to render a form.
    ShowForm(FormRequest),

    /// Continue at another step, optionally with input already supplied.
    Transition {
        to: FlowStep,
        input: Option<UserInput>,
    },

    /// End the flow without an entry.
    Abort(AbortReason),

    /// End the flow by creating an entry.
    CreateEntry(EntryRequest),
}

impl StepOutcome {
    fn goto(to: FlowStep) -> Self {
        StepOutcome::Transition { to, input: None }
    }
}

/// User-initiated entry point.
pub fn user_step(ctx: &impl FlowContext) -> StepOutcome {
    if ctx.is_supervised() {
        StepOutcome::goto(FlowStep::OnSupervisor)
    } else {
        StepOutcome::goto(FlowStep::Manual)
    }
}

/// Discovery-initiated entry point.
///
/// Guards run in order and each aborts before the session is touched:
/// supervisor host, existing entry, flow in progress.
///
/// # Errors
/// Returns an error if the descriptor yields no unique ID or the session
/// already has one.
pub fn usb_step(
    session: &mut FlowSession,
    info: &UsbServiceInfo,
    ctx: &impl FlowContext,
) -> Result<StepOutcome> {
    if !ctx.is_supervised() {
        return Ok(StepOutcome::Abort(AbortReason::DiscoveryRequiresSupervisor));
    }
    if ctx.has_entries() {
        return Ok(StepOutcome::Abort(AbortReason::AlreadyConfigured));
    }
    if ctx.has_flow_in_progress() {
        return Ok(StepOutcome::Abort(AbortReason::AlreadyInProgress));
    }

    session.apply_discovery(info)?;
    Ok(StepOutcome::goto(FlowStep::UsbConfirm))
}

/// Connection URL entry. The only step that creates an entry.
///
/// # Errors
/// Returns `Error::InvalidInput` for unknown fields or a non-string URL.
pub fn manual_step(
    session: &mut FlowSession,
    config: &FlowConfig,
    input: Option<UserInput>,
) -> Result<StepOutcome> {
    let Some(input) = input else {
        return Ok(StepOutcome::ShowForm(manual_form(&config.default_url)));
    };

    reject_unknown_fields(&input, &[CONF_URL])?;
    let submitted = optional_str(&input, CONF_URL)?.unwrap_or(config.default_url.as_str());

    match config.manual_input {
        ManualInputPolicy::AcceptAny => {}
        ManualInputPolicy::ValidateAndStore => match ConnectionUrl::new(submitted) {
            Ok(url) => session.set_connection_url(url),
            Err(_) => {
                return Ok(StepOutcome::ShowForm(
                    manual_form(submitted).with_error(CONF_URL, ERROR_INVALID_URL),
                ));
            }
        },
    }

    Ok(StepOutcome::CreateEntry(create_entry(session, config)))
}

/// Managed add-on offer.
///
/// # Errors
/// Returns `Error::InvalidInput` for unknown fields or a non-boolean choice.
pub fn on_supervisor_step(
    session: &mut FlowSession,
    input: Option<UserInput>,
) -> Result<StepOutcome> {
    let Some(input) = input else {
        return Ok(StepOutcome::ShowForm(on_supervisor_form()));
    };

    reject_unknown_fields(&input, &[CONF_USE_ADDON])?;
    let use_addon = optional_bool(&input, CONF_USE_ADDON)?.unwrap_or(DEFAULT_USE_ADDON);

    if use_addon {
        session.enable_addon();
    }
    Ok(StepOutcome::goto(FlowStep::Manual))
}

/// Confirmation of a discovered USB device.
///
/// Confirming skips the add-on form by answering it with "use add-on".
///
/// # Errors
/// Returns `Error::InvalidInput` if the confirmation carries any field.
pub fn usb_confirm_step(
    session: &mut FlowSession,
    input: Option<UserInput>,
) -> Result<StepOutcome> {
    let Some(input) = input else {
        return Ok(StepOutcome::ShowForm(usb_confirm_form(session.title())));
    };

    reject_unknown_fields(&input, &[])?;
    session.mark_discovered_via_usb();

    let mut choice = UserInput::new();
    choice.insert(CONF_USE_ADDON.to_string(), Value::Bool(true));
    Ok(StepOutcome::Transition {
        to: FlowStep::OnSupervisor,
        input: Some(choice),
    })
}

/// Build the entry for a finished session.
pub fn create_entry(session: &FlowSession, config: &FlowConfig) -> EntryRequest {
    let mut data = Map::new();

    if config.manual_input == ManualInputPolicy::ValidateAndStore {
        if let Some(url) = session.connection_url() {
            data.insert(CONF_URL.to_string(), Value::String(url.to_string()));
        }
        data.insert(CONF_USE_ADDON.to_string(), Value::Bool(session.use_addon()));
        if let Some(path) = session.usb_path() {
            data.insert(CONF_USB_PATH.to_string(), Value::String(path.to_string()));
        }
    }

    EntryRequest {
        title: TITLE.to_string(),
        data,
        unique_id: session.unique_id().cloned(),
        source: session.source(),
    }
}
