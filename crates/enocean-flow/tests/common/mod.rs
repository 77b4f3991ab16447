//! Common test utilities for setup flow integration tests.
//!
//! Provides a fixed host context and assertion helpers shared by the
//! scenario and property tests.
//!
//! # Usage
//!
//! ```ignore
//! use crate::common::{self, StaticHost};
//!
//! let host = StaticHost::supervised();
//! let mut flow = enocean_flow::ConfigFlow::default();
//! let result = flow.start(FlowOrigin::User, &host).unwrap();
//! let form = common::expect_form(result, FlowStep::OnSupervisor);
//! ```

#![allow(dead_code)]

use enocean_core::UsbServiceInfo;
use enocean_flow::{
    EntryRequest, EnvironmentProber, FlowRegistry, FlowResult, FlowStep, FormRequest, UserInput,
};
use serde_json::Value;

/// Host context with fixed answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticHost {
    pub supervised: bool,
    pub has_entries: bool,
    pub in_progress: bool,
}

impl StaticHost {
    pub fn new(supervised: bool, has_entries: bool, in_progress: bool) -> Self {
        Self {
            supervised,
            has_entries,
            in_progress,
        }
    }

    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn supervised() -> Self {
        Self {
            supervised: true,
            ..Self::default()
        }
    }
}

impl EnvironmentProber for StaticHost {
    fn is_supervised(&self) -> bool {
        self.supervised
    }
}

impl FlowRegistry for StaticHost {
    fn has_entries(&self) -> bool {
        self.has_entries
    }

    fn has_flow_in_progress(&self) -> bool {
        self.in_progress
    }
}

/// Serial path of the USB300 stick used in tests.
pub const USB300_PATH: &str =
    "/dev/serial/by-id/usb-EnOcean_GmbH_EnOcean_USB_300_DC_FT5ABC12-if00-port0";

/// USB300 stick as reported by discovery.
pub fn usb300() -> UsbServiceInfo {
    UsbServiceInfo::new(USB300_PATH, 0x0403, 0x6001)
        .with_serial_number("FT5ABC12")
        .with_manufacturer("EnOcean GmbH")
        .with_description("EnOcean USB 300 DC")
}

/// Convert a `json!` object into form input.
pub fn input(value: Value) -> Option<UserInput> {
    match value {
        Value::Object(map) => Some(map),
        other => panic!("form input must be a JSON object, got {other}"),
    }
}

/// Assert the result is a form for `step` and return it.
pub fn expect_form(result: FlowResult, step: FlowStep) -> FormRequest {
    match result {
        FlowResult::Form(form) => {
            assert_eq!(form.step_id, step, "unexpected form step");
            form
        }
        other => panic!("expected {step} form, got {other:?}"),
    }
}

/// Assert the result is a created entry and return it.
pub fn expect_entry(result: FlowResult) -> EntryRequest {
    match result {
        FlowResult::CreateEntry(entry) => entry,
        other => panic!("expected created entry, got {other:?}"),
    }
}

/// Assert the entry is the canonical one: title "EnOcean", empty data.
pub fn assert_canonical_entry(entry: &EntryRequest) {
    assert_eq!(entry.title, "EnOcean");
    assert!(entry.data.is_empty(), "entry data not empty: {:?}", entry.data);
}
