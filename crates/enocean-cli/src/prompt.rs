//! Line-based form rendering.

use std::io::{BufRead, Write};

use anyhow::{Context, bail};
use serde_json::Value;

use enocean_core::constants::{CONF_NAME, ERROR_INVALID_URL};
use enocean_flow::{FieldKind, FieldSchema, FlowStep, FormRequest, UserInput};

/// What the user did with a form.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Submit(UserInput),
    Decline,
}

/// Renders forms to `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Show `form` and collect an answer.
    ///
    /// Empty answers leave the field out so the flow applies its default.
    pub fn ask(&mut self, form: &FormRequest) -> anyhow::Result<Answer> {
        writeln!(self.output, "\n== {} ==", heading(form.step_id))?;
        for (field, code) in &form.errors {
            writeln!(self.output, "  ! {field}: {}", describe_error(code))?;
        }

        if form.step_id == FlowStep::UsbConfirm {
            let name = form
                .description_placeholders
                .get(CONF_NAME)
                .map_or("the discovered device", String::as_str);
            let confirmed = self.ask_bool(&format!("Set up {name}?"), true)?;
            return Ok(if confirmed {
                Answer::Submit(UserInput::new())
            } else {
                Answer::Decline
            });
        }

        let mut answers = UserInput::new();
        for field in &form.fields {
            if let Some(value) = self.ask_field(field)? {
                answers.insert(field.name.clone(), value);
            }
        }
        Ok(Answer::Submit(answers))
    }

    fn ask_field(&mut self, field: &FieldSchema) -> anyhow::Result<Option<Value>> {
        match field.kind {
            FieldKind::String => {
                let default = field.default.as_ref().and_then(Value::as_str).unwrap_or("");
                let line = self.read_answer(&format!("{} [{default}]", field.name))?;
                Ok((!line.is_empty()).then_some(Value::String(line)))
            }
            FieldKind::Boolean => {
                let default = field.default.as_ref().and_then(Value::as_bool).unwrap_or(false);
                self.ask_bool(&field.name, default).map(|b| Some(Value::Bool(b)))
            }
        }
    }

    fn ask_bool(&mut self, question: &str, default: bool) -> anyhow::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let line = self.read_answer(&format!("{question} [{hint}]"))?;
            match parse_bool(&line) {
                Some(answer) => return Ok(answer),
                None if line.is_empty() => return Ok(default),
                None => writeln!(self.output, "  Please answer yes or no.")?,
            }
        }
    }

    fn read_answer(&mut self, prompt: &str) -> anyhow::Result<String> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            bail!("Input closed before the form was answered");
        }
        Ok(line.trim().to_string())
    }
}

fn heading(step: FlowStep) -> &'static str {
    match step {
        FlowStep::Manual => "Gateway connection",
        FlowStep::OnSupervisor => "EnOcean add-on",
        FlowStep::UsbConfirm => "Discovered USB gateway",
        FlowStep::User | FlowStep::Usb => "EnOcean setup",
    }
}

fn describe_error(code: &str) -> &str {
    match code {
        ERROR_INVALID_URL => "expected a ws:// or wss:// URL",
        other => other,
    }
}

fn parse_bool(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}
