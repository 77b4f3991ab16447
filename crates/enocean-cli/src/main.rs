//! Interactive setup for an EnOcean gateway.
//!
//! Drives one setup flow over stdin/stdout and prints the created entry as
//! JSON. Configuration is read from the environment (see [`config`]).
//!
//! ```text
//! enocean-setup          start as if the user added the integration
//! enocean-setup scan     discover a gateway on the USB bus (hardware-usb)
//! ```

mod config;
mod prompt;

use std::io;

use anyhow::{Context, bail};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use enocean_core::constants::KNOWN_USB_GATEWAYS;
use enocean_core::{FlowId, UsbServiceInfo};
use enocean_flow::FlowResult;
use enocean_host::mock::StaticProber;
use enocean_host::{FlowManager, HostError};

use crate::config::SetupConfig;
use crate::prompt::{Answer, Prompter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SetupConfig::from_env().context("Invalid configuration")?;
    let mut manager = FlowManager::new(config.host_config(), StaticProber::new(config.supervised));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let started = match args.first().map(String::as_str) {
        Some("scan") => scan(&mut manager).await?,
        Some(other) => bail!("Unknown command: {other}"),
        None => match &config.usb_device {
            Some(path) => Some(manager.start_usb_flow(usb_gateway(path))?),
            None => Some(manager.start_user_flow()?),
        },
    };

    let Some((id, result)) = started else {
        println!("No EnOcean gateway found.");
        return Ok(());
    };

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    drive(&mut manager, &mut prompter, id, result)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Descriptor for a gateway given by path only.
fn usb_gateway(path: &str) -> UsbServiceInfo {
    let (vid, pid) = KNOWN_USB_GATEWAYS[0];
    UsbServiceInfo::new(path, vid, pid)
}

#[cfg(feature = "hardware-usb")]
async fn scan(
    manager: &mut FlowManager<StaticProber>,
) -> anyhow::Result<Option<(FlowId, FlowResult)>> {
    let report = manager
        .run_discovery(enocean_host::usb::UsbBusScanner::new())
        .await?;
    if let Some(reason) = report.aborted.first() {
        warn!(%reason, "Discovered gateway was not set up");
    }

    let Some(&id) = report.started.first() else {
        return Ok(None);
    };
    // Re-request the pending confirmation form
    let result = manager.advance(id, enocean_flow::FlowStep::UsbConfirm, None)?;
    Ok(Some((id, result)))
}

#[cfg(not(feature = "hardware-usb"))]
async fn scan(
    _manager: &mut FlowManager<StaticProber>,
) -> anyhow::Result<Option<(FlowId, FlowResult)>> {
    bail!("USB scanning requires the hardware-usb feature")
}

fn drive<R: io::BufRead, W: io::Write>(
    manager: &mut FlowManager<StaticProber>,
    prompter: &mut Prompter<R, W>,
    id: FlowId,
    mut result: FlowResult,
) -> anyhow::Result<()> {
    loop {
        let form = match result {
            FlowResult::Form(form) => form,
            FlowResult::Abort(reason) => {
                println!("Setup aborted: {reason}");
                return Ok(());
            }
            FlowResult::CreateEntry(_) => {
                let entry = manager
                    .entries()
                    .last()
                    .context("Created entry was not stored")?;
                info!(entry_id = %entry.entry_id, "Gateway configured");
                println!("{}", serde_json::to_string_pretty(entry)?);
                return Ok(());
            }
        };

        let input = match prompter.ask(&form)? {
            Answer::Submit(input) => input,
            Answer::Decline => {
                manager.abort_flow(id)?;
                println!("Setup cancelled.");
                return Ok(());
            }
        };

        result = match manager.advance(id, form.step_id, Some(input)) {
            Ok(next) => next,
            Err(HostError::Core(e)) => {
                warn!(error = %e, "Answer rejected");
                eprintln!("{e}");
                FlowResult::Form(form)
            }
            Err(e) => return Err(e.into()),
        };
    }
}
