//! Chart link resolution: pick a record's link for a horizon and hand it to
//! the operating system's default handler.
//!
//! Launching sits behind [`ChartOpener`] so the shell can be driven in tests
//! without spawning processes.

use std::process::{Command, Stdio};

use tracing::info;

use crate::error::ResolveError;
use crate::types::{ChartHorizon, Record};

/// Something that can open a chart link
pub trait ChartOpener {
    /// Open `link`; returns once the handler has been launched
    fn open(&mut self, link: &str) -> Result<(), ResolveError>;
}

/// Opens links with the platform default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl ChartOpener for SystemOpener {
    fn open(&mut self, link: &str) -> Result<(), ResolveError> {
        let mut command = launcher(link);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn launcher(link: &str) -> Command {
    let mut command = Command::new("cmd");
    // Empty title argument so `start` does not treat a quoted link as one
    command.args(["/C", "start", "", link]);
    command
}

#[cfg(target_os = "macos")]
fn launcher(link: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(link);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launcher(link: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(link);
    command
}

/// Open `record`'s chart for `horizon`.
///
/// # Returns
///
/// The link that was opened
///
/// # Errors
///
/// * `ResolveError::ChartUnavailable` - The record has no link for `horizon`
/// * `ResolveError::Launch` - The handler could not be started
pub fn open_chart<O: ChartOpener + ?Sized>(
    record: &Record,
    horizon: ChartHorizon,
    opener: &mut O,
) -> Result<String, ResolveError> {
    let link = record
        .chart(horizon)
        .ok_or_else(|| ResolveError::ChartUnavailable {
            ticker: record.ticker.clone(),
            horizon,
        })?;

    opener.open(link)?;
    info!(ticker = %record.ticker, %horizon, link, "chart opened");
    Ok(link.to_owned())
}

// ============================================================================
// Unit Tests
// ============================================================================
