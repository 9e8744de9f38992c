//! # Test Harness
//!
//! Diagnostic prints for the "Test Print" buttons of the settings screen.
//! A transport the host cannot exercise (no relay, no Bluetooth, no print
//! surface) is reported as a simulated success with the payload that would
//! have been sent in `details`.

use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::error::PrintError;
use crate::orchestrator::{PrintMode, PrintService};
use crate::printer::TransportKind;
use crate::receipt::{ReceiptDocument, formatting_sample, render_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Reach the printer without printing a page
    Connection,
    /// Every font size and alignment, plain and bold
    Formatting,
    /// The sample receipt through the full print path
    Receipt,
}

impl TestKind {
    pub const ALL: [TestKind; 3] = [TestKind::Connection, TestKind::Formatting, TestKind::Receipt];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Connection => "connection",
            TestKind::Formatting => "formatting",
            TestKind::Receipt => "receipt",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PrintError::InvalidConfig(format!(
                    "unknown test '{}' (expected connection, formatting or receipt)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub simulated: bool,
}

impl TestResult {
    fn passed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: None,
            simulated: false,
        }
    }

    fn failed(error: PrintError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            details: None,
            simulated: false,
        }
    }

    fn simulated(message: impl Into<String>, details: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: Some(details),
            simulated: true,
        }
    }
}

pub struct TestHarness<'a> {
    service: &'a PrintService,
}

impl<'a> TestHarness<'a> {
    pub fn new(service: &'a PrintService) -> Self {
        Self { service }
    }

    /// Whether this host can physically reach the profile's printer.
    pub fn can_exercise(&self) -> bool {
        let hosts = self.service.hosts();
        match self.service.profile().transport() {
            TransportKind::Bluetooth => hosts.device.as_ref().is_some_and(|d| d.is_available()),
            TransportKind::Network => hosts.relay.is_some(),
            TransportKind::Local => hosts.surface.as_ref().is_some_and(|s| s.is_available()),
        }
    }

    pub async fn run(&self, kind: TestKind) -> TestResult {
        let profile = self.service.profile();
        let result = if self.can_exercise() {
            self.exercise(kind).await
        } else {
            self.simulate(kind)
        };
        info!(
            test = %kind,
            profile = %profile.id,
            success = result.success,
            simulated = result.simulated,
            "printer test"
        );
        result
    }

    async fn exercise(&self, kind: TestKind) -> TestResult {
        let common = self.service.profile().settings.common();
        match kind {
            TestKind::Connection => match self.service.check_connection().await {
                Ok(message) => TestResult::passed(message),
                Err(e) => TestResult::failed(e),
            },
            TestKind::Formatting => {
                let lines = formatting_sample(common);
                match self.service.send_lines("Formatting test", &lines).await {
                    Ok(()) => TestResult::passed(format!("Formatting page sent ({} lines)", lines.len())),
                    Err(e) => TestResult::failed(e),
                }
            }
            TestKind::Receipt => {
                let sample = ReceiptDocument::sample(Local::now().fixed_offset());
                match self
                    .service
                    .print(&sample, None, PrintMode::Interactive)
                    .await
                {
                    Ok(report) => TestResult::passed(format!("Test receipt printed ({})", report.outcome)),
                    Err(e) => TestResult::failed(e),
                }
            }
        }
    }

    fn simulate(&self, kind: TestKind) -> TestResult {
        let profile = self.service.profile();
        let common = profile.settings.common();
        let target = match profile.transport() {
            TransportKind::Bluetooth => "Bluetooth is not available on this host",
            TransportKind::Network => "No print relay is configured",
            TransportKind::Local => "No print surface is available",
        };
        let details = match kind {
            TestKind::Connection => match profile.transport() {
                TransportKind::Network => "would send testData {kind: connection} to the relay".to_string(),
                _ => "would send the init sequence (ESC @, ESC t 16)".to_string(),
            },
            TestKind::Formatting => join_lines(formatting_sample(common).iter().map(|l| l.text.as_str())),
            TestKind::Receipt => {
                let sample = ReceiptDocument::sample(Local::now().fixed_offset());
                let lines = render_lines(&sample, common);
                join_lines(lines.iter().map(|l| l.text.as_str()))
            }
        };
        TestResult::simulated(format!("{}; {} test simulated", target, kind), details)
    }
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}
