//! # Print Orchestrator
//!
//! [`PrintService`] is built once per active printer profile with the host
//! capabilities injected, and routes each job to the profile's transport.
//!
//! ## Fallback Chain
//!
//! ```text
//! configured transport ──ok──> success
//!        │ RelayFailure, or Bluetooth unsupported
//!        │ while a print surface exists
//!        v
//! local print ──ok──> fallback-success
//!        │ any failure            (a Local profile failing with
//!        v                         HostPrintUnavailable starts here)
//! emergency print (80mm defaults, no logo) ──ok──> emergency-fallback-success
//!        │
//!        v
//!     failed
//! ```
//!
//! Every attempt is logged with its `result` tag. In
//! [`PrintMode::Interactive`] the last error is returned to the caller; in
//! [`PrintMode::Silent`] it is logged and reported as `failed`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::connection::{ConnectionConfig, ConnectionManager};
use crate::error::{PrintError, PrintResult};
use crate::ir::Program;
use crate::printer::{
    Capability, CommonSettings, PrinterProfile, SettingsOverride, TransportKind,
    TransportSettings,
};
use crate::receipt::{
    Finish, Line, ReceiptDocument, encode_lines, render_html, render_lines, render_lines_html,
};
use crate::transport::{
    DeviceFilter, DeviceHost, PrintSurface, ReceiptPayload, Relay, RelayRequest, TestPayload,
};

/// Host capabilities available to a [`PrintService`].
#[derive(Clone, Default)]
pub struct Hosts {
    pub device: Option<Arc<dyn DeviceHost>>,
    pub surface: Option<Arc<dyn PrintSurface>>,
    pub relay: Option<Arc<dyn Relay>>,
}

impl Hosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device: impl DeviceHost + 'static) -> Self {
        self.device = Some(Arc::new(device));
        self
    }

    pub fn with_surface(mut self, surface: impl PrintSurface + 'static) -> Self {
        self.surface = Some(Arc::new(surface));
        self
    }

    pub fn with_relay(mut self, relay: impl Relay + 'static) -> Self {
        self.relay = Some(Arc::new(relay));
        self
    }
}

impl fmt::Debug for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hosts")
            .field("device", &self.device.is_some())
            .field("surface", &self.surface.is_some())
            .field("relay", &self.relay.is_some())
            .finish()
    }
}

/// Whether failures reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    /// User-initiated print, test or reprint: the final error is returned
    #[default]
    Interactive,
    /// Auto-print after a sale: failures are logged only
    Silent,
}

/// Result tag of a print call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrintOutcome {
    Success,
    FallbackSuccess,
    EmergencyFallbackSuccess,
    Failed,
}

impl PrintOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintOutcome::Success => "success",
            PrintOutcome::FallbackSuccess => "fallback-success",
            PrintOutcome::EmergencyFallbackSuccess => "emergency-fallback-success",
            PrintOutcome::Failed => "failed",
        }
    }

    /// Whether something came out of a printer.
    pub fn is_printed(&self) -> bool {
        *self != PrintOutcome::Failed
    }
}

impl fmt::Display for PrintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one print call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintReport {
    pub outcome: PrintOutcome,
    pub transport: TransportKind,
    /// Transport attempts made, fallbacks included
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One print call in flight. Never persisted.
#[derive(Debug, Clone)]
pub struct PrintJob<'a> {
    pub profile: &'a PrinterProfile,
    pub document: &'a ReceiptDocument,
    pub settings: TransportSettings,
    pub attempt: u32,
}

impl PrintJob<'_> {
    fn title(&self) -> String {
        format!(
            "{} {}",
            self.document.transaction.kind, self.document.transaction.number
        )
    }
}

/// Print service for one printer profile.
#[derive(Debug)]
pub struct PrintService {
    profile: PrinterProfile,
    hosts: Hosts,
    connection: Option<ConnectionManager>,
}

impl PrintService {
    pub fn new(profile: PrinterProfile, hosts: Hosts) -> PrintResult<Self> {
        Self::with_connection_config(profile, hosts, ConnectionConfig::default())
    }

    /// Bluetooth profiles get a [`ConnectionManager`] when a device host is
    /// available.
    pub fn with_connection_config(
        profile: PrinterProfile,
        hosts: Hosts,
        config: ConnectionConfig,
    ) -> PrintResult<Self> {
        profile.validate()?;
        let connection = match (&profile.settings, &hosts.device) {
            (
                TransportSettings::Bluetooth {
                    device_name_filter, ..
                },
                Some(device),
            ) => Some(ConnectionManager::new(
                device.clone(),
                DeviceFilter::name_prefix(device_name_filter.as_deref()),
                config,
            )),
            _ => None,
        };
        info!(profile = %profile.id, transport = %profile.transport(), "print service ready");
        Ok(Self {
            profile,
            hosts,
            connection,
        })
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    /// The Bluetooth session, when this profile has one.
    pub fn connection(&self) -> Option<&ConnectionManager> {
        self.connection.as_ref()
    }

    /// Print a receipt through the profile's transport and its fallbacks.
    pub async fn print(
        &self,
        document: &ReceiptDocument,
        overrides: Option<&SettingsOverride>,
        mode: PrintMode,
    ) -> PrintResult<PrintReport> {
        let transport = self.profile.transport();
        let (result, attempts) = self.run(document, overrides).await;

        match result {
            Ok(outcome) => Ok(PrintReport {
                outcome,
                transport,
                attempts,
                error: None,
            }),
            Err(e) => {
                warn!(
                    result = PrintOutcome::Failed.as_str(),
                    %transport,
                    attempts,
                    error = %e,
                    "print failed"
                );
                match mode {
                    PrintMode::Interactive => Err(e),
                    PrintMode::Silent => Ok(PrintReport {
                        outcome: PrintOutcome::Failed,
                        transport,
                        attempts,
                        error: Some(e.to_string()),
                    }),
                }
            }
        }
    }

    /// Silent print right after a sale. Never fails.
    pub async fn auto_print(&self, document: &ReceiptDocument) -> PrintReport {
        let transport = self.profile.transport();
        self.print(document, None, PrintMode::Silent)
            .await
            .unwrap_or_else(|e| PrintReport {
                outcome: PrintOutcome::Failed,
                transport,
                attempts: 0,
                error: Some(e.to_string()),
            })
    }

    /// Regenerate the receipt with the reprint marker and print it.
    pub async fn reprint(
        &self,
        document: &ReceiptDocument,
        at: DateTime<FixedOffset>,
    ) -> PrintResult<PrintReport> {
        let reprint = document.as_reprint(at);
        self.print(&reprint, None, PrintMode::Interactive).await
    }

    /// Run the fallback chain. Returns the outcome and the attempt count.
    async fn run(
        &self,
        document: &ReceiptDocument,
        overrides: Option<&SettingsOverride>,
    ) -> (PrintResult<PrintOutcome>, u32) {
        let settings = self.profile.effective_settings(overrides);
        if let Err(e) = settings.validate() {
            return (Err(e), 0);
        }
        let mut job = PrintJob {
            profile: &self.profile,
            document,
            settings,
            attempt: 1,
        };
        let transport = job.settings.kind();

        let primary = self.dispatch(&job).await;
        let error = match primary {
            Ok(()) => return (Ok(self.logged(&job, PrintOutcome::Success)), job.attempt),
            Err(e) => e,
        };

        let local_unavailable =
            transport == TransportKind::Local && matches!(error, PrintError::HostPrintUnavailable(_));
        // A host without Bluetooth still prints through a local surface
        let bluetooth_unsupported = transport == TransportKind::Bluetooth
            && matches!(error, PrintError::UnsupportedTransport(_))
            && self.surface().is_ok();
        let error = if error.is_recoverable() || bluetooth_unsupported {
            warn!(%transport, error = %error, "falling back to local print");
            job.attempt += 1;
            let show_logo = self.profile.has(Capability::Logo);
            match self.print_local(&job, job.settings.common(), show_logo).await {
                Ok(()) => {
                    return (
                        Ok(self.logged(&job, PrintOutcome::FallbackSuccess)),
                        job.attempt,
                    );
                }
                Err(e) => e,
            }
        } else if local_unavailable {
            error
        } else {
            return (Err(error), job.attempt);
        };

        warn!(error = %error, "trying emergency print");
        job.attempt += 1;
        match self.print_local(&job, &CommonSettings::default(), false).await {
            Ok(()) => (
                Ok(self.logged(&job, PrintOutcome::EmergencyFallbackSuccess)),
                job.attempt,
            ),
            Err(e) => (Err(e), job.attempt),
        }
    }

    fn logged(&self, job: &PrintJob<'_>, outcome: PrintOutcome) -> PrintOutcome {
        info!(
            result = outcome.as_str(),
            transport = %job.settings.kind(),
            attempt = job.attempt,
            number = %job.document.transaction.number,
            "print job"
        );
        outcome
    }

    async fn dispatch(&self, job: &PrintJob<'_>) -> PrintResult<()> {
        match &job.settings {
            TransportSettings::Bluetooth { common, .. } => {
                let lines = render_lines(job.document, common);
                let chunks = encode_lines(&lines, Finish::for_profile(job.profile, common));
                self.write_bluetooth(&chunks).await
            }
            TransportSettings::Network { common, .. } => {
                let lines = render_lines(job.document, common);
                let bytes = encode_lines(&lines, Finish::for_profile(job.profile, common)).concat();
                let relay = self.relay()?;
                let request = RelayRequest::receipt(
                    self.profile_with(&job.settings),
                    ReceiptPayload::new(&lines, &bytes),
                );
                relay.print(&request).await?.into_result()?;
                Ok(())
            }
            TransportSettings::Local { common } => {
                self.print_local(job, common, self.profile.has(Capability::Logo))
                    .await
            }
        }
    }

    async fn print_local(
        &self,
        job: &PrintJob<'_>,
        common: &CommonSettings,
        show_logo: bool,
    ) -> PrintResult<()> {
        let surface = self.surface()?;
        let html = render_html(job.document, common, show_logo);
        surface.print_markup(&job.title(), &html).await
    }

    /// Connect once if needed, then write every chunk under one session.
    async fn write_bluetooth(&self, chunks: &[Vec<u8>]) -> PrintResult<()> {
        let connection = self.connection.as_ref().ok_or_else(|| {
            PrintError::UnsupportedTransport("no Bluetooth host configured".to_string())
        })?;
        if !connection.is_connected() {
            info!(state = %connection.state(), "auto-connecting");
            connection.connect().await?;
        }
        let mut session = connection.begin_session()?;
        for chunk in chunks {
            session.write(chunk).await?;
        }
        Ok(())
    }

    /// Send pre-laid-out lines (a diagnostic page) through the transport,
    /// without fallbacks.
    pub async fn send_lines(&self, title: &str, lines: &[Line]) -> PrintResult<()> {
        let settings = &self.profile.settings;
        let common = settings.common();
        match settings {
            TransportSettings::Bluetooth { .. } => {
                let chunks = encode_lines(lines, Finish::for_profile(&self.profile, common));
                self.write_bluetooth(&chunks).await
            }
            TransportSettings::Network { .. } => {
                let bytes = encode_lines(lines, Finish::for_profile(&self.profile, common)).concat();
                let request = RelayRequest::test(
                    self.profile.clone(),
                    TestPayload::with_bytes("formatting", &bytes),
                );
                self.relay()?.test(&request).await?.into_result()?;
                Ok(())
            }
            TransportSettings::Local { .. } => {
                let html = render_lines_html(title, lines, common);
                self.surface()?.print_markup(title, &html).await
            }
        }
    }

    /// Connection check: init sequence over Bluetooth, relay test call for
    /// Network, surface availability for Local.
    pub async fn check_connection(&self) -> PrintResult<String> {
        match self.profile.transport() {
            TransportKind::Bluetooth => {
                self.write_bluetooth(&[Program::with_init().to_bytes()])
                    .await?;
                let state = self
                    .connection
                    .as_ref()
                    .map(|c| c.state().to_string())
                    .unwrap_or_default();
                Ok(format!("Printer {}", state))
            }
            TransportKind::Network => {
                let request = RelayRequest::test(self.profile.clone(), TestPayload::connection());
                let message = self.relay()?.test(&request).await?.into_result()?;
                Ok(message.unwrap_or_else(|| "Relay reached the printer".to_string()))
            }
            TransportKind::Local => {
                let surface = self.surface()?;
                if surface.is_available() {
                    Ok("Print surface available".to_string())
                } else {
                    Err(PrintError::HostPrintUnavailable(
                        "print surface not available".to_string(),
                    ))
                }
            }
        }
    }

    fn relay(&self) -> PrintResult<&Arc<dyn Relay>> {
        self.hosts
            .relay
            .as_ref()
            .ok_or_else(|| PrintError::RelayFailure("no relay configured".to_string()))
    }

    fn surface(&self) -> PrintResult<&Arc<dyn PrintSurface>> {
        self.hosts
            .surface
            .as_ref()
            .filter(|s| s.is_available())
            .ok_or_else(|| PrintError::HostPrintUnavailable("no print surface".to_string()))
    }

    fn profile_with(&self, settings: &TransportSettings) -> PrinterProfile {
        PrinterProfile {
            settings: settings.clone(),
            ..self.profile.clone()
        }
    }
}
