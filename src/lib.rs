//! # posprint - Receipt Printing Core
//!
//! posprint turns a transaction into a printed receipt on whatever printer a
//! point-of-sale terminal has configured. It provides:
//!
//! - **Receipt formatting**: fixed-width text layout and HTML markup
//! - **ESC/POS encoding**: command builders and an op-list encoder
//! - **Transports**: Bluetooth serial, network relay, local print surface
//! - **Fallback chain**: relay failure falls back to local print, then to an
//!   emergency print with default settings
//! - **Relay server**: HTTP endpoint that forwards jobs to port 9100 printers
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::Local;
//! use posprint::{
//!     Hosts, PrintMode, PrintService, PrinterProfile, ReceiptDocument,
//!     transport::{HttpRelay, SpoolPrintSurface},
//! };
//!
//! # async fn example() -> Result<(), posprint::PrintError> {
//! let profile = PrinterProfile::from_json_file("printer.json")?;
//! let hosts = Hosts::new()
//!     .with_relay(HttpRelay::new("http://pos-backend:8080")?)
//!     .with_surface(SpoolPrintSurface::default());
//!
//! let service = PrintService::new(profile, hosts)?;
//! let receipt = ReceiptDocument::sample(Local::now().fixed_offset());
//! let report = service.print(&receipt, None, PrintMode::Interactive).await?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`receipt`] | Document model, text layout, HTML markup |
//! | [`protocol`] | ESC/POS command builders |
//! | [`ir`] | Op list and byte encoder |
//! | [`printer`] | Profiles and transport settings |
//! | [`transport`] | Host capability traits and implementations |
//! | [`connection`] | Bluetooth connection state machine |
//! | [`orchestrator`] | Transport routing and fallbacks |
//! | [`harness`] | Connection, formatting and receipt test prints |
//! | [`server`] | Print relay HTTP endpoint |
//! | [`error`] | Error types |

pub mod connection;
pub mod error;
pub mod harness;
pub mod ir;
pub mod orchestrator;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{PrintError, PrintResult};
pub use harness::{TestHarness, TestKind, TestResult};
pub use orchestrator::{Hosts, PrintMode, PrintOutcome, PrintReport, PrintService};
pub use printer::PrinterProfile;
pub use receipt::ReceiptDocument;
