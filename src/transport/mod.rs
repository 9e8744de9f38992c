//! # Host Capabilities
//!
//! The print core never talks to hardware directly. Everything it needs from
//! the host is injected through three traits:
//!
//! | Trait | Used by | Implementation |
//! |-------|---------|----------------|
//! | [`DeviceHost`] | Bluetooth path | [`bluetooth::RfcommHost`] |
//! | [`PrintSurface`] | Local path and fallbacks | [`spool::SpoolPrintSurface`] |
//! | [`Relay`] | Network path | [`http::HttpRelay`] |
//!
//! [`memory`] has in-memory doubles of all three for tests.
//!
//! ## Modules
//!
//! - [`bluetooth`]: RFCOMM serial devices (Linux)
//! - [`network`]: raw TCP port 9100 sender used by the relay endpoint
//! - [`http`]: JSON client for the backend relay
//! - [`spool`]: local print command fed with an HTML spool file
//! - [`payload`]: relay request and response wire types

use async_trait::async_trait;

use crate::error::PrintResult;

pub mod bluetooth;
pub mod http;
pub mod memory;
pub mod network;
pub mod payload;
pub mod spool;

pub use bluetooth::RfcommHost;
pub use http::HttpRelay;
pub use network::NetworkPrinter;
pub use payload::{ReceiptPayload, RelayRequest, RelayResponse, TestPayload};
pub use spool::SpoolPrintSurface;

/// The single writable endpoint of a paired device.
#[async_trait]
pub trait Characteristic: Send {
    /// Write one chunk. Errors are reported as `WriteFailure`.
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Human-readable identity for logs.
    fn describe(&self) -> String;
}

/// What to look for when requesting a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Match devices whose advertised name starts with this prefix
    pub name_prefix: Option<String>,
}

impl DeviceFilter {
    pub fn name_prefix(prefix: Option<&str>) -> Self {
        Self {
            name_prefix: prefix
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        }
    }

    /// Whether an advertised device name passes the filter.
    pub fn matches(&self, name: &str) -> bool {
        match &self.name_prefix {
            Some(prefix) => name.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

/// Device-pairing capability.
#[async_trait]
pub trait DeviceHost: Send + Sync {
    /// Whether the host has the radio/stack at all.
    fn is_available(&self) -> bool;

    /// Find a device matching `filter`, open its session and resolve the
    /// writable characteristic.
    async fn request_device(&self, filter: &DeviceFilter) -> PrintResult<Box<dyn Characteristic>>;
}

/// Host print primitive used for local printing.
#[async_trait]
pub trait PrintSurface: Send + Sync {
    fn is_available(&self) -> bool;

    /// Print a complete HTML document. Errors are `HostPrintUnavailable`.
    async fn print_markup(&self, title: &str, html: &str) -> PrintResult<()>;
}

/// Backend relay that forwards pre-formatted jobs to network printers.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn print(&self, request: &RelayRequest) -> PrintResult<RelayResponse>;

    async fn test(&self, request: &RelayRequest) -> PrintResult<RelayResponse>;
}
