//! # Printer Module
//!
//! Printer profiles and transport settings.
//!
//! ## Modules
//!
//! - [`profile`]: Profile identity and capabilities
//! - [`settings`]: Tagged transport settings and per-call overrides

pub mod profile;
pub mod settings;

pub use profile::{Capability, PrinterProfile};
pub use settings::{
    CommonSettings, DEFAULT_NETWORK_PORT, MAX_CHARACTERS_PER_LINE, PaperWidth, SettingsOverride,
    TransportKind, TransportSettings,
};
