//! # Transport Settings
//!
//! Settings are a tagged union keyed by transport, so a network host can
//! never end up on a Bluetooth profile. Per-call overrides are merged with
//! [`TransportSettings::merged`], which only touches fields that exist on
//! the profile's own variant.
//!
//! ## Paper Widths
//!
//! | Paper | Characters per line |
//! |-------|---------------------|
//! | 58mm  | 24 |
//! | 80mm  | 32 |
//! | 112mm | 48 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrintError;
use crate::protocol::text::FontSize;

/// Default raw TCP port for network thermal printers
pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// Widest explicit column override accepted
pub const MAX_CHARACTERS_PER_LINE: usize = 255;

/// Paper width class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperWidth {
    #[serde(rename = "58mm")]
    Mm58,
    #[default]
    #[serde(rename = "80mm")]
    Mm80,
    #[serde(rename = "112mm")]
    Mm112,
}

impl PaperWidth {
    pub const ALL: [PaperWidth; 3] = [PaperWidth::Mm58, PaperWidth::Mm80, PaperWidth::Mm112];

    /// Fixed characters-per-line table.
    ///
    /// ```
    /// use posprint::printer::PaperWidth;
    ///
    /// assert_eq!(PaperWidth::Mm58.characters_per_line(), 24);
    /// ```
    pub fn characters_per_line(self) -> usize {
        match self {
            PaperWidth::Mm58 => 24,
            PaperWidth::Mm80 => 32,
            PaperWidth::Mm112 => 48,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaperWidth::Mm58 => "58mm",
            PaperWidth::Mm80 => "80mm",
            PaperWidth::Mm112 => "112mm",
        }
    }
}

impl fmt::Display for PaperWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaperWidth {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches("mm") {
            "58" => Ok(PaperWidth::Mm58),
            "80" => Ok(PaperWidth::Mm80),
            "112" => Ok(PaperWidth::Mm112),
            other => Err(PrintError::InvalidConfig(format!(
                "Unknown paper width '{}' (expected 58mm, 80mm or 112mm)",
                other
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_feed_lines() -> u8 {
    3
}

/// Settings shared by every transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonSettings {
    #[serde(default)]
    pub paper_width: PaperWidth,
    /// Explicit override of the paper-derived column count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters_per_line: Option<usize>,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default = "default_true")]
    pub auto_cut: bool,
    #[serde(default)]
    pub open_drawer: bool,
    #[serde(default = "default_feed_lines")]
    pub feed_lines_before_cut: u8,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            paper_width: PaperWidth::default(),
            characters_per_line: None,
            font_size: FontSize::default(),
            auto_cut: true,
            open_drawer: false,
            feed_lines_before_cut: default_feed_lines(),
        }
    }
}

impl CommonSettings {
    /// Column budget: the explicit override when set (capped at
    /// [`MAX_CHARACTERS_PER_LINE`]), otherwise the paper width table.
    pub fn characters_per_line(&self) -> usize {
        self.characters_per_line
            .filter(|&n| n > 0)
            .map(|n| n.min(MAX_CHARACTERS_PER_LINE))
            .unwrap_or_else(|| self.paper_width.characters_per_line())
    }

    fn apply(&mut self, o: &SettingsOverride) {
        if let Some(paper) = o.paper_width {
            self.paper_width = paper;
            // A new paper class re-derives the column count
            self.characters_per_line = None;
        }
        if let Some(cpl) = o.characters_per_line {
            self.characters_per_line = Some(cpl);
        }
        if let Some(size) = o.font_size {
            self.font_size = size;
        }
        if let Some(cut) = o.auto_cut {
            self.auto_cut = cut;
        }
        if let Some(drawer) = o.open_drawer {
            self.open_drawer = drawer;
        }
        if let Some(feed) = o.feed_lines_before_cut {
            self.feed_lines_before_cut = feed;
        }
    }
}

/// Transport discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Local,
    Network,
    Bluetooth,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Local => "local",
            TransportKind::Network => "network",
            TransportKind::Bluetooth => "bluetooth",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-specific settings.
///
/// ```
/// use posprint::printer::{TransportKind, TransportSettings};
///
/// let json = r#"{"transport": "network", "host": "10.0.0.7", "paper_width": "58mm"}"#;
/// let settings: TransportSettings = serde_json::from_str(json).unwrap();
/// assert_eq!(settings.kind(), TransportKind::Network);
/// assert_eq!(settings.common().characters_per_line(), 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportSettings {
    Local {
        #[serde(flatten)]
        common: CommonSettings,
    },
    Network {
        #[serde(flatten)]
        common: CommonSettings,
        host: String,
        #[serde(default = "default_port")]
        port: u16,
    },
    Bluetooth {
        #[serde(flatten)]
        common: CommonSettings,
        /// Device name prefix (or MAC address) to match when pairing
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_name_filter: Option<String>,
    },
}

fn default_port() -> u16 {
    DEFAULT_NETWORK_PORT
}

impl TransportSettings {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportSettings::Local { .. } => TransportKind::Local,
            TransportSettings::Network { .. } => TransportKind::Network,
            TransportSettings::Bluetooth { .. } => TransportKind::Bluetooth,
        }
    }

    pub fn common(&self) -> &CommonSettings {
        match self {
            TransportSettings::Local { common }
            | TransportSettings::Network { common, .. }
            | TransportSettings::Bluetooth { common, .. } => common,
        }
    }

    fn common_mut(&mut self) -> &mut CommonSettings {
        match self {
            TransportSettings::Local { common }
            | TransportSettings::Network { common, .. }
            | TransportSettings::Bluetooth { common, .. } => common,
        }
    }

    /// Apply per-call overrides on a copy of these settings.
    ///
    /// Network host/port overrides are ignored for other transports.
    pub fn merged(&self, overrides: Option<&SettingsOverride>) -> Self {
        let mut merged = self.clone();
        let Some(o) = overrides else {
            return merged;
        };

        merged.common_mut().apply(o);
        if let TransportSettings::Network { host, port, .. } = &mut merged {
            if let Some(h) = &o.host {
                *host = h.clone();
            }
            if let Some(p) = o.port {
                *port = p;
            }
        }
        merged
    }

    /// Reject settings that cannot address a printer.
    pub fn validate(&self) -> Result<(), PrintError> {
        match self.common().characters_per_line {
            Some(0) => {
                return Err(PrintError::InvalidConfig(
                    "characters_per_line must be greater than zero".to_string(),
                ));
            }
            Some(n) if n > MAX_CHARACTERS_PER_LINE => {
                return Err(PrintError::InvalidConfig(format!(
                    "characters_per_line {} exceeds {}",
                    n, MAX_CHARACTERS_PER_LINE
                )));
            }
            _ => {}
        }
        if let TransportSettings::Network { host, port, .. } = self {
            if host.trim().is_empty() {
                return Err(PrintError::InvalidConfig(
                    "network printer host is empty".to_string(),
                ));
            }
            if *port == 0 {
                return Err(PrintError::InvalidConfig(
                    "network printer port must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Per-call overrides. `None` keeps the profile value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverride {
    #[serde(default)]
    pub paper_width: Option<PaperWidth>,
    #[serde(default)]
    pub characters_per_line: Option<usize>,
    #[serde(default)]
    pub font_size: Option<FontSize>,
    #[serde(default)]
    pub auto_cut: Option<bool>,
    #[serde(default)]
    pub open_drawer: Option<bool>,
    #[serde(default)]
    pub feed_lines_before_cut: Option<u8>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl SettingsOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
