//! # ESC/POS Text Styling Commands
//!
//! Alignment, emphasis and font size opcodes.
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```
//!
//! ## Font Sizes
//!
//! | Size | Commands | Columns |
//! |------|----------|---------|
//! | Small | Font B, 1×1 | more than the line budget |
//! | Normal | Font A, 1×1 | line budget |
//! | Large | Font A, 1×2 (double height) | line budget |
//!
//! Large only doubles height, so a large line uses the same column budget
//! as a normal one.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS};
use crate::error::PrintError;

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// # Select Justification (ESC a n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
///
/// Takes effect at the start of the next line.
///
/// ```
/// use posprint::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On (ESC E 1)
#[inline]
pub fn bold_on() -> Vec<u8> {
    vec![ESC, b'E', 1]
}

/// # Turn Emphasized Mode Off (ESC E 0)
#[inline]
pub fn bold_off() -> Vec<u8> {
    vec![ESC, b'E', 0]
}

// ============================================================================
// FONT SIZE
// ============================================================================

/// Receipt font sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Normal,
    Large,
}

impl FontSize {
    pub const ALL: [FontSize; 3] = [FontSize::Small, FontSize::Normal, FontSize::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Normal => "normal",
            FontSize::Large => "large",
        }
    }
}

impl FromStr for FontSize {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontSize::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PrintError::InvalidConfig(format!(
                    "Unknown font size '{}' (expected small, normal or large)",
                    s
                ))
            })
    }
}

/// # Select Character Font (ESC M n)
///
/// `n = 0` selects font A (12×24), `n = 1` font B (9×17).
#[inline]
pub fn select_font(font_b: bool) -> Vec<u8> {
    vec![ESC, b'M', font_b as u8]
}

/// # Select Character Size (GS ! n)
///
/// High nibble is the width multiplier, low nibble the height multiplier,
/// both zero-based and clamped to 0-7.
///
/// ```
/// use posprint::protocol::text::char_size;
///
/// assert_eq!(char_size(0, 1), vec![0x1D, 0x21, 0x01]);
/// assert_eq!(char_size(1, 1), vec![0x1D, 0x21, 0x11]);
/// ```
pub fn char_size(width_mult: u8, height_mult: u8) -> Vec<u8> {
    let w = width_mult.min(7);
    let h = height_mult.min(7);
    vec![GS, b'!', (w << 4) | h]
}

/// Font and size commands for a receipt font size.
pub fn font_size(size: FontSize) -> Vec<u8> {
    let mut cmds = Vec::with_capacity(6);
    match size {
        FontSize::Small => {
            cmds.extend(select_font(true));
            cmds.extend(char_size(0, 0));
        }
        FontSize::Normal => {
            cmds.extend(select_font(false));
            cmds.extend(char_size(0, 0));
        }
        FontSize::Large => {
            cmds.extend(select_font(false));
            cmds.extend(char_size(0, 1));
        }
    }
    cmds
}

// ============================================================================
// TEXT STYLE
// ============================================================================

/// Style of one printed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub align: Alignment,
    pub bold: bool,
    pub size: FontSize,
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn align(mut self, a: Alignment) -> Self {
        self.align = a;
        self
    }

    pub fn center(self) -> Self {
        self.align(Alignment::Center)
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, size: FontSize) -> Self {
        self.size = size;
        self
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Commands that switch the printer into this style.
    pub fn to_commands(&self) -> Vec<u8> {
        let mut cmds = Vec::new();
        if self.align != Alignment::Left {
            cmds.extend(align(self.align));
        }
        if self.bold {
            cmds.extend(bold_on());
        }
        if self.size != FontSize::Normal {
            cmds.extend(font_size(self.size));
        }
        cmds
    }

    /// Commands that restore the neutral state: bold off, normal font,
    /// left alignment.
    pub fn reset() -> Vec<u8> {
        let mut cmds = Vec::new();
        cmds.extend(bold_off());
        cmds.extend(font_size(FontSize::Normal));
        cmds.extend(align(Alignment::Left));
        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_bold() {
        assert_eq!(bold_on(), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold_off(), vec![0x1B, 0x45, 0x00]);
    }

    #[test]
    fn test_char_size_clamps() {
        assert_eq!(char_size(0, 0), vec![0x1D, 0x21, 0x00]);
        assert_eq!(char_size(9, 9), vec![0x1D, 0x21, 0x77]);
    }

    #[test]
    fn test_font_size() {
        assert_eq!(font_size(FontSize::Small), vec![0x1B, 0x4D, 0x01, 0x1D, 0x21, 0x00]);
        assert_eq!(font_size(FontSize::Normal), vec![0x1B, 0x4D, 0x00, 0x1D, 0x21, 0x00]);
        assert_eq!(font_size(FontSize::Large), vec![0x1B, 0x4D, 0x00, 0x1D, 0x21, 0x01]);
    }

    #[test]
    fn test_font_size_parse() {
        assert_eq!("LARGE".parse::<FontSize>().unwrap(), FontSize::Large);
        assert!("huge".parse::<FontSize>().is_err());
    }

    #[test]
    fn test_neutral_style_emits_nothing() {
        assert!(TextStyle::new().to_commands().is_empty());
        assert!(TextStyle::new().is_neutral());
    }

    #[test]
    fn test_style_commands() {
        let cmds = TextStyle::new().center().bold().to_commands();
        assert!(cmds.windows(3).any(|w| w == [0x1B, 0x61, 0x01]));
        assert!(cmds.windows(3).any(|w| w == [0x1B, 0x45, 0x01]));
    }

    #[test]
    fn test_reset_restores_everything() {
        let reset = TextStyle::reset();
        assert!(reset.windows(3).any(|w| w == [0x1B, 0x45, 0x00]));
        assert!(reset.windows(3).any(|w| w == [0x1D, 0x21, 0x00]));
        assert!(reset.ends_with(&[0x1B, 0x61, 0x00]));
    }
}
