//! # ESC/POS Control Commands
//!
//! Printer control opcodes: initialization, paper feed, cutter and cash
//! drawer. Every function is a pure `() -> Vec<u8>` builder; nothing here
//! touches a device.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`
//! - Prefixed: `ESC @`, `ESC d n`, `GS V m`
//! - With parameters: `ESC p m t1 t2`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for character size, cutter and other extended commands.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets the printer to its power-on state:
/// bold off, normal size, left alignment.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ## Example
///
/// ```
/// use posprint::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Select Character Code Table (ESC t n)
///
/// Selects the single-byte code page used for bytes 0x80-0xFF.
/// Page 16 is WPC1252, which matches the text encoder.
#[inline]
pub fn code_page(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

/// ESC/POS code table number for Windows-1252
pub const CODE_PAGE_WPC1252: u8 = 16;

// ============================================================================
// PAPER FEED
// ============================================================================

/// Print the line buffer and feed one line.
#[inline]
pub fn line_feed() -> Vec<u8> {
    vec![LF]
}

/// # Print and Feed n Lines (ESC d n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC d n  |
/// | Hex     | 1B 64 n  |
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER
// ============================================================================

/// # Full Cut (GS V 0)
///
/// Cuts at the current position without feeding.
#[inline]
pub fn cut_full() -> Vec<u8> {
    vec![GS, b'V', 0]
}

/// # Feed Then Full Cut (GS V 66 n)
///
/// Feeds `n` lines past the cutter and cuts. The printer accounts for the
/// head-to-cutter distance itself, which wastes less paper than a separate
/// feed followed by `cut_full()`.
#[inline]
pub fn cut_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', 66, n]
}

// ============================================================================
// CASH DRAWER
// ============================================================================

/// Drawer kick connector pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerPin {
    #[default]
    Pin2 = 0,
    Pin5 = 1,
}

/// # Generate Drawer Pulse (ESC p m t1 t2)
///
/// Sends a pulse on the drawer connector: on-time 25 × 2ms, off-time
/// 250 × 2ms.
///
/// ```
/// use posprint::protocol::commands::{drawer_kick, DrawerPin};
///
/// assert_eq!(drawer_kick(DrawerPin::Pin2), vec![0x1B, 0x70, 0x00, 25, 250]);
/// ```
#[inline]
pub fn drawer_kick(pin: DrawerPin) -> Vec<u8> {
    vec![ESC, b'p', pin as u8, 25, 250]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_code_page() {
        assert_eq!(code_page(CODE_PAGE_WPC1252), vec![0x1B, 0x74, 0x10]);
    }

    #[test]
    fn test_feed() {
        assert_eq!(line_feed(), vec![0x0A]);
        assert_eq!(feed_lines(3), vec![0x1B, 0x64, 0x03]);
    }

    #[test]
    fn test_cut() {
        assert_eq!(cut_full(), vec![0x1D, 0x56, 0x00]);
        assert_eq!(cut_feed(4), vec![0x1D, 0x56, 0x42, 0x04]);
    }

    #[test]
    fn test_drawer_kick() {
        assert_eq!(drawer_kick(DrawerPin::Pin2), vec![0x1B, 0x70, 0x00, 0x19, 0xFA]);
        assert_eq!(drawer_kick(DrawerPin::Pin5), vec![0x1B, 0x70, 0x01, 0x19, 0xFA]);
    }
}
