//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for ESC/POS thermal receipt printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Printer control (init, feed, cut, drawer kick)
//! - [`text`]: Text styling (alignment, bold, font size)
//! - [`encoding`]: Unicode to Windows-1252 text payload
//!
//! ## Usage Example
//!
//! ```
//! use posprint::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::bold_on());
//! data.extend(b"RECEIPT\n");
//! data.extend(text::TextStyle::reset());
//! data.extend(commands::cut_feed(3));
//! ```

pub mod commands;
pub mod encoding;
pub mod text;
