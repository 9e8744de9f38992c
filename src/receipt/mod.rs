//! # Receipt Formatter
//!
//! Turns a [`ReceiptDocument`] into something a printer can take:
//!
//! - [`layout`]: fixed-width [`Line`]s for thermal printers, then ESC/POS chunks
//! - [`markup`]: a complete HTML page for the local print surface
//! - [`currency`]: amount formatting shared by both paths
//!
//! ## Example
//!
//! ```
//! use chrono::{FixedOffset, TimeZone};
//! use posprint::printer::{CommonSettings, PaperWidth};
//! use posprint::receipt::{render_lines, ReceiptDocument};
//!
//! let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap();
//! let doc = ReceiptDocument::sample(now);
//! let settings = CommonSettings { paper_width: PaperWidth::Mm58, ..Default::default() };
//!
//! for line in render_lines(&doc, &settings) {
//!     assert!(line.text.chars().count() <= 24);
//! }
//! ```

pub mod currency;
pub mod document;
pub mod layout;
pub mod markup;

pub use currency::{Amount, format_amount};
pub use document::{
    BusinessInfo, LineItem, Payment, PaymentMethod, ReceiptDocument, Totals, TransactionInfo,
    TransactionKind,
};
pub use layout::{Finish, Line, encode_lines, formatting_sample, render_lines};
pub use markup::{render_html, render_lines_html};
