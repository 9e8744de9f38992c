//! # Fixed-Width Layout
//!
//! Renders a [`ReceiptDocument`] as a list of [`Line`]s sized to the
//! printer's column budget, then lowers those lines to ESC/POS byte chunks.
//!
//! ## Layout
//!
//! ```text
//!        CORNER CAFE           <- bold, large, centered
//!      12 Harbour Road
//! ------------------------
//! Sale: S-1042                 <- bold
//! Date: 2026-01-20 12:00
//! Cashier: Ana
//! Customer: Walk-in
//! ------------------------
//! Extra Large Deluxe Combo     <- name, truncated
//! 1x $7.50            $7.50
//! ------------------------
//! Subtotal          $16.00
//! ========================
//! TOTAL             $15.50     <- bold, large
//! ```
//!
//! Text that does not fit is truncated; it is never wrapped and never an
//! error.

use serde::{Deserialize, Serialize};

use super::currency::format_amount;
use super::document::ReceiptDocument;
use crate::ir::{Op, Program};
use crate::printer::{Capability, CommonSettings, PrinterProfile};
use crate::protocol::commands::DrawerPin;
use crate::protocol::text::{Alignment, FontSize, TextStyle};

/// Width of the right-aligned value column in the totals block
pub const VALUE_COLUMN: usize = 12;

/// Thank-you line printed above the footer
pub const THANK_YOU: &str = "Thank you!";

/// Date format used on receipts
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One printed line: visible text plus its style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub style: TextStyle,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::new(),
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

// ============================================================================
// TEXT HELPERS
// ============================================================================

/// Truncate to at most `width` characters.
pub fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Pad (or truncate) to exactly `width` characters.
pub fn pad(s: &str, width: usize, align_right: bool) -> String {
    let len = s.chars().count();
    if len >= width {
        return truncate(s, width);
    }
    let spaces = " ".repeat(width - len);
    if align_right {
        format!("{}{}", spaces, s)
    } else {
        format!("{}{}", s, spaces)
    }
}

/// Left and right text on one line of exactly `width` characters.
///
/// The right side is kept whole; the left side is truncated to leave at
/// least one space between them.
pub fn left_right(left: &str, right: &str, width: usize) -> String {
    let right = truncate(right, width);
    let right_len = right.chars().count();
    let left_budget = width.saturating_sub(right_len + 1);
    let left = truncate(left, left_budget);
    let gap = width - left.chars().count() - right_len;
    format!("{}{}{}", left, " ".repeat(gap), right)
}

/// Totals row: label padded to `width - 12`, value right-aligned in a
/// 12-character field. A value wider than the field takes columns from the
/// label.
pub fn total_row(label: &str, value: &str, width: usize) -> String {
    let value_width = value.chars().count().max(VALUE_COLUMN).min(width);
    let label_width = width - value_width;
    format!(
        "{}{}",
        pad(label, label_width, false),
        pad(value, value_width, true)
    )
}

/// Item quantity: whole numbers without decimals, otherwise two places.
pub(crate) fn quantity(value: f64) -> String {
    if (value.round() - value).abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Non-blank lines of a free-text block, trimmed.
pub fn text_block_lines(block: Option<&str>) -> impl Iterator<Item = &str> {
    block
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
}

// ============================================================================
// RENDERING
// ============================================================================

struct LineWriter {
    width: usize,
    lines: Vec<Line>,
}

impl LineWriter {
    fn push(&mut self, text: &str, style: TextStyle) {
        self.lines.push(Line::styled(truncate(text, self.width), style));
    }

    fn plain(&mut self, text: &str) {
        self.push(text, TextStyle::new());
    }

    fn centered(&mut self, text: &str) {
        self.push(text, TextStyle::new().center());
    }

    fn rule(&mut self, ch: char) {
        let rule: String = std::iter::repeat_n(ch, self.width).collect();
        self.plain(&rule);
    }
}

/// Render the fixed-width layout for `characters_per_line` columns.
pub fn render_lines(doc: &ReceiptDocument, settings: &CommonSettings) -> Vec<Line> {
    let width = settings.characters_per_line();
    let body = TextStyle::new().size(settings.font_size);
    let money = |amount| format_amount(amount, &doc.currency);
    let mut w = LineWriter {
        width,
        lines: Vec::new(),
    };

    // Header
    let business = &doc.business;
    w.push(
        &business.name,
        TextStyle::new().center().bold().size(FontSize::Large),
    );
    for contact in [&business.address, &business.phone, &business.email]
        .into_iter()
        .flatten()
    {
        w.centered(contact);
    }
    for line in text_block_lines(business.header.as_deref()) {
        w.centered(line);
    }
    w.rule('-');

    // Transaction
    let tx = &doc.transaction;
    w.push(&format!("{}: {}", tx.kind, tx.number), TextStyle::new().bold());
    w.plain(&format!("Date: {}", tx.timestamp.format(DATE_FORMAT)));
    if let Some(cashier) = &tx.cashier {
        w.plain(&format!("Cashier: {}", cashier));
    }
    let customer = tx
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Walk-in");
    w.plain(&format!("Customer: {}", customer));
    w.rule('-');

    // Items: two lines each
    for item in &doc.items {
        w.push(&item.name, body);
        let left = format!("{}x {}", quantity(item.quantity), money(item.unit_price));
        w.push(&left_right(&left, &money(item.line_total), width), body);
    }
    w.rule('-');

    // Totals
    let totals = &doc.totals;
    w.plain(&total_row("Subtotal", &money(totals.subtotal), width));
    if !totals.discount.is_zero() {
        w.plain(&total_row("Discount", &money(-totals.discount.abs()), width));
    }
    if !totals.tax.is_zero() {
        w.plain(&total_row("Tax", &money(totals.tax), width));
    }
    w.rule('=');
    w.push(
        &total_row("TOTAL", &money(totals.total), width),
        TextStyle::new().bold().size(FontSize::Large),
    );

    // Payment
    if let Some(payment) = &doc.payment {
        if payment.is_cash() {
            if let Some(tendered) = payment.tendered {
                w.plain(&total_row("Cash", &money(tendered), width));
            }
            if let Some(change) = doc.change_due() {
                w.plain(&total_row("Change", &money(change), width));
            }
        } else {
            w.plain(&total_row("Paid by", payment.method.label(), width));
        }
    }
    w.rule('-');

    // Footer
    w.centered(THANK_YOU);
    for line in text_block_lines(business.footer.as_deref()) {
        w.centered(line);
    }
    if let Some(notes) = doc.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        w.plain(&format!("Note: {}", notes));
    }
    if tx.reprint {
        let at = tx.reprinted_at.unwrap_or(tx.timestamp);
        w.push(
            &format!("REPRINT {}", at.format(DATE_FORMAT)),
            TextStyle::new().center().size(FontSize::Small),
        );
    }

    w.lines
}

// ============================================================================
// ENCODING
// ============================================================================

/// What happens after the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finish {
    pub feed_lines: u8,
    pub cut: bool,
    pub open_drawer: bool,
}

impl Finish {
    /// Cut and drawer kick only when both the settings ask for them and the
    /// profile has the hardware.
    pub fn for_profile(profile: &PrinterProfile, settings: &CommonSettings) -> Self {
        Self {
            feed_lines: settings.feed_lines_before_cut,
            cut: settings.auto_cut && profile.has(Capability::Cut),
            open_drawer: settings.open_drawer && profile.has(Capability::CashDrawer),
        }
    }
}

/// Lower lines to ESC/POS byte chunks: the init prelude, one chunk per
/// line, and the finishing trailer. Chunks are written to a device one at
/// a time.
pub fn encode_lines(lines: &[Line], finish: Finish) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity(lines.len() + 2);
    chunks.push(Program::with_init().to_bytes());

    for line in lines {
        let mut program = Program::new();
        program.styled_line(&line.text, line.style);
        chunks.push(program.to_bytes());
    }

    let mut trailer = Program::new();
    if finish.cut {
        trailer.push(Op::Cut {
            feed: finish.feed_lines,
        });
    } else if finish.feed_lines > 0 {
        trailer.push(Op::Feed {
            lines: finish.feed_lines,
        });
    }
    if finish.open_drawer {
        trailer.push(Op::DrawerKick(DrawerPin::Pin2));
    }
    chunks.push(trailer.to_bytes());

    chunks
}

/// Diagnostic page covering every font size and alignment, plain and bold.
pub fn formatting_sample(settings: &CommonSettings) -> Vec<Line> {
    let width = settings.characters_per_line();
    let mut lines = vec![
        Line::styled(
            truncate("FORMATTING TEST", width),
            TextStyle::new().center().bold(),
        ),
        Line::plain("-".repeat(width)),
    ];
    for size in FontSize::ALL {
        for align in Alignment::ALL {
            for bold in [false, true] {
                let mut style = TextStyle::new().size(size).align(align);
                if bold {
                    style = style.bold();
                }
                let label = format!(
                    "{} {}{}",
                    size.as_str(),
                    align.as_str(),
                    if bold { " bold" } else { "" }
                );
                lines.push(Line::styled(truncate(&label, width), style));
            }
        }
    }
    lines.push(Line::plain("-".repeat(width)));
    lines
}
