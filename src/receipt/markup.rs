//! # HTML Markup
//!
//! Receipt markup for the local print surface. Sections mirror the
//! fixed-width layout and amounts go through the same
//! [`format_amount`], so a fallback print shows the same numbers a thermal
//! print would.
//!
//! The body carries a paper width class (`paper-58mm`, `paper-80mm`,
//! `paper-112mm`) that sets the printable width.

use std::fmt::Write;

use super::currency::format_amount;
use super::document::ReceiptDocument;
use super::layout::{DATE_FORMAT, Line, THANK_YOU, quantity, text_block_lines};
use crate::printer::CommonSettings;
use crate::protocol::text::{Alignment, FontSize};

/// Escape text for inclusion in HTML.
pub fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_shell(title: &str, settings: &CommonSettings, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
@page {{ margin: 0; }}
body {{ font-family: ui-monospace, Menlo, monospace; margin: 0 auto; padding: 4mm; color: #000; font-size: 12px; }}
body.paper-58mm {{ width: 48mm; }}
body.paper-80mm {{ width: 72mm; }}
body.paper-112mm {{ width: 104mm; }}
body.font-small {{ font-size: 10px; }}
body.font-large {{ font-size: 14px; }}
.center {{ text-align: center; }}
.right {{ text-align: right; }}
.bold {{ font-weight: bold; }}
.small {{ font-size: 0.8em; }}
.large {{ font-size: 1.4em; }}
.logo {{ display: block; margin: 0 auto 2mm; max-width: 60%; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; }}
.section {{ margin-top: 6px; border-top: 1px dashed #000; padding-top: 4px; }}
.grand {{ border-top: 2px solid #000; margin-top: 4px; padding-top: 4px; }}
.item-name {{ overflow: hidden; white-space: nowrap; text-overflow: ellipsis; }}
</style>
</head>
<body class="paper-{} font-{}">
{}</body>
</html>"#,
        esc(title),
        settings.paper_width,
        settings.font_size.as_str(),
        body
    )
}

fn pair(body: &mut String, class: &str, label: &str, value: &str) {
    let _ = writeln!(
        body,
        "<div class=\"line {}\"><span>{}</span><span>{}</span></div>",
        class,
        esc(label),
        esc(value)
    );
}

fn div(body: &mut String, class: &str, text: &str) {
    let _ = writeln!(body, "<div class=\"{}\">{}</div>", class, esc(text));
}

/// Render a complete HTML document for the receipt.
pub fn render_html(doc: &ReceiptDocument, settings: &CommonSettings, show_logo: bool) -> String {
    let money = |amount| format_amount(amount, &doc.currency);
    let business = &doc.business;
    let tx = &doc.transaction;
    let mut body = String::new();

    // Header
    body.push_str("<header>\n");
    if show_logo {
        if let Some(logo) = business.logo.as_deref().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(body, "<img class=\"logo\" src=\"{}\" alt=\"\"/>", esc(logo));
        }
    }
    div(&mut body, "center bold large", &business.name);
    for contact in [&business.address, &business.phone, &business.email]
        .into_iter()
        .flatten()
    {
        div(&mut body, "center", contact);
    }
    for line in text_block_lines(business.header.as_deref()) {
        div(&mut body, "center", line);
    }
    body.push_str("</header>\n");

    // Transaction
    body.push_str("<section class=\"section\">\n");
    div(&mut body, "bold", &format!("{}: {}", tx.kind, tx.number));
    pair(&mut body, "", "Date", &tx.timestamp.format(DATE_FORMAT).to_string());
    if let Some(cashier) = &tx.cashier {
        pair(&mut body, "", "Cashier", cashier);
    }
    let customer = tx
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Walk-in");
    pair(&mut body, "", "Customer", customer);
    body.push_str("</section>\n");

    // Items
    body.push_str("<section class=\"section items\">\n");
    for item in &doc.items {
        div(&mut body, "item-name", &item.name);
        pair(
            &mut body,
            "",
            &format!("{}x {}", quantity(item.quantity), money(item.unit_price)),
            &money(item.line_total),
        );
    }
    body.push_str("</section>\n");

    // Totals
    let totals = &doc.totals;
    body.push_str("<section class=\"section totals\">\n");
    pair(&mut body, "", "Subtotal", &money(totals.subtotal));
    if !totals.discount.is_zero() {
        pair(&mut body, "", "Discount", &money(-totals.discount.abs()));
    }
    if !totals.tax.is_zero() {
        pair(&mut body, "", "Tax", &money(totals.tax));
    }
    pair(&mut body, "grand bold large", "TOTAL", &money(totals.total));
    if let Some(payment) = &doc.payment {
        if payment.is_cash() {
            if let Some(tendered) = payment.tendered {
                pair(&mut body, "", "Cash", &money(tendered));
            }
            if let Some(change) = doc.change_due() {
                pair(&mut body, "", "Change", &money(change));
            }
        } else {
            pair(&mut body, "", "Paid by", payment.method.label());
        }
    }
    body.push_str("</section>\n");

    // Footer
    body.push_str("<footer class=\"section\">\n");
    div(&mut body, "center", THANK_YOU);
    for line in text_block_lines(business.footer.as_deref()) {
        div(&mut body, "center", line);
    }
    if let Some(notes) = doc.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        div(&mut body, "", &format!("Note: {}", notes));
    }
    if tx.reprint {
        let at = tx.reprinted_at.unwrap_or(tx.timestamp);
        div(
            &mut body,
            "center small",
            &format!("REPRINT {}", at.format(DATE_FORMAT)),
        );
    }
    body.push_str("</footer>\n");

    let title = format!("{} {}", tx.kind, tx.number);
    html_shell(&title, settings, &body)
}

/// Render pre-laid-out lines (such as the formatting test page) as HTML,
/// one block per line with its style mapped to CSS classes.
pub fn render_lines_html(title: &str, lines: &[Line], settings: &CommonSettings) -> String {
    let mut body = String::new();
    for line in lines {
        let mut classes = vec![match line.style.align {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }];
        if line.style.bold {
            classes.push("bold");
        }
        match line.style.size {
            FontSize::Small => classes.push("small"),
            FontSize::Large => classes.push("large"),
            FontSize::Normal => {}
        }
        div(&mut body, &classes.join(" "), &line.text);
    }
    html_shell(title, settings, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::PaperWidth;
    use crate::receipt::currency::Amount;
    use crate::receipt::document::{LineItem, Payment, PaymentMethod};
    use crate::receipt::layout::{formatting_sample, render_lines};
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 20, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_esc() {
        assert_eq!(esc("<b>Fish & Chips</b>"), "&lt;b&gt;Fish &amp; Chips&lt;/b&gt;");
        assert_eq!(esc("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_paper_width_class() {
        let doc = ReceiptDocument::sample(now());
        for paper in PaperWidth::ALL {
            let settings = CommonSettings {
                paper_width: paper,
                ..Default::default()
            };
            let html = render_html(&doc, &settings, false);
            assert!(html.starts_with("<!DOCTYPE html>"));
            assert!(html.contains(&format!("<body class=\"paper-{} ", paper)));
        }
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = ReceiptDocument::sample(now());
        doc.business.name = "<script>alert(1)</script>".into();
        let html = render_html(&doc, &CommonSettings::default(), false);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_same_amount_text_as_layout() {
        let doc = ReceiptDocument::sample(now());
        let html = render_html(&doc, &CommonSettings::default(), false);
        assert!(html.contains("$15.50"));
        assert!(html.contains("-$1.00"));
        assert!(html.contains("<span>Change</span><span>$4.50</span>"));
        assert!(html.contains(THANK_YOU));
    }

    #[test]
    fn test_item_quantity_matches_layout() {
        let mut doc = ReceiptDocument::sample(now());
        doc.items = vec![
            LineItem {
                name: "Coffee beans".into(),
                quantity: 1.5,
                unit_price: Amount::from_minor(1000),
                line_total: Amount::from_minor(1500),
            },
            LineItem {
                name: "Croissant".into(),
                quantity: 2.0,
                unit_price: Amount::from_minor(250),
                line_total: Amount::from_minor(500),
            },
        ];
        let settings = CommonSettings::default();
        let html = render_html(&doc, &settings, false);
        assert!(html.contains("<span>1.50x $10.00</span>"));
        assert!(html.contains("<span>2x $2.50</span>"));

        let lines = render_lines(&doc, &settings);
        assert!(lines.iter().any(|l| l.text.starts_with("1.50x $10.00")));
        assert!(lines.iter().any(|l| l.text.starts_with("2x $2.50")));
    }

    #[test]
    fn test_card_payment() {
        let mut doc = ReceiptDocument::sample(now());
        doc.payment = Some(Payment {
            method: PaymentMethod::Card,
            tendered: None,
            change: None,
        });
        let html = render_html(&doc, &CommonSettings::default(), false);
        assert!(!html.contains("Change"));
        assert!(html.contains("<span>Paid by</span><span>Card</span>"));
    }

    #[test]
    fn test_logo_only_when_shown() {
        let mut doc = ReceiptDocument::sample(now());
        doc.business.logo = Some("https://shop.example/logo.png".into());
        let settings = CommonSettings::default();
        assert!(render_html(&doc, &settings, true).contains("<img class=\"logo\""));
        assert!(!render_html(&doc, &settings, false).contains("<img"));
    }

    #[test]
    fn test_reprint_marker() {
        let doc = ReceiptDocument::sample(now()).as_reprint(now());
        let html = render_html(&doc, &CommonSettings::default(), false);
        assert!(html.contains("REPRINT 2026-01-20 12:00"));
    }

    #[test]
    fn test_render_lines_html() {
        let settings = CommonSettings::default();
        let html = render_lines_html("Formatting", &formatting_sample(&settings), &settings);
        assert!(html.contains("<div class=\"right bold large\">large right bold</div>"));
        assert!(html.contains("<div class=\"left small\">small left</div>"));
    }
}
