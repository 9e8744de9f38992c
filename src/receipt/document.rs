//! # Receipt Documents
//!
//! The immutable render input. A document is built fresh from a finished
//! transaction for every print, reprint or test call and is never cached;
//! a reprint regenerates it with the reprint marker set.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::currency::Amount;
use crate::error::PrintError;

/// Business identity block printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Logo URL or file path (markup path only)
    #[serde(default)]
    pub logo: Option<String>,
    /// Free text under the contact block, may contain line breaks
    #[serde(default)]
    pub header: Option<String>,
    /// Free text under the thank-you line, may contain line breaks
    #[serde(default)]
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Invoice,
    OrderSlip,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "Sale",
            TransactionKind::Invoice => "Invoice",
            TransactionKind::OrderSlip => "Order Slip",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transaction metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub kind: TransactionKind,
    pub number: String,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub cashier: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub reprint: bool,
    #[serde(default)]
    pub reprinted_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: Amount,
    pub line_total: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Amount,
    #[serde(default)]
    pub discount: Amount,
    #[serde(default)]
    pub tax: Amount,
    pub total: Amount,
}

/// Payment method. Unrecognized names deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
    BankTransfer,
    Voucher,
    Other,
}

impl From<String> for PaymentMethod {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => PaymentMethod::Cash,
            "card" | "credit_card" | "debit_card" => PaymentMethod::Card,
            "mobile" => PaymentMethod::Mobile,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "voucher" => PaymentMethod::Voucher,
            _ => PaymentMethod::Other,
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        let name = match method {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Voucher => "voucher",
            PaymentMethod::Other => "other",
        };
        name.to_string()
    }
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Mobile => "Mobile",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Voucher => "Voucher",
            PaymentMethod::Other => "Other",
        }
    }
}

/// Payment block. Tendered and change are only printed for cash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    #[serde(default)]
    pub tendered: Option<Amount>,
    #[serde(default)]
    pub change: Option<Amount>,
}

impl Payment {
    pub fn is_cash(&self) -> bool {
        self.method == PaymentMethod::Cash
    }
}

/// Everything a receipt prints, in one immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDocument {
    pub business: BusinessInfo,
    pub transaction: TransactionInfo,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// ISO 4217 code shared by every amount in the document
    pub currency: String,
    pub totals: Totals,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ReceiptDocument {
    /// Load a document from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PrintError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| PrintError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// A copy of this document carrying the reprint marker.
    pub fn as_reprint(&self, at: DateTime<FixedOffset>) -> Self {
        let mut doc = self.clone();
        doc.transaction.reprint = true;
        doc.transaction.reprinted_at = Some(at);
        doc
    }

    /// Change due for a cash payment: the recorded change, or tendered
    /// minus total when only the tendered amount is known.
    pub fn change_due(&self) -> Option<Amount> {
        let payment = self.payment.as_ref().filter(|p| p.is_cash())?;
        payment
            .change
            .or_else(|| payment.tendered.map(|t| t - self.totals.total))
    }

    /// Synthetic document used by the test print.
    pub fn sample(now: DateTime<FixedOffset>) -> Self {
        let items = vec![
            LineItem {
                name: "Espresso".to_string(),
                quantity: 2.0,
                unit_price: Amount::from_minor(350),
                line_total: Amount::from_minor(700),
            },
            LineItem {
                name: "Extra Large Deluxe Combo Meal Set".to_string(),
                quantity: 1.0,
                unit_price: Amount::from_minor(750),
                line_total: Amount::from_minor(750),
            },
            LineItem {
                name: "Bottled Water".to_string(),
                quantity: 1.0,
                unit_price: Amount::from_minor(150),
                line_total: Amount::from_minor(150),
            },
        ];

        Self {
            business: BusinessInfo {
                name: "Test Print".to_string(),
                address: Some("1 Sample Street".to_string()),
                phone: Some("555-0100".to_string()),
                email: Some("shop@example.com".to_string()),
                logo: None,
                header: Some("Printer self-test".to_string()),
                footer: Some("This is not a valid receipt".to_string()),
            },
            transaction: TransactionInfo {
                kind: TransactionKind::Sale,
                number: "TEST-0001".to_string(),
                timestamp: now,
                cashier: Some("Self-test".to_string()),
                customer: None,
                reprint: false,
                reprinted_at: None,
            },
            items,
            currency: "USD".to_string(),
            totals: Totals {
                subtotal: Amount::from_minor(1600),
                discount: Amount::from_minor(100),
                tax: Amount::from_minor(50),
                total: Amount::from_minor(1550),
            },
            payment: Some(Payment {
                method: PaymentMethod::Cash,
                tendered: Some(Amount::from_minor(2000)),
                change: Some(Amount::from_minor(450)),
            }),
            notes: None,
        }
    }
}
