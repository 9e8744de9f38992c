//! # Money Amounts and Currency Formatting
//!
//! Amounts are held in minor units so two decimals never drift. Both the
//! fixed-width layout and the HTML markup call [`format_amount`], which
//! keeps the numeric text identical across transports.
//!
//! ## Symbol Placement
//!
//! ```text
//! prefix   USD  $4.50      -$2.00
//! suffix   SEK  4.50 kr    -2.00 kr
//! unknown  XYZ  XYZ 4.50
//! ```

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A money amount in minor units (cents).
///
/// Deserializes from a number in major units (`15.5`) or from
/// `{"minor": 1550}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(from = "AmountRepr", into = "AmountRepr")]
pub struct Amount(i64);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Minor { minor: i64 },
    Major(f64),
}

impl From<AmountRepr> for Amount {
    fn from(repr: AmountRepr) -> Self {
        match repr {
            AmountRepr::Minor { minor } => Amount::from_minor(minor),
            AmountRepr::Major(major) => Amount::from_major(major),
        }
    }
}

impl From<Amount> for AmountRepr {
    fn from(amount: Amount) -> Self {
        AmountRepr::Minor { minor: amount.0 }
    }
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Self {
        Amount(minor)
    }

    /// Convert from major units, rounding to the nearest cent.
    pub fn from_major(major: f64) -> Self {
        Amount((major * 100.0).round() as i64)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Amount(self.0.abs())
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

/// Plain two-decimal rendering without a symbol.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Where the currency symbol goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `$4.50`
    Prefix,
    /// `4.50 kr`
    Suffix,
}

/// Symbol and placement for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: &'static str,
    pub placement: Placement,
}

const fn prefix(symbol: &'static str) -> CurrencyFormat {
    CurrencyFormat {
        symbol,
        placement: Placement::Prefix,
    }
}

const fn suffix(symbol: &'static str) -> CurrencyFormat {
    CurrencyFormat {
        symbol,
        placement: Placement::Suffix,
    }
}

/// Every currency code with a known symbol.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "USD", "CAD", "AUD", "NZD", "MXN", "SGD", "HKD", "EUR", "GBP", "JPY", "CNY", "INR", "PHP",
    "NGN", "KRW", "BRL", "ZAR", "TRY", "ILS", "SEK", "NOK", "DKK", "PLN", "CZK", "HUF", "CHF",
];

/// Look up the symbol table. Codes are matched case-insensitively.
pub fn currency_format(code: &str) -> Option<CurrencyFormat> {
    let format = match code.trim().to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" | "NZD" | "MXN" | "SGD" | "HKD" => prefix("$"),
        "EUR" => prefix("€"),
        "GBP" => prefix("£"),
        "JPY" | "CNY" => prefix("¥"),
        "INR" => prefix("₹"),
        "PHP" => prefix("₱"),
        "NGN" => prefix("₦"),
        "KRW" => prefix("₩"),
        "BRL" => prefix("R$"),
        "ZAR" => prefix("R"),
        "TRY" => prefix("₺"),
        "ILS" => prefix("₪"),
        // Suffix allow-list
        "SEK" | "NOK" | "DKK" => suffix("kr"),
        "PLN" => suffix("zł"),
        "CZK" => suffix("Kč"),
        "HUF" => suffix("Ft"),
        "CHF" => suffix("CHF"),
        _ => return None,
    };
    Some(format)
}

/// Render an amount with its currency symbol and exactly two decimals.
///
/// ```
/// use posprint::receipt::currency::{format_amount, Amount};
///
/// assert_eq!(format_amount(Amount::from_minor(450), "USD"), "$4.50");
/// assert_eq!(format_amount(Amount::from_minor(-200), "EUR"), "-€2.00");
/// assert_eq!(format_amount(Amount::from_minor(1999), "SEK"), "19.99 kr");
/// ```
pub fn format_amount(amount: Amount, code: &str) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let digits = amount.abs().to_string();

    match currency_format(code) {
        Some(CurrencyFormat {
            symbol,
            placement: Placement::Prefix,
        }) => format!("{}{}{}", sign, symbol, digits),
        Some(CurrencyFormat {
            symbol,
            placement: Placement::Suffix,
        }) => format!("{}{} {}", sign, digits, symbol),
        None => format!("{}{} {}", sign, code.trim().to_ascii_uppercase(), digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Amount::from_minor(0).to_string(), "0.00");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
        assert_eq!(Amount::from_minor(1550).to_string(), "15.50");
        assert_eq!(Amount::from_minor(-1).to_string(), "-0.01");
        assert_eq!(Amount::from_minor(123456789).to_string(), "1234567.89");
    }

    #[test]
    fn test_from_major_rounds() {
        assert_eq!(Amount::from_major(15.5).minor(), 1550);
        assert_eq!(Amount::from_major(0.1 + 0.2).minor(), 30);
        assert_eq!(Amount::from_major(-2.5).minor(), -250);
    }

    #[test]
    fn test_every_supported_code_is_deterministic() {
        let amount = Amount::from_minor(123405);
        for code in SUPPORTED_CURRENCIES {
            let format = currency_format(code).expect("supported code");
            let rendered = format_amount(amount, code);
            assert_eq!(rendered, format_amount(amount, code));
            assert!(rendered.contains("1234.05"), "{}: {}", code, rendered);
            match format.placement {
                Placement::Prefix => assert!(rendered.starts_with(format.symbol)),
                Placement::Suffix => {
                    assert!(rendered.ends_with(&format!(" {}", format.symbol)))
                }
            }
        }
    }

    #[test]
    fn test_prefix_symbols() {
        let amount = Amount::from_minor(450);
        assert_eq!(format_amount(amount, "GBP"), "£4.50");
        assert_eq!(format_amount(amount, "JPY"), "¥4.50");
        assert_eq!(format_amount(amount, "INR"), "₹4.50");
        assert_eq!(format_amount(amount, "BRL"), "R$4.50");
    }

    #[test]
    fn test_suffix_symbols() {
        let amount = Amount::from_minor(450);
        assert_eq!(format_amount(amount, "NOK"), "4.50 kr");
        assert_eq!(format_amount(amount, "PLN"), "4.50 zł");
        assert_eq!(format_amount(-amount, "CZK"), "-4.50 Kč");
    }

    #[test]
    fn test_case_insensitive_and_unknown() {
        assert_eq!(format_amount(Amount::from_minor(100), "usd"), "$1.00");
        assert_eq!(format_amount(Amount::from_minor(100), "xyz"), "XYZ 1.00");
        assert_eq!(format_amount(Amount::from_minor(100), "AED"), "AED 1.00");
    }

    #[test]
    fn test_deserialize_both_forms() {
        let major: Amount = serde_json::from_str("15.5").unwrap();
        let minor: Amount = serde_json::from_str(r#"{"minor": 1550}"#).unwrap();
        let integer: Amount = serde_json::from_str("20").unwrap();
        assert_eq!(major, minor);
        assert_eq!(integer.minor(), 2000);
    }

    #[test]
    fn test_serialize_as_minor() {
        let json = serde_json::to_string(&Amount::from_minor(450)).unwrap();
        assert_eq!(json, r#"{"minor":450}"#);
    }
}
