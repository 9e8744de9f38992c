//! # Relay Wire Format
//!
//! The relay is a dumb pipe: the core sends fully formatted bytes and gets
//! back success or failure.
//!
//! ```json
//! {
//!   "profile": { "id": "kitchen", "name": "Kitchen", "settings": { "transport": "network", "host": "10.0.0.9" } },
//!   "receiptData": { "lines": ["CORNER CAFE", "..."], "escpos": "G0AbdBA..." }
//! }
//! ```
//!
//! Response: `{ "success": true }` or `{ "success": false, "message": "..." }`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{PrintError, PrintResult};
use crate::printer::PrinterProfile;
use crate::receipt::Line;

/// A formatted receipt: the visible lines for logging plus the ESC/POS
/// stream, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPayload {
    pub lines: Vec<String>,
    pub escpos: String,
}

impl ReceiptPayload {
    pub fn new(lines: &[Line], bytes: &[u8]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.text.clone()).collect(),
            escpos: STANDARD.encode(bytes),
        }
    }

    pub fn decode_escpos(&self) -> PrintResult<Vec<u8>> {
        decode(&self.escpos)
    }
}

/// A test request. `kind` is `connection`, `formatting` or `receipt`;
/// anything but `connection` carries the bytes to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escpos: Option<String>,
}

impl TestPayload {
    pub fn connection() -> Self {
        Self {
            kind: "connection".to_string(),
            escpos: None,
        }
    }

    pub fn with_bytes(kind: &str, bytes: &[u8]) -> Self {
        Self {
            kind: kind.to_string(),
            escpos: Some(STANDARD.encode(bytes)),
        }
    }

    pub fn decode_escpos(&self) -> PrintResult<Option<Vec<u8>>> {
        self.escpos.as_deref().map(decode).transpose()
    }
}

fn decode(escpos: &str) -> PrintResult<Vec<u8>> {
    STANDARD
        .decode(escpos)
        .map_err(|e| PrintError::InvalidConfig(format!("escpos payload is not base64: {}", e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub profile: PrinterProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_data: Option<ReceiptPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<TestPayload>,
}

impl RelayRequest {
    pub fn receipt(profile: PrinterProfile, payload: ReceiptPayload) -> Self {
        Self {
            profile,
            receipt_data: Some(payload),
            test_data: None,
        }
    }

    pub fn test(profile: PrinterProfile, payload: TestPayload) -> Self {
        Self {
            profile,
            receipt_data: None,
            test_data: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RelayResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Convert a non-success answer into `RelayFailure`.
    pub fn into_result(self) -> PrintResult<Option<String>> {
        if self.success {
            Ok(self.message)
        } else {
            Err(PrintError::RelayFailure(
                self.message
                    .unwrap_or_else(|| "relay reported failure".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::{CommonSettings, TransportSettings};

    fn profile() -> PrinterProfile {
        PrinterProfile::new(
            "kitchen",
            "Kitchen",
            TransportSettings::Network {
                common: CommonSettings::default(),
                host: "10.0.0.9".into(),
                port: 9100,
            },
        )
    }

    #[test]
    fn test_receipt_request_shape() {
        let payload = ReceiptPayload::new(&[Line::plain("HELLO")], &[0x1B, 0x40]);
        let json = serde_json::to_value(RelayRequest::receipt(profile(), payload)).unwrap();
        assert_eq!(json["receiptData"]["lines"][0], "HELLO");
        assert_eq!(json["receiptData"]["escpos"], "G0A=");
        assert_eq!(json["profile"]["settings"]["transport"], "network");
        assert!(json.get("testData").is_none());
    }

    #[test]
    fn test_escpos_decodes() {
        let payload = ReceiptPayload::new(&[], &[0x1B, 0x40, 0x0A]);
        assert_eq!(payload.decode_escpos().unwrap(), vec![0x1B, 0x40, 0x0A]);

        let bad = ReceiptPayload {
            lines: vec![],
            escpos: "not base64!".into(),
        };
        assert!(bad.decode_escpos().is_err());
        assert_eq!(TestPayload::connection().decode_escpos().unwrap(), None);
    }

    #[test]
    fn test_response_into_result() {
        let ok: RelayResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), None);

        let failed = RelayResponse::failure("printer offline");
        match failed.into_result() {
            Err(PrintError::RelayFailure(msg)) => assert_eq!(msg, "printer offline"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
