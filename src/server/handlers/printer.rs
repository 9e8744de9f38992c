//! Relay handlers: forward pre-formatted ESC/POS jobs to network printers.
//!
//! The relay never formats anything. It decodes `escpos`, opens a TCP
//! connection to the profile's `host:port` and writes the bytes.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

use super::super::state::AppState;
use crate::error::PrintError;
use crate::ir::Program;
use crate::printer::{PrinterProfile, TransportSettings};
use crate::transport::{NetworkPrinter, RelayRequest, RelayResponse};

type Reply = (StatusCode, Json<RelayResponse>);

fn reply(status: StatusCode, response: RelayResponse) -> Reply {
    (status, Json(response))
}

fn bad_request(message: impl Into<String>) -> Reply {
    reply(StatusCode::BAD_REQUEST, RelayResponse::failure(message))
}

fn printer_for(profile: &PrinterProfile, state: &AppState) -> Result<NetworkPrinter, Reply> {
    match &profile.settings {
        TransportSettings::Network { host, port, .. } => NetworkPrinter::new(host, *port)
            .map(|p| p.with_timeout(state.config.printer_timeout))
            .map_err(|e| bad_request(e.to_string())),
        other => Err(bad_request(format!(
            "profile '{}' uses the {} transport, not network",
            profile.id,
            other.kind()
        ))),
    }
}

async fn forward(printer: NetworkPrinter, bytes: Vec<u8>, done: &str) -> Reply {
    match printer.print(&bytes).await {
        Ok(()) => reply(StatusCode::OK, RelayResponse::ok(done)),
        Err(e) => {
            warn!(addr = %printer.addr(), error = %e, "relay forward failed");
            let status = match e {
                PrintError::ConnectionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
            reply(status, RelayResponse::failure(e.to_string()))
        }
    }
}

/// Handle POST /api/printer/print - forward a formatted receipt.
pub async fn print(State(state): State<Arc<AppState>>, Json(request): Json<RelayRequest>) -> Reply {
    let printer = match printer_for(&request.profile, &state) {
        Ok(printer) => printer,
        Err(reply) => return reply,
    };
    let Some(receipt) = request.receipt_data else {
        return bad_request("receiptData is required");
    };
    let bytes = match receipt.decode_escpos() {
        Ok(bytes) => bytes,
        Err(e) => return bad_request(e.to_string()),
    };

    info!(
        profile = %request.profile.id,
        addr = %printer.addr(),
        lines = receipt.lines.len(),
        bytes = bytes.len(),
        "relaying receipt"
    );
    forward(printer, bytes, "Receipt sent to printer").await
}

/// Handle POST /api/printer/test - connection check or diagnostic page.
pub async fn test(State(state): State<Arc<AppState>>, Json(request): Json<RelayRequest>) -> Reply {
    let printer = match printer_for(&request.profile, &state) {
        Ok(printer) => printer,
        Err(reply) => return reply,
    };
    let Some(test) = request.test_data else {
        return bad_request("testData is required");
    };

    let bytes = match test.decode_escpos() {
        Ok(Some(bytes)) => bytes,
        Ok(None) if test.kind == "connection" => Program::with_init().to_bytes(),
        Ok(None) => return bad_request(format!("test '{}' needs escpos data", test.kind)),
        Err(e) => return bad_request(e.to_string()),
    };

    info!(profile = %request.profile.id, kind = %test.kind, "relaying test");
    forward(printer, bytes, "Printer reachable").await
}
