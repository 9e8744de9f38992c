//! # Print Relay Server
//!
//! Backend endpoint that network-transport profiles print through. Browsers
//! and tablets cannot open raw TCP sockets, so the relay accepts a JSON job
//! and forwards its bytes to the printer on port 9100.
//!
//! ## Usage
//!
//! ```bash
//! posprint relay --listen 0.0.0.0:8080
//! ```
//!
//! | Route | Body |
//! |-------|------|
//! | `POST /api/printer/print` | `{profile, receiptData: {lines, escpos}}` |
//! | `POST /api/printer/test` | `{profile, testData: {kind, escpos?}}` |

mod handlers;
mod state;

pub use state::ServerConfig;

use std::sync::Arc;

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::PrintError;
use state::AppState;

/// Build the relay router.
pub fn router(config: ServerConfig) -> Router {
    let app_state = Arc::new(AppState::new(config));

    Router::new()
        .route("/api/printer/print", post(handlers::printer::print))
        .route("/api/printer/test", post(handlers::printer::test))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the relay server.
///
/// ```no_run
/// use posprint::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), posprint::PrintError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), PrintError> {
    let listen_addr = config.listen_addr.clone();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| PrintError::InvalidConfig(format!("failed to bind to {}: {}", listen_addr, e)))?;
    info!(addr = %listen_addr, "print relay listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::{CommonSettings, PrinterProfile, TransportSettings};
    use crate::receipt::Line;
    use crate::transport::{ReceiptPayload, RelayRequest, RelayResponse, TestPayload};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn network_profile(port: u16) -> PrinterProfile {
        PrinterProfile::new(
            "kitchen",
            "Kitchen",
            TransportSettings::Network {
                common: CommonSettings::default(),
                host: "127.0.0.1".into(),
                port,
            },
        )
    }

    async fn post(uri: &str, request: &RelayRequest) -> (StatusCode, RelayResponse) {
        let response = router(ServerConfig::default())
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn fake_printer() -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_print_forwards_bytes() {
        let (port, printer) = fake_printer().await;
        let payload = ReceiptPayload::new(&[Line::plain("HELLO")], b"\x1b@HELLO\n");
        let request = RelayRequest::receipt(network_profile(port), payload);

        let (status, response) = post("/api/printer/print", &request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.success);
        assert_eq!(printer.await.unwrap(), b"\x1b@HELLO\n".to_vec());
    }

    #[tokio::test]
    async fn test_connection_test_sends_init() {
        let (port, printer) = fake_printer().await;
        let request = RelayRequest::test(network_profile(port), TestPayload::connection());

        let (status, response) = post("/api/printer/test", &request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.success);
        assert_eq!(printer.await.unwrap(), vec![0x1B, 0x40, 0x1B, 0x74, 16]);
    }

    #[tokio::test]
    async fn test_rejects_non_network_profile() {
        let profile = PrinterProfile::new(
            "office",
            "Office",
            TransportSettings::Local {
                common: CommonSettings::default(),
            },
        );
        let request = RelayRequest::receipt(profile, ReceiptPayload::new(&[], b"x"));

        let (status, response) = post("/api/printer/print", &request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.success);
        assert!(response.message.unwrap().contains("local"));
    }

    #[tokio::test]
    async fn test_missing_receipt_data() {
        let request = RelayRequest::test(network_profile(9100), TestPayload::connection());
        let (status, response) = post("/api/printer/print", &request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response.message.as_deref(), Some("receiptData is required"));
    }

    #[tokio::test]
    async fn test_unreachable_printer_is_bad_gateway() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = RelayRequest::receipt(network_profile(port), ReceiptPayload::new(&[], b"x"));

        let (status, response) = post("/api/printer/print", &request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!response.success);
    }
}
