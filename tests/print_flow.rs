//! # Print Flow Tests
//!
//! End-to-end jobs through the public API: a network profile printing via
//! the HTTP relay client, the relay server and a fake port 9100 printer,
//! plus the Bluetooth and fallback paths against in-memory hosts.

use chrono::{FixedOffset, TimeZone};
use pretty_assertions::assert_eq;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use posprint::printer::{Capability, CommonSettings, PaperWidth, TransportSettings};
use posprint::transport::memory::{MemoryDeviceHost, MemoryPrintSurface};
use posprint::transport::HttpRelay;
use posprint::{
    Hosts, PrintError, PrintMode, PrintOutcome, PrintService, PrinterProfile, ReceiptDocument,
    TestHarness, TestKind, server,
};

fn sample() -> ReceiptDocument {
    let at = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .unwrap();
    ReceiptDocument::sample(at)
}

/// Accept one connection and return everything written to it.
async fn fake_printer() -> (u16, JoinHandle<Vec<u8>>) {
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

/// Serve the relay router on an ephemeral port and return its base URL.
async fn relay_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(server::ServerConfig::default());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn network_profile(port: u16) -> PrinterProfile {
    PrinterProfile::new(
        "kitchen",
        "Kitchen",
        TransportSettings::Network {
            common: CommonSettings {
                paper_width: PaperWidth::Mm58,
                ..CommonSettings::default()
            },
            host: "127.0.0.1".into(),
            port,
        },
    )
    .with_capability(Capability::Cut)
}

#[tokio::test]
async fn test_network_receipt_reaches_printer() {
    let (port, printer) = fake_printer().await;
    let relay = HttpRelay::new(&relay_server().await).unwrap();
    let surface = MemoryPrintSurface::new();
    let hosts = Hosts::new().with_relay(relay).with_surface(surface.clone());
    let service = PrintService::new(network_profile(port), hosts).unwrap();

    let report = service
        .print(&sample(), None, PrintMode::Interactive)
        .await
        .unwrap();
    assert_eq!(report.outcome, PrintOutcome::Success);
    assert_eq!(report.attempts, 1);
    assert_eq!(surface.calls(), 0);

    let bytes = printer.await.unwrap();
    assert_eq!(&bytes[..5], &[0x1B, 0x40, 0x1B, 0x74, 16]);
    // 58mm paper: 24-column lines
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("Test Print"));
    assert!(text.contains("TOTAL"));
    assert!(text.contains("Change"));
    // Cut with 3 lines of feed
    assert_eq!(&bytes[bytes.len() - 4..], &[0x1D, 0x56, 66, 3]);
}

#[tokio::test]
async fn test_relay_failure_falls_back_to_local() {
    let relay = HttpRelay::new(&relay_server().await).unwrap();
    let surface = MemoryPrintSurface::new();
    let hosts = Hosts::new().with_relay(relay).with_surface(surface.clone());
    let service = PrintService::new(network_profile(closed_port().await), hosts).unwrap();

    let report = service
        .print(&sample(), None, PrintMode::Interactive)
        .await
        .unwrap();
    assert_eq!(report.outcome, PrintOutcome::FallbackSuccess);
    assert_eq!(report.attempts, 2);

    let printed = surface.printed();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].title, "Sale TEST-0001");
    assert!(printed[0].html.contains("paper-58mm"));
}

#[tokio::test]
async fn test_unreachable_relay_falls_back_to_local() {
    let relay = HttpRelay::new(&format!("http://127.0.0.1:{}", closed_port().await)).unwrap();
    let surface = MemoryPrintSurface::new().failing(1);
    let hosts = Hosts::new().with_relay(relay).with_surface(surface.clone());
    let service = PrintService::new(network_profile(9100), hosts).unwrap();

    let report = service.auto_print(&sample()).await;
    assert_eq!(report.outcome, PrintOutcome::EmergencyFallbackSuccess);
    assert_eq!(report.attempts, 3);
    assert_eq!(surface.calls(), 2);
    assert!(surface.printed()[0].html.contains("paper-80mm"));
}

#[tokio::test]
async fn test_everything_down_is_reported() {
    let relay = HttpRelay::new(&format!("http://127.0.0.1:{}", closed_port().await)).unwrap();
    let hosts = Hosts::new()
        .with_relay(relay)
        .with_surface(MemoryPrintSurface::unavailable());
    let service = PrintService::new(network_profile(9100), hosts).unwrap();

    let report = service.auto_print(&sample()).await;
    assert_eq!(report.outcome, PrintOutcome::Failed);
    assert!(report.error.is_some());

    let err = service
        .print(&sample(), None, PrintMode::Interactive)
        .await
        .unwrap_err();
    assert!(matches!(err, PrintError::HostPrintUnavailable(_)));
}

#[tokio::test]
async fn test_bluetooth_receipt_and_drawer() {
    let device = MemoryDeviceHost::new();
    let profile = PrinterProfile::new(
        "counter",
        "Counter",
        TransportSettings::Bluetooth {
            common: CommonSettings {
                open_drawer: true,
                ..CommonSettings::default()
            },
            device_name_filter: Some("TM-P20".into()),
        },
    )
    .with_capability(Capability::Cut)
    .with_capability(Capability::CashDrawer);
    let service = PrintService::new(profile, Hosts::new().with_device(device.clone())).unwrap();

    let report = service
        .print(&sample(), None, PrintMode::Interactive)
        .await
        .unwrap();
    assert_eq!(report.outcome, PrintOutcome::Success);
    assert_eq!(device.requests(), 1);
    assert_eq!(device.filters()[0].name_prefix.as_deref(), Some("TM-P20"));

    let bytes = device.bytes();
    assert_eq!(&bytes[bytes.len() - 5..], &[0x1B, 0x70, 0, 25, 250]);

    // Second job reuses the connection
    service
        .print(&sample(), None, PrintMode::Interactive)
        .await
        .unwrap();
    assert_eq!(device.requests(), 1);
}

#[tokio::test]
async fn test_harness_connection_through_relay() {
    let (port, printer) = fake_printer().await;
    let relay = HttpRelay::new(&relay_server().await).unwrap();
    let service = PrintService::new(network_profile(port), Hosts::new().with_relay(relay)).unwrap();

    let result = TestHarness::new(&service).run(TestKind::Connection).await;
    assert!(result.success, "{}", result.message);
    assert!(!result.simulated);
    assert_eq!(printer.await.unwrap(), vec![0x1B, 0x40, 0x1B, 0x74, 16]);
}
