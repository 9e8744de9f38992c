//! In-memory host capabilities for tests.
//!
//! Each double records what it was asked to do behind an `Arc`, so a clone
//! handed to a [`PrintService`](crate::orchestrator::PrintService) can be
//! inspected afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::payload::{RelayRequest, RelayResponse};
use super::{Characteristic, DeviceFilter, DeviceHost, PrintSurface, Relay};
use crate::error::{PrintError, PrintResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// DEVICE HOST
// ============================================================================

/// How `request_device` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    Refused,
    /// Never completes; exercises the connect timeout
    Hang,
}

#[derive(Debug, Default)]
struct DeviceLog {
    requests: usize,
    filters: Vec<DeviceFilter>,
    writes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct MemoryDeviceHost {
    available: bool,
    connect_failure: Option<ConnectFailure>,
    write_delay: Duration,
    fail_write_at: Option<usize>,
    log: Arc<Mutex<DeviceLog>>,
}

impl MemoryDeviceHost {
    pub fn new() -> Self {
        Self {
            available: true,
            connect_failure: None,
            write_delay: Duration::ZERO,
            fail_write_at: None,
            log: Arc::default(),
        }
    }

    /// A host without Bluetooth.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing_connect(mut self, failure: ConnectFailure) -> Self {
        self.connect_failure = Some(failure);
        self
    }

    /// Every write sleeps this long before it lands.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// The write with this zero-based index fails.
    pub fn failing_write_at(mut self, index: usize) -> Self {
        self.fail_write_at = Some(index);
        self
    }

    pub fn requests(&self) -> usize {
        lock(&self.log).requests
    }

    pub fn filters(&self) -> Vec<DeviceFilter> {
        lock(&self.log).filters.clone()
    }

    /// Chunks in the order they landed.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.log).writes.clone()
    }

    /// Everything written, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.log).writes.concat()
    }
}

impl Default for MemoryDeviceHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceHost for MemoryDeviceHost {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_device(&self, filter: &DeviceFilter) -> PrintResult<Box<dyn Characteristic>> {
        if !self.available {
            return Err(PrintError::UnsupportedTransport(
                "memory host has no Bluetooth".to_string(),
            ));
        }
        {
            let mut log = lock(&self.log);
            log.requests += 1;
            log.filters.push(filter.clone());
        }
        match self.connect_failure {
            Some(ConnectFailure::Refused) => Err(PrintError::ConnectionRefused(
                "memory device refused".to_string(),
            )),
            Some(ConnectFailure::Hang) => std::future::pending().await,
            None => Ok(Box::new(MemoryCharacteristic {
                host: self.clone(),
                attempts: 0,
            })),
        }
    }
}

pub struct MemoryCharacteristic {
    host: MemoryDeviceHost,
    attempts: usize,
}

#[async_trait]
impl Characteristic for MemoryCharacteristic {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let index = self.attempts;
        self.attempts += 1;
        if !self.host.write_delay.is_zero() {
            tokio::time::sleep(self.host.write_delay).await;
        }
        if self.host.fail_write_at == Some(index) {
            return Err(PrintError::WriteFailure(format!("memory write {} failed", index)));
        }
        lock(&self.host.log).writes.push(data.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory device".to_string()
    }
}

// ============================================================================
// PRINT SURFACE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedMarkup {
    pub title: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct MemoryPrintSurface {
    available: bool,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    printed: Arc<Mutex<Vec<PrintedMarkup>>>,
}

impl MemoryPrintSurface {
    pub fn new() -> Self {
        Self {
            available: true,
            failures_left: Arc::default(),
            calls: Arc::default(),
            printed: Arc::default(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// The first `n` print calls fail with `HostPrintUnavailable`.
    pub fn failing(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Print calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn printed(&self) -> Vec<PrintedMarkup> {
        lock(&self.printed).clone()
    }
}

impl Default for MemoryPrintSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrintSurface for MemoryPrintSurface {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn print_markup(&self, title: &str, html: &str) -> PrintResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(PrintError::HostPrintUnavailable(
                "memory surface unavailable".to_string(),
            ));
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PrintError::HostPrintUnavailable(
                "memory surface failed".to_string(),
            ));
        }
        lock(&self.printed).push(PrintedMarkup {
            title: title.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// RELAY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayBehavior {
    Accept,
    /// Answers `{success: false, message}`
    Reject(String),
    /// Transport-level failure
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct MemoryRelay {
    behavior: RelayBehavior,
    requests: Arc<Mutex<Vec<RelayRequest>>>,
}

impl MemoryRelay {
    pub fn new(behavior: RelayBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::default(),
        }
    }

    pub fn accepting() -> Self {
        Self::new(RelayBehavior::Accept)
    }

    pub fn rejecting(message: &str) -> Self {
        Self::new(RelayBehavior::Reject(message.to_string()))
    }

    pub fn requests(&self) -> Vec<RelayRequest> {
        lock(&self.requests).clone()
    }

    fn answer(&self, request: &RelayRequest) -> PrintResult<RelayResponse> {
        lock(&self.requests).push(request.clone());
        match &self.behavior {
            RelayBehavior::Accept => Ok(RelayResponse::ok("printed")),
            RelayBehavior::Reject(message) => Ok(RelayResponse::failure(message.as_str())),
            RelayBehavior::Unreachable => {
                Err(PrintError::RelayFailure("memory relay unreachable".to_string()))
            }
        }
    }
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn print(&self, request: &RelayRequest) -> PrintResult<RelayResponse> {
        self.answer(request)
    }

    async fn test(&self, request: &RelayRequest) -> PrintResult<RelayResponse> {
        self.answer(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_device_records_writes() {
        let host = MemoryDeviceHost::new();
        let mut device = host.request_device(&DeviceFilter::default()).await.unwrap();
        device.write(b"ab").await.unwrap();
        device.write(b"cd").await.unwrap();
        assert_eq!(host.requests(), 1);
        assert_eq!(host.bytes(), b"abcd".to_vec());
    }

    #[tokio::test]
    async fn test_device_write_failure() {
        let host = MemoryDeviceHost::new().failing_write_at(1);
        let mut device = host.request_device(&DeviceFilter::default()).await.unwrap();
        device.write(b"ok").await.unwrap();
        assert!(device.write(b"no").await.is_err());
        assert_eq!(host.writes(), vec![b"ok".to_vec()]);
    }

    #[tokio::test]
    async fn test_surface_failing_then_ok() {
        let surface = MemoryPrintSurface::new().failing(1);
        assert!(surface.print_markup("a", "<p/>").await.is_err());
        surface.print_markup("b", "<p/>").await.unwrap();
        assert_eq!(surface.calls(), 2);
        assert_eq!(surface.printed().len(), 1);
        assert_eq!(surface.printed()[0].title, "b");
    }
}
