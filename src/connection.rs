//! # Connection Manager
//!
//! Owns the Bluetooth session for one printer profile: the state machine,
//! the single writable characteristic, and the write lock.
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!                                 |                  |
//!                          failure/timeout     write failure
//!                                 v                  v
//!                               Error <--------------+
//!
//! disconnect(): any state --> Disconnected
//! ```
//!
//! ## Writes
//!
//! The device protocol has no multiplexing, so writes never interleave. A
//! write (or a [`WriteSession`] holding the lock for a whole job) that is
//! outstanding makes every other write fail immediately with
//! [`PrintError::WriteInProgress`]. Nothing is queued.
//!
//! A write that is abandoned mid-flight (its future dropped) cannot be
//! recalled from the device. The manager then moves to
//! `Error("write abandoned")` and refuses to connect again until
//! [`ConnectionManager::disconnect`] is called.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

use crate::error::{PrintError, PrintResult};
use crate::transport::{Characteristic, DeviceFilter, DeviceHost};

/// Connection lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}

/// Connection timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Bound on the whole device request and handshake
    pub connect_timeout: Duration,
    /// Bound on each individual write
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: ConnectionState,
    poisoned: bool,
}

type Link = Option<Box<dyn Characteristic>>;

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn transition(shared: &Mutex<Shared>, to: ConnectionState) {
    let mut guard = lock(shared);
    if guard.state != to {
        info!(from = %guard.state, to = %to, "connection state");
        guard.state = to;
    }
}

/// Moves the manager to `Error` if dropped while armed.
struct Abandon<'a> {
    shared: &'a Mutex<Shared>,
    reason: &'static str,
    poison: bool,
    armed: bool,
}

impl<'a> Abandon<'a> {
    fn arm(shared: &'a Mutex<Shared>, reason: &'static str, poison: bool) -> Self {
        Self {
            shared,
            reason,
            poison,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Abandon<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(reason = self.reason, "in-flight operation dropped");
            transition(self.shared, ConnectionState::Error(self.reason.to_string()));
            if self.poison {
                lock(self.shared).poisoned = true;
            }
        }
    }
}

/// Single owner of a Bluetooth session.
pub struct ConnectionManager {
    host: Arc<dyn DeviceHost>,
    filter: DeviceFilter,
    config: ConnectionConfig,
    shared: Arc<Mutex<Shared>>,
    link: Arc<tokio::sync::Mutex<Link>>,
}

impl ConnectionManager {
    pub fn new(host: Arc<dyn DeviceHost>, filter: DeviceFilter, config: ConnectionConfig) -> Self {
        Self {
            host,
            filter,
            config,
            shared: Arc::new(Mutex::new(Shared {
                state: ConnectionState::Disconnected,
                poisoned: false,
            })),
            link: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        lock(&self.shared).state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn config(&self) -> ConnectionConfig {
        self.config
    }

    /// Request the device and resolve its writable characteristic.
    ///
    /// A no-op when already connected.
    #[instrument(skip(self), fields(filter = ?self.filter.name_prefix))]
    pub async fn connect(&self) -> PrintResult<()> {
        {
            let shared = lock(&self.shared);
            if shared.poisoned {
                return Err(PrintError::NotConnected(
                    "a write was abandoned; disconnect before reconnecting".to_string(),
                ));
            }
            if shared.state == ConnectionState::Connected {
                return Ok(());
            }
        }
        if !self.host.is_available() {
            return Err(PrintError::UnsupportedTransport(
                "host has no Bluetooth capability".to_string(),
            ));
        }

        let mut link = self
            .link
            .clone()
            .try_lock_owned()
            .map_err(|_| PrintError::WriteInProgress)?;

        transition(&self.shared, ConnectionState::Connecting);
        let abandon = Abandon::arm(&self.shared, "connect abandoned", false);
        let result = tokio::time::timeout(
            self.config.connect_timeout,
            self.host.request_device(&self.filter),
        )
        .await;
        abandon.disarm();

        match result {
            Ok(Ok(device)) => {
                info!(device = %device.describe(), "connected");
                *link = Some(device);
                transition(&self.shared, ConnectionState::Connected);
                Ok(())
            }
            Ok(Err(e)) => {
                *link = None;
                transition(&self.shared, ConnectionState::Error(e.to_string()));
                Err(e)
            }
            Err(_) => {
                *link = None;
                let e = PrintError::ConnectionTimeout(format!(
                    "no device after {:?}",
                    self.config.connect_timeout
                ));
                transition(&self.shared, ConnectionState::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Take the write lock for a whole job.
    ///
    /// Fails with `NotConnected` unless connected, and with
    /// `WriteInProgress` while another write or session is outstanding.
    pub fn begin_session(&self) -> PrintResult<WriteSession> {
        let state = self.state();
        if state != ConnectionState::Connected {
            return Err(PrintError::NotConnected(state.to_string()));
        }
        let link = self
            .link
            .clone()
            .try_lock_owned()
            .map_err(|_| PrintError::WriteInProgress)?;
        if link.is_none() {
            return Err(PrintError::NotConnected("no characteristic".to_string()));
        }
        Ok(WriteSession {
            link,
            shared: self.shared.clone(),
            write_timeout: self.config.write_timeout,
        })
    }

    /// Write one block of bytes.
    pub async fn write(&self, data: &[u8]) -> PrintResult<()> {
        let mut session = self.begin_session()?;
        session.write(data).await
    }

    /// Drop the session. Always succeeds and is idempotent.
    pub fn disconnect(&self) {
        transition(&self.shared, ConnectionState::Disconnected);
        lock(&self.shared).poisoned = false;
        // A live session releases the characteristic when it drops
        if let Ok(mut link) = self.link.try_lock() {
            *link = None;
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("filter", &self.filter)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Exclusive write access for the duration of one job.
pub struct WriteSession {
    link: OwnedMutexGuard<Link>,
    shared: Arc<Mutex<Shared>>,
    write_timeout: Duration,
}

impl WriteSession {
    /// Write one block, bounded by the write timeout. Any failure moves the
    /// manager to `Error` and releases the characteristic.
    pub async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let state = lock(&self.shared).state.clone();
        if state != ConnectionState::Connected {
            return Err(PrintError::NotConnected(state.to_string()));
        }
        let device = self
            .link
            .as_mut()
            .ok_or_else(|| PrintError::NotConnected("no characteristic".to_string()))?;

        let abandon = Abandon::arm(&self.shared, "write abandoned", true);
        let result = tokio::time::timeout(self.write_timeout, device.write(data)).await;
        abandon.disarm();

        let error = match result {
            Ok(Ok(())) => {
                debug!(bytes = data.len(), "write complete");
                return Ok(());
            }
            Ok(Err(PrintError::WriteFailure(reason))) => PrintError::WriteFailure(reason),
            Ok(Err(e)) => PrintError::WriteFailure(e.to_string()),
            Err(_) => {
                PrintError::WriteFailure(format!("write timed out after {:?}", self.write_timeout))
            }
        };
        *self.link = None;
        transition(&self.shared, ConnectionState::Error(error.to_string()));
        Err(error)
    }
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        if lock(&self.shared).state != ConnectionState::Connected {
            *self.link = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{ConnectFailure, MemoryDeviceHost};
    use pretty_assertions::assert_eq;

    fn manager(host: &MemoryDeviceHost) -> ConnectionManager {
        manager_with(host, ConnectionConfig::default())
    }

    fn manager_with(host: &MemoryDeviceHost, config: ConnectionConfig) -> ConnectionManager {
        ConnectionManager::new(Arc::new(host.clone()), DeviceFilter::default(), config)
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let host = MemoryDeviceHost::new();
        let mgr = manager(&host);
        mgr.disconnect();
        mgr.disconnect();
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_and_write() {
        let host = MemoryDeviceHost::new();
        let mgr = manager(&host);
        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), ConnectionState::Connected);

        // Connecting again is a no-op
        mgr.connect().await.unwrap();
        assert_eq!(host.requests(), 1);

        mgr.write(&[0x1B, 0x40]).await.unwrap();
        assert_eq!(host.bytes(), vec![0x1B, 0x40]);

        mgr.disconnect();
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(matches!(
            mgr.write(b"x").await,
            Err(PrintError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_write_rejected_when_disconnected() {
        let host = MemoryDeviceHost::new();
        let mgr = manager(&host);
        assert!(matches!(
            mgr.write(b"x").await,
            Err(PrintError::NotConnected(_))
        ));
        assert_eq!(host.requests(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_host() {
        let host = MemoryDeviceHost::unavailable();
        let mgr = manager(&host);
        assert!(matches!(
            mgr.connect().await,
            Err(PrintError::UnsupportedTransport(_))
        ));
    }

    #[tokio::test]
    async fn test_refused_connect_moves_to_error() {
        let host = MemoryDeviceHost::new().failing_connect(ConnectFailure::Refused);
        let mgr = manager(&host);
        assert!(matches!(
            mgr.connect().await,
            Err(PrintError::ConnectionRefused(_))
        ));
        assert!(matches!(mgr.state(), ConnectionState::Error(_)));

        mgr.disconnect();
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let host = MemoryDeviceHost::new().failing_connect(ConnectFailure::Hang);
        let config = ConnectionConfig {
            connect_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let mgr = manager_with(&host, config);
        assert!(matches!(
            mgr.connect().await,
            Err(PrintError::ConnectionTimeout(_))
        ));
        assert!(matches!(mgr.state(), ConnectionState::Error(_)));
    }

    #[tokio::test]
    async fn test_concurrent_write_is_rejected() {
        let host = MemoryDeviceHost::new().with_write_delay(Duration::from_millis(50));
        let mgr = manager(&host);
        mgr.connect().await.unwrap();

        let first = b"first job bytes".to_vec();
        let (a, b) = tokio::join!(mgr.write(&first), mgr.write(b"second"));
        a.unwrap();
        assert!(matches!(b, Err(PrintError::WriteInProgress)));
        assert_eq!(host.bytes(), first);
        assert_eq!(mgr.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_session_holds_lock_for_whole_job() {
        let host = MemoryDeviceHost::new();
        let mgr = manager(&host);
        mgr.connect().await.unwrap();

        let mut session = mgr.begin_session().unwrap();
        session.write(b"one").await.unwrap();
        assert!(matches!(
            mgr.write(b"intruder").await,
            Err(PrintError::WriteInProgress)
        ));
        session.write(b"two").await.unwrap();
        drop(session);

        mgr.write(b"three").await.unwrap();
        assert_eq!(host.writes(), vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[tokio::test]
    async fn test_write_timeout_moves_to_error() {
        let host = MemoryDeviceHost::new().with_write_delay(Duration::from_millis(200));
        let config = ConnectionConfig {
            write_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let mgr = manager_with(&host, config);
        mgr.connect().await.unwrap();

        assert!(matches!(
            mgr.write(b"slow").await,
            Err(PrintError::WriteFailure(_))
        ));
        assert!(matches!(mgr.state(), ConnectionState::Error(_)));

        // Error state is left by reconnecting
        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), ConnectionState::Connected);
        assert_eq!(host.requests(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_moves_to_error() {
        let host = MemoryDeviceHost::new().failing_write_at(0);
        let mgr = manager(&host);
        mgr.connect().await.unwrap();
        assert!(mgr.write(b"x").await.is_err());
        assert!(matches!(mgr.state(), ConnectionState::Error(_)));
    }

    #[tokio::test]
    async fn test_abandoned_write_poisons_until_disconnect() {
        let host = MemoryDeviceHost::new().with_write_delay(Duration::from_millis(200));
        let mgr = manager(&host);
        mgr.connect().await.unwrap();

        let abandoned = tokio::time::timeout(Duration::from_millis(20), mgr.write(b"lost")).await;
        assert!(abandoned.is_err());
        assert_eq!(
            mgr.state(),
            ConnectionState::Error("write abandoned".to_string())
        );
        assert!(matches!(
            mgr.connect().await,
            Err(PrintError::NotConnected(_))
        ));

        mgr.disconnect();
        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_string(&ConnectionState::Error("timeout".into())).unwrap();
        assert_eq!(json, r#"{"state":"error","reason":"timeout"}"#);
    }
}
