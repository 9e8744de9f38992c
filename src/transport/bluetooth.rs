//! # Bluetooth RFCOMM Device Host
//!
//! Receipt printers speak Serial Port Profile over RFCOMM. On Linux a paired
//! printer is bound to a tty (`/dev/rfcommN`) which becomes the single
//! writable characteristic for a session.
//!
//! ## Bluetooth Setup (Linux)
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on
//! [bluetooth]# pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX
//! # This creates /dev/rfcomm0
//! ```
//!
//! ## Device Resolution
//!
//! 1. An explicit device path (`/dev/rfcomm0`) is used as is.
//! 2. An explicit MAC address is looked up in `/proc/net/rfcomm`.
//! 3. Otherwise `bluetoothctl devices` is searched for the first device whose
//!    name passes the [`DeviceFilter`], and its MAC is looked up as in (2).
//!
//! ## TTY Configuration
//!
//! The tty is opened in raw mode so binary data passes through unmodified:
//! no input or output processing, 8-bit characters, no echo, non-canonical,
//! and no XON/XOFF flow control.

use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::{Characteristic, DeviceFilter, DeviceHost};
use crate::error::{PrintError, PrintResult};

/// Default RFCOMM device path
pub const DEFAULT_DEVICE: &str = "/dev/rfcomm0";

/// Where the kernel lists Bluetooth controllers
const SYSFS_BLUETOOTH: &str = "/sys/class/bluetooth";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Bluetooth host backed by RFCOMM tty devices.
///
/// ```no_run
/// use posprint::transport::{DeviceFilter, DeviceHost, RfcommHost};
///
/// # async fn run() -> posprint::PrintResult<()> {
/// let host = RfcommHost::new(Some("00:11:62:AA:BB:CC".to_string()));
/// let mut device = host.request_device(&DeviceFilter::default()).await?;
/// device.write(&[0x1B, 0x40]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RfcommHost {
    device: Option<String>,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl RfcommHost {
    /// `device` is a tty path or a MAC address. `None` resolves through the
    /// device filter.
    pub fn new(device: Option<String>) -> Self {
        Self {
            device,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        }
    }

    /// Set the chunk size for large writes.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    fn resolve_device(&self, filter: &DeviceFilter) -> PrintResult<PathBuf> {
        match self.device.as_deref() {
            Some(path) if path.starts_with('/') => Ok(PathBuf::from(path)),
            Some(mac) if is_valid_mac(mac) => mac_to_device(mac),
            Some(other) => Err(PrintError::InvalidConfig(format!(
                "not a device path or MAC address: {}",
                other
            ))),
            None if filter.name_prefix.is_none() && Path::new(DEFAULT_DEVICE).exists() => {
                Ok(PathBuf::from(DEFAULT_DEVICE))
            }
            None => {
                let output = Command::new("bluetoothctl")
                    .arg("devices")
                    .output()
                    .map_err(|e| {
                        PrintError::UnsupportedTransport(format!("failed to run bluetoothctl: {}", e))
                    })?;
                let listing = String::from_utf8_lossy(&output.stdout);
                let mac = find_device_mac(&listing, filter).ok_or_else(|| {
                    PrintError::ConnectionRefused(format!(
                        "no paired device matches {}",
                        filter.name_prefix.as_deref().unwrap_or("any name")
                    ))
                })?;
                mac_to_device(&mac)
            }
        }
    }
}

impl Default for RfcommHost {
    fn default() -> Self {
        Self::new(None)
    }
}

fn mac_to_device(mac: &str) -> PrintResult<PathBuf> {
    find_rfcomm_for_mac(mac)?.map(PathBuf::from).ok_or_else(|| {
        PrintError::ConnectionRefused(format!("no RFCOMM device bound to {}", mac))
    })
}

#[async_trait]
impl DeviceHost for RfcommHost {
    fn is_available(&self) -> bool {
        fs::read_dir(SYSFS_BLUETOOTH)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    #[instrument(skip(self), fields(device = ?self.device))]
    async fn request_device(&self, filter: &DeviceFilter) -> PrintResult<Box<dyn Characteristic>> {
        if !self.is_available() {
            return Err(PrintError::UnsupportedTransport(
                "no Bluetooth controller on this host".to_string(),
            ));
        }

        let host = self.clone();
        let filter = filter.clone();
        let (path, file) = tokio::task::spawn_blocking(move || {
            let path = host.resolve_device(&filter)?;
            let file = OpenOptions::new().write(true).open(&path).map_err(|e| {
                PrintError::ConnectionRefused(format!("failed to open {}: {}", path.display(), e))
            })?;
            configure_tty_raw(file.as_raw_fd())?;
            Ok::<_, PrintError>((path, file))
        })
        .await
        .map_err(|e| PrintError::ConnectionRefused(format!("device task failed: {}", e)))??;

        info!(path = %path.display(), "RFCOMM device opened");
        Ok(Box::new(RfcommCharacteristic {
            path,
            file: tokio::fs::File::from_std(file),
            chunk_size: self.chunk_size,
            chunk_delay: self.chunk_delay,
        }))
    }
}

/// An open RFCOMM tty.
pub struct RfcommCharacteristic {
    path: PathBuf,
    file: tokio::fs::File,
    chunk_size: usize,
    chunk_delay: Duration,
}

#[async_trait]
impl Characteristic for RfcommCharacteristic {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let failure = |e: io::Error| PrintError::WriteFailure(format!("{}: {}", self.path.display(), e));

        // Large blocks are chunked so the printer buffer keeps up
        let mut chunks = data.chunks(self.chunk_size).peekable();
        while let Some(chunk) = chunks.next() {
            self.file.write_all(chunk).await.map_err(failure)?;
            if chunks.peek().is_some() && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }
        self.file.flush().await.map_err(failure)?;

        debug!(bytes = data.len(), "RFCOMM write");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY must be off: 0x11 (XON) and 0x13 (XOFF) can appear in
/// ESC/POS parameters.
fn configure_tty_raw(fd: i32) -> PrintResult<()> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(PrintError::ConnectionRefused(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(PrintError::ConnectionRefused(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// DEVICE LOOKUP
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Pick the first device from `bluetoothctl devices` output whose name
/// passes the filter.
///
/// Lines look like `Device 00:11:62:AA:BB:CC TM-P20`.
pub fn find_device_mac(listing: &str, filter: &DeviceFilter) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.trim().splitn(3, ' ');
        if parts.next()? != "Device" {
            return None;
        }
        let mac = parts.next()?;
        let name = parts.next().unwrap_or("").trim();
        (is_valid_mac(mac) && filter.matches(name)).then(|| mac.to_uppercase())
    })
}

/// Find the `/dev/rfcommN` name bound to `mac` in `/proc/net/rfcomm`
/// contents (`rfcomm0: XX:XX:XX:XX:XX:XX channel N ...`).
pub fn rfcomm_name_for_mac(contents: &str, mac: &str) -> Option<String> {
    let mac_upper = mac.to_uppercase();
    contents
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .find_map(|line| line.split(':').next().map(|name| name.trim().to_string()))
        .filter(|name| !name.is_empty())
}

/// Find an existing RFCOMM device bound to the given MAC address.
///
/// Checks `/proc/net/rfcomm` and falls back to `rfcomm -a`.
pub fn find_rfcomm_for_mac(mac: &str) -> PrintResult<Option<String>> {
    let existing = |name: String| {
        let path = format!("/dev/{}", name);
        Path::new(&path).exists().then_some(path)
    };

    if let Ok(contents) = fs::read_to_string("/proc/net/rfcomm")
        && let Some(path) = rfcomm_name_for_mac(&contents, mac).and_then(existing)
    {
        return Ok(Some(path));
    }

    let output = Command::new("rfcomm")
        .arg("-a")
        .output()
        .map_err(|e| PrintError::UnsupportedTransport(format!("failed to run 'rfcomm -a': {}", e)))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(rfcomm_name_for_mac(&stdout, mac).and_then(existing))
}
