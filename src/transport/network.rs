//! Raw TCP sender for network receipt printers.
//!
//! Most thermal printers accept raw ESC/POS on port 9100. The relay
//! endpoint uses this to forward jobs it receives.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Network printer (TCP port 9100)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PrintError::InvalidConfig("printer host is empty".to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self, timeout: Duration) -> PrintResult<TcpStream> {
        let addr = self.addr();
        tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| PrintError::ConnectionTimeout(addr.clone()))?
            .map_err(|e| PrintError::ConnectionRefused(format!("{}: {}", addr, e)))
    }

    /// Send raw ESC/POS data to the printer
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    pub async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = self.connect(self.timeout).await?;
        info!("Connected, sending {} bytes", data.len());

        // A printer that accepts but stops reading must not hang the job
        let send = async {
            stream.write_all(data).await?;
            stream.flush().await?;
            stream.shutdown().await
        };
        tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                PrintError::WriteFailure(format!(
                    "{}: write timed out after {:?}",
                    self.addr(),
                    self.timeout
                ))
            })?
            .map_err(|e| PrintError::WriteFailure(format!("{}: {}", self.addr(), e)))?;

        info!("Print job sent");
        Ok(())
    }

    /// Check if the printer accepts connections
    #[instrument(skip(self), fields(addr = %self.addr()))]
    pub async fn is_online(&self) -> bool {
        match self.connect(Duration::from_millis(500)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}
