//! Local print surface: writes the markup to a spool file and hands it to
//! the system print command (`lp` by default).

use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::PrintSurface;
use crate::error::{PrintError, PrintResult};

pub const DEFAULT_PRINT_COMMAND: &str = "lp";

#[derive(Debug, Clone)]
pub struct SpoolPrintSurface {
    program: String,
    args: Vec<String>,
    spool_dir: PathBuf,
}

impl SpoolPrintSurface {
    /// `command` is a program followed by its arguments; the spool file
    /// path is appended as the last argument.
    pub fn new(command: &str) -> PrintResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PrintError::InvalidConfig("print command is empty".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            spool_dir: env::temp_dir(),
        })
    }

    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = dir.into();
        self
    }

    fn program_exists(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }
        env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

impl Default for SpoolPrintSurface {
    fn default() -> Self {
        Self {
            program: DEFAULT_PRINT_COMMAND.to_string(),
            args: Vec::new(),
            spool_dir: env::temp_dir(),
        }
    }
}

#[async_trait]
impl PrintSurface for SpoolPrintSurface {
    fn is_available(&self) -> bool {
        self.program_exists()
    }

    #[instrument(skip(self, html), fields(program = %self.program, bytes = html.len()))]
    async fn print_markup(&self, title: &str, html: &str) -> PrintResult<()> {
        if !self.program_exists() {
            return Err(PrintError::HostPrintUnavailable(format!(
                "print command not found: {}",
                self.program
            )));
        }

        let path = self
            .spool_dir
            .join(format!("posprint-{}.html", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, html).await.map_err(|e| {
            PrintError::HostPrintUnavailable(format!("cannot spool {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), title, "markup spooled");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .output()
            .await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "spool file not removed");
        }

        let output = output.map_err(|e| {
            PrintError::HostPrintUnavailable(format!("failed to run {}: {}", self.program, e))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::HostPrintUnavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        let surface = SpoolPrintSurface::new("lp -d receipts").unwrap();
        assert_eq!(surface.program, "lp");
        assert_eq!(surface.args, vec!["-d", "receipts"]);
        assert!(SpoolPrintSurface::new("   ").is_err());
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let surface = SpoolPrintSurface::new("/nonexistent/posprint-lp").unwrap();
        assert!(!surface.is_available());
        let err = surface.print_markup("t", "<p>x</p>").await.unwrap_err();
        assert!(matches!(err, PrintError::HostPrintUnavailable(_)));
    }

    #[tokio::test]
    async fn test_runs_command_with_spool_file() {
        // `true` ignores its arguments and exits 0
        let surface = SpoolPrintSurface::new("true").unwrap();
        if !surface.is_available() {
            return;
        }
        surface.print_markup("Receipt", "<p>ok</p>").await.unwrap();
    }
}
