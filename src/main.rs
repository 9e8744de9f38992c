//! # posprint CLI
//!
//! Command-line front end for the receipt printing core.
//!
//! ## Usage
//!
//! ```bash
//! # Print the sample receipt through a profile
//! posprint print --profile printer.json
//!
//! # Print a receipt file, logging failures instead of returning them
//! posprint print --profile printer.json --receipt sale.json --silent
//!
//! # Run a printer test
//! posprint test formatting --profile printer.json
//!
//! # Show the laid-out receipt without printing
//! posprint preview --profile printer.json --paper 58mm
//!
//! # Run the network print relay
//! posprint relay --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use posprint::{
    Hosts, PrintError, PrintMode, PrintService, PrinterProfile, ReceiptDocument, TestHarness,
    TestKind,
    printer::{PaperWidth, SettingsOverride},
    protocol::text::{Alignment, FontSize},
    receipt::{render_html, render_lines},
    server::{self, ServerConfig},
    transport::{HttpRelay, RfcommHost, SpoolPrintSurface},
};

/// posprint - receipt printing for point-of-sale terminals
#[derive(Parser, Debug)]
#[command(name = "posprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a receipt through the profile's transport
    Print {
        #[command(flatten)]
        target: Target,

        /// Receipt JSON file (defaults to the sample receipt)
        #[arg(long, value_name = "FILE")]
        receipt: Option<PathBuf>,

        /// Log failures instead of exiting with an error
        #[arg(long)]
        silent: bool,

        /// Mark the receipt as a reprint
        #[arg(long)]
        reprint: bool,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Run a printer test: connection, formatting or receipt
    Test {
        /// Test to run
        kind: TestKind,

        #[command(flatten)]
        target: Target,
    },

    /// Show a receipt as printer text or HTML without printing
    Preview {
        /// Printer profile JSON file
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,

        /// Receipt JSON file (defaults to the sample receipt)
        #[arg(long, value_name = "FILE")]
        receipt: Option<PathBuf>,

        /// Emit the local print markup instead of text lines
        #[arg(long)]
        html: bool,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Run the network print relay
    Relay {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Printer connect timeout in seconds
        #[arg(long, default_value = "5")]
        printer_timeout: u64,
    },
}

/// Profile and host capabilities for a print job
#[derive(Args, Debug)]
struct Target {
    /// Printer profile JSON file
    #[arg(long, value_name = "FILE")]
    profile: PathBuf,

    /// Print relay base URL (enables the network transport)
    #[arg(long, value_name = "URL")]
    relay_url: Option<String>,

    /// Local print command; the spool file path is appended
    #[arg(long, default_value = "lp")]
    print_command: String,

    /// Bluetooth serial device path or MAC address
    #[arg(long)]
    device: Option<String>,
}

/// Per-call settings overrides
#[derive(Args, Debug)]
struct OverrideArgs {
    /// Paper width (58mm, 80mm, 112mm)
    #[arg(long)]
    paper: Option<PaperWidth>,

    /// Characters per line
    #[arg(long)]
    chars_per_line: Option<usize>,

    /// Body font size (small, normal, large)
    #[arg(long)]
    font: Option<FontSize>,

    /// Skip the paper cut
    #[arg(long)]
    no_cut: bool,

    /// Kick the cash drawer
    #[arg(long)]
    drawer: bool,
}

impl OverrideArgs {
    fn to_override(&self) -> Option<SettingsOverride> {
        let o = SettingsOverride {
            paper_width: self.paper,
            characters_per_line: self.chars_per_line,
            font_size: self.font,
            auto_cut: self.no_cut.then_some(false),
            open_drawer: self.drawer.then_some(true),
            ..Default::default()
        };
        (!o.is_empty()).then_some(o)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PrintError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posprint=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Print {
            target,
            receipt,
            silent,
            reprint,
            overrides,
        } => runtime.block_on(async {
            let service = build_service(&target)?;
            let mut document = load_receipt(receipt.as_ref())?;
            if reprint {
                document = document.as_reprint(Local::now().fixed_offset());
            }
            let mode = if silent {
                PrintMode::Silent
            } else {
                PrintMode::Interactive
            };

            let report = service
                .print(&document, overrides.to_override().as_ref(), mode)
                .await?;
            println!("{} via {} ({} attempts)", report.outcome, report.transport, report.attempts);
            if let Some(error) = report.error {
                println!("  {}", error);
            }
            Ok(())
        }),

        Commands::Test { kind, target } => runtime.block_on(async {
            let service = build_service(&target)?;
            let result = TestHarness::new(&service).run(kind).await;

            let status = match (result.success, result.simulated) {
                (true, true) => "SIMULATED",
                (true, false) => "OK",
                (false, _) => "FAILED",
            };
            println!("[{}] {} test: {}", status, kind, result.message);
            if let Some(details) = &result.details {
                println!("{}", details);
            }
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }),

        Commands::Preview {
            profile,
            receipt,
            html,
            overrides,
        } => {
            let profile = PrinterProfile::from_json_file(&profile)?;
            let document = load_receipt(receipt.as_ref())?;
            let settings = profile.effective_settings(overrides.to_override().as_ref());
            settings.validate()?;
            let common = settings.common();

            if html {
                println!("{}", render_html(&document, common, false));
            } else {
                let width = common.characters_per_line();
                println!("+{}+", "-".repeat(width));
                for line in render_lines(&document, common) {
                    let text = line.text;
                    match line.style.align {
                        Alignment::Left => println!("|{:<width$}|", text),
                        Alignment::Center => println!("|{:^width$}|", text),
                        Alignment::Right => println!("|{:>width$}|", text),
                    }
                }
                println!("+{}+", "-".repeat(width));
            }
            Ok(())
        }

        Commands::Relay {
            listen,
            printer_timeout,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                printer_timeout: Duration::from_secs(printer_timeout),
            };
            runtime.block_on(server::serve(config))
        }
    }
}

fn build_service(target: &Target) -> Result<PrintService, PrintError> {
    let profile = PrinterProfile::from_json_file(&target.profile)?;

    let mut hosts = Hosts::new()
        .with_device(RfcommHost::new(target.device.clone()))
        .with_surface(SpoolPrintSurface::new(&target.print_command)?);
    if let Some(url) = &target.relay_url {
        hosts = hosts.with_relay(HttpRelay::new(url)?);
    }

    PrintService::new(profile, hosts)
}

fn load_receipt(path: Option<&PathBuf>) -> Result<ReceiptDocument, PrintError> {
    match path {
        Some(path) => ReceiptDocument::from_json_file(path),
        None => Ok(ReceiptDocument::sample(Local::now().fixed_offset())),
    }
}
