//! FILENAME: app/src/lib.rs
// PURPOSE: Report application library: session orchestration and CLI entry.
// CONTEXT: The session drives the core crates (facts, pivot, export) and talks
// to the backend only through `report_client::ReportApi`.

pub mod logging;

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod loader;
pub mod session;

pub use config::AppConfig;
pub use error::AppError;
pub use events::{EventBus, Notification, NotificationLevel, SessionEvent, SubscriptionId};
pub use filters::FilterSpec;
pub use loader::LoadedFacts;
pub use session::{LoadOutcome, LoadTicket, ReportSession, SwitchDecision, SwitchOutcome};

use clap::Parser;
use std::process::ExitCode;

/// Parses the command line and runs one report.
pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: cannot start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
