//! FILENAME: app/src/cli.rs
//! Command line front end: load, pivot, print, optionally export.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::NotificationLevel;
use crate::logging;
use crate::session::{ReportSession, SwitchDecision, SwitchOutcome};
use crate::{log_info, log_warn};
use chrono::NaiveDate;
use clap::Parser;
use fact_model::FactSchema;
use pivot_engine::MeasureUnit;
use report_client::{HttpReportApi, LabelId, ReportApi};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "planin-report",
    version,
    about = "Productivity report: pivot backend facts and export them"
)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First day to include (YYYY-MM-DD).
    #[arg(long, value_name = "DAY")]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD).
    #[arg(long, value_name = "DAY")]
    pub to: Option<NaiveDate>,

    /// Restrict to a label id. Repeatable; none means every label.
    #[arg(long = "label", value_name = "ID")]
    pub labels: Vec<i64>,

    /// Row fields, comma separated, outermost first.
    #[arg(long, value_delimiter = ',')]
    pub rows: Option<Vec<String>>,

    /// Column fields, comma separated, outermost first.
    #[arg(long, value_delimiter = ',')]
    pub cols: Option<Vec<String>>,

    /// minutes or hours.
    #[arg(long)]
    pub unit: Option<MeasureUnit>,

    /// Start from the saved view with this name.
    #[arg(long, value_name = "NAME")]
    pub view: Option<String>,

    /// Export to a spreadsheet, into DIR or the configured directory.
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Echo log lines to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn has_server_filter(&self) -> bool {
        self.from.is_some() || self.to.is_some() || !self.labels.is_empty()
    }
}

pub async fn execute(cli: Cli) -> Result<(), AppError> {
    logging::set_console_echo(cli.verbose);
    let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    logging::install_log_bridge(level);

    let config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &config.log_file {
        logging::init_log_file(path).map_err(AppError::Config)?;
    }
    log_info!("CLI", "backend {}", config.api.base_url);

    let api = HttpReportApi::new(config.api.clone())?;
    let unit = cli.unit.unwrap_or(config.default_unit);
    let mut session = ReportSession::with_schema(api, FactSchema::productivity(), unit);

    let result = drive(&mut session, &cli, &config).await;
    for notification in session.take_notifications() {
        if notification.level != NotificationLevel::Success {
            eprintln!("{:?}: {}", notification.level, notification.message);
        }
    }
    if config.log_file.is_some() {
        if let Err(e) = logging::sort_log_file() {
            eprintln!("[LOG_ERROR] {}", e);
        }
    }
    result
}

async fn drive<A: ReportApi>(session: &mut ReportSession<A>, cli: &Cli, config: &AppConfig) -> Result<(), AppError> {
    session.mount().await?;

    if let Some(name) = &cli.view {
        let id = session
            .views()
            .iter()
            .find(|v| v.name == *name)
            .map(|v| v.id)
            .ok_or_else(|| AppError::NotFound(format!("view {:?}", name)))?;
        if let SwitchOutcome::DecisionRequired { .. } = session.click_view(id)? {
            session.resolve_switch(SwitchDecision::Discard).await?;
        }
    }

    if cli.has_server_filter() {
        if !cli.labels.is_empty() {
            session.set_label_filter(cli.labels.iter().map(|id| LabelId(*id)));
        }
        session.set_date_range(cli.from, cli.to)?;
        session.search().await?;
    }

    if cli.rows.is_some() || cli.cols.is_some() {
        let rows = cli
            .rows
            .clone()
            .unwrap_or_else(|| session.arrangement().row_fields.clone());
        let cols = cli
            .cols
            .clone()
            .unwrap_or_else(|| session.arrangement().col_fields.clone());
        session.rearrange(rows, cols)?;
    }
    if session.is_dirty() {
        log_warn!("CLI", "layout differs from view {:?}", session.selected_view().name);
    }

    let view = session.view()?;
    println!("{}", view.to_text());

    if let Some(target) = &cli.export {
        let dir = target.clone().unwrap_or_else(|| config.export_dir.clone());
        let path = session.export(&dir, &config.file_name_base)?;
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "planin-report",
            "--from",
            "2024-05-01",
            "--to",
            "2024-05-31",
            "--label",
            "3",
            "--label",
            "7",
            "--rows",
            "User,Client",
            "--unit",
            "hours",
            "--export",
        ])
        .unwrap();

        assert_eq!(cli.from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(cli.labels, vec![3, 7]);
        assert_eq!(cli.rows, Some(vec!["User".to_string(), "Client".to_string()]));
        assert_eq!(cli.cols, None);
        assert_eq!(cli.unit, Some(MeasureUnit::Hours));
        assert_eq!(cli.export, Some(None));
        assert!(cli.has_server_filter());
    }

    #[test]
    fn test_export_with_directory() {
        let cli = Cli::try_parse_from(["planin-report", "--export", "out"]).unwrap();
        assert_eq!(cli.export, Some(Some(PathBuf::from("out"))));
        assert!(!cli.has_server_filter());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["planin-report", "--from", "05/01/2024"]).is_err());
        assert!(Cli::try_parse_from(["planin-report", "--unit", "days"]).is_err());
    }
}
