mod reports;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;

pub(crate) use reports::{
    ApplyReport, CaptureReports, CaptureStarted, CommitReport, DiffReport, DirectoryCheckpoints,
    DirectoryResults, SyncReport,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Something a command prints on success.
pub(crate) trait Report: Serialize {
    fn plain(&self) -> String;
}

pub(crate) fn render<R: Report>(format: OutputFormat, report: &R) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(report.plain()),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
    }
}

pub(crate) fn emit<R: Report>(format: OutputFormat, report: &R) -> Result<()> {
    print!("{}", render(format, report)?);
    Ok(())
}
