//! Summarize a crash log export offline
//!
//! Reads an export file (Logs Insights results or a plain array of events),
//! normalizes it and prints every dashboard view as JSON.

use anyhow::Result;
use clap::Parser;
use crash_insights::record::CategoryField;
use crash_insights::service::Dataset;
use crash_insights::{DashboardViews, FilterSpec, ViewOptions};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "summarize-export",
    about = "Print every dashboard view of a crash log export as JSON"
)]
struct Args {
    /// Logs Insights export (results or plain array of events)
    path: PathBuf,

    /// Field the error breakdown groups by (errorMessage, errorType, gameName, gameId, platform, primaryBrowser)
    #[arg(long, default_value = "errorMessage")]
    error_field: CategoryField,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let dataset = Dataset::load(&args.path)?;

    info!(
        "{} of {} rows accepted from {}",
        dataset.report.accepted,
        dataset.report.rows_seen,
        args.path.display()
    );

    let spec = FilterSpec::all_time(&dataset.records);
    let views = DashboardViews::compute(
        &dataset.records,
        &spec,
        ViewOptions {
            error_field: args.error_field,
        },
    );

    let summary = serde_json::json!({
        "shape": dataset.shape,
        "report": dataset.report,
        "views": views,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_error_field_flag() {
        let args = Args::try_parse_from(["summarize-export", "export.json"]).unwrap();
        assert_eq!(args.path, PathBuf::from("export.json"));
        assert_eq!(args.error_field, CategoryField::ErrorMessage);

        let args =
            Args::try_parse_from(["summarize-export", "export.json", "--error-field", "type"]).unwrap();
        assert_eq!(args.error_field, CategoryField::ErrorType);

        assert!(Args::try_parse_from(["summarize-export", "export.json", "--error-field", "os"]).is_err());
        assert!(Args::try_parse_from(["summarize-export"]).is_err());
    }
}
