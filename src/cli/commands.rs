use std::fs::File;
use std::io::{BufWriter, Write};

use tracing::{info, warn};

use crate::browser::driver::{UiDriver, ViewId};
use crate::browser::session::BrowserSession;
use crate::browser::synthetic::SyntheticApp;
use crate::cli::config::{
    AppConfig, OutputFormat, RunArgs, build_driver_config, build_explorer_config,
};
use crate::explorer::explorer::{CancelFlag, Explorer};
use crate::report::console::format_console_report;
use crate::report::jsonl::{to_json_pretty, write_jsonl};
use crate::report::report_model::Report;
use crate::trace::logger::TraceLogger;

// ============================================================================
// explore subcommand
// ============================================================================

pub fn cmd_explore(
    app_config: &AppConfig,
    url: Option<&str>,
    node: Option<&str>,
    script: Option<&str>,
    args: &RunArgs,
    cancel: &CancelFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    let driver_config = build_driver_config(&app_config.driver, url, node, script);
    let mut session = BrowserSession::launch_with(&driver_config.node, &driver_config.script)?;
    let start = session.initial_view().clone();

    if let Some(url) = driver_config.start_url.as_deref() {
        info!(url, "navigating to start url");
        session.navigate(&start, url)?;
    }

    let result = run_and_write(&mut session, &start, app_config, args, cancel);
    session.quit()?;
    result
}

// ============================================================================
// fixture subcommand
// ============================================================================

pub fn cmd_fixture(
    app_config: &AppConfig,
    fixture_path: &str,
    args: &RunArgs,
    cancel: &CancelFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = SyntheticApp::from_file(fixture_path)?;
    let start = app.initial_view();
    info!(fixture = fixture_path, "exploring synthetic app");
    run_and_write(&mut app, &start, app_config, args, cancel)
}

// ============================================================================
// Helpers
// ============================================================================

/// Run one exploration and write its report. A run that ends early still
/// writes what it found before the error is returned.
fn run_and_write(
    driver: &mut dyn UiDriver,
    start: &ViewId,
    app_config: &AppConfig,
    args: &RunArgs,
    cancel: &CancelFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_explorer_config(&app_config.explore, args);
    let tracer = match args.trace.as_deref() {
        Some(path) => Some(TraceLogger::create(path)?),
        None => None,
    };

    let mut explorer = Explorer::new(driver, &config).with_cancel(cancel.clone());
    if let Some(tracer) = tracer.as_ref() {
        explorer = explorer.with_trace(tracer);
    }

    match explorer.run(start) {
        Ok(report) => write_report(&report, args.format, args.output.as_deref()),
        Err(aborted) => {
            warn!(
                inputs = aborted.partial.total_inputs(),
                "writing partial report"
            );
            write_report(&aborted.partial, args.format, args.output.as_deref())?;
            Err(Box::new(aborted))
        }
    }
}

/// Render `report` in `format` to a file, or stdout when no path is given.
pub fn write_report(
    report: &Report,
    format: OutputFormat,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        OutputFormat::Jsonl => write_jsonl(report, &mut writer)?,
        OutputFormat::Json => {
            writeln!(writer, "{}", to_json_pretty(report)?)?;
        }
        OutputFormat::Console => write!(writer, "{}", format_console_report(report))?,
    }

    writer.flush()?;
    Ok(())
}
