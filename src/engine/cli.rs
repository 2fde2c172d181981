//! CLI command handler: layer settings, validate the job, run it and print a summary.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use log::{info, warn};
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::cancel::CancellationSignal;
use crate::pipeline::list_failures;
use crate::utils::imgbatch_toml::{ImgbatchToml, apply_file_to_opts, load_imgbatch_toml};
use crate::utils::setup_logging;
use crate::{Job, JobReport, RunOpts, run_job};

/// Defaults, then `.imgbatch.toml` from the source dir, then CLI flags.
pub fn setup_opts(cli: &Cli, file: Option<&ImgbatchToml>) -> RunOpts {
    let mut opts = RunOpts::default();
    if let Some(file) = file {
        apply_file_to_opts(file, &mut opts);
    }
    if cli.workers.is_some() {
        opts.workers = cli.workers;
    }
    if let Some(secs) = cli.timeout {
        opts.shutdown_timeout = Duration::from_secs(secs);
    }
    if let Some(fmt) = cli.default_format {
        opts.default_format = fmt;
    }
    opts.follow_links = cli.follow_links.unwrap_or(opts.follow_links);
    opts.skip_unreadable = cli.skip_unreadable.unwrap_or(opts.skip_unreadable);
    opts.atomic_write = cli.atomic.unwrap_or(opts.atomic_write);
    opts.esc_cancel = cli.esc_cancel.unwrap_or(opts.esc_cancel);
    opts.verbose = cli.verbose.unwrap_or(opts.verbose);
    opts
}

/// Run the selected operation over the source directory.
/// Errors (and a non-zero exit) only for bad configuration or a failed directory walk.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let file = load_imgbatch_toml(&cli.source_dir);
    let settings = file.as_ref().ok().and_then(Option::as_ref);
    setup_logging(
        cli.verbose
            .or_else(|| settings.and_then(ImgbatchToml::verbose))
            .unwrap_or(false),
    );
    let opts = setup_opts(cli, settings);
    if let Err(msg) = &file {
        warn!("{}; ignoring settings file", msg);
    }

    let recurse = cli
        .sub
        .or_else(|| settings.and_then(ImgbatchToml::recurse))
        .unwrap_or(false);
    let job = Job::new(&cli.source_dir, recurse, cli.operation())?;

    let signal = CancellationSignal::new();
    signal.install_ctrlc()?;
    if opts.esc_cancel {
        signal.spawn_esc_monitor();
        info!("Type ESC then Enter to cancel");
    }

    let report = run_job(&job, &opts, &signal)?;
    print_summary(&report);
    if opts.verbose && report.failed() > 0 {
        list_failures(&report, job.source_root());
    }
    Ok(())
}

/// Colours for the run summary.
struct Colors;

impl Colors {
    const DONE: &'static str = "green";
    const FAILED: &'static str = "red";
    const SKIPPED: &'static str = "yellow";

    fn colorize(color: &str, text: &str) -> ColoredString {
        text.color(color)
    }
}

/// Print the run summary: done | failed | cancelled/not run.
fn print_summary(report: &JobReport) {
    let done = report.succeeded();
    let failed = report.failed();
    let skipped = report.cancelled() + report.not_run;

    if report.was_cancelled() {
        println!(
            "{} ({} files processed)",
            "Operation cancelled by user".yellow(),
            done + failed
        );
    }
    println!(
        "{} | {} | {}",
        Colors::colorize(Colors::DONE, &format!("Done: {}", done)),
        Colors::colorize(Colors::FAILED, &format!("{} files failed", failed)),
        Colors::colorize(Colors::SKIPPED, &format!("Not run: {}", skipped))
    );
    if !report.clean_drain {
        warn!("Shutdown timed out; some files may still have been in progress");
    }
}
