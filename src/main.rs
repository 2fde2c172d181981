//! imgbatch CLI: apply one transform to every image in a directory; Ctrl+C cancels.

use anyhow::Result;
use clap::Parser;
use imgbatch::engine::arg_parser::Cli;
use imgbatch::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
