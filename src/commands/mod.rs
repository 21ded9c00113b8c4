pub mod capacity;
pub mod habitat;

use std::path::Path;

use anyhow::{bail, Result};

use crate::aggregate::{process, RunOptions};
use crate::cli::Cli;
use crate::common;
use crate::output::{write_output, OutputFormat};
use crate::scratch::ScratchWorkspace;
use crate::source::ZoneSource;
use crate::zone::Zone;

/// Validate the output path before doing any work.
fn prepare(output: &Path, force: bool) -> Result<()> {
    if output == Path::new("-") { bail!("stdout is not supported."); }
    OutputFormat::from_path(output)?;
    common::prepare_output_file(output, force)
}

/// Measure all zones, release the scratch workspace and write the output.
fn run_zones(cli: &Cli, zones: &[Zone], source: &dyn ZoneSource, scratch: Option<&Path>, output: &Path) -> Result<()> {
    let options = RunOptions { verbose: cli.verbose, threads: cli.threads };
    let workspace = match scratch {
        Some(dir) => ScratchWorkspace::persistent(dir)?,
        None => ScratchWorkspace::new()?,
    };

    let report = process(zones, source, &workspace, &options);
    if let Some(warning) = workspace.close() {
        eprintln!("[warn] {warning}");
    }
    let report = report?;

    write_output(output, zones, &report.records)?;

    if cli.verbose > 0 {
        eprintln!("[done] {} zones ({} empty, {} failed) -> {}",
            report.records.len(), report.empty_zones.len(), report.failed_zones.len(), output.display());
    }
    if !report.failed_zones.is_empty() {
        eprintln!("[warn] zones that could not be measured: {:?}", report.failed_zones);
    }
    Ok(())
}
