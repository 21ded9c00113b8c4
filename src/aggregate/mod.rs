//! Drives every zone through measurement and gathers the results.

mod zone_state;

pub use zone_state::{measure_zone, summarize, ZoneState};

use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::{
    common,
    error::ZoneError,
    merge::ResultMerger,
    record::{Outcome, ZoneRecord},
    scratch::ScratchWorkspace,
    source::ZoneSource,
    zone::Zone,
};

/// Settings for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 0 = quiet, 1 = progress, 2+ = per-zone detail.
    pub verbose: u8,
    /// Worker threads; `None` uses rayon's default.
    pub threads: Option<usize>,
}

/// Outcome of a run: one record per input zone plus what went wrong where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Sorted by `zone_id`.
    pub records: Vec<ZoneRecord>,
    /// Zones measured with no data.
    pub empty_zones: Vec<u32>,
    /// Zones that could not be measured and were zero-filled.
    pub failed_zones: Vec<u32>,
    pub warnings: Vec<String>,
}

/// Measure every zone against `source`, one isolated record per zone in `scratch`.
///
/// Fails up front on malformed input; after that no single zone can abort the run.
/// A persistent workspace left by a run over the same zones and source keeps its
/// records; zones that failed there, or whose record is unreadable, are measured again.
pub fn process(
    zones: &[Zone],
    source: &dyn ZoneSource,
    scratch: &ScratchWorkspace,
    options: &RunOptions,
) -> Result<RunReport> {
    let zone_ids = validate_zones(zones)?;

    let fingerprint = run_fingerprint(zones, source)?;
    if scratch.claim(&fingerprint).context("[aggregate] Failed to claim scratch workspace")? && options.verbose > 0 {
        eprintln!("[aggregate] resuming from {}", scratch.root().display());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0))
        .build()
        .context("[aggregate] Failed to build worker pool")?;

    if options.verbose > 0 {
        eprintln!("[aggregate] measuring {} zones ({}) on {} threads",
            zones.len(), source.scheme(), pool.current_num_threads());
    }

    let done = AtomicUsize::new(0);
    let scratch_errors = pool.install(|| {
        zones.par_iter()
            .filter_map(|zone| {
                let result = write_zone(zone, source, scratch, options.verbose);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if options.verbose > 1 {
                    eprintln!("[aggregate] finished zone {} ({n}/{})", zone.zone_id(), zones.len());
                }
                result.err()
            })
            .collect::<Vec<_>>()
    });

    // A record that could not be persisted is fatal for the merge, so surface it now.
    if let Some(err) = scratch_errors.into_iter().next() {
        return Err(err).context("[aggregate] Failed to persist zone record");
    }

    let records = ResultMerger::collect(scratch, &zone_ids)?;
    Ok(report(records))
}

/// Zones must be non-empty with unique identifiers. Returns the identifiers.
fn validate_zones(zones: &[Zone]) -> Result<BTreeSet<u32>, ZoneError> {
    if zones.is_empty() {
        return Err(ZoneError::MalformedInput("no zones supplied".into()));
    }
    let ids = zones.iter().map(Zone::zone_id).collect::<BTreeSet<_>>();
    if ids.len() != zones.len() {
        return Err(ZoneError::MalformedInput("zone identifiers are not unique".into()));
    }
    Ok(ids)
}

/// Digest of everything a zone record depends on: scheme, source data, zone ids and footprints.
fn run_fingerprint(zones: &[Zone], source: &dyn ZoneSource) -> Result<String> {
    let mut fed = Ok(());
    let fingerprint = common::sha256_hex(|hasher| {
        common::digest_str(hasher, &source.scheme().to_string());
        fed = source.fingerprint(hasher);
        for zone in zones {
            common::digest_str(hasher, &zone.zone_id().to_string());
            common::digest_coords(hasher, zone.footprint());
        }
    });
    fed.context("[aggregate] Failed to fingerprint source")?;
    Ok(fingerprint)
}

/// Measure one zone (unless an earlier run already did) and persist its record.
fn write_zone(zone: &Zone, source: &dyn ZoneSource, scratch: &ScratchWorkspace, verbose: u8) -> Result<(), ZoneError> {
    let scope = scratch.scope(zone.zone_id())?;
    match scope.read_record() {
        Ok(Some(record)) if !record.is_failed() && record.statistics.scheme() == source.scheme() => {
            if verbose > 1 {
                eprintln!("[aggregate] zone {} already measured - reusing record", zone.zone_id());
            }
            return Ok(())
        }
        Err(err) if verbose > 0 => eprintln!("[aggregate] {err}; measuring again"),
        _ => {}
    }

    let record = measure_zone(zone, source);
    if let Some(warning) = warning(&record) {
        eprintln!("{warning}");
    }
    scope.write_record(&record)
}

fn warning(record: &ZoneRecord) -> Option<String> {
    match &record.outcome {
        Outcome::Computed | Outcome::Empty { reason: None } => None,
        Outcome::Empty { reason: Some(reason) } => Some(format!("[warn] {reason}; statistics set to 0")),
        Outcome::Failed { message } => Some(format!("[warn] {message}; statistics set to 0")),
    }
}

fn report(records: Vec<ZoneRecord>) -> RunReport {
    let empty_zones = records.iter().filter(|r| r.is_empty()).map(|r| r.zone_id).collect();
    let failed_zones = records.iter().filter(|r| r.is_failed()).map(|r| r.zone_id).collect();
    let warnings = records.iter().filter_map(warning).collect();
    RunReport { records, empty_zones, failed_zones, warnings }
}
