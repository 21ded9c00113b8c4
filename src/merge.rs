use std::collections::BTreeSet;

use anyhow::{ensure, Context, Result};
use walkdir::WalkDir;

use crate::{
    combine::{combine, Combine},
    record::ZoneRecord,
    scratch::{self, ScratchWorkspace},
};

/// A table of zone records, as produced per zone and after merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable(pub Vec<ZoneRecord>);

impl Combine for ZoneTable {
    fn combine_many(parts: Vec<Self>) -> Result<Self> {
        Ok(Self(parts.into_iter().flat_map(|t| t.0).collect()))
    }
}

/// Gathers the per-zone records left in a scratch workspace into one table.
pub struct ResultMerger;

impl ResultMerger {
    /// Collect the records of `zone_ids` under `scratch`, requiring one for every zone.
    /// Scopes of other zones are left alone. Records come back sorted by `zone_id`.
    pub fn collect(scratch: &ScratchWorkspace, zone_ids: &BTreeSet<u32>) -> Result<Vec<ZoneRecord>> {
        let mut tables = Vec::new();
        for entry in WalkDir::new(scratch.root()).min_depth(2).max_depth(2).sort_by_file_name() {
            let entry = entry.with_context(|| format!("[merge] Failed to walk {}", scratch.root().display()))?;
            if !entry.file_type().is_file() || !scratch::is_record_file(entry.path()) { continue }
            let wanted = entry.path().parent()
                .and_then(scratch::scope_zone_id)
                .is_some_and(|id| zone_ids.contains(&id));
            if !wanted { continue }

            let record = scratch::read_record(entry.path())
                .with_context(|| format!("[merge] Failed to read record {}", entry.path().display()))?;
            tables.push(ZoneTable(vec![record]));
        }

        Self::merge(tables, zone_ids.len())
    }

    /// Combine per-zone tables, checking the record count and zone uniqueness.
    pub fn merge(tables: Vec<ZoneTable>, expected: usize) -> Result<Vec<ZoneRecord>> {
        ensure!(!tables.is_empty(), "[merge] no zone records to merge");
        let ZoneTable(mut records) = combine(tables)?;

        let ids = records.iter().map(|r| r.zone_id).collect::<BTreeSet<_>>();
        ensure!(ids.len() == records.len(), "[merge] duplicate zone records");
        ensure!(records.len() == expected,
            "[merge] expected {expected} zone records, found {}", records.len());

        records.sort_by_key(|r| r.zone_id);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify::Scheme, record::{Outcome, ZoneStatistics}};

    fn record(zone_id: u32) -> ZoneRecord {
        ZoneRecord {
            zone_id,
            outcome: Outcome::Computed,
            statistics: ZoneStatistics::zeroed(Scheme::Capacity, 0.0),
        }
    }

    #[test]
    fn single_table_passes_through() {
        let merged = ResultMerger::merge(vec![ZoneTable(vec![record(1)])], 1).unwrap();
        assert_eq!(merged, vec![record(1)]);
    }

    #[test]
    fn tables_merge_sorted_by_zone() {
        let tables = vec![ZoneTable(vec![record(3)]), ZoneTable(vec![record(1)]), ZoneTable(vec![record(2)])];
        let merged = ResultMerger::merge(tables, 3).unwrap();
        assert_eq!(merged.iter().map(|r| r.zone_id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn count_and_duplicates_are_checked() {
        assert!(ResultMerger::merge(vec![ZoneTable(vec![record(1)])], 2).is_err());
        assert!(ResultMerger::merge(vec![ZoneTable(vec![record(1)]), ZoneTable(vec![record(1)])], 2).is_err());
        assert!(ResultMerger::merge(vec![], 0).is_err());
    }

    #[test]
    fn collects_records_from_scratch() {
        let scratch = ScratchWorkspace::new().unwrap();
        for id in [2, 1] {
            scratch.scope(id).unwrap().write_record(&record(id)).unwrap();
        }
        std::fs::write(scratch.scope(1).unwrap().dir().join("mosaic.tif"), b"").unwrap();

        let merged = ResultMerger::collect(&scratch, &BTreeSet::from([1, 2])).unwrap();
        assert_eq!(merged, vec![record(1), record(2)]);
    }

    #[test]
    fn collect_skips_zones_outside_the_run() {
        let scratch = ScratchWorkspace::new().unwrap();
        for id in [1, 2, 3] {
            scratch.scope(id).unwrap().write_record(&record(id)).unwrap();
        }
        std::fs::write(scratch.scope(3).unwrap().dir().join("record.json"), b"stale").unwrap();

        let merged = ResultMerger::collect(&scratch, &BTreeSet::from([1, 2])).unwrap();
        assert_eq!(merged, vec![record(1), record(2)]);
        assert!(ResultMerger::collect(&scratch, &BTreeSet::from([1, 2, 4])).is_err());
    }
}
