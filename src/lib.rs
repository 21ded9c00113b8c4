#![doc = "Zonal statistics of beaver dam capacity and beaver habitat index data"]
mod aggregate;
mod classify;
mod combine;
mod common;
mod error;
mod merge;
mod output;
mod raster;
mod record;
mod scratch;
mod source;
mod stats;
mod tiles;
mod values;
mod zone;

pub mod cli;
pub mod commands;

#[doc(inline)]
pub use aggregate::{measure_zone, process, summarize, RunOptions, RunReport, ZoneState};

#[doc(inline)]
pub use classify::{Bin, BinShare, ClassBreakdown, Classifier, CrossTab, Scheme};

#[doc(inline)]
pub use combine::{combine, Combine};

#[doc(inline)]
pub use common::round2;

#[doc(inline)]
pub use error::ZoneError;

#[doc(inline)]
pub use merge::{ResultMerger, ZoneTable};

#[doc(inline)]
pub use output::{records_to_dataframe, records_to_geojson, write_csv, write_geojson, write_output, OutputFormat};

#[doc(inline)]
pub use raster::{clip, cross_tabulate, describe, mask, mosaic, rasterize, read_geotiff, write_geotiff, Raster};

#[doc(inline)]
pub use record::{Outcome, ZoneRecord, ZoneStatistics};

#[doc(inline)]
pub use scratch::{ScratchWorkspace, ZoneScope};

#[doc(inline)]
pub use source::{Coverage, HabitatSource, LineFeature, LineNetwork, ZoneData, ZoneSource};

#[doc(inline)]
pub use stats::WeightedStatistics;

#[doc(inline)]
pub use tiles::{assemble, bng_square_name, DiskStore, MemStore, RasterStore, TileCatalog, TileGrid, TileResolver, TileSelection};

#[doc(inline)]
pub use values::{ValueArray, ValueSample};

#[doc(inline)]
pub use zone::{assign_sequential_zone_ids, read_zones, AttributeValue, Zone};
