use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Zonal statistics of beaver dam capacity and beaver habitat index data
#[derive(Parser, Debug)]
#[command(name = "beaver-zones", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Number of worker threads (defaults to one per core)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize dam capacity (BDC) of river networks per zone
    Capacity(CapacityArgs),

    /// Summarize beaver habitat index (BHI) rasters per zone
    Habitat(HabitatArgs),
}

#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Zone polygons (.shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub zones: PathBuf,

    /// Output file (.csv, .geojson or .json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// River network polylines (.shp); repeat to merge several networks
    #[arg(long = "network", required = true, value_hint = ValueHint::FilePath)]
    pub networks: Vec<PathBuf>,

    /// Numeric field holding the dam capacity value
    #[arg(long, default_value = "BDC")]
    pub field: String,

    /// Keep per-zone records in this directory (reused by a rerun) instead of a temp dir
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub scratch: Option<PathBuf>,

    /// Overwrite if the output exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct HabitatArgs {
    /// Zone polygons (.shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub zones: PathBuf,

    /// Output file (.csv, .geojson or .json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Directory of habitat index GeoTIFF tiles, named by tile prefix (e.g. SU_bhi.tif)
    #[arg(long, value_hint = ValueHint::DirPath, required_unless_present = "raster", conflicts_with = "raster")]
    pub tiles: Option<PathBuf>,

    /// Tile grid polygons (.shp); defaults to the British National Grid 100 km squares
    #[arg(long, requires = "tiles", value_hint = ValueHint::FilePath)]
    pub grid: Option<PathBuf>,

    /// Tile name field of the grid shapefile
    #[arg(long, default_value = "TILE_NAME")]
    pub grid_field: String,

    /// Number of leading file name characters that name a raster's tile
    #[arg(long, default_value_t = 2)]
    pub prefix_len: usize,

    /// A single habitat index GeoTIFF covering every zone
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub raster: Option<PathBuf>,

    /// Keep per-zone records in this directory (reused by a rerun) instead of a temp dir
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub scratch: Option<PathBuf>,

    /// Overwrite if the output exists
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn capacity_accepts_several_networks() {
        let cli = Cli::try_parse_from([
            "beaver-zones", "-vv", "capacity", "zones.shp", "out.csv",
            "--network", "a.shp", "--network", "b.shp",
        ]).unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Capacity(args) = cli.command else { panic!("expected capacity") };
        assert_eq!(args.networks.len(), 2);
        assert_eq!(args.field, "BDC");
    }

    #[test]
    fn habitat_needs_exactly_one_raster_source() {
        assert!(Cli::try_parse_from(["beaver-zones", "habitat", "z.shp", "o.csv"]).is_err());
        assert!(Cli::try_parse_from(["beaver-zones", "habitat", "z.shp", "o.csv", "--tiles", "t", "--raster", "r.tif"]).is_err());
        let cli = Cli::try_parse_from(["beaver-zones", "habitat", "z.shp", "o.csv", "--raster", "r.tif", "--threads", "4"]).unwrap();
        assert_eq!(cli.threads, Some(4));
    }
}
