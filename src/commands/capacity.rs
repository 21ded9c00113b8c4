use anyhow::{Context, Result};

use crate::cli::{CapacityArgs, Cli};
use crate::combine::combine;
use crate::common;
use crate::commands::{prepare, run_zones};
use crate::error::ZoneError;
use crate::source::LineNetwork;
use crate::zone::read_zones;

pub fn run(cli: &Cli, args: &CapacityArgs) -> Result<()> {
    prepare(&args.output, args.force)?;
    common::require_file_exists(&args.zones)?;
    for network in &args.networks {
        common::require_file_exists(network)?;
    }

    if cli.verbose > 0 {
        eprintln!("[capacity] zones={} networks={} field={} -> {}",
            args.zones.display(), args.networks.len(), args.field, args.output.display());
    }

    let zones = read_zones(&args.zones)?;

    if args.networks.is_empty() {
        return Err(ZoneError::MalformedInput("no line networks supplied".into()).into());
    }
    let networks = args.networks.iter()
        .map(|path| LineNetwork::from_shapefile(path, &args.field))
        .collect::<Result<Vec<_>>>()?;
    let network = combine(networks).context("[capacity] Failed to merge line networks")?;

    if cli.verbose > 0 {
        eprintln!("[capacity] {} zones, {} line features", zones.len(), network.len());
    }

    run_zones(cli, &zones, &network, args.scratch.as_deref(), &args.output)
}
