use anyhow::Result;
use log::info;
use nldas_county::{load_counties, prepare_weights};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::BuildWeightsArgs) -> Result<()> {
    let mut config = super::load_config(cli, &args.config)?;
    config.rebuild_weights |= args.rebuild;

    let counties = load_counties(&config)?;
    let source = super::open_source(&config)?;
    let weights = prepare_weights(&config, &counties, source.grid_axes()?)?;

    info!(
        "[build-weights] shape {} x {}, nnz {}, {} counties without coverage -> {}",
        weights.num_counties(), weights.num_cells(), weights.nnz(),
        weights.uncovered_count(), config.cache_dir().display()
    );

    Ok(())
}
