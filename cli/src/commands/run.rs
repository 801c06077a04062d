use anyhow::Result;
use log::info;
use nldas_county::{load_counties, run_panel};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let mut config = super::load_config(cli, &args.config)?;
    config.rebuild_weights |= args.rebuild_weights;

    info!("[run] years {}-{}, output {}", config.start_year, config.end_year, config.output_dir.display());
    let counties = load_counties(&config)?;
    let source = super::open_source(&config)?;

    let summary = run_panel(&config, &counties, source.as_ref())?;
    info!(
        "[run] done: {} per-year files, combined panel {}",
        summary.year_files.len(), summary.panel_file.path.display()
    );

    Ok(())
}
