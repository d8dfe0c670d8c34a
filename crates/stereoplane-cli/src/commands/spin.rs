use super::load_molecule;
use crate::cli::SpinArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::report::{self, SpinDocument};
use crate::utils::progress::CliProgressHandler;
use stereoplane::engine::progress::ProgressReporter;
use stereoplane::workflows;
use tracing::info;

pub async fn run(args: SpinArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_config(&args.molecule, Some(&args))?;
    let molecule = load_molecule(&args.molecule)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Spinning '{}' for {:.1} s at {:.1}°/s...",
        molecule.name, app_config.spin.duration, app_config.alignment.rotation.speed_deg_per_sec
    );
    info!("Invoking the core spin workflow...");
    let result = tokio::task::block_in_place(|| {
        workflows::spin::run(
            molecule,
            &app_config.alignment,
            &app_config.spin,
            &reporter,
        )
    });
    progress_handler.clear();
    let spin = result?;

    info!(
        ticks = spin.ticks,
        rerenders = spin.bond_rerenders,
        flips = spin.label_flips(),
        "Spin finished."
    );
    println!("{}", report::spin_timeline(&spin));

    if let Some(path) = &args.molecule.output {
        report::write_report(path, &SpinDocument::from(&spin))?;
        println!("✓ Report written to: {}", path.display());
    }
    Ok(())
}
