use super::load_molecule;
use crate::cli::AlignArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::report::{self, AlignmentDocument};
use stereoplane::engine::scene::{FixedViewer, Viewer};
use stereoplane::workflows;
use tracing::info;

pub async fn run(args: AlignArgs) -> Result<()> {
    let args = args.molecule;
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_config(&args, None)?;
    let molecule = load_molecule(&args)?;

    let viewer = app_config
        .viewer_forward
        .map(|forward| Box::new(FixedViewer::new(forward)) as Box<dyn Viewer>);

    info!("Invoking the core alignment workflow...");
    let alignment = tokio::task::block_in_place(|| {
        workflows::align::run(molecule, &app_config.alignment, viewer)
    })?;

    println!("{}", report::alignment_summary(&alignment));

    if let Some(path) = &args.output {
        report::write_report(path, &AlignmentDocument::from(&alignment))?;
        println!("✓ Report written to: {}", path.display());
    }
    Ok(())
}
