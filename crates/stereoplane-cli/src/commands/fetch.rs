use crate::cli::FetchArgs;
use crate::error::Result;
use crate::store::{FetchProgress, MoleculeStore, RecordType};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tracing::info;

pub async fn run(args: FetchArgs) -> Result<()> {
    let store = MoleculeStore::new()?;
    println!(
        "Fetching '{}' from PubChem into: {:?}",
        args.name,
        store.get_store_path()
    );

    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr_with_hz(2));
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(100));

    let progress_callback = |progress: FetchProgress| match progress {
        FetchProgress::Resolving => pb.set_message("Resolving compound name..."),
        FetchProgress::DownloadStarted { total_size } => {
            pb.disable_steady_tick();
            pb.set_position(0);
            match total_size {
                Some(size) => {
                    pb.set_length(size);
                    pb.set_style(bytes_style());
                }
                None => pb.set_style(spinner_style()),
            }
            pb.set_message("Downloading...");
        }
        FetchProgress::Downloading { downloaded } => pb.set_position(downloaded),
        FetchProgress::Validating => {
            pb.set_style(spinner_style());
            pb.set_message("Validating record...");
        }
    };

    match store
        .fetch(&args.name, args.force, args.two_d, progress_callback)
        .await
    {
        Ok(outcome) => {
            pb.finish_and_clear();
            info!(cid = outcome.cid, path = ?outcome.path, "Fetch complete.");
            let flavour = match outcome.record_type {
                RecordType::ThreeD => "3D conformer",
                RecordType::TwoD => "2D layout",
            };
            println!(
                "✓ Stored '{}' (CID {}, {}, {} atoms) at: {}",
                outcome.name,
                outcome.cid,
                flavour,
                outcome.atoms,
                outcome.path.display()
            );
            Ok(())
        }
        Err(e) => {
            pb.finish_with_message("✗ Fetch failed.");
            Err(e)
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}
