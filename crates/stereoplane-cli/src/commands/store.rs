use crate::cli::{StoreArgs, StoreCommands};
use crate::error::{CliError, Result};
use crate::store::MoleculeStore;
use std::path::PathBuf;
use tracing::info;

pub async fn run(args: StoreArgs) -> Result<()> {
    match args.command {
        StoreCommands::Path => handle_path(),
        StoreCommands::SetPath { path } => handle_set_path(path),
        StoreCommands::ResetPath => handle_reset_path(),
        StoreCommands::List => handle_list(),
    }
}

fn handle_path() -> Result<()> {
    let store = MoleculeStore::new()?;
    println!("{}", store.get_store_path().display());
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    if !path.is_absolute() {
        return Err(CliError::Argument(format!(
            "The store path must be absolute: {}",
            path.display()
        )));
    }
    MoleculeStore::set_custom_path(&path)?;
    info!(path = ?path, "Custom store path saved.");
    println!("✓ Molecule store path set to: {}", path.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    MoleculeStore::reset_path()?;
    let store = MoleculeStore::new()?;
    println!(
        "✓ Molecule store path reset to default: {}",
        store.get_store_path().display()
    );
    Ok(())
}

fn handle_list() -> Result<()> {
    let store = MoleculeStore::new()?;
    let names = store.list()?;
    if names.is_empty() {
        println!(
            "The store at {} is empty. Use 'stereoplane fetch <name>' to add molecules.",
            store.get_store_path().display()
        );
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
