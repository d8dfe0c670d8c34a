pub mod align;
pub mod fetch;
pub mod spin;
pub mod store;

use crate::cli::MoleculeArgs;
use crate::error::{CliError, Result};
use crate::store::MoleculeStore;
use crate::utils::parser::{self, MoleculeRef};
use std::path::Path;
use std::sync::Arc;
use stereoplane::core::io::sdf::SdfFile;
use stereoplane::core::io::traits::MolecularFile;
use stereoplane::core::models::molecule::Molecule;
use stereoplane::engine::library::{LibraryError, MoleculeLibrary};
use tracing::info;

/// Loads the molecule named on the command line and centres it on its atom centroid.
///
/// The molecule's name (used to select a plane rule) is `--name` if given, otherwise
/// the file stem or the store name.
pub fn load_molecule(args: &MoleculeArgs) -> Result<Molecule> {
    let reference =
        parser::parse_molecule_ref(&args.molecule).map_err(|e| CliError::Argument(e.to_string()))?;

    let mut molecule = match reference {
        MoleculeRef::Path(path) => load_from_file(&path)?,
        MoleculeRef::Name(name) => {
            let store = MoleculeStore::new()?;
            load_from_store(&store, &name)?
        }
    };
    if let Some(name) = &args.name {
        molecule.name = name.clone();
    }
    molecule.center_at_origin();
    info!(
        name = %molecule.name,
        atoms = molecule.atoms().len(),
        bonds = molecule.bonds().len(),
        "Molecule ready."
    );
    Ok(molecule)
}

fn load_from_file(path: &Path) -> Result<Molecule> {
    info!("Loading molecule from {:?}", path);
    let (mut molecule, _) = SdfFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        molecule.name = stem.to_string();
    }
    Ok(molecule)
}

fn load_from_store(store: &MoleculeStore, name: &str) -> Result<Molecule> {
    let mut library = MoleculeLibrary::new();
    let molecule = library
        .load(name, &store.source())
        .map_err(|e| match e {
            LibraryError::NotFound(n) => CliError::Store(format!(
                "'{}' is not in the store at {:?}.\nHint: Run 'stereoplane fetch {}' to download it.",
                n,
                store.get_store_path(),
                n
            )),
            other => other.into(),
        })?;
    Ok(Arc::unwrap_or_clone(molecule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use stereoplane::core::models::topology::{BondOrder, BondStereo};
    use tempfile::tempdir;

    fn write_water(path: &Path) {
        let mut m = Molecule::new("962");
        let o = m.add_atom("O", Point3::new(1.0, 1.0, 1.0));
        let h1 = m.add_atom("H", Point3::new(1.96, 1.0, 1.0));
        let h2 = m.add_atom("H", Point3::new(0.76, 1.93, 1.0));
        m.add_bond(o, h1, BondOrder::Single, BondStereo::None).unwrap();
        m.add_bond(o, h2, BondOrder::Single, BondStereo::None).unwrap();
        SdfFile::write_molecule_to_path(&m, path).unwrap();
    }

    #[test]
    fn file_molecules_are_named_by_stem_and_centred() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.sdf");
        write_water(&path);

        let args = MoleculeArgs {
            molecule: path.to_string_lossy().into_owned(),
            ..MoleculeArgs::default()
        };
        let molecule = load_molecule(&args).unwrap();
        assert_eq!(molecule.name, "water");
        let centroid = molecule.centroid().unwrap();
        assert!(centroid.coords.norm() < 1e-9);
    }

    #[test]
    fn name_flag_overrides_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cid-962.sdf");
        write_water(&path);

        let args = MoleculeArgs {
            molecule: path.to_string_lossy().into_owned(),
            name: Some("Water".to_string()),
            ..MoleculeArgs::default()
        };
        assert_eq!(load_molecule(&args).unwrap().name, "Water");
    }

    #[test]
    fn store_lookup_reports_missing_molecules_with_a_hint() {
        let dir = tempdir().unwrap();
        let store = MoleculeStore::with_custom_path(dir.path().to_path_buf());
        match load_from_store(&store, "caffeine") {
            Err(CliError::Store(message)) => assert!(message.contains("stereoplane fetch caffeine")),
            other => panic!("unexpected result: {:?}", other.map(|m| m.name)),
        }

        write_water(&dir.path().join("water.sdf"));
        assert_eq!(load_from_store(&store, "Water").unwrap().name, "water");
    }

    #[test]
    fn unreadable_files_are_parsing_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.sdf");
        std::fs::write(&path, "not a molfile\n").unwrap();
        let args = MoleculeArgs {
            molecule: path.to_string_lossy().into_owned(),
            ..MoleculeArgs::default()
        };
        assert!(matches!(load_molecule(&args), Err(CliError::FileParsing { .. })));
    }
}
