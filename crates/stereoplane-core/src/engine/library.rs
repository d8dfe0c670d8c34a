//! # Molecule Library
//!
//! Name-keyed access to molecules with a cache, a short most-recently-used list and a
//! single-flight load gate.
//!
//! Loading is split so that callers with their own runtime can do the slow part
//! (download, disk read) elsewhere:
//!
//! 1. [`MoleculeLibrary::try_begin_load`] hands out a [`LoadTicket`], or refuses with
//!    [`LibraryError::LoadInProgress`] while another ticket is outstanding.
//! 2. The caller obtains the molecule however it likes.
//! 3. [`MoleculeLibrary::finish_load`] (or [`MoleculeLibrary::abandon_load`]) returns the
//!    ticket and releases the gate.
//!
//! [`MoleculeLibrary::load`] performs all three steps synchronously against a
//! [`MoleculeSource`].

use crate::core::io::sdf::{SdfError, SdfFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::molecule::Molecule;
use crate::engine::rules::normalize_name;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Length of the recently-used list.
pub const MAX_RECENT: usize = 6;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Another molecule load is already in progress")]
    LoadInProgress,

    #[error("Molecule name is empty")]
    EmptyName,

    #[error("Molecule '{0}' was not found")]
    NotFound(String),

    #[error("Failed to read molecule '{name}' from {path}: {source}")]
    File {
        name: String,
        path: PathBuf,
        #[source]
        source: SdfError,
    },

    #[error("Molecule source failed for '{name}': {message}")]
    Source { name: String, message: String },
}

/// Anything that can produce a molecule for a normalized name.
pub trait MoleculeSource {
    fn fetch(&self, name: &str) -> Result<Molecule, LibraryError>;
}

/// Reads `<root>/<name>.sdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.sdf", name))
    }

    /// Names of every `.sdf` file directly under the root, sorted.
    pub fn list(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.is_dir() {
            return Ok(names);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sdf") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl MoleculeSource for DirectorySource {
    fn fetch(&self, name: &str) -> Result<Molecule, LibraryError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        let (mut molecule, _) =
            SdfFile::read_from_path(&path).map_err(|source| LibraryError::File {
                name: name.to_string(),
                path: path.clone(),
                source,
            })?;
        // The store is keyed by the requested name, which also selects plane rules.
        molecule.name = name.to_string();
        Ok(molecule)
    }
}

/// Proof that the holder owns the load gate for `name`.
#[derive(Debug)]
#[must_use = "a load ticket must be finished or abandoned to release the gate"]
pub struct LoadTicket {
    name: String,
}

impl LoadTicket {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default)]
pub struct MoleculeLibrary {
    cache: HashMap<String, Arc<Molecule>>,
    recent: VecDeque<String>,
    loading: AtomicBool,
}

impl MoleculeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the load gate for `name`.
    ///
    /// # Errors
    ///
    /// [`LibraryError::EmptyName`] for a blank name, [`LibraryError::LoadInProgress`]
    /// while another ticket is outstanding. A refused request is dropped, not queued.
    pub fn try_begin_load(&self, name: &str) -> Result<LoadTicket, LibraryError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(name = %name, "Load request dropped; another load is in progress.");
            return Err(LibraryError::LoadInProgress);
        }
        debug!(name = %name, "Load gate acquired.");
        Ok(LoadTicket { name })
    }

    /// Stores the loaded molecule, marks it most recent and releases the gate.
    pub fn finish_load(&mut self, ticket: LoadTicket, molecule: Molecule) -> Arc<Molecule> {
        let molecule = Arc::new(molecule);
        self.cache.insert(ticket.name.clone(), Arc::clone(&molecule));
        self.touch(&ticket.name);
        self.loading.store(false, Ordering::Release);
        info!(name = %ticket.name, atoms = molecule.atoms().len(), "Molecule loaded.");
        molecule
    }

    /// Releases the gate without storing anything.
    pub fn abandon_load(&self, ticket: LoadTicket) {
        debug!(name = %ticket.name, "Load abandoned.");
        self.loading.store(false, Ordering::Release);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Returns the cached molecule or fetches it from `source`.
    ///
    /// A cache hit still goes through the gate so that it is refused while another load
    /// is running, matching what an interactive caller would see.
    pub fn load(
        &mut self,
        name: &str,
        source: &dyn MoleculeSource,
    ) -> Result<Arc<Molecule>, LibraryError> {
        let ticket = self.try_begin_load(name)?;
        if let Some(hit) = self.cache.get(&ticket.name).cloned() {
            debug!(name = %ticket.name, "Cache hit.");
            self.touch(&ticket.name);
            self.abandon_load(ticket);
            return Ok(hit);
        }
        match source.fetch(&ticket.name) {
            Ok(molecule) => Ok(self.finish_load(ticket, molecule)),
            Err(e) => {
                self.abandon_load(ticket);
                Err(e)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Molecule>> {
        self.cache.get(&normalize_name(name)).cloned()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(&normalize_name(name))
    }

    /// Most recently loaded names, newest first.
    pub fn recent(&self) -> Vec<&str> {
        self.recent.iter().map(String::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.recent.clear();
    }

    fn touch(&mut self, name: &str) {
        self.recent.retain(|n| n != name);
        self.recent.push_front(name.to_string());
        self.recent.truncate(MAX_RECENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::{BondOrder, BondStereo};
    use nalgebra::Point3;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl MoleculeSource for CountingSource {
        fn fetch(&self, name: &str) -> Result<Molecule, LibraryError> {
            self.calls.set(self.calls.get() + 1);
            if name == "missing" {
                return Err(LibraryError::NotFound(name.into()));
            }
            let mut m = Molecule::new(name);
            m.add_atom("C", Point3::origin());
            Ok(m)
        }
    }

    #[test]
    fn load_caches_by_normalized_name() {
        let source = CountingSource::new();
        let mut library = MoleculeLibrary::new();
        let first = library.load("  Water ", &source).unwrap();
        let second = library.load("water", &source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.get(), 1);
        assert!(library.is_cached("WATER"));
        assert!(!library.is_loading());
    }

    #[test]
    fn recent_list_is_deduplicated_newest_first_and_bounded() {
        let source = CountingSource::new();
        let mut library = MoleculeLibrary::new();
        for name in ["a", "b", "c", "d", "e", "f", "g", "c"] {
            library.load(name, &source).unwrap();
        }
        assert_eq!(library.recent(), vec!["c", "g", "f", "e", "d", "b"]);
    }

    #[test]
    fn second_request_while_loading_is_dropped() {
        let mut library = MoleculeLibrary::new();
        let ticket = library.try_begin_load("benzene").unwrap();
        assert!(matches!(
            library.try_begin_load("water"),
            Err(LibraryError::LoadInProgress)
        ));
        assert!(matches!(
            library.load("water", &CountingSource::new()),
            Err(LibraryError::LoadInProgress)
        ));

        let mut m = Molecule::new("benzene");
        m.add_atom("C", Point3::origin());
        library.finish_load(ticket, m);
        assert!(library.try_begin_load("water").is_ok());
    }

    #[test]
    fn failed_fetch_releases_the_gate() {
        let mut library = MoleculeLibrary::new();
        let source = CountingSource::new();
        assert!(matches!(
            library.load("missing", &source),
            Err(LibraryError::NotFound(_))
        ));
        assert!(!library.is_loading());
        assert!(library.recent().is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        let library = MoleculeLibrary::new();
        assert!(matches!(
            library.try_begin_load("   "),
            Err(LibraryError::EmptyName)
        ));
        assert!(!library.is_loading());
    }

    #[test]
    fn directory_source_reads_sdf_files_by_name() {
        let dir = tempdir().unwrap();
        let mut m = Molecule::new("Methanol");
        let c = m.add_atom("C", Point3::new(0.0, 0.0, 0.0));
        let o = m.add_atom("O", Point3::new(1.43, 0.0, 0.0));
        m.add_bond(c, o, BondOrder::Single, BondStereo::None).unwrap();
        SdfFile::write_molecule_to_path(&m, dir.path().join("methanol.sdf")).unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.list().unwrap(), vec!["methanol".to_string()]);

        let mut library = MoleculeLibrary::new();
        let loaded = library.load("Methanol", &source).unwrap();
        assert_eq!(loaded.name, "methanol");
        assert_eq!(loaded.atoms().len(), 2);
        assert_eq!(loaded.bonds().len(), 1);

        assert!(matches!(
            library.load("ethanol", &source),
            Err(LibraryError::NotFound(_))
        ));
    }
}
