use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing molecule file formats.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// helpers are provided on top of the reader/writer methods.
pub trait MolecularFile {
    /// Format-specific data that does not belong on [`Molecule`] (header lines, data items).
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a molecule from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed molecule and associated metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Molecule, Self::Metadata), Self::Error>;

    /// Writes a molecule and metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a molecule with metadata derived from the molecule itself.
    fn write_molecule_to(molecule: &Molecule, writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Molecule, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(molecule, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_molecule_to_path<P: AsRef<Path>>(
        molecule: &Molecule,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_molecule_to(molecule, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
