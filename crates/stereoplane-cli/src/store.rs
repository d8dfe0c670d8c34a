use crate::error::{CliError, Result};
use directories::ProjectDirs;
use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use stereoplane::core::io::sdf::SdfFile;
use stereoplane::engine::library::DirectorySource;
use stereoplane::engine::rules::normalize_name;
use tracing::{debug, info, warn};

const PUBCHEM_REST: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

#[derive(Debug, Clone, Copy)]
pub enum FetchProgress {
    Resolving,
    DownloadStarted { total_size: Option<u64> },
    Downloading { downloaded: u64 },
    Validating,
}

/// PubChem record flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    ThreeD,
    TwoD,
}

impl RecordType {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::ThreeD => "3d",
            Self::TwoD => "2d",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub name: String,
    pub cid: u64,
    pub record_type: RecordType,
    pub path: PathBuf,
    pub atoms: usize,
}

/// Directory of `<name>.sdf` files, with its location remembered across runs.
#[derive(Debug)]
pub struct MoleculeStore {
    base_path: PathBuf,
}

impl MoleculeStore {
    pub fn new() -> Result<Self> {
        let path = Self::determine_store_path()?;
        debug!("MoleculeStore initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { base_path: path }
    }

    pub fn get_store_path(&self) -> &Path {
        &self.base_path
    }

    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(&self.base_path)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.source().path_for(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.source().list()?)
    }

    /// Downloads `name` from PubChem and stores it as `<name>.sdf`.
    ///
    /// Without `two_d_only` the 3D conformer is tried first and the 2D record is used
    /// when PubChem has no conformer. The download is parsed before it is written, so a
    /// bad record never lands in the store.
    pub async fn fetch(
        &self,
        name: &str,
        force: bool,
        two_d_only: bool,
        mut progress_callback: impl FnMut(FetchProgress),
    ) -> Result<FetchOutcome> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(CliError::Argument("Molecule name is empty.".to_string()));
        }
        let target = self.path_for(&name);
        if self.contains(&name) && !force {
            return Err(CliError::Store(format!(
                "'{}' is already in the store. Use --force to overwrite.",
                name
            )));
        }

        let client = reqwest::Client::new();
        progress_callback(FetchProgress::Resolving);
        let cid = resolve_cid(&client, &name).await?;
        info!(name = %name, cid, "Resolved PubChem compound.");

        let record_types: &[RecordType] = if two_d_only {
            &[RecordType::TwoD]
        } else {
            &[RecordType::ThreeD, RecordType::TwoD]
        };

        let mut last_status = None;
        for &record_type in record_types {
            let url = record_url(cid, record_type)?;
            info!("Sending request to {}", url);
            let response = client.get(url.clone()).send().await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                warn!(cid, record = record_type.as_query(), "Record not available.");
                last_status = Some(response.status());
                continue;
            }
            let mut response = response.error_for_status()?;

            let total_size = response.content_length();
            progress_callback(FetchProgress::DownloadStarted { total_size });
            let mut buffer: Vec<u8> = Vec::with_capacity(total_size.unwrap_or(0) as usize);
            while let Some(chunk) = response.chunk().await? {
                buffer.extend_from_slice(&chunk);
                progress_callback(FetchProgress::Downloading {
                    downloaded: buffer.len() as u64,
                });
            }

            progress_callback(FetchProgress::Validating);
            let text = String::from_utf8(buffer).map_err(|e| CliError::FileParsing {
                path: PathBuf::from(url.as_str()),
                source: e.into(),
            })?;
            let (molecule, _) = SdfFile::parse_str(&text).map_err(|e| CliError::FileParsing {
                path: PathBuf::from(url.as_str()),
                source: e.into(),
            })?;

            fs::create_dir_all(&self.base_path)?;
            fs::write(&target, text)?;
            info!(path = ?target, atoms = molecule.atoms().len(), "Molecule stored.");
            return Ok(FetchOutcome {
                name,
                cid,
                record_type,
                path: target,
                atoms: molecule.atoms().len(),
            });
        }

        Err(CliError::Store(format!(
            "PubChem has no structure record for CID {} ({:?}).",
            cid, last_status
        )))
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| CliError::Argument(format!("Path is not valid UTF-8: {:?}", path)))?;
        fs::write(config_path, path_str).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_store_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_store_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_store_path(),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("edu", "caltech", "stereoplane")
            .ok_or_else(|| CliError::Store("Could not determine project directories.".to_string()))
    }

    fn get_path_config_file() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("store-path.conf"))
    }

    fn get_default_store_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("molecules"))
    }
}

async fn resolve_cid(client: &reqwest::Client, name: &str) -> Result<u64> {
    let url = cid_lookup_url(name)?;
    info!("Sending request to {}", url);
    let response = client.get(url).send().await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(CliError::CompoundNotFound(name.to_string()));
    }
    let body = response.error_for_status()?.text().await?;
    parse_cid_list(&body).ok_or_else(|| CliError::CompoundNotFound(name.to_string()))
}

pub fn cid_lookup_url(name: &str) -> Result<Url> {
    pubchem_url(&["compound", "name", name, "cids", "TXT"])
}

pub fn record_url(cid: u64, record_type: RecordType) -> Result<Url> {
    let mut url = pubchem_url(&["compound", "cid", &cid.to_string(), "SDF"])?;
    url.query_pairs_mut()
        .append_pair("record_type", record_type.as_query());
    Ok(url)
}

/// PubChem REST URL with `segments` appended, each percent-encoded as one path segment.
fn pubchem_url(segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(PUBCHEM_REST).map_err(|e| CliError::Other(e.into()))?;
    url.path_segments_mut()
        .map_err(|_| CliError::Other(anyhow::anyhow!("PubChem base URL cannot carry a path")))?
        .extend(segments);
    Ok(url)
}

/// First CID of a plain-text CID listing (one per line).
pub fn parse_cid_list(body: &str) -> Option<u64> {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse().ok())
        .filter(|&cid| cid > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn urls_follow_pubchem_rest_layout() {
        assert_eq!(
            cid_lookup_url("ethanol").unwrap().as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/ethanol/cids/TXT"
        );
        assert_eq!(
            record_url(702, RecordType::ThreeD).unwrap().as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/cid/702/SDF?record_type=3d"
        );
        assert_eq!(
            record_url(962, RecordType::TwoD).unwrap().query(),
            Some("record_type=2d")
        );
    }

    #[test]
    fn compound_names_are_encoded_as_a_single_path_segment() {
        assert_eq!(
            cid_lookup_url("acetic acid").unwrap().as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/acetic%20acid/cids/TXT"
        );
        let url = cid_lookup_url("1/2-dichloro?ethane#x").unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 7);
        assert_eq!(segments[4], "1%2F2-dichloro%3Fethane%23x");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn cid_listing_takes_first_positive_entry() {
        assert_eq!(parse_cid_list("702\n"), Some(702));
        assert_eq!(parse_cid_list("\n  962 \n 1234\n"), Some(962));
        assert_eq!(parse_cid_list(""), None);
        assert_eq!(parse_cid_list("Status: 404"), None);
        assert_eq!(parse_cid_list("0"), None);
    }

    #[test]
    fn store_paths_use_normalized_names() {
        let dir = tempdir().unwrap();
        let store = MoleculeStore::with_custom_path(dir.path().to_path_buf());
        assert_eq!(store.path_for("  Benzene "), dir.path().join("benzene.sdf"));
        assert!(!store.contains("benzene"));

        fs::write(dir.path().join("benzene.sdf"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        assert!(store.contains("BENZENE"));
        assert_eq!(store.list().unwrap(), vec!["benzene".to_string()]);
    }

    #[test]
    fn listing_a_missing_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = MoleculeStore::with_custom_path(dir.path().join("not-created"));
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("water.sdf"), "").unwrap();
        let store = MoleculeStore::with_custom_path(dir.path().to_path_buf());
        let result = store.fetch("Water", false, false, |_| {}).await;
        assert!(matches!(result, Err(CliError::Store(_))));
    }
}
