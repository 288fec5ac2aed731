//! On-disk form of a [`SimilarityIndex`].
//!
//! Three JSON files live side by side in the index directory. Each is written
//! to a temp file and renamed into place, and each carries the same
//! fingerprint of the unit list, so a set left behind by an interrupted
//! persist (missing file or mixed generations) never loads.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use localchat_core::error::{Error, Result};
use localchat_core::types::DocumentUnit;

use crate::index::SimilarityIndex;
use crate::tfidf::{SparseMatrix, TfidfVectorizer};

pub const FORMAT_VERSION: u32 = 1;
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const MATRIX_FILE: &str = "tfidf_matrix.json";
pub const UNITS_FILE: &str = "tfidf_units.json";

#[derive(Debug, Serialize, Deserialize)]
struct Stamped<T> {
    format_version: u32,
    fingerprint: String,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn paths(&self) -> [PathBuf; 3] {
        [self.dir.join(VECTORIZER_FILE), self.dir.join(MATRIX_FILE), self.dir.join(UNITS_FILE)]
    }

    /// True only when all three files are present.
    pub fn exists(&self) -> bool { self.paths().iter().all(|p| p.is_file()) }

    pub fn save(&self, index: &SimilarityIndex) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let fingerprint = fingerprint(index.units());
        let [vec_path, mat_path, units_path] = self.paths();
        self.write_atomic(&vec_path, &stamp(&fingerprint, index.vectorizer()))?;
        self.write_atomic(&mat_path, &stamp(&fingerprint, index.matrix()))?;
        self.write_atomic(&units_path, &stamp(&fingerprint, index.units()))?;
        debug!(dir = %self.dir.display(), fingerprint = %fingerprint, "persisted similarity index");
        Ok(())
    }

    /// Load all three parts or fail. `ArtifactMissing` means nothing usable
    /// is on disk; any other error means the files exist but are unusable.
    pub fn load(&self) -> Result<SimilarityIndex> {
        let paths = self.paths();
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(Error::ArtifactMissing(missing.clone()));
        }
        let [vec_path, mat_path, units_path] = paths;
        let vectorizer: Stamped<TfidfVectorizer> = read_json(&vec_path)?;
        let matrix: Stamped<SparseMatrix> = read_json(&mat_path)?;
        let units: Stamped<Vec<DocumentUnit>> = read_json(&units_path)?;

        for (name, version) in [(VECTORIZER_FILE, vectorizer.format_version), (MATRIX_FILE, matrix.format_version), (UNITS_FILE, units.format_version)] {
            if version != FORMAT_VERSION {
                return Err(Error::ArtifactCorrupt(format!("{} has format version {}, expected {}", name, version, FORMAT_VERSION)));
            }
        }
        let expected = fingerprint(&units.payload);
        if vectorizer.fingerprint != expected || matrix.fingerprint != expected || units.fingerprint != expected {
            return Err(Error::ArtifactCorrupt("index files belong to different builds".to_string()));
        }
        SimilarityIndex::from_parts(vectorizer.payload, matrix.payload, units.payload)
    }

    /// Remove whatever part of the artifact exists.
    pub fn clear(&self) -> Result<()> {
        for path in self.paths() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed index file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(path, e)),
            }
        }
        Ok(())
    }

    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, value).map_err(|e| Error::serialization(path, e))?;
            writer.flush().map_err(|e| Error::io(path, e))?;
        }
        tmp.as_file().sync_all().map_err(|e| Error::io(path, e))?;
        tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
        Ok(())
    }
}

fn stamp<'a, T: ?Sized>(fingerprint: &str, payload: &'a T) -> Stamped<&'a T> {
    Stamped { format_version: FORMAT_VERSION, fingerprint: fingerprint.to_string(), payload }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::serialization(path, e))
}

/// BLAKE3 digest over the ordered `(id, text)` list.
pub fn fingerprint(units: &[DocumentUnit]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(units.len() as u64).to_le_bytes());
    for u in units {
        hasher.update(u.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(u.text.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}
