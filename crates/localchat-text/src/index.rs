use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::{info, warn};

use localchat_core::config::{Settings, TfidfConfig};
use localchat_core::error::{Error, Result};
use localchat_core::loader::DocumentLoader;
use localchat_core::traits::Retriever;
use localchat_core::types::{DocumentUnit, ScoredUnit};

use crate::store::ArtifactStore;
use crate::tfidf::{SparseMatrix, TfidfVectorizer};

/// Where the corpus lives, where the artifact goes, and how to weigh terms.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub extensions: Vec<String>,
    pub tfidf: TfidfConfig,
}

impl IndexOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            docs_dir: settings.rag.docs_dir.clone(),
            index_dir: settings.rag.index_dir.clone(),
            extensions: settings.rag.extensions.clone(),
            tfidf: settings.tfidf.clone(),
        }
    }

    pub fn store(&self) -> ArtifactStore { ArtifactStore::new(&self.index_dir) }

    pub fn loader(&self) -> DocumentLoader { DocumentLoader::new(&self.extensions) }
}

/// Fitted transform + weight matrix + units, row-aligned.
///
/// Queries are always projected through the transform fitted on `units`;
/// it is never refit after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    vectorizer: TfidfVectorizer,
    matrix: SparseMatrix,
    units: Vec<DocumentUnit>,
}

impl SimilarityIndex {
    /// Fit over `units`. An empty list gives a zero-row, zero-column index.
    pub fn build(units: Vec<DocumentUnit>, config: &TfidfConfig) -> Self {
        if units.is_empty() {
            return Self { vectorizer: TfidfVectorizer::empty(config), matrix: SparseMatrix::default(), units };
        }
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(config, &texts);
        Self { vectorizer, matrix, units }
    }

    pub fn from_parts(vectorizer: TfidfVectorizer, matrix: SparseMatrix, units: Vec<DocumentUnit>) -> Result<Self> {
        vectorizer.validate()?;
        matrix.validate()?;
        if matrix.row_count() != units.len() {
            return Err(Error::ArtifactCorrupt(format!("{} matrix rows for {} units", matrix.row_count(), units.len())));
        }
        if matrix.n_cols != vectorizer.vocabulary_len() {
            return Err(Error::ArtifactCorrupt(format!("{} matrix columns for {} terms", matrix.n_cols, vectorizer.vocabulary_len())));
        }
        Ok(Self { vectorizer, matrix, units })
    }

    /// Load the persisted artifact, or scan + fit + persist when it is
    /// missing or unusable. Never fails; a persist error only costs the
    /// next run a rebuild.
    pub fn open(options: &IndexOptions) -> Self {
        let store = options.store();
        match store.load() {
            Ok(index) => {
                info!(units = index.len(), terms = index.vocabulary_len(), dir = %store.dir().display(), "loaded similarity index");
                return index;
            }
            Err(Error::ArtifactMissing(path)) => info!(missing = %path.display(), "no persisted index, building"),
            Err(e) => warn!(error = %e, "discarding unusable persisted index, rebuilding"),
        }
        let index = Self::build(options.loader().scan(&options.docs_dir), &options.tfidf);
        if let Err(e) = store.save(&index) {
            warn!(error = %e, "failed to persist similarity index");
        }
        info!(units = index.len(), terms = index.vocabulary_len(), "built similarity index");
        index
    }

    /// Drop any persisted artifact and build from the corpus again.
    pub fn rebuild(options: &IndexOptions) -> Result<Self> {
        let store = options.store();
        store.clear()?;
        let index = Self::build(options.loader().scan(&options.docs_dir), &options.tfidf);
        store.save(&index)?;
        Ok(index)
    }

    /// Cosine similarity of `query` against every row, in row order.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let q = self.vectorizer.transform(query);
        self.matrix.rows.iter().map(|row| q.cosine(row)).collect()
    }

    /// The `min(k, len)` best rows by descending score; ties keep row order.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<ScoredUnit> {
        if self.units.is_empty() || k == 0 { return Vec::new(); }
        let mut ranked: Vec<(usize, f32)> = self.scores(query).into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let unit = &self.units[i];
                ScoredUnit { id: unit.id.clone(), text: unit.text.clone(), score }
            })
            .collect()
    }

    pub fn len(&self) -> usize { self.units.len() }

    pub fn is_empty(&self) -> bool { self.units.is_empty() }

    pub fn vocabulary_len(&self) -> usize { self.vectorizer.vocabulary_len() }

    pub fn units(&self) -> &[DocumentUnit] { &self.units }

    pub fn vectorizer(&self) -> &TfidfVectorizer { &self.vectorizer }

    pub fn matrix(&self) -> &SparseMatrix { &self.matrix }
}

impl Retriever for SimilarityIndex {
    fn top_k(&self, query: &str, k: usize) -> Vec<ScoredUnit> { SimilarityIndex::top_k(self, query, k) }
}

/// Defers load-or-build until the first query, then serves from memory
/// for the rest of the process.
#[derive(Debug)]
pub struct LazyIndex {
    options: IndexOptions,
    index: OnceLock<SimilarityIndex>,
}

impl LazyIndex {
    pub fn new(options: IndexOptions) -> Self { Self { options, index: OnceLock::new() } }

    pub fn is_ready(&self) -> bool { self.index.get().is_some() }

    pub fn get(&self) -> &SimilarityIndex { self.index.get_or_init(|| SimilarityIndex::open(&self.options)) }
}

impl Retriever for LazyIndex {
    fn top_k(&self, query: &str, k: usize) -> Vec<ScoredUnit> { self.get().top_k(query, k) }
}
