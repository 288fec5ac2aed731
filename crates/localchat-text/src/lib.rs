//! localchat-text
//!
//! TF-IDF similarity index over paragraph units: text analysis, the fitted
//! term-weighting transform, the ranked `top_k` lookup and the on-disk
//! artifact that lets later runs skip the build.
pub mod analyzer;
pub mod index;
pub mod store;
pub mod tfidf;

pub use index::{IndexOptions, LazyIndex, SimilarityIndex};
pub use store::ArtifactStore;
pub use tfidf::{SparseMatrix, SparseVector, TfidfVectorizer};
