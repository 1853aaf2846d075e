//! Single-process flat index with on-disk snapshots

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::embedding::inner_product;
use crate::domain::semantic_cache::{
    meets_threshold, CacheEntry, EntryMetadata, SimilarityMatch, VectorIndex,
};
use crate::domain::DomainError;

const INDEX_FILE: &str = "index.json";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Default)]
struct FlatIndexState {
    vectors: Vec<Vec<f32>>,
    metadata: Vec<EntryMetadata>,
}

/// Brute-force inner-product index.
///
/// Vectors and metadata are parallel arrays: ordinal `i` of one describes
/// ordinal `i` of the other. When a data directory is set, every store
/// rewrites both snapshot files before it returns.
#[derive(Debug)]
pub struct FlatIndex {
    dimensions: usize,
    data_dir: Option<PathBuf>,
    state: RwLock<FlatIndexState>,
}

impl FlatIndex {
    /// Index that never touches the filesystem
    pub fn in_memory(dimensions: usize) -> Self {
        Self {
            dimensions,
            data_dir: None,
            state: RwLock::new(FlatIndexState::default()),
        }
    }

    /// Load the snapshot in `data_dir`, or start empty and write one
    pub async fn open(dimensions: usize, data_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let data_dir = data_dir.into();

        tokio::fs::create_dir_all(&data_dir).await.map_err(|e| {
            DomainError::configuration(format!(
                "cannot create index directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let index_path = data_dir.join(INDEX_FILE);
        let metadata_path = data_dir.join(METADATA_FILE);

        let state = if index_path.exists() && metadata_path.exists() {
            Self::load(dimensions, &index_path, &metadata_path).await?
        } else {
            info!(path = %data_dir.display(), "No snapshot found, starting with an empty index");
            FlatIndexState::default()
        };

        let index = Self {
            dimensions,
            data_dir: Some(data_dir),
            state: RwLock::new(state),
        };

        {
            let state = index.state.read().await;
            index.write_snapshot(&state).await.map_err(|e| {
                DomainError::configuration(format!("cannot write index snapshot: {}", e))
            })?;
            info!(entries = state.vectors.len(), dimensions, "Flat index ready");
        }

        Ok(index)
    }

    async fn load(
        dimensions: usize,
        index_path: &Path,
        metadata_path: &Path,
    ) -> Result<FlatIndexState, DomainError> {
        let snapshot: IndexSnapshot = read_json(index_path).await?;
        let mut metadata: Vec<EntryMetadata> = read_json(metadata_path).await?;

        if snapshot.dimensions != dimensions {
            return Err(DomainError::configuration(format!(
                "index snapshot has dimension {} but the embedder produces {}",
                snapshot.dimensions, dimensions
            )));
        }

        let mut vectors = snapshot.vectors;

        if let Some(bad) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(DomainError::configuration(format!(
                "index snapshot row {} has dimension {}, expected {}",
                bad,
                vectors[bad].len(),
                dimensions
            )));
        }

        if vectors.len() != metadata.len() {
            let keep = vectors.len().min(metadata.len());
            warn!(
                vectors = vectors.len(),
                metadata = metadata.len(),
                keep,
                "Index snapshot and metadata disagree, truncating to the shorter"
            );
            vectors.truncate(keep);
            metadata.truncate(keep);
        }

        info!(entries = vectors.len(), "Loaded index snapshot");

        Ok(FlatIndexState { vectors, metadata })
    }

    async fn write_snapshot(&self, state: &FlatIndexState) -> std::io::Result<()> {
        let Some(ref dir) = self.data_dir else {
            return Ok(());
        };

        let snapshot = IndexSnapshot {
            dimensions: self.dimensions,
            vectors: state.vectors.clone(),
        };

        write_atomic(&dir.join(INDEX_FILE), &serde_json::to_vec(&snapshot)?).await?;
        write_atomic(&dir.join(METADATA_FILE), &serde_json::to_vec(&state.metadata)?).await
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.dimensions {
            return Err(DomainError::validation(format!(
                "embedding has dimension {}, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn search(
        &self,
        embedding: &[f32],
        model: &str,
        threshold: f32,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        let state = self.state.read().await;

        if state.vectors.is_empty() {
            return Ok(None);
        }

        self.check_dimensions(embedding)?;

        let mut best: Option<(usize, f32)> = None;
        for (i, vector) in state.vectors.iter().enumerate() {
            let score = inner_product(embedding, vector);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        let Some((ordinal, score)) = best else {
            return Ok(None);
        };

        if !meets_threshold(score, threshold) {
            return Ok(None);
        }

        let metadata = &state.metadata[ordinal];
        if metadata.model != model {
            debug!(
                score,
                query_model = model,
                entry_model = %metadata.model,
                "Nearest neighbour belongs to another model"
            );
            return Ok(None);
        }

        Ok(Some(SimilarityMatch::from_metadata(metadata, score)))
    }

    async fn store(&self, entry: CacheEntry) -> Result<(), DomainError> {
        self.check_dimensions(entry.embedding())?;

        let (embedding, metadata) = entry.into_parts();
        let mut state = self.state.write().await;

        state.vectors.push(embedding);
        state.metadata.push(metadata);

        if let Err(e) = self.write_snapshot(&state).await {
            state.vectors.pop();
            state.metadata.pop();
            return Err(DomainError::index_unavailable(format!(
                "failed to persist index snapshot: {}",
                e
            )));
        }

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.state.read().await.vectors.len())
    }

    fn backend_name(&self) -> &'static str {
        "flat"
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        DomainError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        DomainError::configuration(format!("corrupt snapshot {}: {}", path.display(), e))
    })
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{Message, Usage};

    fn entry(embedding: Vec<f32>, question: &str, answer: &str, model: &str) -> CacheEntry {
        CacheEntry::new(
            embedding,
            vec![Message::user(question)],
            vec![Message::assistant(answer)],
            model,
            Usage::new(5, 1, 6),
        )
    }

    #[tokio::test]
    async fn test_empty_index_is_miss_for_any_threshold() {
        let index = FlatIndex::in_memory(2);

        for threshold in [0.0, 0.5, 1.0, -1.0] {
            assert!(index.search(&[1.0, 0.0], "m", threshold).await.unwrap().is_none());
        }
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_hit_returns_stored_response() {
        let index = FlatIndex::in_memory(2);
        index
            .store(entry(vec![1.0, 0.0], "What is 2+2?", "4", "gpt-4o-mini"))
            .await
            .unwrap();

        let hit = index
            .search(&[1.0, 0.0], "gpt-4o-mini", 0.99)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.response_messages, vec![Message::assistant("4")]);
        assert_eq!(hit.usage, Usage::new(5, 1, 6));
        assert!((hit.similarity_score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_inclusive() {
        let index = FlatIndex::in_memory(2);
        index.store(entry(vec![0.6, 0.8], "q", "a", "m")).await.unwrap();

        let query = [1.0, 0.0];
        let score = inner_product(&query, &[0.6, 0.8]);

        assert!(index.search(&query, "m", score).await.unwrap().is_some());
        assert!(index.search(&query, "m", score + 1e-4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_model_isolation() {
        let index = FlatIndex::in_memory(2);
        index.store(entry(vec![1.0, 0.0], "q", "a", "gpt-4o")).await.unwrap();

        for threshold in [-1.0, 0.0, 0.5, 1.0] {
            assert!(index
                .search(&[1.0, 0.0], "gpt-4o-mini", threshold)
                .await
                .unwrap()
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_model_gate_applies_to_global_nearest() {
        let index = FlatIndex::in_memory(2);
        index.store(entry(vec![0.0, 1.0], "q1", "far", "m")).await.unwrap();
        index.store(entry(vec![1.0, 0.0], "q2", "near", "other")).await.unwrap();

        assert!(index.search(&[1.0, 0.0], "m", -1.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_best_neighbour_wins() {
        let index = FlatIndex::in_memory(2);
        index.store(entry(vec![0.6, 0.8], "q1", "second", "m")).await.unwrap();
        index.store(entry(vec![1.0, 0.0], "q2", "first", "m")).await.unwrap();

        let hit = index.search(&[1.0, 0.0], "m", 0.5).await.unwrap().unwrap();

        assert_eq!(hit.response_messages[0].text(), "first");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_validation_error() {
        let index = FlatIndex::in_memory(2);

        let result = index.store(entry(vec![1.0, 0.0, 0.0], "q", "a", "m")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        index.store(entry(vec![1.0, 0.0], "q", "a", "m")).await.unwrap();
        let result = index.search(&[1.0], "m", 0.5).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = FlatIndex::open(2, dir.path()).await.unwrap();
            index
                .store(entry(vec![1.0, 0.0], "What is 2+2?", "4", "gpt-4o-mini"))
                .await
                .unwrap();
        }

        let reopened = FlatIndex::open(2, dir.path()).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);

        let hit = reopened
            .search(&[1.0, 0.0], "gpt-4o-mini", 0.99)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.response_messages, vec![Message::assistant("4")]);
    }

    #[tokio::test]
    async fn test_open_writes_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();

        FlatIndex::open(4, dir.path()).await.unwrap();

        assert!(dir.path().join(INDEX_FILE).exists());
        assert!(dir.path().join(METADATA_FILE).exists());
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_torn_snapshot_is_truncated() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = FlatIndex::open(2, dir.path()).await.unwrap();
            index.store(entry(vec![1.0, 0.0], "q1", "a1", "m")).await.unwrap();
        }

        // Simulate a crash after the index rename but before the metadata rename
        let snapshot = IndexSnapshot {
            dimensions: 2,
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        std::fs::write(
            dir.path().join(INDEX_FILE),
            serde_json::to_vec(&snapshot).unwrap(),
        )
        .unwrap();

        let reopened = FlatIndex::open(2, dir.path()).await.unwrap();

        assert_eq!(reopened.len().await.unwrap(), 1);
        assert!(reopened.search(&[0.0, 1.0], "m", 0.9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dimension_change_rejected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        FlatIndex::open(2, dir.path()).await.unwrap();

        let result = FlatIndex::open(3, dir.path()).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_rejected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"not json").unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), b"[]").unwrap();

        let result = FlatIndex::open(2, dir.path()).await;

        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_stores_are_all_kept() {
        let index = std::sync::Arc::new(FlatIndex::in_memory(2));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let index = index.clone();
                tokio::spawn(async move {
                    index
                        .store(entry(vec![1.0, 0.0], &format!("q{}", i), "a", "m"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(index.len().await.unwrap(), 16);
    }
}
