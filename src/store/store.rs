//! Single-writer persistent content store.
//!
//! # Responsibilities
//! - Load/merge/persist the content snapshot at startup
//! - Serve lock-free read snapshots to handlers
//! - Serialize all mutations through one write lock (FIFO)
//! - Persist before swapping the in-memory snapshot
//!
//! # Design Decisions
//! - Readers get an `Arc<ContentDocument>` via arc-swap and can never
//!   observe a draft another call is still mutating
//! - Mutators signal failure by returning `Err`, which aborts the commit
//!   before anything touches disk or the cache
//! - Persistence is a temp-file write followed by an atomic rename, so a
//!   crash mid-write leaves the previous snapshot intact

use arc_swap::ArcSwapOption;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::store::document::{ContentDocument, now_millis};
use crate::store::seed::{Seed, merge_snapshot};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was used before `initialize` ran. Programming error.
    #[error("content store used before initialization")]
    NotInitialized,

    /// Disk access failed. The in-memory snapshot is unchanged and the
    /// operation is safe to retry.
    #[error("content snapshot io error: {0}")]
    Persistence(#[from] std::io::Error),

    /// The document could not be encoded as JSON.
    #[error("failed to encode content snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Process-wide owner of all mutable content.
///
/// Constructed once at startup and passed by handle; there is no ambient
/// global. Correctness depends on exactly one process owning `path`.
pub struct ContentStore {
    path: PathBuf,
    cache: ArcSwapOption<ContentDocument>,
    write_lock: Mutex<()>,
}

impl ContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: ArcSwapOption::const_empty(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the on-disk snapshot if present, reconcile it with `seed`,
    /// persist the reconciled result and cache it. Idempotent: a second
    /// call returns the already-cached snapshot untouched.
    pub async fn initialize(&self, seed: Seed) -> Result<Arc<ContentDocument>, StoreError> {
        let _guard = self.write_lock.lock().await;
        if let Some(doc) = self.cache.load_full() {
            return Ok(doc);
        }

        let doc = match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(raw) => merge_snapshot(&raw, seed),
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), %error,
                        "Snapshot unreadable, starting from seed");
                    seed.into_document()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting from seed");
                seed.into_document()
            }
            // A snapshot that exists but cannot be read must not be
            // silently replaced by the seed.
            Err(error) => return Err(StoreError::Persistence(error)),
        };

        self.persist(&doc).await?;
        let doc = Arc::new(doc);
        self.cache.store(Some(doc.clone()));
        tracing::info!(
            version = doc.version,
            projects = doc.projects.len(),
            news = doc.news.len(),
            "Content store initialized"
        );
        Ok(doc)
    }

    /// Latest committed snapshot. Never blocks behind writers.
    pub fn read(&self) -> Result<Arc<ContentDocument>, StoreError> {
        self.cache.load_full().ok_or(StoreError::NotInitialized)
    }

    /// Apply `mutator` to a private draft of the current snapshot.
    ///
    /// Calls are strictly serialized: each draft is taken from the state
    /// left by the previous successful commit. The draft becomes canonical
    /// only after it has been durably persisted; a failed write leaves the
    /// cached snapshot unchanged and later callers retry against it.
    pub async fn update<R, E, F>(&self, mutator: F) -> Result<(Arc<ContentDocument>, R), E>
    where
        F: FnOnce(&mut ContentDocument) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let current = self
            .cache
            .load_full()
            .ok_or(StoreError::NotInitialized)
            .map_err(E::from)?;

        let mut draft = (*current).clone();
        let result = mutator(&mut draft)?;

        draft.version = current.version + 1;
        draft.updated_at = now_millis();
        draft.repair_next_ids();

        self.persist(&draft).await.map_err(E::from)?;
        let draft = Arc::new(draft);
        self.cache.store(Some(draft.clone()));
        Ok((draft, result))
    }

    async fn persist(&self, doc: &ContentDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
