use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::models::{Cart, RepositoryError, RepositoryResult};

/// Trait defining the interface for cart snapshot storage
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Load the stored cart snapshot, `None` when nothing was saved yet
    async fn load_cart(&self) -> RepositoryResult<Option<Cart>>;

    /// Overwrite the stored snapshot with `cart`
    async fn save_cart(&self, cart: &Cart) -> RepositoryResult<()>;
}

/// File-backed repository: one JSON document per storage key
pub struct FileCartRepository {
    directory: PathBuf,
    storage_key: String,
}

impl FileCartRepository {
    /// Create a new file repository rooted at `directory`
    pub fn new(directory: impl Into<PathBuf>, storage_key: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            storage_key: storage_key.into(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the snapshot file for the configured key
    pub fn snapshot_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.json", file_stem(&self.storage_key)))
    }

    async fn write_atomically(&self, path: &Path, bytes: &[u8]) -> RepositoryResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            error!("Failed to move snapshot into place: {}", e);
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                warn!("Failed to remove temporary snapshot: {}", cleanup);
            }
            return Err(RepositoryError::WriteFailed {
                message: format!("rename to {} failed: {}", path.display(), e),
            });
        }
        Ok(())
    }
}

/// Map a storage key onto a portable file name
fn file_stem(storage_key: &str) -> String {
    storage_key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl CartRepository for FileCartRepository {
    #[instrument(skip(self), fields(storage_key = %self.storage_key))]
    async fn load_cart(&self) -> RepositoryResult<Option<Cart>> {
        let path = self.snapshot_path();
        info!("Loading cart snapshot from {}", path.display());

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let cart: Cart = serde_json::from_slice(&bytes)?;
                info!("Cart snapshot loaded with {} products", cart.len());
                Ok(Some(cart))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No cart snapshot stored yet");
                Ok(None)
            }
            Err(e) => {
                error!("Failed to read cart snapshot: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, cart), fields(storage_key = %self.storage_key, item_count = cart.len()))]
    async fn save_cart(&self, cart: &Cart) -> RepositoryResult<()> {
        let bytes = serde_json::to_vec(cart)?;
        let path = self.snapshot_path();

        self.write_atomically(&path, &bytes).await?;

        info!("Cart snapshot saved");
        Ok(())
    }
}

/// Repository keeping the serialized snapshot in memory
#[derive(Default)]
pub struct InMemoryCartRepository {
    snapshot: RwLock<Option<String>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository that already holds `cart`
    pub fn with_cart(cart: &Cart) -> RepositoryResult<Self> {
        Ok(Self {
            snapshot: RwLock::new(Some(serde_json::to_string(cart)?)),
        })
    }

    /// Create a repository holding a raw snapshot string
    pub fn with_raw_snapshot(raw: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Some(raw.into())),
        }
    }

    /// The serialized snapshot as it was last written
    pub async fn raw_snapshot(&self) -> Option<String> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    #[instrument(skip(self))]
    async fn load_cart(&self) -> RepositoryResult<Option<Cart>> {
        let snapshot = self.snapshot.read().await;
        match snapshot.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, cart), fields(item_count = cart.len()))]
    async fn save_cart(&self, cart: &Cart) -> RepositoryResult<()> {
        let raw = serde_json::to_string(cart)?;
        *self.snapshot.write().await = Some(raw);
        Ok(())
    }
}
