//! File-backed token store
//!
//! Keeps the `vec2_*` keys in a flat JSON object on disk so a CLI can stay
//! logged in between runs. All writes use atomic temp-file + rename to
//! prevent corruption on crash. A tokio Mutex serializes concurrent writes.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::{TokenStore, store_key};

/// Token store persisted to a JSON file.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Load the store from `path`.
    ///
    /// If the file doesn't exist, creates it as `{}` (cold start, anonymous).
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let values: BTreeMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), keys = values.len(), "loaded credentials");
            values
        } else {
            info!(path = %path.display(), "credential file not found, starting anonymous");
            let values = BTreeMap::new();
            write_atomic(&path, &values).await?;
            values
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.state.lock().await.get(key).cloned()
    }

    async fn set(&self, key: String, value: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(key, value.to_owned());
        write_atomic(&self.path, &state).await
    }
}

impl TokenStore for FileStore {
    fn id(&self) -> &str {
        "file"
    }

    fn read<'a>(&'a self, name: &'a str) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async move { self.get(&store_key(name)).await.unwrap_or_default() })
    }

    fn write<'a>(
        &'a self,
        name: &'a str,
        value: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.set(store_key(name), value))
    }
}

/// Write the key map atomically with 0600 permissions (it holds bearer tokens).
async fn write_atomic(path: &Path, data: &BTreeMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
    if !dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;
    }

    let tmp_path = dir.join(format!(".vec2-credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
