use crate::error::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;

// STORAGE MANAGER

/// Writes run artifacts under one output directory.
pub struct AsyncStorageManager {
    pub base_dir: PathBuf,
}

impl AsyncStorageManager {
    /// Creates the directory up front so later saves don't have to check for it.
    pub async fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    /// Atomic write: the bytes go to `<name>.tmp` first, then get renamed over the target,
    /// so a crash mid-write leaves the previous artifact intact.
    pub async fn save_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let final_path = self.path(file_name);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path(&format!("{}.tmp", file_name));

        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &final_path).await?;

        Ok(final_path)
    }

    pub async fn save_text(&self, file_name: &str, text: &str) -> Result<PathBuf> {
        self.save_bytes(file_name, text.as_bytes()).await
    }

    /// Pretty-printed so artifacts stay human-readable.
    pub async fn save_json<T: Serialize>(&self, file_name: &str, data: &T) -> Result<PathBuf> {
        let json_bytes = serde_json::to_vec_pretty(data)?;
        self.save_bytes(file_name, &json_bytes).await
    }

    pub async fn load_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        // serde_json scans the bytes anyway, so skip the UTF-8 pass of read_to_string.
        let content = fs::read(self.path(file_name)).await?;
        Ok(serde_json::from_slice(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn saves_and_loads_json_in_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::new(dir.path().join("out")).await.unwrap();

        let path = storage.save_json("cache/state.json", &json!({"a": 1})).await.unwrap();
        assert!(path.ends_with("cache/state.json"));
        assert!(!storage.path("cache/state.json.tmp").exists());

        let loaded: Value = storage.load_json("cache/state.json").await.unwrap();
        assert_eq!(loaded["a"], 1);
    }

    #[tokio::test]
    async fn save_text_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::new(dir.path()).await.unwrap();

        storage.save_text("returns.csv", "old").await.unwrap();
        let path = storage.save_text("returns.csv", "new").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AsyncStorageManager::new(dir.path()).await.unwrap();
        assert!(storage.load_json::<Value>("nope.json").await.is_err());
    }
}
