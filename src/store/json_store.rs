use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Load a keyed record file, defaulting to empty when it does not exist yet.
/// A missing file is a fresh deployment, not an error; a present-but-corrupt
/// file is.
pub(crate) async fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Crash-safe write: serialize into a sibling temp file, fsync, then rename
/// over the target. A crash leaves either the old file or the new one,
/// never a partial write.
pub(crate) async fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        items: BTreeMap<String, u64>,
    }

    #[tokio::test]
    async fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Sample = load_or_default(&dir.path().join("nope.json")).await.unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut sample = Sample::default();
        sample.items.insert("k".into(), 42);
        save_atomic(&path, &sample).await.unwrap();

        let loaded: Sample = load_or_default(&path).await.unwrap();
        assert_eq!(loaded, sample);
        // no temp file left behind
        assert!(!dir.path().join("db.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        tokio::fs::write(&path, b"{ truncated").await.unwrap();
        let loaded: Result<Sample> = load_or_default(&path).await;
        assert!(loaded.is_err());
    }
}
