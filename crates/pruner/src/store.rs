//! Persisted storage under `<project root>/.pruner`
//!
//! ```text
//! .pruner/
//! ├── settings.json        project settings (written by `init`)
//! ├── <provider>.json      coverage state, one per provider
//! └── temp/<n>/lcov.info   copied coverage artifacts
//! ```

use crate::result::{PrunerError, PrunerResult};
use crate::settings::PrunerSettings;
use crate::state::State;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the storage directory under the project root
pub const STORE_DIR: &str = ".pruner";

/// File name of the settings document
pub const SETTINGS_FILE: &str = "settings.json";

/// Subdirectory for copied coverage artifacts
pub const TEMP_DIR: &str = "temp";

/// JSON document storage for one project
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store for the project rooted at `project_root`
    #[must_use]
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(STORE_DIR),
        }
    }

    /// The `.pruner` directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the state document for `name`
    #[must_use]
    pub fn state_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Path of the settings document
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Load the state for `name`; `None` on first run
    pub async fn load(&self, name: &str) -> PrunerResult<Option<State>> {
        read_json(&self.state_path(name)).await
    }

    /// Replace the state for `name`
    pub async fn save(&self, name: &str, state: &State) -> PrunerResult<()> {
        let path = self.state_path(name);
        write_json(&path, state).await?;
        tracing::info!(
            path = %path.display(),
            tests = state.tests.len(),
            files = state.files.len(),
            lines = state.coverage.len(),
            "saved state"
        );
        Ok(())
    }

    /// Whether `init` has created the settings document
    pub async fn settings_exists(&self) -> PrunerResult<bool> {
        Ok(tokio::fs::try_exists(self.settings_path()).await?)
    }

    /// Load the settings document; `None` before `init`
    pub async fn load_settings(&self) -> PrunerResult<Option<PrunerSettings>> {
        read_json(&self.settings_path()).await
    }

    /// Write the settings document
    pub async fn save_settings(&self, settings: &PrunerSettings) -> PrunerResult<()> {
        write_json(&self.settings_path(), settings).await
    }

    /// Copy an artifact to `temp/<index>/<file name>`
    pub async fn persist_artifact(&self, index: usize, source: &Path) -> PrunerResult<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| PrunerError::settings(format!("{} has no file name", source.display())))?;
        let target_dir = self.dir.join(TEMP_DIR).join(index.to_string());
        tokio::fs::create_dir_all(&target_dir).await?;
        let target = target_dir.join(file_name);
        tokio::fs::copy(source, &target).await?;
        tracing::debug!(from = %source.display(), to = %target.display(), "persisted artifact");
        Ok(target)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> PrunerResult<Option<T>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no document");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| PrunerError::StateCorrupt {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> PrunerResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::{CoverageLine, SourceFile, Test};
    use tempfile::TempDir;

    fn sample() -> State {
        State {
            tests: vec![Test::new(9, "N.T")],
            files: vec![SourceFile::new(1, "A.cs")],
            coverage: vec![CoverageLine::new(1, 20, [9])],
        }
    }

    #[tokio::test]
    async fn test_absent_state_is_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load("dotnet").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        store.save("dotnet", &sample()).await.unwrap();

        assert!(dir.path().join(".pruner/dotnet.json").exists());
        assert!(!dir.path().join(".pruner/dotnet.json.tmp").exists());
        assert_eq!(store.load("dotnet").await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_persisted_field_names() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        store.save("dotnet", &sample()).await.unwrap();

        let text = std::fs::read_to_string(store.state_path("dotnet")).unwrap();
        assert!(text.contains("\"testIds\""));
        assert!(text.contains("\"fileId\""));
        assert!(text.contains("\"lineNumber\""));
    }

    #[tokio::test]
    async fn test_corrupt_state_is_error() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.state_path("dotnet"), "{not json").unwrap();

        let err = store.load("dotnet").await.unwrap_err();
        assert!(matches!(err, PrunerError::StateCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_settings_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        assert!(!store.settings_exists().await.unwrap());
        assert!(store.load_settings().await.unwrap().is_none());

        store.save_settings(&PrunerSettings::new()).await.unwrap();
        assert!(store.settings_exists().await.unwrap());
        assert_eq!(std::fs::read_to_string(store.settings_path()).unwrap(), "{}");
        assert_eq!(store.load_settings().await.unwrap(), Some(PrunerSettings::new()));
    }

    #[tokio::test]
    async fn test_persist_artifact() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("out/lcov.info");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "TN:\n").unwrap();

        let store = StateStore::new(dir.path());
        let target = store.persist_artifact(2, &source).await.unwrap();
        assert_eq!(target, dir.path().join(".pruner/temp/2/lcov.info"));
        assert_eq!(std::fs::read_to_string(target).unwrap(), "TN:\n");
    }
}
