//! Fragments read from a directory tree: `<root>/<release>/<provider>.json`.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mapping_cache::{MappingProvider, ProviderError};
use mapping_types::{Fragment, Release};
use tracing::debug;

/// Provider adapter over pre-converted JSON fragments.
#[derive(Debug, Clone)]
pub struct JsonDirectoryProvider {
    id: String,
    root: PathBuf,
}

impl JsonDirectoryProvider {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    pub fn path_for(&self, release: &Release) -> PathBuf {
        self.root.join(&release.id).join(format!("{}.json", self.id))
    }
}

#[async_trait]
impl MappingProvider for JsonDirectoryProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, release: &Release) -> Result<Fragment, ProviderError> {
        let path = self.path_for(release);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::Unavailable {
                    provider: self.id.clone(),
                    release: release.id.clone(),
                })
            }
            Err(e) => {
                return Err(ProviderError::Fetch {
                    provider: self.id.clone(),
                    release: release.id.clone(),
                    message: format!("{}: {e}", path.display()),
                })
            }
        };
        debug!(provider = %self.id, release = %release, path = %path.display(), "Read fragment");

        serde_json::from_str(&text).map_err(|e| ProviderError::Parse {
            provider: self.id.clone(),
            release: release.id.clone(),
            message: e.to_string(),
        })
    }
}

/// Provider ids found under `root`: every `*.json` file stem in any release
/// directory, sorted.
pub fn discover_providers(root: &Path) -> std::io::Result<Vec<String>> {
    let mut ids = BTreeSet::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(entry.path())? {
            let path = file?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.insert(stem.to_string());
                }
            }
        }
    }
    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mapping_types::ReleaseKind;

    #[tokio::test]
    async fn reads_parses_and_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("1.0")).unwrap();
        std::fs::write(
            dir.path().join("1.0").join("yarn.json"),
            r#"{"namespace": "yarn", "classes": [{"source": "a", "name": "Alpha"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("1.0").join("broken.json"), "{").unwrap();

        let release = Release::new("1.0", ReleaseKind::Release, Utc::now());
        let yarn = JsonDirectoryProvider::new("yarn", dir.path());
        let fragment = yarn.fetch(&release).await.unwrap();
        assert_eq!(fragment.classes[0].name.as_deref(), Some("Alpha"));

        let broken = JsonDirectoryProvider::new("broken", dir.path());
        assert!(matches!(broken.fetch(&release).await, Err(ProviderError::Parse { .. })));

        let missing = JsonDirectoryProvider::new("mojang", dir.path());
        assert!(matches!(
            missing.fetch(&release).await,
            Err(ProviderError::Unavailable { .. })
        ));

        assert_eq!(discover_providers(dir.path()).unwrap(), vec!["broken", "yarn"]);
    }
}
