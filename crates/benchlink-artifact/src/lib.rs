//! Local persistence and cleanup of downloaded report artifacts
//!
//! Report artifacts are zip archives downloaded from the server. The store
//! writes them either straight into the working directory (pipeline use) or
//! through a [`SavePrompt`] that lets a frontend pick the destination and
//! veto overwrites (interactive use).
//!
//! Removal is deliberately narrow: the store only ever deletes `.zip` files,
//! so a misconfigured path can never take out unrelated data.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use benchlink_client::{ClientError, JobApi};

/// Errors raised by artifact persistence and cleanup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to delete {path}: not a zip artifact")]
    NotAnArtifact { path: PathBuf },

    #[error(transparent)]
    Download(#[from] ClientError),
}

/// Outcome of an overwrite confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    Overwrite,
    Skip,
}

/// Frontend seam for interactive saves.
///
/// `pick_destination` returns `None` when the user dismisses the dialog;
/// the save is then silently dropped.
#[async_trait]
pub trait SavePrompt: Send + Sync {
    async fn pick_destination(&self, suggested: &Path) -> Option<PathBuf>;
    async fn confirm_overwrite(&self, path: &Path) -> OverwriteChoice;
}

/// Prompt that accepts the suggested destination and overwrites without
/// asking. Used by the non-interactive CLI paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptSuggested;

#[async_trait]
impl SavePrompt for AcceptSuggested {
    async fn pick_destination(&self, suggested: &Path) -> Option<PathBuf> {
        Some(suggested.to_path_buf())
    }

    async fn confirm_overwrite(&self, _path: &Path) -> OverwriteChoice {
        OverwriteChoice::Overwrite
    }
}

/// Prompt that declines everything: no destination, no overwrites. For
/// headless runs where an interactive save must never block.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

#[async_trait]
impl SavePrompt for DeclineAll {
    async fn pick_destination(&self, _suggested: &Path) -> Option<PathBuf> {
        None
    }

    async fn confirm_overwrite(&self, _path: &Path) -> OverwriteChoice {
        OverwriteChoice::Skip
    }
}

/// Store rooted at the working directory where pipeline artifacts land.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    working_dir: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Path an artifact with this name would occupy in the working directory.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.working_dir.join(name)
    }

    /// Write artifact bytes into the working directory, creating it if
    /// needed. Existing files are overwritten; the pipeline owns this
    /// directory.
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        tokio::fs::create_dir_all(&self.working_dir)
            .await
            .map_err(|source| ArtifactError::Io {
                path: self.working_dir.clone(),
                source,
            })?;
        let path = self.artifact_path(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), size = bytes.len(), "stored artifact");
        Ok(path)
    }

    /// Save artifact bytes through a [`SavePrompt`].
    ///
    /// Returns `Ok(None)` when the prompt dismisses the save or declines to
    /// overwrite an existing file; neither is an error.
    pub async fn save_with_prompt(
        &self,
        name: &str,
        bytes: &[u8],
        prompt: &dyn SavePrompt,
    ) -> Result<Option<PathBuf>, ArtifactError> {
        let suggested = self.artifact_path(name);
        let Some(destination) = prompt.pick_destination(&suggested).await else {
            debug!(%name, "save dismissed");
            return Ok(None);
        };

        if destination.exists()
            && prompt.confirm_overwrite(&destination).await == OverwriteChoice::Skip
        {
            debug!(path = %destination.display(), "overwrite declined");
            return Ok(None);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ArtifactError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&destination, bytes)
            .await
            .map_err(|source| ArtifactError::Io {
                path: destination.clone(),
                source,
            })?;
        debug!(path = %destination.display(), "saved artifact");
        Ok(Some(destination))
    }

    /// Persist artifact bytes: unprompted into the working directory when it
    /// already exists, through the prompt otherwise.
    pub async fn persist(
        &self,
        name: &str,
        bytes: &[u8],
        prompt: &dyn SavePrompt,
    ) -> Result<Option<PathBuf>, ArtifactError> {
        if self.working_dir.is_dir() {
            return self.store(name, bytes).await.map(Some);
        }
        self.save_with_prompt(name, bytes, prompt).await
    }

    /// Download a report artifact and persist it in one step.
    pub async fn download_and_persist(
        &self,
        api: &dyn JobApi,
        project_key: &str,
        report_name: &str,
        prompt: &dyn SavePrompt,
    ) -> Result<Option<PathBuf>, ArtifactError> {
        let bytes = api.download_artifact(project_key, report_name).await?;
        self.persist(report_name, &bytes, prompt).await
    }

    /// Delete a previously stored artifact.
    ///
    /// Only `.zip` files are eligible. A missing file is logged and treated
    /// as already removed.
    pub async fn remove(&self, path: &Path) -> Result<(), ArtifactError> {
        if path.extension().and_then(|ext| ext.to_str()) != Some("zip") {
            return Err(ArtifactError::NotAnArtifact {
                path: path.to_path_buf(),
            });
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed artifact");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "artifact already gone");
                Ok(())
            }
            Err(source) => Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Prompt scripted with a fixed destination and overwrite choice.
    struct ScriptedPrompt {
        destination: Option<PathBuf>,
        overwrite: OverwriteChoice,
        overwrite_asked: Mutex<bool>,
    }

    impl ScriptedPrompt {
        fn new(destination: Option<PathBuf>, overwrite: OverwriteChoice) -> Self {
            Self {
                destination,
                overwrite,
                overwrite_asked: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl SavePrompt for ScriptedPrompt {
        async fn pick_destination(&self, _suggested: &Path) -> Option<PathBuf> {
            self.destination.clone()
        }

        async fn confirm_overwrite(&self, _path: &Path) -> OverwriteChoice {
            *self.overwrite_asked.lock().unwrap() = true;
            self.overwrite
        }
    }

    #[tokio::test]
    async fn test_store_creates_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested").join("work"));

        let path = store.store("report.zip", b"zipbytes").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"zipbytes");
    }

    #[tokio::test]
    async fn test_save_dismissed_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let prompt = ScriptedPrompt::new(None, OverwriteChoice::Overwrite);

        let saved = store
            .save_with_prompt("report.zip", b"data", &prompt)
            .await
            .unwrap();
        assert!(saved.is_none());
        assert!(!dir.path().join("report.zip").exists());
    }

    #[tokio::test]
    async fn test_save_declined_overwrite_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("report.zip");
        tokio::fs::write(&existing, b"old").await.unwrap();

        let store = ArtifactStore::new(dir.path());
        let prompt = ScriptedPrompt::new(Some(existing.clone()), OverwriteChoice::Skip);

        let saved = store
            .save_with_prompt("report.zip", b"new", &prompt)
            .await
            .unwrap();
        assert!(saved.is_none());
        assert_eq!(tokio::fs::read(&existing).await.unwrap(), b"old");
        assert!(*prompt.overwrite_asked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_save_overwrites_when_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("report.zip");
        tokio::fs::write(&existing, b"old").await.unwrap();

        let store = ArtifactStore::new(dir.path());
        let saved = store
            .save_with_prompt("report.zip", b"new", &AcceptSuggested)
            .await
            .unwrap();
        assert_eq!(saved, Some(existing.clone()));
        assert_eq!(tokio::fs::read(&existing).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_persist_skips_prompt_when_working_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        // DeclineAll would refuse, but no prompt happens for an existing dir.
        let saved = store
            .persist("report.zip", b"data", &DeclineAll)
            .await
            .unwrap();
        assert_eq!(saved, Some(dir.path().join("report.zip")));
    }

    #[tokio::test]
    async fn test_persist_prompts_when_working_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("absent"));

        let saved = store
            .persist("report.zip", b"data", &DeclineAll)
            .await
            .unwrap();
        assert!(saved.is_none());
    }

    #[tokio::test]
    async fn test_remove_refuses_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("output.xml");
        tokio::fs::write(&file, b"keep me").await.unwrap();

        let store = ArtifactStore::new(dir.path());
        let err = store.remove(&file).await.unwrap_err();
        assert!(matches!(err, ArtifactError::NotAnArtifact { .. }));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_zip_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .remove(&dir.path().join("gone.zip"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_deletes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.store("report.zip", b"data").await.unwrap();

        store.remove(&path).await.unwrap();
        assert!(!path.exists());
    }

    /// Server fake that only serves downloads.
    struct DownloadOnly;

    #[async_trait]
    impl JobApi for DownloadOnly {
        async fn submit_report_job(
            &self,
            _project_key: &str,
            _cycle_key: &str,
            _params: &benchlink_client::types::ReportParams,
        ) -> Result<benchlink_client::types::JobId, ClientError> {
            unreachable!()
        }

        async fn submit_import_job(
            &self,
            _project_key: &str,
            _cycle_key: &str,
            _request: &benchlink_client::types::ImportRequest,
        ) -> Result<benchlink_client::types::JobId, ClientError> {
            unreachable!()
        }

        async fn job_status(
            &self,
            _project_key: &str,
            _kind: benchlink_client::types::JobKind,
            _job_id: &benchlink_client::types::JobId,
        ) -> Result<benchlink_client::types::JobStatus, ClientError> {
            unreachable!()
        }

        async fn download_artifact(
            &self,
            _project_key: &str,
            report_name: &str,
        ) -> Result<Vec<u8>, ClientError> {
            if report_name == "missing.zip" {
                return Err(ClientError::NotFound {
                    resource: report_name.to_string(),
                });
            }
            Ok(b"zipbytes".to_vec())
        }

        async fn upload_execution_results(
            &self,
            _project_key: &str,
            _archive: Vec<u8>,
        ) -> Result<String, ClientError> {
            unreachable!()
        }

        async fn fetch_cycle_structure(
            &self,
            _project_key: &str,
            _cycle_key: &str,
            _request: &benchlink_client::types::StructureRequest,
        ) -> Result<benchlink_client::types::CycleStructure, ClientError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_download_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let saved = store
            .download_and_persist(&DownloadOnly, "p1", "r.zip", &AcceptSuggested)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tokio::fs::read(&saved).await.unwrap(), b"zipbytes");
    }

    #[tokio::test]
    async fn test_download_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store
            .download_and_persist(&DownloadOnly, "p1", "missing.zip", &AcceptSuggested)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Download(ClientError::NotFound { .. })
        ));
    }
}
