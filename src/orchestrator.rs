//! Generation and import pipelines
//!
//! Ties the workspace crates together: submit a server-side job, poll it,
//! download the artifact, hand it to the external generator, and clean up.
//! Each pipeline reports a [`PipelineOutcome`] instead of an error for the
//! expected end states (done, cancelled by the user, failed with a reason).
//!
//! Cleanup discipline: the generator config file is transient, written just
//! before the tool runs and removed after every run, success or not. The
//! downloaded report archive survives a successful run unless
//! `clear-report-after-processing` is set, and is always removed after a
//! failed generator run so a broken archive is never picked up again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use benchlink_artifact::ArtifactStore;
use benchlink_client::types::{ImportRequest, JobKind, ReportParams};
use benchlink_client::JobApi;
use benchlink_config::{Config, GENERATION_CONFIG_FILE_NAME};
use benchlink_poller::{poll_job, CancelFlag, PollError, PollOptions};
use benchlink_runner::GeneratorTool;

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Succeeded,
    Cancelled,
    Failed(String),
}

/// What to generate: the cycle and optional subtree the report is built for.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub project_key: String,
    pub cycle_key: String,
    /// Unique id of a theme to scope the report to; `None` means the whole
    /// cycle.
    pub tree_root_uid: Option<String>,
    /// Build the report from the execution view rather than the
    /// specification view.
    pub execution_based: bool,
}

/// Seam for choosing the generation subject.
///
/// The CLI builds the request from arguments; an interactive frontend walks
/// the tree views. Returning `None` aborts the pipeline before anything is
/// submitted to the server.
#[async_trait]
pub trait SubjectSelector: Send + Sync {
    async fn select(&self) -> Option<GenerationRequest>;
}

/// Parameters of the last successful generation. The read pipeline uses them
/// to fetch the same report again, so results are folded into the archive
/// the tests were generated from.
#[derive(Debug, Clone)]
pub struct LastGenerationParameters {
    pub project_key: String,
    pub cycle_key: String,
    pub tree_root_uid: Option<String>,
    pub execution_based: bool,
}

/// Runs the generate / read / import pipelines.
pub struct GenerationOrchestrator {
    api: Arc<dyn JobApi>,
    tool: Arc<dyn GeneratorTool>,
    store: ArtifactStore,
    config: Config,
    cancel: CancelFlag,
    poll_options: PollOptions,
    last_generation: Option<LastGenerationParameters>,
}

impl GenerationOrchestrator {
    #[must_use]
    pub fn new(
        api: Arc<dyn JobApi>,
        tool: Arc<dyn GeneratorTool>,
        store: ArtifactStore,
        config: Config,
        cancel: CancelFlag,
    ) -> Self {
        let poll_options = PollOptions {
            max_duration: None,
            cancel: cancel.clone(),
        };
        Self {
            api,
            tool,
            store,
            config,
            cancel,
            poll_options,
            last_generation: None,
        }
    }

    /// Parameters of the last successful generation in this session, if any.
    #[must_use]
    pub fn last_generation(&self) -> Option<&LastGenerationParameters> {
        self.last_generation.as_ref()
    }

    fn generation_config_path(&self) -> PathBuf {
        self.store.working_dir().join(GENERATION_CONFIG_FILE_NAME)
    }

    /// Write the generator's JSON config into the working directory,
    /// overwriting whatever a previous run left there.
    async fn write_generation_config(&self) -> Result<PathBuf, String> {
        let path = self.generation_config_path();
        let json = serde_json::to_vec_pretty(&self.config.generation)
            .map_err(|err| format!("cannot serialize generation settings: {err}"))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| format!("cannot create working directory: {err}"))?;
        }
        tokio::fs::write(&path, json)
            .await
            .map_err(|err| format!("cannot write {}: {err}", path.display()))?;
        debug!(path = %path.display(), "generation config written");
        Ok(path)
    }

    async fn delete_generation_config(&self) {
        let path = self.generation_config_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "generation config removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "could not remove generation config"),
        }
    }

    async fn delete_artifact(&self, path: &Path) {
        if let Err(err) = self.store.remove(path).await {
            warn!(path = %path.display(), error = %err, "could not remove report archive");
        }
    }

    /// Full cleanup after a failed or cancelled run: the config file and the
    /// report archive both go.
    async fn cleanup_after_failure(&self, artifact: Option<&Path>) {
        self.delete_generation_config().await;
        if let Some(path) = artifact {
            self.delete_artifact(path).await;
        }
    }

    /// Submit a report job, poll it to completion and store the downloaded
    /// archive in the working directory. Both the generate and the read
    /// pipeline start with this step; neither has created any local state
    /// yet when it fails, so the error arm carries the outcome directly.
    async fn produce_report(
        &self,
        project_key: &str,
        cycle_key: &str,
        tree_root_uid: Option<&str>,
        execution_based: bool,
    ) -> Result<PathBuf, PipelineOutcome> {
        let params = ReportParams {
            based_on_execution: execution_based,
            tree_root_uid: tree_root_uid.map(str::to_string),
            ..ReportParams::default()
        };
        let job_id = self
            .api
            .submit_report_job(project_key, cycle_key, &params)
            .await
            .map_err(|err| {
                PipelineOutcome::Failed(format!("report job submission failed: {err}"))
            })?;
        info!(%job_id, project = %project_key, cycle = %cycle_key, "report job submitted");

        let status = match poll_job(
            self.api.as_ref(),
            project_key,
            JobKind::Report,
            &job_id,
            &self.poll_options,
            |update| info!(percent = update.percent, "report generation progress"),
        )
        .await
        {
            Ok(Some(status)) => status,
            Ok(None) => {
                return Err(PipelineOutcome::Failed(
                    "report job did not complete in time".to_string(),
                ))
            }
            Err(PollError::Cancelled) => return Err(PipelineOutcome::Cancelled),
            Err(PollError::Client(err)) => {
                return Err(PipelineOutcome::Failed(format!(
                    "report job polling failed: {err}"
                )))
            }
        };

        // A report job without an artifact name never left the queue; treat
        // the advisory-budget return the same as a failure here.
        let Some(report_name) = status.report_name().map(str::to_string) else {
            return Err(PipelineOutcome::Failed(
                "report job finished without an artifact".to_string(),
            ));
        };

        let bytes = self
            .api
            .download_artifact(project_key, &report_name)
            .await
            .map_err(|err| PipelineOutcome::Failed(format!("artifact download failed: {err}")))?;
        self.store
            .store(&report_name, &bytes)
            .await
            .map_err(|err| PipelineOutcome::Failed(err.to_string()))
    }

    /// Generate Robot Framework tests for a subject chosen by `selector`.
    ///
    /// Submits a report job, polls it to completion, downloads the archive,
    /// runs the generator and records the parameters for a later
    /// [`Self::read_results`].
    pub async fn generate_tests(&mut self, selector: &dyn SubjectSelector) -> PipelineOutcome {
        let Some(request) = selector.select().await else {
            info!("generation subject selection aborted");
            return PipelineOutcome::Cancelled;
        };

        let report_path = match self
            .produce_report(
                &request.project_key,
                &request.cycle_key,
                request.tree_root_uid.as_deref(),
                request.execution_based,
            )
            .await
        {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };

        if self.cancel.is_cancelled() {
            self.delete_artifact(&report_path).await;
            return PipelineOutcome::Cancelled;
        }

        let config_path = match self.write_generation_config().await {
            Ok(path) => path,
            Err(reason) => {
                self.delete_artifact(&report_path).await;
                return PipelineOutcome::Failed(reason);
            }
        };

        if let Err(err) = self.tool.write_tests(&config_path, &report_path).await {
            self.cleanup_after_failure(Some(&report_path)).await;
            return PipelineOutcome::Failed(format!("test generation failed: {err}"));
        }

        self.delete_generation_config().await;
        if self.config.clear_report_after_processing {
            self.delete_artifact(&report_path).await;
        }
        self.last_generation = Some(LastGenerationParameters {
            project_key: request.project_key,
            cycle_key: request.cycle_key,
            tree_root_uid: request.tree_root_uid,
            execution_based: request.execution_based,
        });
        info!("test generation finished");
        PipelineOutcome::Succeeded
    }

    /// Fold Robot Framework execution results back into an importable
    /// archive, using the parameters of the last successful generation.
    ///
    /// The report is fetched from the server again with those parameters;
    /// the archive the generation run downloaded may already be gone under
    /// `clear-report-after-processing`. Refuses to run without parameters,
    /// and consumes them; a new generation is required before the next read.
    pub async fn read_results(&mut self, output_xml: &Path) -> PipelineOutcome {
        let Some(params) = self.last_generation.take() else {
            return PipelineOutcome::Failed(
                "no previous generation in this session; generate tests first".to_string(),
            );
        };

        let report_path = match self
            .produce_report(
                &params.project_key,
                &params.cycle_key,
                params.tree_root_uid.as_deref(),
                params.execution_based,
            )
            .await
        {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };

        if self.cancel.is_cancelled() {
            self.delete_artifact(&report_path).await;
            return PipelineOutcome::Cancelled;
        }

        let config_path = match self.write_generation_config().await {
            Ok(path) => path,
            Err(reason) => {
                self.delete_artifact(&report_path).await;
                return PipelineOutcome::Failed(reason);
            }
        };
        let results_archive = self.results_archive_path();

        if let Err(err) = self
            .tool
            .read_results(&config_path, output_xml, &results_archive, &report_path)
            .await
        {
            self.cleanup_after_failure(Some(&report_path)).await;
            return PipelineOutcome::Failed(format!("result reading failed: {err}"));
        }

        self.delete_generation_config().await;
        if self.config.clear_report_after_processing {
            self.delete_artifact(&report_path).await;
        }
        info!(archive = %results_archive.display(), "execution results folded into archive");
        PipelineOutcome::Succeeded
    }

    /// Path where [`Self::read_results`] writes the importable archive.
    /// Fixed name, overwritten on each run, like the generator config.
    #[must_use]
    pub fn results_archive_path(&self) -> PathBuf {
        self.store.working_dir().join("ReportWithResults.zip")
    }

    /// Upload a results archive and run the server-side import job.
    pub async fn import_results(
        &self,
        archive: &Path,
        project_key: &str,
        cycle_key: &str,
        report_root_uid: &str,
    ) -> PipelineOutcome {
        let bytes = match tokio::fs::read(archive).await {
            Ok(bytes) => bytes,
            Err(err) => {
                return PipelineOutcome::Failed(format!(
                    "cannot read {}: {err}",
                    archive.display()
                ))
            }
        };

        let file_name = match self.api.upload_execution_results(project_key, bytes).await {
            Ok(name) => name,
            Err(err) => return PipelineOutcome::Failed(format!("archive upload failed: {err}")),
        };

        let request = ImportRequest::new(file_name, report_root_uid);
        let job_id = match self
            .api
            .submit_import_job(project_key, cycle_key, &request)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                return PipelineOutcome::Failed(format!("import job submission failed: {err}"))
            }
        };
        info!(%job_id, project = %project_key, cycle = %cycle_key, "import job submitted");

        match poll_job(
            self.api.as_ref(),
            project_key,
            JobKind::Import,
            &job_id,
            &self.poll_options,
            |update| info!(percent = update.percent, "import progress"),
        )
        .await
        {
            Ok(Some(_)) => {
                info!("execution results imported");
                PipelineOutcome::Succeeded
            }
            Ok(None) => PipelineOutcome::Failed("import job reported failure".to_string()),
            Err(PollError::Cancelled) => PipelineOutcome::Cancelled,
            Err(PollError::Client(err)) => {
                PipelineOutcome::Failed(format!("import job polling failed: {err}"))
            }
        }
    }
}
