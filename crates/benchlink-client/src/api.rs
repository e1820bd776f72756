//! Server-job API seam
//!
//! The polling loop and the generation pipelines only need the handful of
//! operations below, so they take `&dyn JobApi` instead of the concrete
//! client. Tests swap in scripted fakes.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{
    CycleStructure, ImportRequest, JobId, JobKind, JobStatus, ReportParams, StructureRequest,
};

/// Operations on server-side jobs and their artifacts.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submit a report-generation job for a test cycle. Returns the job id.
    async fn submit_report_job(
        &self,
        project_key: &str,
        cycle_key: &str,
        params: &ReportParams,
    ) -> Result<JobId, ClientError>;

    /// Submit an execution-results import job for a test cycle.
    async fn submit_import_job(
        &self,
        project_key: &str,
        cycle_key: &str,
        request: &ImportRequest,
    ) -> Result<JobId, ClientError>;

    /// Read the current status of a job of the given kind.
    async fn job_status(
        &self,
        project_key: &str,
        kind: JobKind,
        job_id: &JobId,
    ) -> Result<JobStatus, ClientError>;

    /// Download a finished report artifact by name. Returns the raw bytes.
    async fn download_artifact(
        &self,
        project_key: &str,
        report_name: &str,
    ) -> Result<Vec<u8>, ClientError>;

    /// Upload an execution-results archive. Returns the server-side file name.
    async fn upload_execution_results(
        &self,
        project_key: &str,
        archive: Vec<u8>,
    ) -> Result<String, ClientError>;

    /// Fetch the flat node list of a cycle's test structure.
    async fn fetch_cycle_structure(
        &self,
        project_key: &str,
        cycle_key: &str,
        request: &StructureRequest,
    ) -> Result<CycleStructure, ClientError>;
}
