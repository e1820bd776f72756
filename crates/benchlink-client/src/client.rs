//! Concrete HTTP client against the play server

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::api::JobApi;
use crate::error::ClientError;
use crate::session::Session;
use crate::types::{
    CycleStructure, ImportRequest, JobId, JobIdResponse, JobKind, JobStatus, ProjectNode,
    ProjectSummary, ReportParams, ServerVersions, StructureRequest, UploadResponse,
};

const ACCEPT_PLAY: &str = "application/vnd.testbench+json";

/// HTTP client for the play server, holding the session and connection pool.
///
/// Construction fails only if the underlying TLS backend cannot be
/// initialized. All request methods borrow `self`; the client is safe to
/// share behind an `Arc`.
pub struct RemoteJobClient {
    session: Session,
    http: reqwest::Client,
}

impl RemoteJobClient {
    /// Build a client for the given session.
    ///
    /// `accept_invalid_certs` disables certificate verification for servers
    /// running with self-signed certificates, which is the factory default of
    /// the play server.
    pub fn new(session: Session, accept_invalid_certs: bool) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_PLAY));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { session, http })
    }

    /// Every authorized call checks the token up front; an empty token means
    /// the caller never logged in (or the session was dropped) and no amount
    /// of retrying will help.
    fn ensure_session(&self) -> Result<(), ClientError> {
        if self.session.token().is_empty() {
            return Err(ClientError::ConnectionMissing);
        }
        Ok(())
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(AUTHORIZATION, self.session.token())
    }

    /// Map a non-success response to a [`ClientError`], reading the body as
    /// the error message when there is one.
    async fn check(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                resource: resource.to_string(),
            });
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    /// List all projects visible to the session.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ClientError> {
        self.ensure_session()?;
        let url = self.session.url("projects/v1");
        let response = self.auth(self.http.get(&url)).send().await?;
        let projects = Self::check(response, "project list")
            .await?
            .json::<Vec<ProjectSummary>>()
            .await?;
        debug!(count = projects.len(), "fetched project list");
        Ok(projects)
    }

    /// Fetch the nested project/version/cycle tree of one project.
    pub async fn project_tree(&self, project_key: &str) -> Result<ProjectNode, ClientError> {
        self.ensure_session()?;
        let url = self.session.url(&format!("projects/{project_key}/tree/v1"));
        let response = self.auth(self.http.get(&url)).send().await?;
        Ok(Self::check(response, &format!("project tree {project_key}"))
            .await?
            .json::<ProjectNode>()
            .await?)
    }

    /// Probe the server for its version information. Needs no session token.
    pub async fn server_versions(&self) -> Result<ServerVersions, ClientError> {
        let url = self.session.url("serverVersions/v1");
        let response = self.http.get(&url).send().await?;
        Ok(Self::check(response, "server versions")
            .await?
            .json::<ServerVersions>()
            .await?)
    }

    /// Refresh the session on the server so it does not expire.
    pub async fn keep_alive(&self) -> Result<(), ClientError> {
        self.ensure_session()?;
        let url = self.session.url("login/session/v1");
        let response = self.auth(self.http.get(&url)).send().await?;
        Self::check(response, "session").await?;
        Ok(())
    }

    /// Invalidate the session token on the server.
    ///
    /// A failed logout is logged and swallowed; the local session is
    /// discarded either way.
    pub async fn logout(&self) {
        let url = self.session.url("login/session/v1");
        match self.auth(self.http.delete(&url)).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("session closed");
            }
            Ok(response) => {
                warn!(status = %response.status(), "logout rejected by server");
            }
            Err(err) => {
                warn!(error = %err, "logout request failed");
            }
        }
    }
}

#[async_trait]
impl JobApi for RemoteJobClient {
    async fn submit_report_job(
        &self,
        project_key: &str,
        cycle_key: &str,
        params: &ReportParams,
    ) -> Result<JobId, ClientError> {
        self.ensure_session()?;
        let url = self
            .session
            .url(&format!("projects/{project_key}/cycles/{cycle_key}/report/v1"));
        let response = self.auth(self.http.post(&url)).json(params).send().await?;
        let body = Self::check(response, "report job submission")
            .await?
            .json::<JobIdResponse>()
            .await?;
        debug!(job_id = %body.job_id, %project_key, %cycle_key, "report job submitted");
        Ok(body.job_id)
    }

    async fn submit_import_job(
        &self,
        project_key: &str,
        cycle_key: &str,
        request: &ImportRequest,
    ) -> Result<JobId, ClientError> {
        self.ensure_session()?;
        let url = self
            .session
            .url(&format!("projects/{project_key}/cycles/{cycle_key}/import/v1"));
        let response = self.auth(self.http.post(&url)).json(request).send().await?;
        let body = Self::check(response, "import job submission")
            .await?
            .json::<JobIdResponse>()
            .await?;
        debug!(job_id = %body.job_id, %project_key, %cycle_key, "import job submitted");
        Ok(body.job_id)
    }

    async fn job_status(
        &self,
        project_key: &str,
        kind: JobKind,
        job_id: &JobId,
    ) -> Result<JobStatus, ClientError> {
        self.ensure_session()?;
        let url = self.session.url(&format!(
            "projects/{project_key}/{}/job/{job_id}/v1",
            kind.path_segment()
        ));
        let response = self.auth(self.http.get(&url)).send().await?;
        Ok(Self::check(response, &format!("{kind} job {job_id}"))
            .await?
            .json::<JobStatus>()
            .await?)
    }

    async fn download_artifact(
        &self,
        project_key: &str,
        report_name: &str,
    ) -> Result<Vec<u8>, ClientError> {
        self.ensure_session()?;
        let url = self
            .session
            .url(&format!("projects/{project_key}/report/{report_name}/v1"));
        let response = self.auth(self.http.get(&url)).send().await?;
        let bytes = Self::check(response, &format!("report {report_name}"))
            .await?
            .bytes()
            .await?;
        debug!(%report_name, size = bytes.len(), "downloaded report artifact");
        Ok(bytes.to_vec())
    }

    async fn upload_execution_results(
        &self,
        project_key: &str,
        archive: Vec<u8>,
    ) -> Result<String, ClientError> {
        self.ensure_session()?;
        let url = self
            .session
            .url(&format!("projects/{project_key}/executionResults/v1"));
        let response = self
            .auth(self.http.post(&url))
            .header("Content-Type", "application/zip")
            .body(archive)
            .send()
            .await?;
        let body = Self::check(response, "execution results upload")
            .await?
            .json::<UploadResponse>()
            .await?;
        debug!(file_name = %body.file_name, "uploaded execution results");
        Ok(body.file_name)
    }

    async fn fetch_cycle_structure(
        &self,
        project_key: &str,
        cycle_key: &str,
        request: &StructureRequest,
    ) -> Result<CycleStructure, ClientError> {
        self.ensure_session()?;
        let url = self.session.url(&format!(
            "projects/{project_key}/cycles/{cycle_key}/structure/v1"
        ));
        let response = self.auth(self.http.post(&url)).json(request).send().await?;
        Ok(
            Self::check(response, &format!("cycle structure {cycle_key}"))
                .await?
                .json::<CycleStructure>()
                .await?,
        )
    }
}
