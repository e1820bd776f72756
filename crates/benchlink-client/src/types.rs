//! Wire types for the play server API
//!
//! The job-status payload reports its outcome as a set of optional fields
//! (`ReportingSuccess`, `ExecutionImportingSuccess`, `ExecutionImportingFailure`);
//! deserialization converts that shape into the exhaustive [`JobResult`] enum so
//! callers match on a tagged variant instead of probing optionals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a server-side asynchronous job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two job families the server exposes, each with its own status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Report,
    Import,
}

impl JobKind {
    /// URL path segment of the status endpoint for this kind.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            JobKind::Report => "report",
            JobKind::Import => "import",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Response body of a job submission call.
#[derive(Debug, Clone, Deserialize)]
pub struct JobIdResponse {
    #[serde(rename = "jobID")]
    pub job_id: JobId,
}

/// Item counters reported while a job is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub total_items_count: u64,
    pub handled_items_count: u64,
}

/// Successful outcome of a report job: the name of the generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSuccess {
    pub report_name: String,
}

/// Error detail attached to an import outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportError {
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub description: String,
}

/// Per-test-case-set detail of a successful import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedTestCaseSet {
    pub key: String,
    #[serde(default)]
    pub execution_key: String,
    #[serde(default)]
    pub finished: bool,
}

/// Successful outcome of an import job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSuccess {
    #[serde(default)]
    pub test_case_sets: Vec<ImportedTestCaseSet>,
}

/// Failure outcome of an import job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFailure {
    pub error: ImportError,
}

/// Terminal outcome of a job, as a tagged variant.
///
/// Report jobs only ever complete with `Report`; the server has no failure
/// arm for them, an unsuccessful report job simply never completes.
#[derive(Debug, Clone)]
pub enum JobResult {
    Report(ReportSuccess),
    ImportSuccess(ImportSuccess),
    ImportFailure(ImportFailure),
}

/// Raw `completion.result` wire shape: one of three optional fields.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawJobResult {
    #[serde(rename = "ReportingSuccess")]
    reporting_success: Option<ReportSuccess>,
    #[serde(rename = "ExecutionImportingSuccess")]
    execution_importing_success: Option<ImportSuccess>,
    #[serde(rename = "ExecutionImportingFailure")]
    execution_importing_failure: Option<ImportFailure>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCompletion {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    result: Option<RawJobResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawJobStatus {
    id: String,
    #[serde(default)]
    progress: Option<JobProgress>,
    #[serde(default)]
    completion: Option<RawCompletion>,
}

/// Status of a server-side job, one observation per poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawJobStatus")]
pub struct JobStatus {
    pub id: JobId,
    pub progress: Option<JobProgress>,
    pub completion_time: Option<String>,
    pub result: Option<JobResult>,
}

impl From<RawJobStatus> for JobStatus {
    fn from(raw: RawJobStatus) -> Self {
        let completion_time = raw.completion.as_ref().and_then(|c| c.time.clone());
        let result = raw
            .completion
            .and_then(|c| c.result)
            .and_then(|r| {
                if let Some(report) = r.reporting_success {
                    Some(JobResult::Report(report))
                } else if let Some(failure) = r.execution_importing_failure {
                    Some(JobResult::ImportFailure(failure))
                } else {
                    r.execution_importing_success.map(JobResult::ImportSuccess)
                }
            });

        JobStatus {
            id: JobId(raw.id),
            progress: raw.progress,
            completion_time,
            result,
        }
    }
}

impl JobStatus {
    /// The artifact name carried by a completed report job, if any.
    #[must_use]
    pub fn report_name(&self) -> Option<&str> {
        match &self.result {
            Some(JobResult::Report(success)) => Some(&success.report_name),
            _ => None,
        }
    }
}

/// Filter entry for report and import requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFilter {
    pub name: String,
    pub filter_type: String,
    #[serde(rename = "testThemeUID")]
    pub test_theme_uid: String,
}

/// Request body of a report-job submission.
///
/// `tree_root_uid` scopes the report to a subtree; an empty string (or `None`)
/// means the whole cycle.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub based_on_execution: bool,
    #[serde(rename = "treeRootUID", skip_serializing_if = "Option::is_none")]
    pub tree_root_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_filtered_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_not_executable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_empty_test_themes: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub filters: Vec<ThemeFilter>,
}

/// Request body of an import-job submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub file_name: String,
    #[serde(rename = "reportRootUID")]
    pub report_root_uid: String,
    pub use_existing_defect: bool,
    pub ignore_non_executed_test_cases: bool,
    pub check_paths: bool,
    pub discard_tester_information: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tester: Option<String>,
    pub filters: Vec<ThemeFilter>,
}

impl ImportRequest {
    /// Standard import request for a previously uploaded results archive.
    #[must_use]
    pub fn new(file_name: impl Into<String>, report_root_uid: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            report_root_uid: report_root_uid.into(),
            use_existing_defect: true,
            ignore_non_executed_test_cases: true,
            check_paths: true,
            discard_tester_information: false,
            default_tester: None,
            filters: Vec::new(),
        }
    }
}

/// Request body of a cycle-structure fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureRequest {
    pub based_on_execution: bool,
    pub suppress_filtered_data: bool,
    pub suppress_not_executable: bool,
    pub suppress_empty_test_themes: bool,
    pub filters: Vec<ThemeFilter>,
}

impl Default for StructureRequest {
    fn default() -> Self {
        Self {
            based_on_execution: true,
            suppress_filtered_data: false,
            suppress_not_executable: false,
            suppress_empty_test_themes: false,
            filters: Vec::new(),
        }
    }
}

/// Node classification across both the project tree and cycle structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Project,
    Version,
    Cycle,
    #[serde(rename = "TestThemeNode")]
    TestTheme,
    #[serde(rename = "TestCaseSetNode")]
    TestCaseSet,
    #[serde(rename = "TestCaseNode")]
    TestCase,
}

impl ElementType {
    /// The innermost leaf type; excluded from structural tree expansion.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        matches!(self, ElementType::TestCase)
    }
}

/// Identity fields shared by all cycle-structure nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBase {
    pub key: String,
    #[serde(default)]
    pub parent_key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub numbering: Option<String>,
    #[serde(rename = "uniqueID", default)]
    pub unique_id: String,
}

impl NodeBase {
    /// Display label: numbering prefix plus name, matching the server UI.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.numbering {
            Some(numbering) if !numbering.is_empty() => format!("{numbering} {}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A single node of a cycle structure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleNode {
    pub element_type: ElementType,
    pub base: NodeBase,
}

/// Flat cycle structure: a declared root plus all nodes keyed by parent links.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleStructure {
    pub root: CycleNode,
    pub nodes: Vec<CycleNode>,
}

/// A node of the nested project tree (projects, versions, cycles).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    pub node_type: ElementType,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<ProjectNode>>,
}

/// Summary entry of the project list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Version information of the server, also serves as a reachability check.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersions {
    pub release_version: String,
    pub database_version: String,
    pub revision: String,
}

/// Response body of a results-archive upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
}
