//! Configuration model and file discovery
//!
//! Settings live in a `benchlink.toml` found by walking upward from the
//! starting directory, the same way build tools find their manifests. Every
//! field has a default, so a missing file yields a fully usable
//! configuration.
//!
//! The `[generation]` section is passed through to the generator tool as a
//! JSON file; its field names follow the tool's camelCase schema, not the
//! TOML convention of the rest of the file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "benchlink.toml";

/// Fixed name of the JSON config handed to the generator tool. Written into
/// the working directory and overwritten on every run.
pub const GENERATION_CONFIG_FILE_NAME: &str = "generation-config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Connection settings for the play server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    pub name: String,
    pub port: u16,
    /// Trust self-signed certificates. The play server ships with one.
    pub accept_invalid_certs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            port: 9445,
            accept_invalid_certs: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub server: ServerConfig,
    /// Name of the pipeline working directory, created inside the workspace.
    pub working_dir_name: String,
    /// Delete the downloaded report archive once the generator has consumed
    /// it. The generator config file is deleted regardless.
    pub clear_report_after_processing: bool,
    /// Program name or path of the generator tool.
    pub generator_program: String,
    pub generation: GenerationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            working_dir_name: "Report".to_string(),
            clear_report_after_processing: false,
            generator_program: "tb2robot".to_string(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration for `start_dir`: walk upward until a
    /// `benchlink.toml` is found, falling back to defaults when none exists.
    pub fn discover(start_dir: &Path) -> Result<Self, ConfigError> {
        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            dir = current.parent();
        }
        debug!(start = %start_dir.display(), "no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// The pipeline working directory under the given workspace root.
    #[must_use]
    pub fn working_dir(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.working_dir_name)
    }
}

/// Settings serialized to JSON for the generator tool.
///
/// Field names and defaults follow the tool's own configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub rf_library_roots: Vec<String>,
    pub rf_resource_roots: Vec<String>,
    pub fully_qualified: bool,
    pub generation_directory: String,
    pub create_output_zip: bool,
    pub resource_directory: String,
    pub clear_generation_directory: bool,
    pub log_suite_numbering: bool,
    pub log_compound_interactions: bool,
    pub subdivisions_mapping: SubdivisionsMapping,
    pub forced_import: ForcedImport,
    #[serde(rename = "testCaseSplitPathRegEx")]
    pub test_case_split_path_regex: String,
    pub logging_configuration: LoggingConfiguration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            rf_library_roots: vec!["Interactions".to_string(), "RF-Library".to_string()],
            rf_resource_roots: vec!["RF-Resource".to_string()],
            fully_qualified: true,
            generation_directory: "generated".to_string(),
            create_output_zip: true,
            resource_directory: "resources".to_string(),
            clear_generation_directory: true,
            log_suite_numbering: true,
            log_compound_interactions: true,
            subdivisions_mapping: SubdivisionsMapping::default(),
            forced_import: ForcedImport::default(),
            test_case_split_path_regex: "^StopWithRestart\\..*".to_string(),
            logging_configuration: LoggingConfiguration::default(),
        }
    }
}

/// Maps subdivision names to library or resource import lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubdivisionsMapping {
    pub libraries: BTreeMap<String, String>,
    pub resources: BTreeMap<String, String>,
}

/// Imports added to every generated suite regardless of subdivisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForcedImport {
    pub libraries: Vec<String>,
    pub resources: Vec<String>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfiguration {
    pub console: ConsoleLogging,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleLogging {
    #[serde(rename = "logLevel")]
    pub log_level: String,
}

impl Default for ConsoleLogging {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
