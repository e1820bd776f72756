//! Generator tool seam and the tb2robot implementation

use std::path::Path;

use async_trait::async_trait;

use crate::command_spec::CommandSpec;
use crate::process::run_command;
use crate::RunnerError;

/// The two generator operations the pipelines need.
///
/// Implemented by [`Tb2RobotTool`] for real runs and by fakes in pipeline
/// tests.
#[async_trait]
pub trait GeneratorTool: Send + Sync {
    /// Generate Robot Framework suites from a report archive.
    async fn write_tests(&self, config: &Path, report: &Path) -> Result<(), RunnerError>;

    /// Fold execution results back into an importable archive.
    async fn read_results(
        &self,
        config: &Path,
        output_xml: &Path,
        results_archive: &Path,
        report: &Path,
    ) -> Result<(), RunnerError>;
}

/// Drives the `tb2robot` command-line generator.
#[derive(Debug, Clone)]
pub struct Tb2RobotTool {
    program: String,
    working_dir: Option<std::path::PathBuf>,
}

impl Tb2RobotTool {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
        }
    }

    /// Run the tool from this directory so relative paths in the generation
    /// config resolve against it.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn base(&self) -> CommandSpec {
        let spec = CommandSpec::new(&self.program);
        match &self.working_dir {
            Some(dir) => spec.current_dir(dir),
            None => spec,
        }
    }

    fn write_command(&self, config: &Path, report: &Path) -> CommandSpec {
        self.base()
            .arg("write")
            .arg("-c")
            .path_arg(config)
            .path_arg(report)
    }

    fn read_command(
        &self,
        config: &Path,
        output_xml: &Path,
        results_archive: &Path,
        report: &Path,
    ) -> CommandSpec {
        self.base()
            .arg("read")
            .arg("-c")
            .path_arg(config)
            .arg("-o")
            .path_arg(output_xml)
            .arg("-r")
            .path_arg(results_archive)
            .path_arg(report)
    }
}

#[async_trait]
impl GeneratorTool for Tb2RobotTool {
    async fn write_tests(&self, config: &Path, report: &Path) -> Result<(), RunnerError> {
        run_command(&self.write_command(config, report)).await
    }

    async fn read_results(
        &self,
        config: &Path,
        output_xml: &Path,
        results_archive: &Path,
        report: &Path,
    ) -> Result<(), RunnerError> {
        run_command(&self.read_command(config, output_xml, results_archive, report)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_command_shape() {
        let tool = Tb2RobotTool::new("tb2robot");
        let spec = tool.write_command(Path::new("config.json"), Path::new("report.zip"));
        assert_eq!(spec.to_string(), "tb2robot write -c config.json report.zip");
    }

    #[test]
    fn test_read_command_shape() {
        let tool = Tb2RobotTool::new("tb2robot");
        let spec = tool.read_command(
            Path::new("config.json"),
            Path::new("output.xml"),
            Path::new("result.zip"),
            Path::new("report.zip"),
        );
        assert_eq!(
            spec.to_string(),
            "tb2robot read -c config.json -o output.xml -r result.zip report.zip"
        );
    }

    #[test]
    fn test_working_dir_propagates() {
        let tool = Tb2RobotTool::new("tb2robot").working_dir("/tmp/work");
        let spec = tool.write_command(Path::new("c.json"), Path::new("r.zip"));
        assert_eq!(spec.cwd(), Some(Path::new("/tmp/work")));
    }
}
