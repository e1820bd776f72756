//! Command-line interface
//!
//! Argument parsing plus the glue that builds the client, orchestrator and
//! tree coordinator from configuration. The session token is taken from
//! `--token` or the `BENCHLINK_TOKEN` environment variable; logging in and
//! obtaining a token is done out of band.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::warn;

use benchlink_artifact::ArtifactStore;
use benchlink_client::types::StructureRequest;
use benchlink_client::{JobApi, RemoteJobClient, Session};
use benchlink_config::Config;
use benchlink_poller::CancelFlag;
use benchlink_runner::Tb2RobotTool;
use benchlink_tree::{NodeId, TreeViewCoordinator};

use crate::logging;
use crate::orchestrator::{
    GenerationOrchestrator, GenerationRequest, PipelineOutcome, SubjectSelector,
};

const TOKEN_ENV_VAR: &str = "BENCHLINK_TOKEN";

/// benchlink - test generation pipelines for a TestBench server
#[derive(Parser)]
#[command(name = "benchlink")]
#[command(about = "Generate Robot Framework tests from test cycles and import execution results")]
struct Cli {
    /// Configuration file (default: discover benchlink.toml upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session token (default: $BENCHLINK_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the projects visible to the session
    Projects,

    /// Print the project/version/cycle tree of one project
    Tree {
        /// Project key
        #[arg(long)]
        project: String,
    },

    /// Print the test structure of one cycle
    Themes {
        /// Project key
        #[arg(long)]
        project: String,

        /// Cycle key
        #[arg(long)]
        cycle: String,
    },

    /// Probe the server for its version information
    Versions,

    /// Refresh the session so it does not expire server-side
    KeepAlive,

    /// Invalidate the session token on the server
    Logout,

    /// Generate Robot Framework tests for a cycle or theme
    Generate {
        /// Project key
        #[arg(long)]
        project: String,

        /// Cycle key
        #[arg(long)]
        cycle: String,

        /// Unique id of a theme to restrict the report to
        #[arg(long)]
        theme_uid: Option<String>,

        /// Build the report from the specification view instead of the
        /// execution view
        #[arg(long)]
        specification_based: bool,

        /// After generating, fold this Robot Framework output.xml back into
        /// an importable archive
        #[arg(long)]
        read_output_xml: Option<PathBuf>,
    },

    /// Upload a results archive and import it into a cycle
    Import {
        /// Results archive produced by a read run
        #[arg(long)]
        archive: PathBuf,

        /// Project key
        #[arg(long)]
        project: String,

        /// Cycle key
        #[arg(long)]
        cycle: String,

        /// Unique id of the structure root the archive was generated for
        #[arg(long)]
        root_uid: String,
    },
}

/// Selector that answers with a request built from CLI arguments.
struct ArgsSelector {
    request: GenerationRequest,
}

#[async_trait]
impl SubjectSelector for ArgsSelector {
    async fn select(&self) -> Option<GenerationRequest> {
        Some(self.request.clone())
    }
}

/// Parse arguments and run the chosen command to completion.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose).map_err(|err| anyhow!("logging setup failed: {err}"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run_command(cli))
}

async fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            Config::discover(&cwd)?
        }
    };

    let token = match cli.token.clone() {
        Some(token) => token,
        None => std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| anyhow!("no session token; pass --token or set {TOKEN_ENV_VAR}"))?,
    };
    let session = Session::new(&config.server.name, config.server.port, token);
    let client = Arc::new(RemoteJobClient::new(
        session,
        config.server.accept_invalid_certs,
    )?);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Projects => {
            for project in client.list_projects().await? {
                match &project.status {
                    Some(status) => println!("{}  {} ({status})", project.key, project.name),
                    None => println!("{}  {}", project.key, project.name),
                }
            }
            Ok(())
        }
        Command::Tree { project } => {
            let tree = client.project_tree(&project).await?;
            let mut coordinator = TreeViewCoordinator::new();
            coordinator.load_projects(std::slice::from_ref(&tree));
            for root in coordinator.project_roots()? {
                print_project_subtree(&coordinator, root, 0)?;
            }
            Ok(())
        }
        Command::Themes { project, cycle } => {
            let tree = client.project_tree(&project).await?;
            let mut coordinator = TreeViewCoordinator::new();
            coordinator.load_projects(std::slice::from_ref(&tree));
            let cycle_id = find_by_key(&coordinator, &cycle)?
                .ok_or_else(|| anyhow!("cycle {cycle} not found in project {project}"))?;

            let structure = client
                .fetch_cycle_structure(&project, &cycle, &StructureRequest::default())
                .await?;
            coordinator.offload_cycle(cycle_id, &structure)?;
            for root in coordinator.theme_roots()? {
                print_theme_subtree(&coordinator, root, 0)?;
            }
            Ok(())
        }
        Command::Versions => {
            let versions = client.server_versions().await?;
            println!("release:  {}", versions.release_version);
            println!("database: {}", versions.database_version);
            println!("revision: {}", versions.revision);
            Ok(())
        }
        Command::KeepAlive => {
            client.keep_alive().await?;
            println!("session refreshed");
            Ok(())
        }
        Command::Logout => {
            client.logout().await;
            Ok(())
        }
        Command::Generate {
            project,
            cycle,
            theme_uid,
            specification_based,
            read_output_xml,
        } => {
            let mut orchestrator = build_orchestrator(&config, client, cancel)?;
            let selector = ArgsSelector {
                request: GenerationRequest {
                    project_key: project,
                    cycle_key: cycle,
                    tree_root_uid: theme_uid,
                    execution_based: !specification_based,
                },
            };
            finish(orchestrator.generate_tests(&selector).await)?;

            if let Some(output_xml) = read_output_xml {
                finish(orchestrator.read_results(&output_xml).await)?;
                println!(
                    "results archive: {}",
                    orchestrator.results_archive_path().display()
                );
            }
            Ok(())
        }
        Command::Import {
            archive,
            project,
            cycle,
            root_uid,
        } => {
            let orchestrator = build_orchestrator(&config, client, cancel)?;
            finish(
                orchestrator
                    .import_results(&archive, &project, &cycle, &root_uid)
                    .await,
            )
        }
    }
}

fn build_orchestrator(
    config: &Config,
    client: Arc<RemoteJobClient>,
    cancel: CancelFlag,
) -> Result<GenerationOrchestrator> {
    let workspace = std::env::current_dir().context("cannot determine current directory")?;
    let working_dir = config.working_dir(&workspace);
    let store = ArtifactStore::new(&working_dir);
    let tool = Arc::new(Tb2RobotTool::new(&config.generator_program).working_dir(&working_dir));
    let api: Arc<dyn JobApi> = client;
    Ok(GenerationOrchestrator::new(
        api,
        tool,
        store,
        config.clone(),
        cancel,
    ))
}

fn finish(outcome: PipelineOutcome) -> Result<()> {
    match outcome {
        PipelineOutcome::Succeeded => Ok(()),
        PipelineOutcome::Cancelled => bail!("cancelled"),
        PipelineOutcome::Failed(reason) => bail!(reason),
    }
}

/// Depth-first search for a node key across the project view.
fn find_by_key(coordinator: &TreeViewCoordinator, key: &str) -> Result<Option<NodeId>> {
    let mut stack: Vec<NodeId> = coordinator.project_roots()?;
    while let Some(id) = stack.pop() {
        let node = coordinator.arena().get(id)?;
        if node.key == key {
            return Ok(Some(id));
        }
        // Search the raw child links, not the view: cycles hide their
        // children from the project view.
        stack.extend(node.children.iter().copied());
    }
    Ok(None)
}

fn print_project_subtree(
    coordinator: &TreeViewCoordinator,
    id: NodeId,
    depth: usize,
) -> Result<()> {
    let node = coordinator.arena().get(id)?;
    println!("{}{} [{}]", "  ".repeat(depth), node.label, node.key);
    for child in coordinator.project_children(id)? {
        print_project_subtree(coordinator, child, depth + 1)?;
    }
    Ok(())
}

fn print_theme_subtree(coordinator: &TreeViewCoordinator, id: NodeId, depth: usize) -> Result<()> {
    let node = coordinator.arena().get(id)?;
    println!("{}{}", "  ".repeat(depth), node.label);
    for child in coordinator.theme_children(id)? {
        print_theme_subtree(coordinator, child, depth + 1)?;
    }
    Ok(())
}
