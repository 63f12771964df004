use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use canvasflow_config::{EngineSettings, GraphDef};
use canvasflow_host_http::HttpGenerationService;
use canvasflow_task_runtime::ExecutorRegistry;
use canvasflow_workflow::Graph;
use canvasflow_workflow_orchestrator::WorkflowEngine;

/// Canvasflow - run graphs of generation steps
#[derive(Parser)]
#[command(name = "canvasflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the engine settings file (default: ~/.canvasflow/settings.json)
  #[arg(long, global = true)]
  settings: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a graph and print every node's output as JSON
  Run {
    /// Path to the graph file (JSON), or `-` to read it from stdin
    graph_file: PathBuf,

    /// Base URL of the generation service
    #[arg(long, env = "CANVASFLOW_ENDPOINT")]
    endpoint: String,

    /// Bearer token for the generation service
    #[arg(long, env = "CANVASFLOW_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
  },

  /// Print the order in which a graph's nodes would execute
  Order {
    /// Path to the graph file (JSON), or `-` to read it from stdin
    graph_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvasflow=info,warn")),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      graph_file,
      endpoint,
      api_key,
    }) => {
      let settings = load_settings(cli.settings)?;
      run_graph(graph_file, endpoint, api_key, settings)?;
    }
    Some(Commands::Order { graph_file }) => {
      print_order(&graph_file)?;
    }
    None => {
      println!("canvasflow - use --help to see available commands");
    }
  }

  Ok(())
}

/// Read settings from `path`, or from the default location if it exists.
fn load_settings(path: Option<PathBuf>) -> Result<EngineSettings> {
  let (path, explicit) = match path {
    Some(path) => (path, true),
    None => match dirs::home_dir() {
      Some(home) => (home.join(".canvasflow").join("settings.json"), false),
      None => return Ok(EngineSettings::default()),
    },
  };

  if !explicit && !path.exists() {
    return Ok(EngineSettings::default());
  }

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read settings file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse settings file: {}", path.display()))
}

fn read_graph(graph_file: &Path) -> Result<GraphDef> {
  let content = if graph_file == Path::new("-") {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read graph from stdin")?;
    input
  } else {
    std::fs::read_to_string(graph_file)
      .with_context(|| format!("failed to read graph file: {}", graph_file.display()))?
  };

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse graph file: {}", graph_file.display()))
}

fn print_order(graph_file: &Path) -> Result<()> {
  let graph = Graph::new(read_graph(graph_file)?).context("invalid graph")?;
  let order = graph
    .execution_order()
    .context("failed to order graph")?;

  for node in order {
    println!("{}\t{}", node.id, node.kind());
  }

  Ok(())
}

fn run_graph(
  graph_file: PathBuf,
  endpoint: String,
  api_key: Option<String>,
  settings: EngineSettings,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_graph_async(graph_file, endpoint, api_key, settings).await })
}

async fn run_graph_async(
  graph_file: PathBuf,
  endpoint: String,
  api_key: Option<String>,
  settings: EngineSettings,
) -> Result<()> {
  let graph_def = read_graph(&graph_file)?;
  info!(
    graph = %graph_def.name,
    nodes = graph_def.nodes.len(),
    edges = graph_def.edges.len(),
    "loaded graph"
  );

  let service = HttpGenerationService::new(&endpoint, api_key)
    .context("failed to create generation client")?;
  let registry = ExecutorRegistry::standard(Arc::new(service), &settings);
  let engine = WorkflowEngine::new(registry, settings);

  match engine.execute(graph_def).await {
    Ok(result) => {
      info!(
        execution_id = %result.execution_id,
        nodes_executed = result.context.len(),
        "execution completed"
      );
      println!("{}", serde_json::to_string_pretty(result.context.outputs())?);
      Ok(())
    }
    Err(failure) => {
      // Partial outputs are still useful for diagnosing the failed node.
      println!("{}", serde_json::to_string_pretty(&failure.context)?);
      bail!(
        "execution {} failed ({}): {}",
        failure.execution_id,
        failure.kind(),
        failure.error
      )
    }
  }
}
