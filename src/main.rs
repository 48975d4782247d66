use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tradegraph::dataset::Dataset;
use tradegraph::io::FormatRegistry;
use tradegraph::server::{self, AppState};
use tradegraph::source::ConfiguredSource;
use tradegraph::view::{LoadState, ShipmentView};

/// Route map and cluster graph generator for trade-shipment data.
#[derive(Parser)]
#[command(name = "tradegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// URL of the shipment API (must answer with a JSON array)
    #[arg(long, global = true, env = "TRADEGRAPH_SOURCE_URL")]
    url: Option<String>,

    /// Local JSON export to read instead of the URL
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Request timeout in seconds (none by default)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output directory for generated files
    #[arg(short, long, global = true, default_value = "output")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write pages and JSON to the output directory (default behavior)
    Render {
        /// Output formats, comma separated
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "html,graph-json,routes-json"
        )]
        format: Vec<String>,
    },
    /// Print the cluster graph JSON to stdout
    Graph,
    /// Start the password-gated preview server
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Access password for the login page
        #[arg(long, env = "TRADEGRAPH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

impl Cli {
    fn source(&self) -> anyhow::Result<Option<ConfiguredSource>> {
        let timeout = self.timeout.map(Duration::from_secs);
        Ok(ConfiguredSource::from_config(
            self.url.as_deref(),
            self.input.as_deref(),
            timeout,
        )?)
    }
}

/// Fetch once and return the loaded dataset, or the reason it is missing
async fn load(source: Option<ConfiguredSource>) -> anyhow::Result<Dataset> {
    let mut view = ShipmentView::mount(source);
    match view.loaded().await {
        LoadState::Ready(dataset) => Ok(dataset),
        LoadState::Unavailable => {
            anyhow::bail!("no shipment source configured; pass --url or --input")
        }
        LoadState::Failed(e) => Err(anyhow::anyhow!("{}", e)).context("failed to load shipments"),
        LoadState::Loading => anyhow::bail!("shipment load did not complete"),
    }
}

async fn render(source: Option<ConfiguredSource>, output: &Path, formats: &[String]) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_defaults();
    // Resolve every format before fetching so typos fail fast
    let writers = formats
        .iter()
        .map(|f| registry.writer_for_format(f.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    let dataset = load(source).await?;
    for writer in writers {
        writer.write(&dataset, output)?;
        tracing::debug!(format = writer.format_id(), "wrote output");
    }

    let graph = dataset.graph();
    println!(
        "Rendered {} shipments ({} nodes, {} edges, {} routes) in {}",
        dataset.records().len(),
        graph.nodes.len(),
        graph.edges.len(),
        dataset.routes().len(),
        output.display()
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let source = cli.source()?;

    match cli.command {
        Some(Commands::Render { ref format }) => {
            render(source, &cli.output, format).await?;
        }
        Some(Commands::Graph) => {
            let dataset = load(source).await?;
            println!("{}", serde_json::to_string_pretty(dataset.graph())?);
        }
        Some(Commands::Serve { port, password }) => {
            server::serve(AppState::new(source, password), port).await?;
        }
        None => {
            let formats: Vec<String> = FormatRegistry::with_defaults()
                .format_ids()
                .into_iter()
                .map(String::from)
                .collect();
            render(source, &cli.output, &formats).await?;
        }
    }

    Ok(())
}
