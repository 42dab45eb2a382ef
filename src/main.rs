use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use weft_rs::weft::config::Settings;
use weft_rs::weft::engine::{resolve_order, Engine};
use weft_rs::weft::graph::NodeId;
use weft_rs::weft::loader::GraphLoader;
use weft_rs::weft::nodes::NodeRegistry;
use weft_rs::weft::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a graph document and print one report per sink
    Run {
        /// Path to the graph document (YAML, or JSON by extension)
        #[arg(short, long)]
        file: PathBuf,

        /// Node id to execute; repeatable. Defaults to the document's sinks
        #[arg(short, long)]
        sink: Vec<u64>,
    },
    /// Print the dependency order of a graph document
    Order {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List registered node types
    Types,
    /// Serve the HTTP API
    Serve {
        /// Overrides WEFT_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let registry = NodeRegistry::with_builtin();

    match args.command {
        Commands::Run { file, sink } => {
            let loaded = GraphLoader::new(&registry).load(&file)?;
            let sinks = if sink.is_empty() {
                loaded.sinks
            } else {
                sink.into_iter().map(NodeId::new).collect()
            };

            let engine = Engine::from_settings(&settings)?;
            let reports = engine.run_sinks(&loaded.graph, &sinks).await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Order { file } => {
            let loaded = GraphLoader::new(&registry).load(&file)?;
            let order = resolve_order(&loaded.graph);

            if let Some(cycle) = &order.cycle {
                let path: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
                println!("Cycle detected ({}); using position order", path.join(" -> "));
            }
            for id in order.nodes {
                let title = loaded
                    .graph
                    .node(id)
                    .map(|n| n.title.as_str())
                    .unwrap_or_default();
                println!("{}\t{}", id, title);
            }
        }
        Commands::Types => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::Serve { port } => {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .finish();
            if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                log::warn!("HTTP tracing disabled: {}", e);
            }

            let engine = Engine::from_settings(&settings)?;
            let port = port.unwrap_or(settings.port);
            server::serve(port, AppState::new(registry, engine)).await?;
        }
    }

    Ok(())
}
