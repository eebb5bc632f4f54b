use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use wirelink::editor::block_catalog::{
    BlockCatalogEntry, get_block_catalog, group_by_category, load_catalog,
};
use wirelink::editor::{EditorEvent, EditorState, view};
use wirelink::{Diagram, DiagramDoc, EditorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect function-block diagrams and replay editor events", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Layout/routing configuration file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<Utf8PathBuf>,
    /// Block catalog file (JSON array) replacing the built-in catalog
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List block types by category
    Catalog {
        /// Only show entries matching this text
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Print nodes, edges and routed wires of a diagram as JSON
    Inspect {
        #[arg(value_name = "DIAGRAM")]
        diagram: Utf8PathBuf,
    },
    /// Apply a JSON array of editor events to a diagram and print the result
    Replay {
        /// Diagram document, or "-" to start from an empty diagram
        #[arg(value_name = "DIAGRAM")]
        diagram: Utf8PathBuf,
        #[arg(value_name = "EVENTS")]
        events: Utf8PathBuf,
        /// Write the resulting document here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<Utf8PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_diagram(path: &Utf8Path) -> Result<Diagram> {
    if path.as_str() == "-" {
        return Ok(Diagram::new());
    }
    let doc = DiagramDoc::load_json(path).with_context(|| format!("Load diagram {}", path))?;
    let diagram = Diagram::from_doc(doc).with_context(|| format!("Invalid diagram {}", path))?;
    for issue in diagram.validate() {
        log::warn!("{}: {:?}", path, issue);
    }
    Ok(diagram)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let catalog: Vec<BlockCatalogEntry> = match &cli.catalog {
        Some(path) => load_catalog(path)?,
        None => get_block_catalog().to_vec(),
    };

    match cli.command {
        Command::Catalog { query } => {
            for category in group_by_category(&catalog) {
                let hits: Vec<_> = category
                    .entries
                    .iter()
                    .filter(|e| e.matches_query(&query))
                    .collect();
                if hits.is_empty() {
                    continue;
                }
                println!("{}", category.name);
                for e in hits {
                    println!(
                        "  {:<12} {:>2} in {:>2} out  {}",
                        e.block_type, e.default_inputs, e.default_outputs, e.description
                    );
                }
            }
        }
        Command::Inspect { diagram } => {
            let d = load_diagram(&diagram)?;
            let snap = view::diagram_snapshot(&d, &config)
                .with_context(|| format!("Route {}", diagram))?;
            println!("{}", serde_json::to_string_pretty(&snap)?);
        }
        Command::Replay {
            diagram,
            events,
            out,
        } => {
            let d = load_diagram(&diagram)?;
            let text = std::fs::read_to_string(&events)
                .with_context(|| format!("Read events {}", events))?;
            let script: Vec<EditorEvent> = serde_json::from_str(&text)
                .with_context(|| format!("Parse events {}", events))?;

            let mut state = EditorState::with_config(d, config, Arc::new(catalog));
            for (i, event) in script.into_iter().enumerate() {
                state
                    .dispatch(event)
                    .with_context(|| format!("Event #{} in {}", i, events))?;
            }
            if let Some(wire) = state.pending() {
                log::warn!("replay ended while drawing from {}#{}:{}", wire.anchor.node, wire.anchor_direction, wire.anchor.port);
            }

            let json = state.into_diagram().to_doc().to_json()?;
            match out {
                Some(path) => std::fs::write(&path, json).with_context(|| format!("Write {}", path))?,
                None => println!("{}", json),
            }
        }
    }
    Ok(())
}
