//! CLI: hydrate a pipeline topology from a session file and print it as JSON.
//!
//! Usage: `render_topology [OPTIONS] <session.json>`
//! Example: render_topology --edit attach:rev-out:s3-out:out:revenue tests/fixtures/revenue.json
//!
//! Set RUST_LOG=pipeline_topology=debug to see every graph mutation.

use clap::Parser;
use pipeline_topology::EngineConfig;
use pipeline_topology::session::{Edit, Session};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hydrate a pipeline topology, apply edits, and print the result.
#[derive(Parser, Debug)]
#[command(name = "render_topology")]
#[command(
  after_help = r#"Edits (applied in order):
  attach:<name>:<connector_id>:<in|out>[:<relation>]
  detach:<name>
  relink:<name>[:<relation>]

Environment variables (override --config when set):
  PIPELINE_TOPOLOGY_POLL_MS     Status poll interval in milliseconds.
  PIPELINE_TOPOLOGY_ROW_HEIGHT  Vertical spacing between nodes of one column."#
)]
struct Args {
  /// Engine config file (JSON).
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Edit to apply after hydration; may be repeated.
  #[arg(long = "edit", value_name = "EDIT")]
  edits: Vec<Edit>,

  /// Print the update request that would persist the attachments instead of the graph.
  #[arg(long)]
  request: bool,

  /// Path to the session file
  #[arg(value_name = "session.json")]
  session: PathBuf,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let config = match EngineConfig::load(args.config.as_deref()) {
    Ok(c) => c,
    Err(e) => {
      eprintln!("Error loading config: {}", e);
      process::exit(1);
    }
  };

  let session = match Session::load(&args.session) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Error reading {}: {}", args.session.display(), e);
      process::exit(1);
    }
  };

  let mut store = config.topology_store();
  if let Err(e) = session.hydrate(&mut store) {
    eprintln!("Error hydrating topology: {}", e);
    process::exit(1);
  }
  for edit in &args.edits {
    if let Err(e) = session.apply(&mut store, edit) {
      eprintln!("Error applying {:?}: {}", edit, e);
      process::exit(1);
    }
  }

  let snapshot = store.snapshot();
  info!(
    nodes = snapshot.nodes.len(),
    edges = snapshot.edges.len(),
    "topology ready"
  );
  let rendered = if args.request {
    serde_json::to_string_pretty(&session.update_request(&store))
  } else {
    serde_json::to_string_pretty(snapshot.as_ref())
  };
  match rendered {
    Ok(json) => println!("{}", json),
    Err(e) => {
      eprintln!("Error serializing output: {}", e);
      process::exit(1);
    }
  }
}
