//! umlgraph CLI - Parse and validate PlantUML diagrams

mod cli;
mod colorizer;
mod summary;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();
    let mut app = cli::UmlgraphApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
