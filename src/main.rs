use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod loader;
mod models;
mod phrases;
mod report;
mod search;
mod sentiment;
mod themes;

#[derive(Parser)]
#[command(name = "parent-survey-dashboard")]
#[command(about = "Builds the parent survey dashboard dataset from feedback CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full aggregation pipeline and write the dashboard JSON
    Build {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "full_dashboard_data.json")]
        out: PathBuf,
    },
    /// Search wellbeing feedback for pastoral-care keywords
    Search {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, out } => {
            let path = loader::resolve_input(input.as_deref())?;
            let responses = loader::load_responses(&path)?;
            let data = report::assemble(&responses)?;
            report::write_json(&data, &out)?;

            println!("Dashboard data written to {}.", out.display());
            println!("Total responses processed: {}.", responses.len());
            println!("Total schools processed: {}.", data.matrix.len());
            if let Some(top) = data.matrix.first() {
                println!("Top school by sentiment: {} ({}).", top.name, top.overall_percent);
            }
        }
        Commands::Search { input, limit } => {
            let path = loader::resolve_input(input.as_deref())?;
            let responses = loader::load_responses(&path)?;
            search::run(&responses, limit);
        }
    }

    Ok(())
}
