use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use calltrail::config::OutputFormat;
use calltrail::Engine;

#[derive(Parser)]
#[command(name = "calltrail")]
#[command(about = "Render the call sequence of an Elixir function as a Mermaid diagram")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sequence diagram for one entry function
    Generate {
        /// Source file containing the entry function
        #[arg(short, long)]
        source: PathBuf,

        /// Name of the entry function
        #[arg(short, long)]
        function: String,

        /// Output file (defaults to <output_dir>/<Module>.<function>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (overrides the configured one)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the modules and functions the index resolves calls against
    Index {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default calltrail.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self, mut engine: Engine) -> Result<()> {
        match self.command {
            Commands::Generate { source, function, output, format } => {
                let written = engine.generate(&source, &function, output, format).await?;
                println!("{}", written.display());
                Ok(())
            }
            Commands::Index { json } => {
                engine.index(json).await
            }
            Commands::Init { path, force } => {
                engine.init(path, force).await.map(|_| ())
            }
        }
    }
}
