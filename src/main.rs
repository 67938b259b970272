//! # rprint-layout CLI
//!
//! Command-line interface for print layout templates.
//!
//! ## Usage
//!
//! ```bash
//! # Compile a template to its printer format
//! rprint-layout compile invoice.json
//!
//! # Full compile output (kind, print hint, warnings) as JSON
//! rprint-layout compile --json label.json
//!
//! # Strict load without compiling
//! rprint-layout validate receipt.json
//!
//! # Element types a canvas kind accepts
//! rprint-layout types label
//!
//! # Start an empty document
//! rprint-layout new receipt --name "Counter receipt" > receipt.json
//!
//! # HTTP compile service
//! rprint-layout serve --listen 0.0.0.0:8080
//! ```
//!
//! `FILE` may be `-` to read standard input. Logging goes to stderr and is
//! controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use rprint_layout::{
    CanvasConfig, CanvasKind, LayoutError, TemplateDoc, compiler,
    server::{self, ServerConfig},
};

/// rprint-layout - print layout template compiler
#[derive(Parser, Debug)]
#[command(name = "rprint-layout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a template document
    Compile {
        /// Document JSON file, or - for stdin
        file: PathBuf,

        /// Print the whole compile output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a document loads
    Validate {
        /// Document JSON file, or - for stdin
        file: PathBuf,
    },

    /// List the element types of a canvas kind
    Types {
        /// page, label, receipt or text
        kind: CanvasKind,
    },

    /// Print an empty document of a canvas kind
    New {
        /// page, label, receipt or text
        kind: CanvasKind,

        /// Document name
        #[arg(long, default_value = "Untitled")]
        name: String,
    },

    /// Run the HTTP compile service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_input(path: &Path) -> Result<String, LayoutError> {
    if path == Path::new("-") {
        Ok(std::io::read_to_string(std::io::stdin())?)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

async fn run() -> Result<(), LayoutError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, json } => {
            let input = read_input(&file)?;
            let compiled = compiler::compile_str(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&compiled)?);
            } else {
                for warning in &compiled.warnings {
                    match &warning.element_id {
                        Some(id) => eprintln!("warning: {} [{}]: {}", warning.code, id, warning.message),
                        None => eprintln!("warning: {}: {}", warning.code, warning.message),
                    }
                }
                print!("{}", compiled.output);
            }
        }

        Commands::Validate { file } => {
            let doc = TemplateDoc::from_json(&read_input(&file)?)?;
            println!(
                "{}: valid {} document, {} elements",
                file.display(),
                doc.kind(),
                doc.body.element_count()
            );
        }

        Commands::Types { kind } => {
            for name in compiler::element_types(kind) {
                println!("{}", name);
            }
        }

        Commands::New { kind, name } => {
            let doc = TemplateDoc::new(name, CanvasConfig::default_for(kind));
            println!("{}", doc.to_json_pretty()?);
        }

        Commands::Serve { listen } => {
            server::serve(ServerConfig { listen_addr: listen }).await?;
        }
    }

    Ok(())
}
