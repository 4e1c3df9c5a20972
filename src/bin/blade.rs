//! Blade CLI - compile templates from the command line
//!
//! Commands: render, compile, detect
//! Generated source or JSON goes to stdout, logs to stderr (`BLADE_LOG`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use blade_core::{detect_engine_name, targets, Engine, EngineConfig, ParseError};

#[derive(Parser)]
#[command(name = "blade")]
#[command(about = "Blade CLI - template to source code compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root directory for `~/` includes
    #[arg(short, long, global = true)]
    library_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated source of a template
    Render {
        /// Template file
        template: PathBuf,

        /// Target engine; defaults to the one the template declares
        #[arg(short, long)]
        engine: Option<String>,
    },

    /// Print the compiled unit manifest as JSON
    Compile {
        /// Template file
        template: PathBuf,

        /// Target engine; defaults to the one the template declares
        #[arg(short, long)]
        engine: Option<String>,
    },

    /// Print the engine a template declares
    Detect {
        /// Template file
        template: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("BLADE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => return fail(&e.to_string()),
        },
        None => EngineConfig::default(),
    };
    if cli.library_root.is_some() {
        config.library_root = cli.library_root.clone();
    }

    match cli.command {
        Commands::Render { template, engine } => {
            let engine = match build_engine(&template, engine, config) {
                Ok(e) => e,
                Err(message) => return fail(&message),
            };
            match engine.parse_file(&template) {
                Ok(parsed) => {
                    print!("{}", engine.render(&parsed));
                    ExitCode::SUCCESS
                }
                Err(e) => parse_failure(&e),
            }
        }

        Commands::Compile { template, engine } => {
            let engine = match build_engine(&template, engine, config) {
                Ok(e) => e,
                Err(message) => return fail(&message),
            };
            match engine.compile_file(&template) {
                Ok(unit) => {
                    let output = serde_json::json!({
                        "success": true,
                        "unit": unit,
                    });
                    print_json(&output);
                    ExitCode::SUCCESS
                }
                Err(e) => parse_failure(&e),
            }
        }

        Commands::Detect { template } => {
            let source = match std::fs::read_to_string(&template) {
                Ok(s) => s,
                Err(e) => return fail(&format!("Failed to read {}: {}", template.display(), e)),
            };
            match detect_engine_name(&source) {
                Ok(engine) => {
                    print_json(&serde_json::json!({ "engine": engine }));
                    ExitCode::SUCCESS
                }
                Err(e) => parse_failure(&e),
            }
        }
    }
}

fn build_engine(template: &Path, engine: Option<String>, config: EngineConfig) -> Result<Engine, String> {
    let name = match engine {
        Some(name) => name,
        None => {
            let source = std::fs::read_to_string(template)
                .map_err(|e| format!("Failed to read {}: {}", template.display(), e))?;
            detect_engine_name(&source)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| "No engine given and the template declares none".to_string())?
        }
    };

    let emitter = targets::by_name(&name, config).map_err(|e| e.to_string())?;
    Ok(Engine::from_boxed(emitter))
}

fn parse_failure(error: &ParseError) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": error.to_string(),
        "cause": error.root_cause().to_string(),
        "includes": error.include_chain(),
        "location": error.location(),
    });
    print_json(&output);
    ExitCode::from(2)
}

fn fail(message: &str) -> ExitCode {
    print_json(&serde_json::json!({ "success": false, "error": message }));
    ExitCode::FAILURE
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}
