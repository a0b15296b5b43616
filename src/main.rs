use anyhow::{Context, Result};
use artifacto::commands;
use artifacto::config::Config;
use artifacto::view::ViewMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "artifacto")]
#[command(about = "Parse assistant messages, compile artifact components and render them in a sandbox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (overrides ARTIFACTO_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the segments of a message as JSON
    Parse {
        /// Message file ("-" for stdin)
        file: PathBuf,
    },

    /// Print the factory source for a component
    Compile {
        /// Component source file ("-" for stdin)
        file: PathBuf,
    },

    /// Print how the artifacts of a message would be presented
    View {
        /// Message file ("-" for stdin)
        file: PathBuf,

        /// Only the artifact with this identifier
        #[arg(long)]
        id: Option<String>,

        #[arg(long, value_enum, default_value = "code")]
        mode: Mode,
    },

    /// Compile a component and render it through the configured evaluator
    Render {
        /// Component source file ("-" for stdin)
        file: PathBuf,
    },

    /// Print the system prompt describing the artifact format
    Prompt,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Code,
    Preview,
}

impl From<Mode> for ViewMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Code => ViewMode::Code,
            Mode::Preview => ViewMode::Preview,
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("reading stdin");
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    artifacto::logging::init(&config.logging);

    if let Ok(capacity) = config.cache_capacity() {
        artifacto::segment::cache::install_global(capacity);
    }

    let result = match &cli.command {
        Commands::Parse { file } => commands::parse_message(&read_input(file)?),
        Commands::Compile { file } => commands::compile_artifact(&read_input(file)?, &config),
        Commands::View { file, id, mode } => {
            commands::present_artifacts(&read_input(file)?, id.as_deref(), (*mode).into(), &config)
        }
        Commands::Render { file } => commands::render_artifact(&read_input(file)?, &config).await,
        Commands::Prompt => commands::system_prompt(&config),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => {
            eprintln!("error: {}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}
