mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use phpgraph_core::Settings;
use tracing::level_filters::LevelFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// PHP source parser and symbol-table builder.
#[derive(Parser)]
#[command(name = "phpgraph", version, about = "PHP source parser and symbol-table builder")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a phpgraph.toml settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse PHP files and directories and print the package index
    Parse {
        /// Files or directories to parse
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the syntax tree of one PHP file
    Dump {
        /// Path to the PHP source file
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(config: Option<&PathBuf>) -> Settings {
    let Some(path) = config else {
        return Settings::default();
    };
    match Settings::load(path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = load_settings(cli.config.as_ref());

    match cli.command {
        Commands::Parse { paths } => {
            commands::parse::cmd_parse(&paths, &settings, cli.output, cli.quiet);
        }
        Commands::Dump { file } => {
            commands::dump::cmd_dump(&file, cli.output);
        }
    }
}
