use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use strata_platform::console::{self, ContentKind};
use strata_platform::resolver::{library_file_name, ResolutionAction};
use strata_platform::{env, fs, paths, ColorMode, Config, HostKind, Platform};

#[derive(Parser)]
#[command(name = "strata")]
#[command(version = "0.2.0")]
#[command(about = "Strata platform facade: driver resolution and host utilities", long_about = None)]
struct Cli {
    /// Color output: auto, always or never
    #[arg(long, global = true, value_name = "WHEN")]
    color: Option<ColorMode>,

    /// Configuration file (default: ./strata.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Env file loaded before the command runs
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a driver and report where it was found
    Resolve {
        /// Capability name (e.g. pg, mysql2, @sap/hana-client)
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show the resolution steps for a driver without loading it
    Which {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List known capabilities
    List,

    /// Highlight SQL or JSON for the terminal
    Highlight {
        /// Content kind: sql, json or plain
        #[arg(short, long, value_name = "KIND", default_value = "sql")]
        kind: ContentKind,

        /// Input file (default: stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print an environment variable after loading the env file
    Env {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show host platform information
    Platform,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            console::log_fatal("strata:", format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?.with_env_overrides()?,
        None => Config::discover()?,
    };
    if let Some(color) = cli.color {
        config.color = color;
    }
    if let Some(env_file) = cli.env_file {
        config.env_file = env_file;
    }
    config.apply_color();

    if fs::exists(&config.env_file) {
        env::load_env_file(&config.env_file)
            .with_context(|| format!("Failed to load {}", config.env_file.display()))?;
    } else {
        log::debug!("no env file at {}", config.env_file.display());
    }

    match cli.command {
        Commands::Resolve { name } => resolve(&config, &name),
        Commands::Which { name } => which(&config, &name),
        Commands::List => list(&config),
        Commands::Highlight { kind, file } => highlight(kind, file),
        Commands::Env { name } => print_var(&name),
        Commands::Platform => platform(&config),
    }
}

fn resolve(config: &Config, name: &str) -> Result<ExitCode> {
    match config.resolver().resolve(name) {
        Ok(handle) => {
            console::log_info(
                "resolved:",
                format!("{} from {}", handle.capability(), handle.origin()),
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            console::log_error("unresolved:", &err);
            for attempt in err.attempts() {
                eprintln!("  {}", attempt);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn which(config: &Config, name: &str) -> Result<ExitCode> {
    let plan = config.resolver().plan(name)?;

    match &plan.action {
        Some(ResolutionAction::Direct { .. }) => println!("{}: known capability", plan.name),
        Some(ResolutionAction::FallbackOnly) => {
            println!("{}: known capability (driver root only)", plan.name)
        }
        None => println!("{}: not in the capability table", plan.name),
    }

    if let Some(direct) = &plan.direct {
        println!("  1. host library search: {}", direct);
    }

    match &plan.root {
        Ok(root) => {
            println!("  driver root: {}", root.display());
            for candidate in &plan.candidates {
                let marker = if fs::exists(candidate) { "found" } else { "-" };
                println!("    [{}] {}", marker, candidate.display());
            }
        }
        Err(e) => println!("  driver root unusable: {}", e),
    }

    Ok(ExitCode::SUCCESS)
}

fn list(config: &Config) -> Result<ExitCode> {
    let resolver = config.resolver();
    let width = resolver
        .table()
        .names()
        .map(str::len)
        .max()
        .unwrap_or(0);

    for entry in resolver.table().iter() {
        let target = match entry.action.library() {
            Some(stem) => library_file_name(stem),
            None => "(driver root only)".to_string(),
        };
        println!("{:<width$}  {}", entry.name, target, width = width);
    }

    Ok(ExitCode::SUCCESS)
}

fn highlight(kind: ContentKind, file: Option<PathBuf>) -> Result<ExitCode> {
    let text = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    print!("{}", console::highlight(&text, kind));
    if !text.ends_with('\n') {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn print_var(name: &str) -> Result<ExitCode> {
    match env::get_var(name) {
        Some(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            console::log_warning("env:", format!("{} is not set", name));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn platform(config: &Config) -> Result<ExitCode> {
    let platform = Platform::detect();
    let host = HostKind::current();
    let cwd = paths::resolve_absolute(".").context("Failed to read current directory")?;

    println!("platform:    {} ({})", platform, platform.to_target_string());
    println!("host:        {}", host);
    println!("dynamic:     {}", host.supports_dynamic_loading());
    println!("cwd:         {}", cwd.display());
    match config.fallback_root().path() {
        Ok(root) => println!("driver root: {}", root.display()),
        Err(e) => println!("driver root: unavailable ({})", e),
    }

    Ok(ExitCode::SUCCESS)
}
