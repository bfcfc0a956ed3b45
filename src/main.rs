use clap::{ArgAction, Parser};
use console::style;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tsellm::config::{Config, init_config, show_config};
use tsellm::models::ModelRegistry;
use tsellm::repl::{EditorReader, Repl};
use tsellm::{EngineSelection, ErrorMode, Result, Target, TsellmError, create_console};

#[derive(Parser)]
#[command(name = "tsellm")]
#[command(about = "Interactive SQL shell for SQLite and DuckDB with LLM functions")]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Database file to open
    #[arg(default_value = ":memory:")]
    filename: String,
    /// SQL statement to run instead of starting the shell
    sql: Option<String>,
    /// Open the database with SQLite
    #[arg(long, visible_alias = "rowstore")]
    sqlite: bool,
    /// Open the database with DuckDB
    #[arg(long, visible_alias = "columnar")]
    duckdb: bool,
    /// Show the current configuration and exit
    #[arg(long)]
    show_config: bool,
    /// Write a default config file if none exists and exit
    #[arg(long)]
    init_config: bool,
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version, value_parser = clap::value_parser!(bool))]
    version: (),
}

impl Cli {
    fn selection(&self) -> EngineSelection {
        EngineSelection {
            sqlite: self.sqlite,
            duckdb: self.duckdb,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        // The console already printed the engine error
        Err(TsellmError::Execution(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", style("Error:").for_stderr().red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_default()?;

    if cli.show_config {
        show_config(&config, &mut io::stderr())?;
        return Ok(());
    }
    if cli.init_config {
        if init_config(&config)? {
            eprintln!("Wrote {}", config.config_file_path().display());
        } else {
            eprintln!("{} already exists", config.config_file_path().display());
        }
        return Ok(());
    }

    let models = Arc::new(ModelRegistry::from_config(&config)?);
    let mut console = create_console(Target::parse(&cli.filename), cli.selection(), models)?;

    let mut out = io::stdout();
    let mut err = io::stderr();
    match &cli.sql {
        Some(sql) => {
            console.execute(sql, ErrorMode::Fatal, &mut out, &mut err)?;
        }
        None => {
            let reader = EditorReader::new()?;
            let exit = Repl::new(&mut console, reader).run(&mut out, &mut err)?;
            debug!("REPL ended with {:?}", exit);
        }
    }

    console.close()
}
