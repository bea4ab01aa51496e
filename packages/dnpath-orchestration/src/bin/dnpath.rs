//! dnpath CLI
//!
//! Creates the missing organizational units of a distinguished name in a
//! directory file.
//!
//! # Usage
//!
//! ```bash
//! # Create a directory file for corp.example in ./dirs
//! dnpath --data-dir dirs init "DC=corp,DC=example"
//!
//! # Show the creation order
//! dnpath plan "OU=EMEA,OU=Sales,DC=corp,DC=example"
//!
//! # Materialize (discovers dirs/corp.example.db)
//! dnpath --data-dir dirs ensure "OU=EMEA,OU=Sales,DC=corp,DC=example"
//!
//! # Preview only
//! dnpath --data-dir dirs --dry-run ensure "OU=APAC,OU=Sales,DC=corp,DC=example"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use dnpath_core::{domain_hint, parse, plan, DirectoryError, SqliteDirectory, SqliteLocator};
use dnpath_orchestration::report;
use dnpath_orchestration::{
    resolve_endpoint, MaterializeError, Materializer, Result, Settings, SettingsOverrides,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dnpath")]
#[command(about = "Create the missing containers of a distinguished name", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "DNPATH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory endpoint (directory file path)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Directory searched for <domain>.db files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Report what would be created without creating anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Only report the final path or the terminal failure
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: Format,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a directory file serving a naming context
    Init {
        /// Naming context, e.g. DC=corp,DC=example
        root: String,
    },

    /// Create every missing container of a DN
    Ensure {
        /// Distinguished name, e.g. OU=EMEA,OU=Sales,DC=corp,DC=example
        dn: String,
    },

    /// Print the creation order without contacting the directory
    Plan {
        dn: String,
    },

    /// List containers of the directory serving a naming context
    List {
        root: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn settings(cli: &Cli) -> Result<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(settings.with_overrides(SettingsOverrides {
        server: cli.server.clone(),
        data_dir: cli.data_dir.clone(),
        dry_run: cli.dry_run,
        quiet: cli.quiet,
    }))
}

/// Resolve the endpoint for `root` once and open it
async fn open_directory(settings: &Settings, root: &str) -> Result<SqliteDirectory> {
    let locator = SqliteLocator::new(&settings.data_dir);
    let endpoint = resolve_endpoint(settings.server.as_deref(), root, &locator).await?;
    Ok(SqliteDirectory::open(endpoint)?)
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = settings(cli)?;

    match &cli.command {
        Commands::Init { root } => {
            let parsed = parse(root)?;
            if !parsed.is_root_only() {
                return Err(MaterializeError::Directory(DirectoryError::unsupported(
                    format!("'{}' is not a naming context", root),
                )));
            }
            let path = match &settings.server {
                Some(server) => PathBuf::from(server),
                None => {
                    let domain = domain_hint(&parsed.root).ok_or_else(|| {
                        DirectoryError::unsupported(format!(
                            "'{}' has no DC components; pass --server",
                            root
                        ))
                    })?;
                    SqliteLocator::new(&settings.data_dir).path_for(&domain)
                }
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            SqliteDirectory::create(&path, &parsed.root)?;
            println!("{}", path.display());
        }

        Commands::Ensure { dn } => {
            // Validate before touching any server
            let parsed = parse(dn)?;
            let plan = plan(&parsed);

            let directory = open_directory(&settings, &parsed.root).await?;
            let materializer = Materializer::new(Arc::new(directory), settings.options());
            let outcome = materializer.materialize(&plan).await?;

            match cli.format {
                Format::Text => print!("{}", report::render_text(&outcome, settings.quiet)),
                Format::Json => println!("{}", report::render_json(&outcome)?),
            }
        }

        Commands::Plan { dn } => {
            let plan = plan(&parse(dn)?);
            match cli.format {
                Format::Text => print!("{}", report::render_plan_text(&plan)),
                Format::Json => println!("{}", report::to_json(&plan)?),
            }
        }

        Commands::List { root } => {
            let parsed = parse(root)?;
            let directory = open_directory(&settings, &parsed.root).await?;
            let containers = directory.containers()?;
            match cli.format {
                Format::Text => print!("{}", report::render_containers_text(&containers)),
                Format::Json => println!("{}", report::to_json(&containers)?),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match cli.format {
                Format::Text => eprint!("{}", report::render_failure_text(&err)),
                Format::Json => match report::render_failure_json(&err) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("error: {}", e),
                },
            }
            ExitCode::from(err.category().exit_code())
        }
    }
}
