use std::path::{Path, PathBuf};
use vulnlens::cli::{Cli, Commands, ConfigAction};
use vulnlens::config::{Config, ConfigValidator};
use vulnlens::error::{Result, VulnError};
use vulnlens::patterns::IdentifierPatterns;
use vulnlens::server::{HttpServer, SignalHandler};
use vulnlens::service::{EnrichmentService, LookupService};
use vulnlens::storage::{Dataset, MappingOrigin};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve { bind, port } => {
            cmd_serve(cli.config, bind, port)?;
        }
        Commands::Lookup { ids, pretty } => {
            cmd_lookup(cli.config, &ids, pretty)?;
        }
        Commands::Enrich { input, output } => {
            cmd_enrich(cli.config, &input, output.as_deref())?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "vulnlens=debug" } else { "vulnlens=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so `lookup` and `enrich` output can be piped
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_serve(config_path: Option<PathBuf>, bind: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    ConfigValidator::validate(&config)?;

    tracing::info!("Serving records from {}", config.data.records_dir.display());

    let runtime = tokio::runtime::Runtime::new().map_err(|e| VulnError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;

    runtime.block_on(async {
        let signals = SignalHandler::new()?;
        let server = HttpServer::from_config(&config)?;
        server.serve_until(signals.shutdown()).await
    })
}

fn cmd_lookup(config_path: Option<PathBuf>, ids: &str, pretty: bool) -> Result<()> {
    let config = load_config(config_path)?.expanded()?;
    let lookup = LookupService::new(Dataset::from_config(&config.data));

    let records = lookup.get_records(ids).map_err(|e| {
        tracing::error!("Lookup failed: {}", e.log_message());
        e
    })?;

    let json = if pretty {
        serde_json::to_string_pretty(&records)
    } else {
        serde_json::to_string(&records)
    }
    .map_err(|e| VulnError::Json {
        source: e,
        context: "Failed to serialize records".to_string(),
    })?;

    println!("{}", json);
    Ok(())
}

fn cmd_enrich(config_path: Option<PathBuf>, input: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?.expanded()?;
    let lookup = LookupService::new(Dataset::from_config(&config.data));
    let service = EnrichmentService::new(lookup, IdentifierPatterns::new()?);

    let table = std::fs::read(input).map_err(|e| VulnError::Io {
        source: e,
        context: format!("Failed to read report: {:?}", input),
    })?;

    let report = service.enrich(&table).map_err(|e| {
        tracing::error!("Enrichment of {:?} failed: {}", input, e.log_message());
        e
    })?;

    if let MappingOrigin::Unreadable { path, reason } = &report.mapping {
        tracing::warn!("Advisory mapping {:?} unreadable: {}", path, reason);
    }
    for advisory in &report.skipped_advisories {
        tracing::warn!("Skipping unknown advisory {}", advisory);
    }
    tracing::info!(
        "Enriched {} rows from column '{}' ({} unique CVEs)",
        report.rows,
        report.target_column,
        report.unique_cves
    );

    match output {
        Some(path) => std::fs::write(path, &report.csv).map_err(|e| VulnError::Io {
            source: e,
            context: format!("Failed to write enriched report: {:?}", path),
        })?,
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&report.csv)
                .map_err(|e| VulnError::Io {
                    source: e,
                    context: "Failed to write enriched report to stdout".to_string(),
                })?;
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let content = toml::to_string_pretty(&config)?;
            println!("{}", content);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| VulnError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'vulnlens config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        return Ok(config);
    }

    Config::load(&path)
}
