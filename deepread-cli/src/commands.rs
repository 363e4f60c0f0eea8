//! CLI subcommand handlers.

use crate::markdown::{render_document, render_report, render_results};
use crate::{AuthAction, Commands, ConfigAction, GlobalOptions, ReportArgs};
use anyhow::Context;
use deepread_core::config::{self, DeepReadConfig};
use deepread_core::credentials::{
    CredentialError, CredentialStore, KeyringCredentialStore, resolve_generation_key,
};
use deepread_core::providers::{
    HttpReaderProvider, HttpSearchProvider, OpenAiGenerationProvider, ReaderProvider,
    SearchProvider,
};
use deepread_core::research::output::{self, OutputFormat};
use deepread_core::research::ResearchSession;
use deepread_core::types::ReportRecord;
use std::path::Path;
use std::sync::Arc;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, options: &GlobalOptions) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, options),
        Commands::Auth { action } => handle_auth(action, options),
        Commands::Search { query, json, limit } => {
            handle_search(&query.join(" "), json, limit, options).await
        }
        Commands::Read { url, json } => handle_read(&url, json, options).await,
        Commands::Analyze {
            topic,
            urls,
            report,
        } => {
            let config = load(options)?;
            let session = build_session(&config)?;
            let result = session.fetch_and_analyze(&topic, &urls, report.mode).await?;
            emit_report(&result, &report, options)
        }
        Commands::Research {
            topic,
            count,
            report,
        } => {
            let config = load(options)?;
            let session = build_session(&config)?;
            if !options.quiet {
                eprintln!("Researching \"{topic}\"...");
            }
            let result = session.research(&topic, count, report.mode).await?;
            emit_report(&result, &report, options)
        }
        Commands::Shell => {
            if !options.quiet && !config::config_exists(Some(&options.workspace)) {
                eprintln!("No config file found; using defaults. Run `deepread config init` to create one.");
            }
            let config = load(options)?;
            let session = build_session(&config)?;
            crate::repl::run_shell(session, &config).await
        }
    }
}

/// Load layered configuration and apply command-line overrides.
pub(crate) fn load(options: &GlobalOptions) -> anyhow::Result<DeepReadConfig> {
    let mut config = config::load_config(
        Some(&options.workspace),
        options.config_file.as_deref(),
        None,
    )
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    if let Some(model) = &options.model {
        config.generation.model = model.clone();
    }
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

/// Wire the HTTP providers and the OS credential store into a session.
pub(crate) fn build_session(config: &DeepReadConfig) -> anyhow::Result<ResearchSession> {
    let search: Arc<dyn SearchProvider> = Arc::new(HttpSearchProvider::new(&config.search)?);
    let reader: Arc<dyn ReaderProvider> = Arc::new(HttpReaderProvider::new(&config.reader)?);
    let generation = Arc::new(OpenAiGenerationProvider::new(&config.generation)?);
    Ok(ResearchSession::new(
        search,
        reader,
        generation,
        Arc::new(KeyringCredentialStore::new()),
        config,
    ))
}

async fn handle_search(
    query: &str,
    json: bool,
    limit: Option<usize>,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    let config = load(options)?;
    let provider = HttpSearchProvider::new(&config.search)?;
    let mut results = provider.search(query).await?;
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for \"{query}\".");
    } else {
        if !options.quiet {
            println!("Found {} results for \"{query}\"\n", results.len());
        }
        print!("{}", render_results(&results));
    }
    Ok(())
}

async fn handle_read(url: &str, json: bool, options: &GlobalOptions) -> anyhow::Result<()> {
    let config = load(options)?;
    let provider = HttpReaderProvider::new(&config.reader)?;
    let document = provider.read(url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", render_document(&document));
    }
    Ok(())
}

/// Print a report, or write it to the requested file.
pub(crate) fn emit_report(
    report: &ReportRecord,
    args: &ReportArgs,
    options: &GlobalOptions,
) -> anyhow::Result<()> {
    if let Some(path) = &args.output {
        save_report(report, path)?;
        if !options.quiet {
            println!("Report saved to {}", path.display());
        }
        return Ok(());
    }

    if args.json {
        println!("{}", output::to_json(report)?);
    } else {
        print!("{}", render_report(report));
    }
    Ok(())
}

pub(crate) fn save_report(report: &ReportRecord, path: &Path) -> anyhow::Result<()> {
    let content = output::render(report, OutputFormat::from_path(path))?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn handle_auth(action: AuthAction, options: &GlobalOptions) -> anyhow::Result<()> {
    let config = load(options)?;
    let store = KeyringCredentialStore::new();
    let key_name = &config.generation.credential_store_key;

    match action {
        AuthAction::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => dialoguer::Password::new()
                    .with_prompt("Generation API key")
                    .interact()
                    .context("Failed to read API key")?,
            };
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key cannot be empty");
            }
            store.store_key(key_name, key)?;
            println!("API key saved to the OS credential store.");
            Ok(())
        }
        AuthAction::Status => {
            println!("Generation provider: {}", config.generation.base_url);
            println!("Model: {}", config.generation.model);
            match resolve_generation_key(&config.generation, &store) {
                Some((key, source)) => {
                    println!("API key: {} (from {source})", mask_key(&key));
                }
                None => {
                    println!("API key: not configured");
                    println!(
                        "  Run `deepread auth set` or export {}.",
                        config.generation.api_key_env
                    );
                }
            }
            for (name, present) in [
                ("Search", config.search.resolve_api_key().is_some()),
                ("Reader", config.reader.resolve_api_key().is_some()),
            ] {
                let status = if present { "set" } else { "not set (anonymous)" };
                println!("{name} key: {status}");
            }
            Ok(())
        }
        AuthAction::Clear => {
            match store.delete_key(key_name) {
                Ok(()) => println!("Stored API key removed."),
                Err(CredentialError::DeleteFailed { message }) => {
                    tracing::debug!(%message, "Nothing to delete");
                    println!("No stored API key.");
                }
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
    }
}

fn handle_config(action: ConfigAction, options: &GlobalOptions) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = config::workspace_config_path(&options.workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml_str = toml::to_string_pretty(&DeepReadConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(options)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

/// Show only the first and last few characters of a secret.
pub(crate) fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
