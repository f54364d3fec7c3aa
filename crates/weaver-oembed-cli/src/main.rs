use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use weaver_oembed::catalog::CatalogFile;
use weaver_oembed::link::{cannot_preview, iframe_title, validate_url};
use weaver_oembed::markup::preview_class_names;
use weaver_oembed::provider::Tier;
use weaver_oembed::telemetry::{self, TelemetryConfig};
use weaver_oembed::{
    CancellationFlag, Catalog, Config, EmbedCache, EmbedError, EmbedResult, EmbedSink,
    EmbedState, GENERIC_PROVIDER, ProxyFetcher, resolve_provider, run_attempt,
};

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about = "Resolve and preview oEmbed providers for editor embeds", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "OEMBED_CONFIG")]
    config: Option<PathBuf>,

    /// Provider catalog file, overrides the one in the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Common,
    Other,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the provider that claims a URL
    Resolve {
        url: String,
    },
    /// Fetch and classify the embed for a URL through the oEmbed proxy
    Fetch {
        url: String,

        /// Provider the embed starts under
        #[arg(long, default_value = GENERIC_PROVIDER)]
        provider: String,

        /// Proxy site root, overrides the config
        #[arg(long)]
        endpoint: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the providers in the catalog
    Providers {
        #[arg(long, value_enum)]
        tier: Option<TierArg>,

        /// Dump the catalog as TOML instead
        #[arg(long)]
        toml: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init(TelemetryConfig::from_env("oembed"));

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(&path.to_string_lossy())?,
        None => Config::default(),
    };
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }
    let catalog = config.catalog()?;

    match cli.command {
        Commands::Resolve { url } => {
            validate_url(&url)?;
            match resolve_provider(&url, &catalog).identifier() {
                Some(identifier) => println!("{identifier}"),
                None => println!("{GENERIC_PROVIDER}"),
            }
        }
        Commands::Fetch {
            url,
            provider,
            endpoint,
            json,
        } => {
            if let Some(endpoint) = endpoint {
                config.endpoint.base_url = endpoint;
            }
            fetch_embed(&config, &catalog, &provider, &url, json).await?;
        }
        Commands::Providers { tier, toml } => list_providers(&catalog, tier, toml)?,
    }

    Ok(())
}

struct ConsoleSink {
    json: bool,
    resolved: Option<String>,
}

impl EmbedSink for ConsoleSink {
    fn on_resolved(&mut self, identifier: &str) {
        tracing::info!(provider = identifier, "fetching embed");
        self.resolved = Some(identifier.to_string());
    }

    fn on_classified(&mut self, result: &EmbedResult) {
        if self.json {
            match serde_json::to_string_pretty(result) {
                Ok(out) => println!("{out}"),
                Err(e) => eprintln!("failed to serialize embed: {e}"),
            }
            return;
        }
        println!("✓ {}", result.classification);
        println!("  provider: {}", self.resolved.as_deref().unwrap_or_default());
        println!("  slug:     {}", result.provider_slug);
        println!("  class:    {}", preview_class_names(result.classification));
        println!("{}", result.renderable_markup);
    }

    fn on_error(&mut self, error: &EmbedError) {
        match error {
            EmbedError::EmptyResponse { .. } => {
                println!("⚠ No preview available for this URL");
            }
            _ => eprintln!("✗ Sorry, we could not embed that content: {error}"),
        }
    }
}

async fn fetch_embed(
    config: &Config,
    catalog: &Catalog,
    provider: &str,
    url: &str,
    json: bool,
) -> Result<()> {
    let parsed = validate_url(url)?;
    if !json {
        println!("→ {}", iframe_title(&parsed));
        if cannot_preview(&parsed, &config.no_preview_hosts) {
            println!("⚠ Previews for this host are unavailable in the editor");
        }
    }

    let cache = EmbedCache::new(ProxyFetcher::new(&config.endpoint)?);
    let mut sink = ConsoleSink {
        json,
        resolved: None,
    };
    let attempt = run_attempt(
        catalog,
        &cache,
        provider,
        url,
        &CancellationFlag::new(),
        &mut sink,
    )
    .await;

    match attempt.state() {
        EmbedState::Failed(err) if err.is_retryable() => Err(err.clone().into()),
        _ => Ok(()),
    }
}

fn list_providers(catalog: &Catalog, tier: Option<TierArg>, as_toml: bool) -> Result<()> {
    if as_toml {
        let dump = toml::to_string_pretty(&CatalogFile::from(catalog)).into_diagnostic()?;
        println!("{dump}");
        return Ok(());
    }

    let tiers: &[Tier] = match tier {
        Some(TierArg::Common) => &[Tier::Common],
        Some(TierArg::Other) => &[Tier::Other],
        None => &[Tier::Common, Tier::Other],
    };
    for tier in tiers {
        for provider in catalog.tier(*tier) {
            let patterns: Vec<&str> = provider.patterns().collect();
            println!(
                "{:<28} {:<14} {}",
                provider.identifier(),
                provider.title(),
                if patterns.is_empty() {
                    "(detected from response)".to_string()
                } else {
                    patterns.join("  ")
                }
            );
        }
    }
    Ok(())
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();
}
