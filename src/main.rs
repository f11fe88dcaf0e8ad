use aisle_finder::catalog::Catalog;
use aisle_finder::config::{parse_timeout_secs, ClassifierConfig, Precedence, ResolverPolicy, RetryPolicy};
use aisle_finder::llm::{Classifier, LlmClassifier};
use aisle_finder::render::render;
use aisle_finder::resolver::Resolver;
use aisle_finder::retry::RetryingClassifier;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aisle-finder")]
#[command(about = "Find the store aisle for an item by name")]
struct Args {
    /// Items to look up; reads one item per line from stdin when omitted
    items: Vec<String>,

    /// Path to the catalog JSON file
    #[arg(short, long, default_value = "aisles.json")]
    catalog: PathBuf,

    /// Which check wins when a term is both blacklisted and a catalog item
    #[arg(long, value_enum, default_value_t = Precedence::BlacklistFirst)]
    precedence: Precedence,

    /// API key (or set GROQ_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Chat-completions endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model name sent to the endpoint
    #[arg(long)]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<String>,

    /// Retry transient classifier failures, up to this many attempts in total
    #[arg(long)]
    retries: Option<u32>,

    /// Print results as JSON instead of messages
    #[arg(long)]
    json: bool,

    /// Validate the catalog, report duplicate items and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;

    if args.check {
        return Ok(check_catalog(&catalog));
    }

    let resolver = build_resolver(&args, catalog)?;
    let mut had_failure = false;

    if args.items.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            if line.trim().is_empty() {
                continue;
            }
            had_failure |= lookup(&resolver, &line, args.json).await?;
        }
    } else {
        for item in &args.items {
            had_failure |= lookup(&resolver, item, args.json).await?;
        }
    }

    Ok(if had_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn build_resolver(args: &Args, catalog: Catalog) -> Result<Resolver> {
    let mut config = ClassifierConfig::from_env()?;
    if let Some(ref api_key) = args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(ref endpoint) = args.endpoint {
        config.endpoint_url = endpoint.clone();
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(ref raw) = args.timeout_secs {
        config.timeout = parse_timeout_secs(raw)?;
    }
    if config.api_key.is_none() {
        info!("No API key configured; items outside the catalog cannot be classified");
    }

    let llm = LlmClassifier::new(config)?;
    let classifier: Arc<dyn Classifier> = match args.retries {
        Some(attempts) if attempts > 1 => {
            Arc::new(RetryingClassifier::new(llm, RetryPolicy::with_max_attempts(attempts)))
        }
        _ => Arc::new(llm),
    };

    Ok(Resolver::with_policy(
        Arc::new(catalog),
        classifier,
        ResolverPolicy {
            precedence: args.precedence,
        },
    ))
}

/// Resolve and print one item; returns true when the lookup hit a failure
async fn lookup(resolver: &Resolver, item: &str, json: bool) -> Result<bool> {
    let result = resolver.resolve(item).await;
    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", render(&result, item));
    }
    Ok(result.is_failure())
}

fn check_catalog(catalog: &Catalog) -> ExitCode {
    let duplicates = catalog.duplicate_items();
    println!(
        "{} aisles, {} categories, {} blacklisted terms",
        catalog.entries().len(),
        catalog.category_labels().len(),
        catalog.blacklist().len()
    );
    if duplicates.is_empty() {
        println!("No duplicate items.");
        return ExitCode::SUCCESS;
    }
    for duplicate in &duplicates {
        println!("Duplicate item '{}' in: {}", duplicate.item, duplicate.aisles.join(", "));
    }
    ExitCode::FAILURE
}
