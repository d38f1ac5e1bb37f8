pub mod assertion;
pub mod cli;
pub mod config;
pub mod context;
pub mod error_filter;
pub mod factory;
pub mod path;
pub mod query;
pub mod types;
pub mod value;

use crate::cli::output::{
    CheckOutcome, render_check_text, render_query_text, render_rules_json, render_rules_text,
};
use crate::config::SieveConfig;
use anyhow::{Context as _, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub use assertion::{
    Assertion, Comparator, ContextExpression, EvaluationError, LogicalMode, TypeCode, TypedLiteral,
};
pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use context::{CapturedError, ErrorContext, ErrorSnapshot, NameValues, RequestContext};
pub use error_filter::{ErrorFilter, ErrorFilterHook, FilterDecision, FilteringArgs};
pub use factory::{AssertionFactory, BuilderRegistry, ConfigNode, ConfigurationError};
pub use path::{PathExpression, compile, eval};
pub use query::{LoggedError, QueryFilter, RecordQuery};
pub use value::{Navigable, Record, Value};

/// Install the global tracing subscriber. `RUST_LOG` wins over `directive`.
pub fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Accepts either a single JSON object or an array of them.
fn read_events(path: &Path) -> anyhow::Result<Vec<ErrorSnapshot>> {
    let raw: serde_json::Value = read_json(path)?;
    let events = if raw.is_array() {
        serde_json::from_value(raw)
    } else {
        serde_json::from_value(raw).map(|event| vec![event])
    };
    events.with_context(|| format!("Invalid captured event in '{}'", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output file '{}'", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

/// Filter every event in `path` through the configured error filter.
pub fn check_events(config: &SieveConfig, path: &Path) -> anyhow::Result<Vec<CheckOutcome>> {
    let Some(settings) = &config.error_filter else {
        bail!("No [error_filter] section in profile '{}'", config.profile_name);
    };
    let filter = ErrorFilter::from_settings(settings, &AssertionFactory::default())
        .context("Failed to build the error filter")?;
    let hook = ErrorFilterHook::new(filter);

    let events = read_events(path)?;
    info!(count = events.len(), path = %path.display(), "checking captured events");

    let outcomes = events
        .into_iter()
        .map(|event| {
            let ambient = event.ambient();
            let type_name = event.exception.type_name.clone();
            let message = event.exception.message.clone();
            let status_code = event.exception.http_status_code();
            let mut args = FilteringArgs::new(event.exception, ambient);
            match hook.on_filtering(&mut args) {
                Ok(()) => CheckOutcome {
                    type_name,
                    message,
                    status_code,
                    decision: args.decision().clone(),
                    error: None,
                },
                Err(err) => CheckOutcome::failed(type_name, message, status_code, &err),
            }
        })
        .collect();
    Ok(outcomes)
}

/// Build the query from profile defaults plus extra predicates and search.
pub fn build_query(
    config: &SieveConfig,
    predicates: &[String],
    search: Option<&str>,
) -> anyhow::Result<RecordQuery<'static>> {
    let all: Vec<&str> = config
        .query
        .filters
        .iter()
        .chain(predicates)
        .map(String::as_str)
        .collect();
    let query = RecordQuery::parse_all(all.as_slice()).context("Invalid query predicate")?;
    Ok(query.with_search(search.or(config.query.search.as_deref())))
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_tracing(cli.log_directive());

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    debug!(profile = %config.profile_name, "configuration loaded");
    let output = cli.output.as_deref();

    match &cli.command {
        Commands::Check { event } => {
            let outcomes = check_events(&config, event)?;
            let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
            let content = match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&outcomes)? + "\n",
                OutputFormat::Text => render_check_text(&outcomes),
            };
            write_output(output, &content)?;
            if failed > 0 {
                warn!(failed, "some events could not be evaluated");
            }
        }
        Commands::Query {
            file,
            predicates,
            search,
        } => {
            let query = build_query(&config, predicates, search.as_deref())?;
            let entries: Vec<LoggedError> = read_json(file)?;
            let matches = query.apply(&entries);
            info!(total = entries.len(), matched = matches.len(), "query applied");
            let content = match cli.format {
                OutputFormat::Json => serde_json::to_string_pretty(&matches)? + "\n",
                OutputFormat::Text => render_query_text(&matches, entries.len()),
            };
            write_output(output, &content)?;
        }
        Commands::Rules => {
            let registry = BuilderRegistry::builtin();
            let content = match cli.format {
                OutputFormat::Json => render_rules_json(&registry)? + "\n",
                OutputFormat::Text => render_rules_text(&registry),
            };
            write_output(output, &content)?;
        }
    }

    Ok(())
}
