//! `run` subcommand: send once, synchronously.

use mailhands_config::Config;
use mailhands_core::{PatternIntentParser, ProviderResults};
use mailhands_protocols::{EngineError, IntentParser, SessionOptions};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::engine::Engine;

/// Execute `run`. Returns whether every requested provider succeeded.
pub(crate) async fn handle_run(config: Config, args: RunArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = apply_overrides(config, &args);
    let options = SessionOptions::headless(args.headless || config.browser.headless);
    let engine = Engine::from_config(&config)?;

    let outcome: Result<bool, Box<dyn std::error::Error>> = if args.analyze {
        analyze(&engine, &args.providers, &options).await
    } else {
        send(&engine, &args.instruction, &args.providers, &options)
            .await
            .map(|results| {
                for line in summary_lines(&results) {
                    println!("{}", line);
                }
                all_succeeded(&results)
            })
            .map_err(Into::into)
    };

    engine.shutdown().await;
    outcome
}

/// Command-line flags win over the config file.
fn apply_overrides(mut config: Config, args: &RunArgs) -> Config {
    if let Some(secs) = args.auth_timeout {
        config.engine.auth_timeout_secs = secs;
    }
    if args.dry_run {
        config.engine.dry_run = true;
    }
    config
}

/// Validate, parse, then drive each provider in turn.
///
/// Unknown providers and unparsable instructions fail before any browser opens.
async fn send(
    engine: &Engine,
    instruction: &str,
    providers: &[String],
    options: &SessionOptions,
) -> Result<ProviderResults, EngineError> {
    let specs = engine.coordinator.resolve_providers(providers)?;
    let intent = PatternIntentParser::new().parse(instruction)?;

    println!("To:      {}", intent.recipient());
    println!("Subject: {}", intent.subject());
    println!("Body:    {}", intent.body());

    let ctx = engine.context(format!("cli-{}", std::process::id()));
    Ok(engine
        .coordinator
        .run_resolved(&intent, &specs, options, &ctx)
        .await)
}

async fn analyze(
    engine: &Engine,
    providers: &[String],
    options: &SessionOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let specs = engine.coordinator.resolve_providers(providers)?;
    let mut ok = true;

    for spec in specs {
        info!("Analyzing {}", spec.display_name());
        match engine.coordinator.analyze(spec.name(), options).await {
            Ok(analysis) => println!("{}", serde_json::to_string_pretty(&analysis)?),
            Err(e) => {
                warn!("Analysis of {} failed: {}", spec.name(), e);
                println!("{}: analysis failed: {}", spec.name(), e);
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn all_succeeded(results: &ProviderResults) -> bool {
    !results.is_empty() && results.values().all(|o| o.success)
}

/// One line per provider.
fn summary_lines(results: &ProviderResults) -> Vec<String> {
    results
        .iter()
        .map(|(name, outcome)| {
            if outcome.success {
                if outcome.dry_run {
                    format!("[ok]   {}: composed (dry run, not sent)", name)
                } else {
                    format!("[ok]   {}: sent", name)
                }
            } else {
                let mut line = format!(
                    "[fail] {}: {} - {}",
                    name,
                    outcome
                        .error_kind
                        .map(|k| k.as_str())
                        .unwrap_or("unknown"),
                    outcome.error.as_deref().unwrap_or("no details")
                );
                if let Some(failure) = &outcome.failure {
                    line.push_str(&format!(" (at {}", failure.step));
                    if let Some(snapshot) = &failure.snapshot {
                        line.push_str(&format!(", snapshot {}", snapshot.display()));
                    }
                    line.push(')');
                }
                line
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "cmd_run_tests.rs"]
mod tests;
