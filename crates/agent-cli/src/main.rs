//! Command-line interface for agent-rs

use agent_finance::{CoordinatorConfig, SubTaskResult, consensus, summarize};
use agent_llm::{ComplexityTier, ProviderId, Router, Selection};
use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "agent-cli")]
#[command(about = "Provider routing and consensus tools for agent-rs", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available providers and their models
    Models,

    /// Select a provider/model for a complexity tier
    Route {
        /// simple, moderate, complex, or critical
        #[arg(long)]
        tier: ComplexityTier,

        /// Maximum average cost per 1M tokens
        #[arg(long, value_parser = parse_ceiling)]
        max_cost: Option<f64>,

        /// Preferred provider
        #[arg(long, requires = "model")]
        provider: Option<ProviderId>,

        /// Preferred model
        #[arg(long, requires = "provider")]
        model: Option<String>,
    },

    /// Recommend a model for a task type (screening, analysis, deep_analysis, ...)
    Recommend {
        task_type: String,

        /// Maximum average cost per 1M tokens
        #[arg(long, value_parser = parse_ceiling)]
        budget: Option<f64>,
    },

    /// Estimate the cost of a call
    Cost {
        model: String,
        input_tokens: u64,
        output_tokens: u64,
    },

    /// Aggregate a JSON file of sub-task results
    Consensus {
        /// JSON object mapping sub-task name to result
        file: PathBuf,
    },
}

fn parse_ceiling(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse::<f64>().map_err(|e| e.to_string())?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("expected a non-negative number, got {raw}"))
    }
}

#[derive(Serialize)]
struct RouteOutput<'a> {
    tier: ComplexityTier,
    provider: ProviderId,
    model: &'a str,
    average_cost: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let config = agent_utils::Config::from_env()?;
    agent_utils::init_tracing_with(&config)?;

    let cli = Cli::parse();
    let coordinator_config = CoordinatorConfig::default().with_env()?;

    let mut router = Router::from_env();
    if let Some(selection) = coordinator_config.preferred_selection() {
        router = router.with_default_selection(selection);
    }

    info!(providers = ?router.available_providers(), "Starting agent-cli");

    match cli.command {
        Command::Models => models(&router, cli.format),
        Command::Route {
            tier,
            max_cost,
            provider,
            model,
        } => {
            let preferred = provider.zip(model).map(|(p, m)| Selection::new(p, m));
            let ceiling = max_cost.or(coordinator_config.cost_ceiling);
            let selection = router.select_provider(tier, ceiling, preferred.as_ref())?;
            print_route(&router, tier, &selection, cli.format)
        }
        Command::Recommend { task_type, budget } => {
            let selection = router.recommend_model(&task_type, budget)?;
            let tier = ComplexityTier::from_task_type(&task_type);
            print_route(&router, tier, &selection, cli.format)
        }
        Command::Cost {
            model,
            input_tokens,
            output_tokens,
        } => {
            if router.registry().model(&model).is_none() {
                warn!(%model, "Unknown model, cost reported as zero");
            }
            let cost = router.estimate_cost(&model, input_tokens, output_tokens);
            match cli.format {
                OutputFormat::Text => println!("${cost:.6}"),
                OutputFormat::Json => println!(
                    "{}",
                    json!({
                        "model": model,
                        "input_tokens": input_tokens,
                        "output_tokens": output_tokens,
                        "cost": cost,
                    })
                ),
            }
            Ok(())
        }
        Command::Consensus { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let results: BTreeMap<String, SubTaskResult> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let summary = summarize(&results);
            let verdict = consensus(&results);
            match cli.format {
                OutputFormat::Text => {
                    println!("{summary}");
                    println!();
                    println!("Consensus: {verdict}");
                }
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "summary": summary,
                        "consensus": verdict,
                    }))?
                ),
            }
            Ok(())
        }
    }
}

fn models(router: &Router, format: OutputFormat) -> anyhow::Result<()> {
    let available = router.available_models();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&available)?);
        return Ok(());
    }

    if available.is_empty() {
        println!("No providers configured. Set one of:");
        for provider in ProviderId::ALL {
            println!("  {}", provider.credential_env_var());
        }
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Provider", "Model", "Input $/1M", "Output $/1M"]);

    for (provider, names) in &available {
        for name in names {
            if let Some(spec) = router.registry().model(name) {
                table.add_row(vec![
                    provider.to_string(),
                    name.clone(),
                    format!("{:.2}", spec.input_cost),
                    format!("{:.2}", spec.output_cost),
                ]);
            }
        }
    }

    println!("{table}");
    Ok(())
}

fn print_route(
    router: &Router,
    tier: ComplexityTier,
    selection: &Selection,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let average_cost = router
        .registry()
        .model(&selection.model)
        .map(agent_llm::ModelSpec::average_cost);

    match format {
        OutputFormat::Text => match average_cost {
            Some(cost) => println!("{selection} ({tier}, avg ${cost:.3}/1M tokens)"),
            None => println!("{selection} ({tier})"),
        },
        OutputFormat::Json => {
            let output = RouteOutput {
                tier,
                provider: selection.provider,
                model: &selection.model,
                average_cost,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_route() {
        let cli = Cli::try_parse_from([
            "agent-cli", "--format", "json", "route", "--tier", "critical", "--max-cost", "5",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Route { tier, max_cost, provider, .. } => {
                assert_eq!(tier, ComplexityTier::Critical);
                assert_eq!(max_cost, Some(5.0));
                assert!(provider.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_provider_requires_model() {
        let result = Cli::try_parse_from([
            "agent-cli", "route", "--tier", "simple", "--provider", "groq",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_tier() {
        assert!(Cli::try_parse_from(["agent-cli", "route", "--tier", "extreme"]).is_err());
    }

    #[test]
    fn test_rejects_invalid_ceiling() {
        for raw in ["NaN", "inf", "-1"] {
            let flag = format!("--budget={raw}");
            assert!(Cli::try_parse_from(["agent-cli", "recommend", "analysis", &flag]).is_err());
            let flag = format!("--max-cost={raw}");
            assert!(
                Cli::try_parse_from(["agent-cli", "route", "--tier", "simple", &flag]).is_err()
            );
        }
        assert!(parse_ceiling("0").is_ok());
    }

    #[test]
    fn test_parse_cost() {
        let cli = Cli::try_parse_from(["agent-cli", "cost", "gpt-4o", "1000", "500"]).unwrap();
        match cli.command {
            Command::Cost {
                model,
                input_tokens,
                output_tokens,
            } => {
                assert_eq!(model, "gpt-4o");
                assert_eq!(input_tokens, 1000);
                assert_eq!(output_tokens, 500);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
