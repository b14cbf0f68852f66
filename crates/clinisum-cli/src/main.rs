//! clinisum CLI
//!
//! Generate and validate structured clinical summaries for a folder of notes.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clinisum_core::{check_payload, Protocol, SchemaValidator};
use clinisum_runtime::{
    BatchAggregator, JsonFileSink, PromptLibrary, PromptVersion, ProviderRegistry, ReportSink,
    RuntimeConfig,
};

mod inputs;

#[derive(Parser)]
#[command(name = "clinisum")]
#[command(version, about = "Structured clinical summaries with a validation guardrail")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the batch pipeline over every *.txt file in a directory
    Run {
        /// Directory containing the clinical notes
        #[arg(short, long, default_value = "data/input")]
        input_dir: PathBuf,

        /// Directory with prompt_v1.txt / prompt_v2.txt templates
        #[arg(long, default_value = "prompts")]
        prompts_dir: PathBuf,

        /// Prompt variant: v1 (raw) or v2 (structured)
        #[arg(long, default_value = "v2")]
        prompt_version: PromptVersion,

        /// Report output path
        #[arg(short, long, default_value = "results.json")]
        output: PathBuf,

        /// Protocol file with validation bounds (YAML or JSON)
        #[arg(long)]
        protocol: Option<PathBuf>,

        /// Generative provider
        #[arg(long, value_enum, default_value = "openai")]
        provider: ProviderChoice,

        /// Model name
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,

        /// Custom API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Per-call timeout, e.g. "30s" or "1m"
        #[arg(long, default_value = "30s")]
        timeout: humantime::Duration,

        /// Skip the service after this many consecutive failures (0 = never)
        #[arg(long, default_value_t = 0)]
        circuit_threshold: u32,
    },

    /// Check one payload file against the protocol
    Validate {
        /// Path to the raw payload (JSON, optionally in a code fence)
        payload: PathBuf,

        /// Protocol file with validation bounds (YAML or JSON)
        #[arg(long)]
        protocol: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderChoice {
    /// OpenAI chat completions (needs OPENAI_API_KEY)
    Openai,
    /// No service calls, every document uses the fallback payload
    Offline,
}

impl ProviderChoice {
    fn as_str(&self) -> &'static str {
        match self {
            ProviderChoice::Openai => "openai",
            ProviderChoice::Offline => "offline",
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            input_dir,
            prompts_dir,
            prompt_version,
            output,
            protocol,
            provider,
            model,
            base_url,
            timeout,
            circuit_threshold,
        } => {
            let protocol = load_protocol(protocol.as_deref())?;
            let documents = inputs::read_documents(&input_dir)?;
            tracing::info!(
                input = %input_dir.display(),
                documents = documents.len(),
                "Loaded input documents"
            );

            let mut provider_config = serde_json::json!({});
            if let Some(url) = base_url {
                provider_config["base_url"] = serde_json::Value::String(url);
            }
            let provider = ProviderRegistry::with_defaults()
                .create(provider.as_str(), &provider_config)
                .context("Failed to create provider (use --provider offline for a dry run)")?;

            let config = RuntimeConfig::default()
                .with_prompt_version(prompt_version)
                .with_model(model)
                .with_timeout(timeout.into())
                .with_circuit_threshold(circuit_threshold);

            let aggregator = BatchAggregator::builder()
                .provider(provider)
                .protocol(protocol)
                .config(config)
                .prompts(PromptLibrary::from_dir(prompts_dir))
                .build()?;

            let report = aggregator.run(&documents).await;
            JsonFileSink::new(&output).write(&report)?;

            println!(
                "Processed {} documents: {} succeeded, {} failed ({} fallbacks)",
                report.total, report.succeeded, report.failed, report.fallbacks
            );
            println!("Report saved to {}", output.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Validate { payload, protocol } => {
            let validator = SchemaValidator::new(load_protocol(protocol.as_deref())?)?;
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("Failed to read {}", payload.display()))?;

            match check_payload(&validator, &raw) {
                Ok(output) => {
                    println!(
                        "VALID: {} themes, {} signifiers, risk {}, {} analysis words",
                        output.themes().len(),
                        output.signifiers().len(),
                        output.risk_level(),
                        output.analysis_word_count()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("INVALID: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_protocol(path: Option<&Path>) -> Result<Protocol> {
    match path {
        Some(path) => Protocol::from_file(path)
            .with_context(|| format!("Failed to load protocol {}", path.display())),
        None => Ok(Protocol::default()),
    }
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
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["clinisum", "run"]).unwrap();
        match cli.command {
            Command::Run {
                prompt_version,
                provider,
                timeout,
                circuit_threshold,
                ..
            } => {
                assert_eq!(circuit_threshold, 0);
                assert_eq!(prompt_version, PromptVersion::V2);
                assert_eq!(provider, ProviderChoice::Openai);
                assert_eq!(
                    std::time::Duration::from(timeout),
                    std::time::Duration::from_secs(30)
                );
            }
            Command::Validate { .. } => panic!("Expected run"),
        }
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "clinisum",
            "-v",
            "run",
            "--prompt-version",
            "v1",
            "--provider",
            "offline",
            "--timeout",
            "1m",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Run {
                prompt_version,
                provider,
                timeout,
                ..
            } => {
                assert_eq!(prompt_version, PromptVersion::V1);
                assert_eq!(provider, ProviderChoice::Offline);
                assert_eq!(
                    std::time::Duration::from(timeout),
                    std::time::Duration::from_secs(60)
                );
            }
            Command::Validate { .. } => panic!("Expected run"),
        }
    }

    #[test]
    fn test_rejects_unknown_prompt_version() {
        assert!(Cli::try_parse_from(["clinisum", "run", "--prompt-version", "v3"]).is_err());
    }

    #[test]
    fn test_default_protocol() {
        let protocol = load_protocol(None).unwrap();
        assert_eq!(protocol, Protocol::default());
    }
}
