use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use triage_core::config::TriageConfig;
use triage_core::pipeline::graph::DEFAULT_LINK_CONFIDENCE;
use triage_core::pipeline::synthesis::ChatMessage;
use triage_core::{init_tracing, DecisionOrchestrator, Providers};

#[derive(Debug, Parser)]
#[command(name = "triage", about = "Symptom triage decision core", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "TRIAGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a symptom report and print the decision
    Analyze(AnalyzeArgs),

    /// Ask a general medical question
    Chat(ChatArgs),

    /// Probe provider availability
    Health,

    /// Create or update a direct symptom → disease link in the graph
    Link(LinkArgs),

    /// Show diseases directly linked to a symptom
    Network {
        /// Symptom name
        symptom: String,
    },
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Free-text symptom description
    text: String,
    /// Patient age in years (0-120)
    #[arg(long)]
    age: Option<u8>,
    /// Known allergies
    #[arg(long)]
    allergies: Option<String>,
}

#[derive(Debug, Args)]
struct ChatArgs {
    /// Question or message
    message: String,
    /// JSON file with prior turns: [{"role": "user", "content": "..."}]
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LinkArgs {
    symptom: String,
    disease: String,
    /// Urgency label stored on the disease
    #[arg(long)]
    urgency: String,
    #[arg(long, default_value_t = DEFAULT_LINK_CONFIDENCE)]
    confidence: f32,
}

#[derive(Serialize)]
struct ChatOutput {
    response: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match TriageConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let providers = match Providers::from_config(&config) {
        Ok(providers) => providers,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };
    let orchestrator = DecisionOrchestrator::from_providers(&config, &providers);

    match cli.command {
        Commands::Analyze(args) => {
            match orchestrator
                .analyze_text(&args.text, args.age, args.allergies)
                .await
            {
                Ok(result) => print_json(&result),
                Err(error) => fail(error),
            }
        }
        Commands::Chat(args) => {
            let history = match args.history.as_deref().map(load_history).transpose() {
                Ok(history) => history.unwrap_or_default(),
                Err(error) => return fail(error),
            };
            match orchestrator.chat(&args.message, &history).await {
                Ok(response) => print_json(&ChatOutput { response }),
                Err(error) => fail(error),
            }
        }
        Commands::Health => print_json(&orchestrator.health().await),
        Commands::Link(args) => {
            match providers
                .maintenance
                .add_symptom_disease(&args.symptom, &args.disease, &args.urgency, args.confidence)
                .await
            {
                Ok(()) => match providers.maintenance.symptom_network(&args.symptom).await {
                    Ok(network) => print_json(&network),
                    Err(error) => fail(error),
                },
                Err(error) => fail(error),
            }
        }
        Commands::Network { symptom } => {
            match providers.maintenance.symptom_network(&symptom).await {
                Ok(network) => print_json(&network),
                Err(error) => fail(error),
            }
        }
    }
}

fn load_history(path: &Path) -> Result<Vec<ChatMessage>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read history {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid history {}: {e}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => fail(error),
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    eprintln!("{error}");
    ExitCode::FAILURE
}
