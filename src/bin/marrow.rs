//! Marrow CLI - Distill a GitHub repository into a structured LLM summary.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use marrow::config::Settings;
use marrow::errors::{exit_code, SummarizeError};
use marrow::fetch::GitHubFetcher;
use marrow::llm::OpenAiGateway;
use marrow::pipeline::Summarizer;
use marrow::repo::Summary;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "marrow")]
#[command(about = "Distill a GitHub repository into a structured LLM summary")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a repository
    Summarize {
        /// Repository URL or owner/repo shorthand
        reference: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Context token budget
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Maximum number of files to fetch
        #[arg(long)]
        max_files: Option<usize>,

        /// Per-file size cap in KB
        #[arg(long)]
        max_file_size_kb: Option<u64>,

        /// Chat-completion model to use
        #[arg(long)]
        model: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = json_flag(&cli.command);

    let result = match cli.command {
        Commands::Summarize {
            reference,
            json,
            max_tokens,
            max_files,
            max_file_size_kb,
            model,
        } => run_summarize(reference, json, max_tokens, max_files, max_file_size_kb, model).await,
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "marrow", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                kind: &'static str,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
                kind: e.kind(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Summarize { json, .. } => *json,
        Commands::Completions { .. } => false,
    }
}

async fn run_summarize(
    reference: String,
    json: bool,
    max_tokens: Option<usize>,
    max_files: Option<usize>,
    max_file_size_kb: Option<u64>,
    model: Option<String>,
) -> Result<(), SummarizeError> {
    let settings = Settings::from_env();

    let api_key = settings.openai_api_key.clone().ok_or_else(|| {
        SummarizeError::Generation("OPENAI_API_KEY is not set".to_string())
    })?;

    let fetcher = GitHubFetcher::new(settings.github_token.clone());
    let gateway = OpenAiGateway::new(api_key, model.unwrap_or(settings.openai_model));

    let summarizer = Summarizer::new(fetcher, gateway)
        .max_context_tokens(max_tokens.unwrap_or(settings.max_context_tokens))
        .max_files_to_fetch(max_files.unwrap_or(settings.max_files_to_fetch))
        .max_file_size_kb(max_file_size_kb.unwrap_or(settings.max_file_size_kb));

    let summary = summarizer.execute(&reference).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(|e| {
            SummarizeError::Generation(format!("failed to serialize summary: {e}"))
        })?;
        println!("{rendered}");
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("Summary\n-------\n{}\n", summary.summary);

    if !summary.technologies.is_empty() {
        println!("Technologies\n------------");
        for tech in &summary.technologies {
            println!("- {tech}");
        }
        println!();
    }

    if !summary.structure.is_empty() {
        println!("Structure\n---------\n{}", summary.structure);
    }
}
