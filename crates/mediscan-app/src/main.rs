//! MediScan application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the triage service and enrichment orchestrator
//! 4. Run the requested command (`chat` REPL or one-shot `enrich`)

mod cli;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mediscan_core::config::MediscanConfig;
use mediscan_core::logging;
use mediscan_enrich::{EnrichmentOrchestrator, EnrichmentRequest};
use mediscan_triage::{TriageError, TriageService, TurnRequest};

use cli::{CliArgs, Command};

/// Interactive intake loop. One line is one patient message.
async fn run_chat(
    config: &MediscanConfig,
    session_id: Option<String>,
    enrich: bool,
    context: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = TriageService::from_config(config)?;
    let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::info!(session_id = %session_id, enrich, "Chat session started");

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Describe what's bothering you. Type 'quit' to leave.\n> ")
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "quit" | "exit") {
            break;
        }

        let mut request = TurnRequest::new(session_id.as_str(), line);
        if enrich {
            request = request.with_enrichment();
            if let Some(ref ctx) = context {
                request = request.with_context(ctx.as_str());
            }
        }

        let output = match service.handle_turn(request).await {
            Ok(reply) => {
                let mut out = format!(
                    "\n{}\n\n[urgency: {} | stage: {}]\n",
                    reply.response_text, reply.urgency_level, reply.stage
                );
                if let Some(ref enrichment) = reply.enrichment {
                    out.push_str(&serde_json::to_string_pretty(enrichment)?);
                    out.push('\n');
                }
                out
            }
            Err(TriageError::EmptyMessage) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Turn rejected");
                format!("{}\n", e)
            }
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    if let Ok(summary) = service.session_summary(&session_id).await {
        tracing::info!(
            session_id = %summary.session_id,
            symptom = %summary.primary_symptom,
            urgency = %summary.urgency_level,
            turns = summary.patient_turns,
            "Chat session ended"
        );
    }
    Ok(())
}

/// One-shot enrichment; prints the result as JSON.
async fn run_enrich(
    config: &MediscanConfig,
    request: EnrichmentRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = EnrichmentOrchestrator::from_config(config)?;
    let result = orchestrator.enrich(request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = MediscanConfig::load_or_default(&config_file);
    logging::init(&args.resolve_log_level(&config.general.log_level));

    tracing::info!("Starting MediScan v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    match args.command {
        Command::Chat {
            session_id,
            enrich,
            context,
        } => run_chat(&config, session_id, enrich, context).await,
        Command::Enrich {
            subject,
            confidence,
            risk,
            kind,
            recommendations,
            context,
        } => {
            let mut request = EnrichmentRequest::new(subject, confidence, risk)
                .with_kind(kind)
                .with_recommendations(recommendations);
            if let Some(ctx) = context {
                request = request.with_context(ctx);
            }
            run_enrich(&config, request).await
        }
    }
}
